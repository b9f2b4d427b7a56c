/*
 *  A thin client for the contest puzzle API: fetch a puzzle, submit a
 *  solution. `mode = local` bypasses HTTP entirely and reads/writes a JSON
 *  file on disk, for running the solver against a known puzzle in tests.
 */

mod options;

pub use options::SubmitOptions;

use crate::packing::prelude::*;
use crate::utils::prelude::*;

/// A puzzle as returned by the API's `GET .../puzzle` endpoint.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PuzzleResponse {
    pub id: String,
    pub puzzle: Vec<Vec<u8>>,
    pub width: usize,
    pub height: usize,
}

/// Wire shape of a submitted solution. The API wants `X = col, Y = row`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SquareDto {
    #[serde(rename = "X")]
    pub x: u32,
    #[serde(rename = "Y")]
    pub y: u32,
    #[serde(rename = "Size")]
    pub size: u32,
}

impl From<&Square> for SquareDto {
    fn from(sq: &Square) -> Self {
        SquareDto { x: sq.col, y: sq.row, size: sq.size }
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct SolutionRequest {
    pub id: String,
    pub squares: Vec<SquareDto>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SolutionResponse {
    pub score: u32,
    #[serde(rename = "timePenalty")]
    pub time_penalty: u32,
    pub errors: Vec<String>,
}

/// Either talks to the real contest server, or a local JSON file, depending
/// on `--mode`. Callers don't need to care which.
pub enum PuzzleApi {
    Challenge { base_url: String, key: String, mode: String, client: reqwest::blocking::Client },
    Local { filename: String },
}

impl PuzzleApi {
    pub fn challenge(base_url: impl Into<String>, key: impl Into<String>, mode: impl Into<String>) -> PuzzleApi {
        PuzzleApi::Challenge { base_url: base_url.into(), key: key.into(), mode: mode.into(), client: reqwest::blocking::Client::new() }
    }

    pub fn local(filename: impl Into<String>) -> PuzzleApi {
        PuzzleApi::Local { filename: filename.into() }
    }

    pub fn get(&self) -> Result<PuzzleResponse> {
        match self {
            PuzzleApi::Challenge { base_url, key, mode, client } => {
                let url = format!("{base_url}/{key}/{mode}/puzzle");
                client.get(&url).send()?.error_for_status()?.json::<PuzzleResponse>().context("decoding puzzle response")
            }
            PuzzleApi::Local { filename } => {
                let text = std::fs::read_to_string(filename).with_context(|| format!("reading local puzzle {filename}"))?;
                serde_json::from_str(&text).context("decoding local puzzle file")
            }
        }
    }

    pub fn submit(&self, puzzle_id: &str, squares: &[Square]) -> Result<SolutionResponse> {
        let request = SolutionRequest { id: puzzle_id.to_owned(), squares: squares.iter().map(SquareDto::from).collect() };
        match self {
            PuzzleApi::Challenge { base_url, key, mode, client } => {
                let url = format!("{base_url}/{key}/{mode}/solution");
                client.post(&url).json(&request).send()?.error_for_status()?.json::<SolutionResponse>().context("decoding solution response")
            }
            PuzzleApi::Local { filename } => {
                let result_path = format!("{filename}.result");
                let body = serde_json::to_string(&request.squares).context("encoding local solution")?;
                std::fs::write(&result_path, body).with_context(|| format!("writing {result_path}"))?;
                Ok(SolutionResponse { score: squares.len() as u32, time_penalty: 0, errors: Vec::new() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mode_round_trips_a_puzzle_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("sqpack-api-test-{}.json", std::process::id()));
        let response = PuzzleResponse { id: "p1".into(), puzzle: vec![vec![1, 1], vec![1, 1]], width: 2, height: 2 };
        std::fs::write(&path, serde_json::to_string(&response).unwrap()).unwrap();

        let api = PuzzleApi::local(path.to_string_lossy().into_owned());
        let fetched = api.get().unwrap();
        assert_eq!(fetched.id, "p1");

        let squares = vec![Square { row: 0, col: 0, size: 2 }];
        let result = api.submit("p1", &squares).unwrap();
        assert_eq!(result.score, 1);
        assert!(result.errors.is_empty());

        std::fs::remove_file(&path).ok();
        std::fs::remove_file(format!("{}.result", path.to_string_lossy())).ok();
    }

    #[test]
    fn square_dto_swaps_row_and_column_into_x_and_y() {
        let sq = Square { row: 3, col: 7, size: 2 };
        let dto = SquareDto::from(&sq);
        assert_eq!((dto.x, dto.y), (7, 3));
    }
}
