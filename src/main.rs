use std::process::Command;

use clap::Parser;
use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use lib_sqpack::prelude::*;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let options = WorkerOptions::parse();
    let _logger = Logger::try_with_env_or_str(if options.debug { "debug" } else { "info" })?
        .write_mode(WriteMode::BufferAndFlush)
        .log_to_stderr()
        .adaptive_format_for_stderr(match cfg!(debug_assertions) {
            true => AdaptiveFormat::WithThread,
            _ => AdaptiveFormat::Default,
        })
        .start()?;

    if options.filename.is_some() && options.workers.is_some() {
        return Err(anyhow!("--filename and --workers are mutually exclusive"));
    }

    let result = if let Some(filename) = options.filename.clone() {
        run_local_file(&options, &filename)
    } else if let Some(workers) = options.workers {
        run_coordinator(&options, workers)
    } else {
        run_worker(&options)
    };

    if let Err(err) = &result {
        log::error!("fatal error: {err}");
    }
    result
}

/// Reads a puzzle straight off disk and solves it with no networking at
/// all, writing `<filename>.result` on completion.
fn run_local_file(options: &WorkerOptions, filename: &str) -> Result<()> {
    let text = std::fs::read_to_string(filename).with_context(|| format!("reading puzzle file {filename}"))?;
    let response: PuzzleResponse = serde_json::from_str(&text).context("decoding puzzle file")?;
    let puzzle = Puzzle::new(&response.puzzle)?;
    let params = options.solver_params();
    let mut prng = Prng::seeded();

    let squares = solve(&response.id, &puzzle, &params, &mut prng, |id, score, _| {
        log::info!("puzzle {id}: score {score}");
    });

    let result_path = format!("{filename}.result");
    let dto: Vec<SquareDto> = squares.iter().map(SquareDto::from).collect();
    std::fs::write(&result_path, serde_json::to_string(&dto)?).with_context(|| format!("writing {result_path}"))?;
    log::info!("wrote {} squares to {result_path}", dto.len());
    Ok(())
}

/// Runs as a plain gossip worker: joins the mesh (dialing `--link` if given)
/// and solves whatever puzzles get announced to it.
fn run_worker(options: &WorkerOptions) -> Result<()> {
    let _cluster = Cluster::start(options.cluster_config(), Some(options.solver_params()))?;
    park_forever()
}

/// Spawns `workers` child worker processes dialing back into this one, then
/// runs as a relay-only coordinator (no local solver).
fn run_coordinator(options: &WorkerOptions, workers: u32) -> Result<()> {
    let exe = std::env::current_exe().context("locating current executable")?;
    let mut children = Vec::new();
    for i in 0..workers {
        let child = Command::new(&exe)
            .arg("--limit")
            .arg(options.limit.to_string())
            .arg("--share-freq")
            .arg(options.share_freq.to_string())
            .arg("--pop-size")
            .arg(options.pop_size.to_string())
            .arg("--spawn-count")
            .arg(options.spawn_count.to_string())
            .arg("--port")
            .arg((options.port + 1 + i as u16).to_string())
            .arg("--link")
            .arg(format!("127.0.0.1:{}", options.port))
            .args(if options.debug { vec!["--debug"] } else { vec![] })
            .spawn()
            .with_context(|| format!("spawning worker {i}"))?;
        children.push(child);
    }

    let _cluster = Cluster::start(options.cluster_config(), None)?;
    for mut child in children {
        child.wait().context("waiting for worker process")?;
    }
    Ok(())
}

fn park_forever() -> Result<()> {
    loop {
        std::thread::sleep(Duration::from_secs(3600));
    }
}
