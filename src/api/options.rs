use clap::Parser;

use crate::api::PuzzleApi;
use crate::utils::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ApiMode {
    Local,
    Trial,
    Contest,
}

impl ApiMode {
    fn as_str(self) -> &'static str {
        match self {
            ApiMode::Local => "local",
            ApiMode::Trial => "trial",
            ApiMode::Contest => "contest",
        }
    }
}

/// CLI flags for `sqpack-submit`: fetch a puzzle from the contest API, post
/// it onto the cluster, then submit the best solution found within `limit`.
#[derive(Clone, Debug, Parser)]
pub struct SubmitOptions {
    #[arg(long)]
    pub key: Option<String>,

    #[arg(long, value_enum, default_value_t = ApiMode::Local)]
    pub mode: ApiMode,

    #[arg(long, default_value_t = 9.6)]
    pub limit: f64,

    #[arg(long, default_value = "127.0.0.1:8099")]
    pub hostname: String,

    #[arg(long)]
    pub filename: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub count: u32,

    #[arg(long, default_value = "http://techchallenge.cimpress.com")]
    pub base_url: String,

    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}

impl SubmitOptions {
    /// Builds the API client this run should use, mirroring the original
    /// `mode == 'local'` branch that skips HTTP entirely.
    pub fn api_client(&self) -> Result<PuzzleApi> {
        if self.mode == ApiMode::Local {
            let filename = self.filename.clone().ok_or_else(|| anyhow!("--filename is required in local mode"))?;
            Ok(PuzzleApi::local(filename))
        } else {
            let key = self.key.clone().ok_or_else(|| anyhow!("--key is required in trial/contest mode"))?;
            Ok(PuzzleApi::challenge(self.base_url.clone(), key, self.mode.as_str()))
        }
    }

    pub fn limit(&self) -> Duration {
        Duration::from_secs_f64(self.limit)
    }
}
