/*
 *  CLI option structs for the `sqpack` worker binary: a flat clap::Parser
 *  struct plus a small builder method that turns raw flags into the
 *  strongly-typed configs the core consumes.
 */

use clap::Parser;

use crate::cluster::ClusterConfig;
use crate::solver::SolverParams;
use crate::utils::prelude::*;

#[derive(Clone, Debug, Parser)]
pub struct WorkerOptions {
    #[arg(long, default_value_t = 9.6)]
    pub limit: f64,

    #[arg(long, default_value_t = 0.5)]
    pub share_freq: f64,

    #[arg(long, default_value_t = 1000)]
    pub pop_size: usize,

    #[arg(long, default_value_t = 100)]
    pub spawn_count: usize,

    #[arg(long)]
    pub link: Option<String>,

    #[arg(long, default_value_t = 8099)]
    pub port: u16,

    #[arg(long)]
    pub filename: Option<String>,

    #[arg(long)]
    pub workers: Option<u32>,

    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}

impl WorkerOptions {
    /// Turns the raw flags into the parameters the evolutionary loop wants,
    /// converting float seconds into `Duration`s once at startup rather than
    /// on every generation check.
    pub fn solver_params(&self) -> SolverParams {
        SolverParams {
            limit: Duration::from_secs_f64(self.limit),
            share_freq: Duration::from_secs_f64(self.share_freq),
            pop_size: self.pop_size,
            spawn_count: self.spawn_count,
        }
    }

    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig { port: self.port, link: self.link.clone(), secret: crate::cluster::protocol::DEFAULT_SECRET.to_owned() }
    }
}
