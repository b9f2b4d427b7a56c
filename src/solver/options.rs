use crate::utils::prelude::*;

/// Parameters for one puzzle solve, already converted out of raw CLI flags
/// into the types the engine wants (durations instead of float seconds).
#[derive(Clone, Copy, Debug)]
pub struct SolverParams {
    pub limit: Duration,
    pub share_freq: Duration,
    pub pop_size: usize,
    pub spawn_count: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            limit: Duration::from_millis(9_600),
            share_freq: Duration::from_millis(500),
            pop_size: 1_000,
            spawn_count: 100,
        }
    }
}
