use clap::Parser;
use flexi_logger::{AdaptiveFormat, Logger, WriteMode};
use lib_sqpack::prelude::*;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let options = SubmitOptions::parse();
    let _logger = Logger::try_with_env_or_str(if options.debug { "debug" } else { "info" })?
        .write_mode(WriteMode::BufferAndFlush)
        .log_to_stderr()
        .adaptive_format_for_stderr(match cfg!(debug_assertions) {
            true => AdaptiveFormat::WithThread,
            _ => AdaptiveFormat::Default,
        })
        .start()?;

    let api = options.api_client()?;
    let cluster = Cluster::start(ClusterConfig { port: 0, link: Some(options.hostname.clone()), ..ClusterConfig::default() }, None)?;

    let mut scores = Vec::new();
    for round in 1..=options.count {
        let response = api.get().context("fetching puzzle")?;
        let puzzle = Puzzle::new(&response.puzzle)?;
        cluster.announce_puzzle(response.id.clone(), puzzle.clone());

        std::thread::sleep(options.limit());

        let best = cluster.global_best().snapshot().ok_or_else(|| anyhow!("no result accumulated for {}", response.id))?;
        let expanded = expand_solution(&puzzle, &best.solution);
        let submission = api.submit(&response.id, &expanded).context("submitting solution")?;

        if !submission.errors.is_empty() {
            return Err(anyhow!("submission for {} rejected: {:?}", response.id, submission.errors));
        }

        log::info!("round {round}/{}: {}x{} scored {} (+{} penalty)", options.count, response.height, response.width, submission.score, submission.time_penalty);
        scores.push(submission.score);
    }

    let mean = scores.iter().sum::<u32>() as f64 / scores.len() as f64;
    log::info!("mean score over {} puzzles: {mean:.2}", scores.len());
    Ok(())
}
