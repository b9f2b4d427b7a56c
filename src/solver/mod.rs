/*
 *  The generational worker loop: seeds a population for one puzzle, evolves
 *  it against a wall-clock deadline, and periodically hands the best-known
 *  solution off to the cluster layer.
 */

mod options;

pub use options::SolverParams;

use crate::cluster::GlobalBest;
use crate::packing::prelude::*;

/// Runs the evolutionary loop for one puzzle until `params.limit` elapses,
/// publishing improvements through `global_best` every `params.share_freq`.
/// `on_share` is called with `(puzzle_id, score, permutation)` each time a
/// share point is reached, so the caller (the cluster layer) can broadcast
/// it; this keeps the solver ignorant of the wire format.
pub fn solve(
    puzzle_id: &str,
    puzzle: &Puzzle,
    params: &SolverParams,
    prng: &mut Prng,
    mut on_share: impl FnMut(&str, u32, &[u32]),
) -> Vec<Square> {
    let mut scratch = Scratch::new(puzzle);
    let mut pop = seed_population(puzzle, &mut scratch, params.pop_size, params.spawn_count);

    if pop.perm_len() == 0 {
        let squares = expand_solution(puzzle, &[]);
        on_share(puzzle_id, squares.len() as u32, &[]);
        return squares;
    }

    let t_start = Instant::now();
    let t_stop = params.limit;
    let t_share = params.share_freq;
    let mut next_share = t_share;

    let mut buf_a = Vec::with_capacity(pop.perm_len());
    let mut buf_b = Vec::with_capacity(pop.perm_len());

    while t_start.elapsed() < t_stop {
        generation(&mut pop, params.pop_size, prng, puzzle, &mut scratch, &mut buf_a, &mut buf_b);

        if t_start.elapsed() >= next_share {
            let best = pop.best_row();
            on_share(puzzle_id, pop.score(best), pop.permutation(best));
            next_share += t_share;
        }
    }

    let best = pop.best_row();
    on_share(puzzle_id, pop.score(best), pop.permutation(best));
    expand_solution(puzzle, pop.permutation(best))
}

/// One generation: partial-select the survivors, spawn offspring into the
/// tail of the population, then score only the freshly spawned rows.
fn generation(
    pop: &mut Population,
    pop_size: usize,
    prng: &mut Prng,
    puzzle: &Puzzle,
    scratch: &mut Scratch,
    buf_a: &mut Vec<u32>,
    buf_b: &mut Vec<u32>,
) {
    divide_population(pop, pop_size);
    spawn_generation(pop, pop_size, prng, puzzle.height as u32, puzzle.width as u32, buf_a, buf_b);
    score_population(puzzle, scratch, pop, pop_size..pop.rows());
}

/// Convenience used by the cluster layer: solves a puzzle and forwards every
/// share point straight into a `GlobalBest` register plus a broadcast
/// callback, so the worker loop above stays free of any gossip type.
pub fn solve_and_publish(
    puzzle_id: &str,
    puzzle: &Puzzle,
    params: &SolverParams,
    prng: &mut Prng,
    global_best: &GlobalBest,
    mut broadcast: impl FnMut(&str, u32, &[u32]),
) -> Vec<Square> {
    solve(puzzle_id, puzzle, params, prng, |id, score, perm| {
        if global_best.update(id, score, perm) {
            broadcast(id, score, perm);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puzzle_of(rows: &[&[u8]]) -> Puzzle {
        let rows: Vec<Vec<u8>> = rows.iter().map(|r| r.to_vec()).collect();
        Puzzle::new(&rows).unwrap()
    }

    #[test]
    fn degenerate_puzzle_skips_evolution_and_shares_once() {
        let puzzle = puzzle_of(&[&[1, 0, 1], &[0, 1, 0], &[1, 0, 1]]);
        let params = SolverParams { limit: Duration::from_millis(50), share_freq: Duration::from_millis(10), pop_size: 20, spawn_count: 4 };
        let mut prng = Prng::from_seed([1, 2, 3, 4]);
        let mut shares = 0;
        let squares = solve("p", &puzzle, &params, &mut prng, |_, score, _| {
            shares += 1;
            assert_eq!(score, 5);
        });
        assert_eq!(shares, 1);
        assert_eq!(squares.len(), 5);
    }

    #[test]
    fn solve_improves_or_holds_score_on_a_small_puzzle() {
        let puzzle = puzzle_of(&[&[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1]]);
        let params = SolverParams { limit: Duration::from_millis(80), share_freq: Duration::from_millis(20), pop_size: 32, spawn_count: 8 };
        let mut prng = Prng::from_seed([5, 6, 7, 8]);
        let mut last_score = u32::MAX;
        let squares = solve("p", &puzzle, &params, &mut prng, |_, score, _| {
            assert!(score <= last_score);
            last_score = score;
        });
        assert_eq!(last_score, 1);
        assert_eq!(squares, vec![Square { row: 0, col: 0, size: 4 }]);
    }
}
