use crate::packing::point::PackedPoint;
use crate::packing::population::Population;
use crate::packing::prelude::*;
use crate::packing::scorer::score_population;

/// Grows a square anchored at (row, col) without mutating anything, purely to
/// measure how large it could get. Mirrors `Scratch::grow_and_mark` but reads
/// straight from the puzzle, since nothing has been filled in yet at seeding
/// time.
fn max_square_at(puzzle: &Puzzle, row: usize, col: usize) -> usize {
    let mut n = 1usize;
    loop {
        if row + n >= puzzle.height || col + n >= puzzle.width {
            break;
        }
        let mut legal = true;
        for k in 0..=n {
            if puzzle.cell(row + n, col + k) != Some(1) || puzzle.cell(row + k, col + n) != Some(1) {
                legal = false;
                break;
            }
        }
        if !legal {
            break;
        }
        n += 1;
    }
    n
}

/// Every interior point paired with the largest square it could anchor if it
/// were the only square drawn. Computed once per puzzle and reused by every
/// heuristic ordering.
pub fn calculate_max_sizes(puzzle: &Puzzle) -> Vec<(u32, PackedPoint)> {
    let mut sizes = Vec::new();
    for row in 0..puzzle.height {
        for col in 0..puzzle.width {
            if puzzle.cell(row, col) == Some(1) {
                let n = max_square_at(puzzle, row, col);
                sizes.push((n as u32, PackedPoint::pack(row as u32, col as u32)));
            }
        }
    }
    sizes
}

/// One seeding heuristic: a comparison key computed per `(max_size, point)`
/// pair, used to stable-sort the point list into a starting permutation.
/// The six baseline keys are literal `(i, j, n)` tuples; the angle family
/// generalizes them into a linear blend of `i`, `j`, and `n` so the seeded
/// population sweeps many "scan directions" at once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HeuristicKey {
    /// `(-n, i, j)`: biggest square first, ties broken row-major.
    BiggestFirstRowTiebreak,
    /// `(-n, j, i)`: biggest square first, ties broken column-major.
    BiggestFirstColumnTiebreak,
    /// `(i, -n, j)`: row-major first, ties broken by biggest square.
    RowMajorBiggestTiebreak,
    /// `(j, -n, i)`: column-major first, ties broken by biggest square.
    ColumnMajorBiggestTiebreak,
    /// `(i, j)`: plain row-major order, ignoring size entirely.
    RowMajor,
    /// `(j, i)`: plain column-major order, ignoring size entirely.
    ColumnMajor,
    /// `split*i + (1-split)*j - ratio*n`, for one of 50 splits and 5 ratios.
    Linear { split_index: u32, ratio: u32 },
}

/// 6 baseline orderings plus 50 splits in each of 5 size-ratio variants, one
/// heuristic per seeded population row.
pub fn make_heuristic_list() -> Vec<HeuristicKey> {
    const SPLIT_STEPS: u32 = 50;
    const RATIO_VARIANTS: u32 = 5;

    let mut keys = vec![
        HeuristicKey::BiggestFirstRowTiebreak,
        HeuristicKey::BiggestFirstColumnTiebreak,
        HeuristicKey::RowMajorBiggestTiebreak,
        HeuristicKey::ColumnMajorBiggestTiebreak,
        HeuristicKey::RowMajor,
        HeuristicKey::ColumnMajor,
    ];
    for split_index in 0..SPLIT_STEPS {
        for ratio in 0..RATIO_VARIANTS {
            keys.push(HeuristicKey::Linear { split_index, ratio });
        }
    }
    keys
}

/// `split*i + (1-split)*j - ratio*n`, scaled and truncated to an `i64` so the
/// key is totally ordered. `split` and `ratio` are passed pre-resolved from
/// their indices.
fn linear_key(n: u32, point: PackedPoint, split: f64, ratio: f64) -> i64 {
    let (i, j) = (point.row() as f64, point.col() as f64);
    let value = split * i + (1.0 - split) * j - ratio * n as f64;
    (value * 1000.0) as i64
}

/// Builds one starting permutation by stable-sorting every interior point
/// according to `key`.
fn seed_one(sizes: &[(u32, PackedPoint)], key: HeuristicKey) -> Vec<u32> {
    let mut points: Vec<(u32, PackedPoint)> = sizes.to_vec();

    match key {
        HeuristicKey::BiggestFirstRowTiebreak => points.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1))),
        HeuristicKey::BiggestFirstColumnTiebreak => {
            points.sort_by(|a, b| b.0.cmp(&a.0).then((a.1.col(), a.1.row()).cmp(&(b.1.col(), b.1.row()))))
        }
        HeuristicKey::RowMajorBiggestTiebreak => points.sort_by(|a, b| a.1.row().cmp(&b.1.row()).then(b.0.cmp(&a.0)).then(a.1.col().cmp(&b.1.col()))),
        HeuristicKey::ColumnMajorBiggestTiebreak => points.sort_by(|a, b| a.1.col().cmp(&b.1.col()).then(b.0.cmp(&a.0)).then(a.1.row().cmp(&b.1.row()))),
        HeuristicKey::RowMajor => points.sort_by_key(|&(_, p)| p),
        HeuristicKey::ColumnMajor => points.sort_by_key(|&(_, p)| (p.col(), p.row())),
        HeuristicKey::Linear { split_index, ratio } => {
            const SPLIT_STEPS: u32 = 50;
            let split = split_index as f64 / (SPLIT_STEPS - 1) as f64;
            points.sort_by_key(|&(n, p)| linear_key(n, p, split, ratio as f64));
        }
    }

    points.into_iter().map(|(_, p)| p.0).collect()
}

/// Builds and scores the initial population: one row per heuristic, then the
/// heuristic list repeated (mod its length) to fill out the rest of
/// `pop_size` rows, plus `spawn_size` empty rows left for the first
/// generation's offspring.
pub fn seed_population(puzzle: &Puzzle, scratch: &mut Scratch, pop_size: usize, spawn_size: usize) -> Population {
    let sizes = calculate_max_sizes(puzzle);
    let heuristics = make_heuristic_list();
    let perm_len = sizes.len();

    let mut pop = Population::new(pop_size + spawn_size, perm_len);
    let seeds: Vec<Vec<u32>> = heuristics.iter().map(|&key| seed_one(&sizes, key)).collect();

    for row in 0..pop_size {
        let seed = &seeds[row % seeds.len()];
        pop.permutation_mut(row).copy_from_slice(seed);
    }
    score_population(puzzle, scratch, &mut pop, 0..pop_size);
    pop
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puzzle_of(rows: &[&[u8]]) -> Puzzle {
        let rows: Vec<Vec<u8>> = rows.iter().map(|r| r.to_vec()).collect();
        Puzzle::new(&rows).unwrap()
    }

    #[test]
    fn heuristic_list_has_256_entries() {
        assert_eq!(make_heuristic_list().len(), 256);
    }

    #[test]
    fn p8_heuristics_produce_multiple_distinct_seed_permutations() {
        let puzzle = puzzle_of(&[&[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1]]);
        let sizes = calculate_max_sizes(&puzzle);
        let heuristics = make_heuristic_list();
        let mut distinct = std::collections::HashSet::new();
        for key in heuristics {
            distinct.insert(seed_one(&sizes, key));
        }
        assert!(distinct.len() > 1, "heuristics collapsed onto a single ordering");
    }

    #[test]
    fn seed_population_fills_every_row_and_scores_the_active_range() {
        let puzzle = puzzle_of(&[&[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1]]);
        let mut scratch = Scratch::new(&puzzle);
        let pop = seed_population(&puzzle, &mut scratch, 10, 4);
        assert_eq!(pop.rows(), 14);
        for idx in 0..10 {
            assert!(pop.score(idx) > 0);
        }
    }

    #[test]
    fn max_sizes_cover_every_interior_cell_once() {
        let puzzle = puzzle_of(&[&[1, 1, 0], &[1, 1, 1]]);
        let sizes = calculate_max_sizes(&puzzle);
        assert_eq!(sizes.len(), 5);
    }
}
