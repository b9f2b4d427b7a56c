use crate::packing::grid::{Scratch, CELL_ANCHOR, CELL_EMPTY, CELL_FILLED};
use crate::packing::point::PackedPoint;
use crate::packing::population::Population;
use crate::packing::prelude::*;

/// One placed square in the puzzle's own coordinate system. The contest API
/// wants `X = col, Y = row` on the wire; that translation happens at
/// serialization, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Square {
    pub row: u32,
    pub col: u32,
    pub size: u32,
}

impl Scratch {
    /// Grows a square anchored at (row, col) as far as it will legally go,
    /// marking every covered cell `CELL_FILLED` along the way. Returns the
    /// final side length; a return of 1 means no square bigger than a single
    /// cell fit.
    pub(crate) fn grow_and_mark(&mut self, row: usize, col: usize) -> usize {
        let (height, width) = (self.height(), self.width());
        let mut n = 1usize;
        loop {
            if row + n >= height || col + n >= width {
                break;
            }
            let mut legal = true;
            for k in 0..=n {
                if self.get_unchecked(row + n, col + k) != CELL_EMPTY
                    || self.get_unchecked(row + k, col + n) != CELL_EMPTY
                {
                    legal = false;
                    break;
                }
            }
            if !legal {
                break;
            }
            for k in 0..=n {
                self.set_unchecked(row + n, col + k, CELL_FILLED);
                self.set_unchecked(row + k, col + n, CELL_FILLED);
            }
            n += 1;
        }
        n
    }
}

/// Counts how many squares the greedy expansion needs for `perm`, without
/// materializing the square list. This is the hot path driving every
/// generation's scoring pass.
pub fn score_solution(puzzle: &Puzzle, scratch: &mut Scratch, perm: &[u32]) -> u32 {
    scratch.reset_from(puzzle);

    let mut squares_used = 0u32;
    let mut tiles_used = 0u32;
    for &word in perm {
        let point = PackedPoint(word);
        let (row, col) = (point.row() as usize, point.col() as usize);
        if scratch.get_unchecked(row, col) != CELL_EMPTY {
            continue;
        }
        let n = scratch.grow_and_mark(row, col);
        if n >= 2 {
            scratch.set_unchecked(row, col, CELL_ANCHOR);
            squares_used += 1;
            tiles_used += (n * n) as u32;
        }
    }

    squares_used + (puzzle.sum - tiles_used)
}

/// Same traversal as `score_solution`, but records the actual squares drawn
/// instead of just counting them, and sweeps leftover 1×1 cells at the end.
pub fn expand_solution(puzzle: &Puzzle, perm: &[u32]) -> Vec<Square> {
    let mut scratch = Scratch::new(puzzle);
    scratch.reset_from(puzzle);

    let mut squares = Vec::new();
    for &word in perm {
        let point = PackedPoint(word);
        let (row, col) = (point.row() as usize, point.col() as usize);
        if scratch.get_unchecked(row, col) != CELL_EMPTY {
            continue;
        }
        let n = scratch.grow_and_mark(row, col);
        if n >= 2 {
            scratch.set_unchecked(row, col, CELL_ANCHOR);
            squares.push(Square { row: row as u32, col: col as u32, size: n as u32 });
        }
    }

    for row in 0..puzzle.height {
        for col in 0..puzzle.width {
            if scratch.get_unchecked(row, col) == CELL_EMPTY {
                squares.push(Square { row: row as u32, col: col as u32, size: 1 });
            }
        }
    }
    squares
}

/// Scores every population row in `range`, writing each result into word 0
/// of that row.
pub fn score_population(
    puzzle: &Puzzle,
    scratch: &mut Scratch,
    pop: &mut Population,
    range: std::ops::Range<usize>,
) {
    for idx in range {
        let score = score_solution(puzzle, scratch, pop.permutation(idx));
        pop.set_score(idx, score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puzzle_of(rows: &[&[u8]]) -> Puzzle {
        let rows: Vec<Vec<u8>> = rows.iter().map(|r| r.to_vec()).collect();
        Puzzle::new(&rows).unwrap()
    }

    #[test]
    fn s1_two_by_two_all_interior() {
        let puzzle = puzzle_of(&[&[1, 1], &[1, 1]]);
        let perm = vec![PackedPoint::pack(0, 0).0];
        let squares = expand_solution(&puzzle, &perm);
        assert_eq!(squares, vec![Square { row: 0, col: 0, size: 2 }]);

        let mut scratch = Scratch::new(&puzzle);
        assert_eq!(score_solution(&puzzle, &mut scratch, &perm), 1);
    }

    #[test]
    fn s2_three_by_three_checkerboard_has_no_valid_points() {
        let puzzle = puzzle_of(&[&[1, 0, 1], &[0, 1, 0], &[1, 0, 1]]);
        // No 2x2 all-interior block exists, so L = 0: an empty permutation.
        let perm: Vec<u32> = vec![];
        let squares = expand_solution(&puzzle, &perm);
        assert_eq!(squares.len(), 5);
        assert!(squares.iter().all(|s| s.size == 1));

        let mut scratch = Scratch::new(&puzzle);
        assert_eq!(score_solution(&puzzle, &mut scratch, &perm), 5);
    }

    #[test]
    fn s3_four_by_four_single_point_grows_full_square() {
        let puzzle = puzzle_of(&[&[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1]]);
        let perm = vec![PackedPoint::pack(0, 0).0];
        let mut scratch = Scratch::new(&puzzle);
        assert_eq!(score_solution(&puzzle, &mut scratch, &perm), 1);
        let squares = expand_solution(&puzzle, &perm);
        assert_eq!(squares, vec![Square { row: 0, col: 0, size: 4 }]);
    }

    #[test]
    fn s4_four_by_four_ordering_matters() {
        let puzzle = puzzle_of(&[&[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1]]);
        let perm = vec![PackedPoint::pack(1, 1).0, PackedPoint::pack(0, 0).0];
        let mut scratch = Scratch::new(&puzzle);
        assert_eq!(score_solution(&puzzle, &mut scratch, &perm), 8);
    }

    #[test]
    fn p1_expansion_covers_every_interior_cell_exactly_once() {
        let puzzle = puzzle_of(&[&[1, 1, 1], &[1, 1, 1], &[1, 1, 0]]);
        for perm in [
            vec![PackedPoint::pack(0, 0).0],
            vec![PackedPoint::pack(0, 1).0, PackedPoint::pack(0, 0).0],
        ] {
            let squares = expand_solution(&puzzle, &perm);
            let mut covered = vec![false; puzzle.height * puzzle.width];
            for sq in &squares {
                for dr in 0..sq.size {
                    for dc in 0..sq.size {
                        let idx = (sq.row + dr) as usize * puzzle.width + (sq.col + dc) as usize;
                        assert!(!covered[idx], "cell covered twice");
                        covered[idx] = true;
                    }
                }
            }
            for row in 0..puzzle.height {
                for col in 0..puzzle.width {
                    let interior = puzzle.cell(row, col).unwrap() == 1;
                    assert_eq!(covered[row * puzzle.width + col], interior);
                }
            }
        }
    }

    #[test]
    fn p2_score_matches_expansion_length() {
        let puzzle = puzzle_of(&[&[1, 1, 1], &[1, 1, 1], &[1, 1, 0]]);
        let perm = vec![PackedPoint::pack(0, 1).0, PackedPoint::pack(0, 0).0];
        let mut scratch = Scratch::new(&puzzle);
        let score = score_solution(&puzzle, &mut scratch, &perm);
        let expanded = expand_solution(&puzzle, &perm);
        assert_eq!(score as usize, expanded.len());
    }
}
