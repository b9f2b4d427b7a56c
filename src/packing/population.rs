use crate::packing::point::{PackedPoint, Prng};
use crate::packing::prelude::*;

/// The population matrix: `rows` records of `perm_len + 1` words each, laid
/// out flat. Word 0 of a row is its cached score (smaller is better); the
/// remaining words are the permutation of packed points.
#[derive(Clone, Debug)]
pub struct Population {
    data: Vec<u32>,
    row_width: usize,
    rows: usize,
}

impl Population {
    /// Allocates a zeroed population of `rows` rows for permutations of
    /// length `perm_len`. Callers seed and score it before use.
    pub fn new(rows: usize, perm_len: usize) -> Population {
        Population { data: vec![0u32; rows * (perm_len + 1)], row_width: perm_len + 1, rows }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn perm_len(&self) -> usize {
        self.row_width - 1
    }

    pub fn score(&self, idx: usize) -> u32 {
        self.data[idx * self.row_width]
    }

    pub fn set_score(&mut self, idx: usize, score: u32) {
        self.data[idx * self.row_width] = score;
    }

    pub fn permutation(&self, idx: usize) -> &[u32] {
        let start = idx * self.row_width + 1;
        &self.data[start..start + self.perm_len()]
    }

    pub fn permutation_mut(&mut self, idx: usize) -> &mut [u32] {
        let len = self.perm_len();
        let start = idx * self.row_width + 1;
        &mut self.data[start..start + len]
    }

    /// Swaps two entire rows (score word included), engine use only.
    pub(crate) fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let w = self.row_width;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.data.split_at_mut(hi * w);
        left[lo * w..lo * w + w].swap_with_slice(&mut right[0..w]);
    }

    /// Index of the row with the smallest score.
    pub fn best_row(&self) -> usize {
        (0..self.rows).min_by_key(|&idx| self.score(idx)).expect("population is never empty")
    }
}

/// The quickselect partition from quicksort, swapping whole rows. Partitions
/// `[first, last]` by score around a pivot taken from the midpoint; returns
/// the final pivot index.
pub fn partition_population(pop: &mut Population, first: usize, last: usize) -> usize {
    let pivot_idx = (last - first) / 2 + first;
    let pivot = pop.score(pivot_idx);
    pop.swap_rows(pivot_idx, first);

    let mut low: isize = first as isize + 1;
    let mut high: isize = last as isize;
    loop {
        while low <= high && pop.score(low as usize) <= pivot {
            low += 1;
        }
        while high >= low && pop.score(high as usize) >= pivot {
            high -= 1;
        }
        if high < low {
            break;
        }
        pop.swap_rows(low as usize, high as usize);
    }
    pop.swap_rows(first, high as usize);
    high as usize
}

/// Repeatedly partitions until every row in `[0, k)` scores no worse than
/// every row in `[k, end)`. Does not otherwise order either side.
pub fn divide_population(pop: &mut Population, k: usize) {
    let mut first = 0usize;
    let mut last = pop.rows() - 1;
    let mut split = 0usize;
    while first < last && split != k {
        split = partition_population(pop, first, last);
        if split > k {
            last = split - 1;
        } else if split < k {
            first = split + 1;
        }
    }
}

/// Diverts an emitted point to the extremes of `dst` when its output
/// position matches one of the two chosen shift indexes; otherwise writes it
/// to the next normal slot. Shared by `copy_and_mutate` and
/// `crossover_and_mutate` so the single-pass mutation logic lives in one
/// place.
#[inline]
fn divert_emit(point: u32, dst: &mut [u32], out_idx: &mut u32, shift_fwd_idx: &mut u32, shift_back_idx: &mut u32) {
    let last = (dst.len() - 1) as u32;
    if *out_idx == *shift_fwd_idx {
        dst[0] = point;
        *shift_fwd_idx = 0;
    } else if *out_idx == *shift_back_idx {
        dst[last as usize] = point;
        *shift_back_idx = 0;
    } else {
        dst[*out_idx as usize] = point;
        *out_idx += 1;
    }
}

/// Copies `src` into `dst`, diverting one random element to the front and
/// another to the back - a cheap large-jump mutation that avoids shifting
/// the whole array.
pub fn copy_and_mutate(src: &[u32], dst: &mut [u32], prng: &mut Prng) {
    debug_assert_eq!(src.len(), dst.len());
    let size = dst.len() as u32;
    let mut shift_fwd_idx = prng.gen_below(size - 1) + 1;
    let mut shift_back_idx = prng.gen_below(size - 1) + 1;
    let mut out_idx = 1u32;

    for &point in src {
        divert_emit(point, dst, &mut out_idx, &mut shift_fwd_idx, &mut shift_back_idx);
    }
}

/// Splits the grid with a random oriented line in integer arithmetic, takes
/// the points of `parent_a` on one side and `parent_b` on the other (in
/// their respective orders), and applies the same divert mutation as
/// `copy_and_mutate` while emitting.
pub fn crossover_and_mutate(
    parent_a: &[u32],
    parent_b: &[u32],
    dst: &mut [u32],
    prng: &mut Prng,
    height: u32,
    width: u32,
) {
    const LARGE: u32 = 10_000;
    let split = prng.gen_below(LARGE);
    let p = prng.gen_below(LARGE);
    let i_mult = p / height;
    let j_mult = (LARGE - p) / width;

    let size = dst.len() as u32;
    let mut shift_fwd_idx = prng.gen_below(size - 1) + 1;
    let mut shift_back_idx = prng.gen_below(size - 1) + 1;
    let mut out_idx = 1u32;

    for &word in parent_a {
        let point = PackedPoint(word);
        if i_mult * point.row() + j_mult * point.col() <= split {
            divert_emit(word, dst, &mut out_idx, &mut shift_fwd_idx, &mut shift_back_idx);
        }
    }
    for &word in parent_b {
        let point = PackedPoint(word);
        if i_mult * point.row() + j_mult * point.col() > split {
            divert_emit(word, dst, &mut out_idx, &mut shift_fwd_idx, &mut shift_back_idx);
        }
    }
}

/// Fills the spawn region `[pop_size, pop.rows())` with offspring: half by
/// crossover of two random survivors, half by mutated copies of one.
/// `buf_a`/`buf_b` are scratch buffers owned by the caller and reused across
/// generations to avoid allocating in the hot loop.
pub fn spawn_generation(
    pop: &mut Population,
    pop_size: usize,
    prng: &mut Prng,
    height: u32,
    width: u32,
    buf_a: &mut Vec<u32>,
    buf_b: &mut Vec<u32>,
) {
    for r in pop_size..pop.rows() {
        let a = prng.gen_below(pop_size as u32) as usize;
        if r % 2 == 0 {
            let b = prng.gen_below(pop_size as u32) as usize;
            buf_a.clear();
            buf_a.extend_from_slice(pop.permutation(a));
            buf_b.clear();
            buf_b.extend_from_slice(pop.permutation(b));
            crossover_and_mutate(buf_a, buf_b, pop.permutation_mut(r), prng, height, width);
        } else {
            buf_a.clear();
            buf_a.extend_from_slice(pop.permutation(a));
            copy_and_mutate(buf_a, pop.permutation_mut(r), prng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn multiset(values: &[u32]) -> HashMap<u32, u32> {
        let mut m = HashMap::new();
        for &v in values {
            *m.entry(v).or_insert(0) += 1;
        }
        m
    }

    #[test]
    fn p4_divide_population_splits_by_score() {
        let mut pop = Population::new(8, 3);
        let mut prng = Prng::from_seed([9, 9, 9, 9]);
        for idx in 0..pop.rows() {
            pop.set_score(idx, prng.gen_below(1000));
            for w in pop.permutation_mut(idx) {
                *w = prng.next_u32();
            }
        }
        divide_population(&mut pop, 3);
        let lo_max = (0..3).map(|i| pop.score(i)).max().unwrap();
        let hi_min = (3..8).map(|i| pop.score(i)).min().unwrap();
        assert!(lo_max <= hi_min);
    }

    #[test]
    fn p5_copy_and_mutate_preserves_multiset() {
        let src: Vec<u32> = (0..10).collect();
        let mut dst = vec![0u32; 10];
        let mut prng = Prng::from_seed([3, 5, 7, 11]);
        copy_and_mutate(&src, &mut dst, &mut prng);
        assert_eq!(multiset(&src), multiset(&dst));
    }

    #[test]
    fn p5_crossover_and_mutate_preserves_multiset() {
        let parent_a: Vec<u32> = (0..12).map(|i| PackedPoint::pack(i / 4, i % 4).0).collect();
        let parent_b: Vec<u32> = {
            let mut v = parent_a.clone();
            v.reverse();
            v
        };
        let mut dst = vec![0u32; 12];
        let mut prng = Prng::from_seed([21, 22, 23, 24]);
        crossover_and_mutate(&parent_a, &parent_b, &mut dst, &mut prng, 3, 4);
        assert_eq!(multiset(&parent_a), multiset(&dst));
    }

    proptest! {
        #[test]
        fn p5_copy_and_mutate_preserves_multiset_for_arbitrary_inputs(
            src in proptest::collection::vec(any::<u32>(), 2..64),
            seed in any::<[u32; 4]>().prop_filter("xorshift seed must be nonzero", |s| *s != [0, 0, 0, 0]),
        ) {
            let mut dst = vec![0u32; src.len()];
            let mut prng = Prng::from_seed(seed);
            copy_and_mutate(&src, &mut dst, &mut prng);
            prop_assert_eq!(multiset(&src), multiset(&dst));
        }
    }
}
