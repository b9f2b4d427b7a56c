/*
 *  The square-packing solver engine: point/PRNG representation, the scratch
 *  grid used to simulate drawing squares, the greedy scorer, the initial
 *  population heuristics, and the generational population operators.
 */

pub(crate) mod grid;
pub(crate) mod initializer;
pub(crate) mod point;
pub(crate) mod population;
pub(crate) mod scorer;

pub mod prelude {
    pub(crate) use crate::utils::prelude::*;

    pub use super::{
        grid::{Puzzle, Scratch, CELL_ANCHOR, CELL_EMPTY, CELL_FILLED, CELL_OUTSIDE},
        initializer::{calculate_max_sizes, make_heuristic_list, seed_population, HeuristicKey},
        point::{PackedPoint, Prng},
        population::{divide_population, partition_population, spawn_generation, Population},
        scorer::{expand_solution, score_population, score_solution, Square},
    };
}
