#![allow(dead_code)]

pub mod api;
pub mod cli;
pub mod cluster;
pub mod packing;
pub mod solver;

pub mod utils {
    pub mod prelude {
        pub use anyhow::{anyhow, Context, Error};
        pub type Result<T> = anyhow::Result<T, Error>;

        pub use std::{
            collections::{HashMap, HashSet},
            sync::{Arc, Mutex},
            time::{Duration, Instant},
        };
    }
}

pub mod prelude {
    pub use super::api::*;
    pub use super::cli::*;
    pub use super::cluster::*;
    pub use super::packing::prelude::*;
    pub use super::solver::*;
    pub use super::utils::prelude::*;
}
