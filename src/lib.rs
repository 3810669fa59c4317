//! Fixed-outline floorplanning for hard rectangular macros.
//!
//! A placement is encoded as a sequence pair, decoded through a pair of
//! constraint graphs into compacted coordinates, scored by a weighted
//! blend of area and wirelength, and searched by simulated annealing
//! under a wall-clock budget.

pub mod anneal;
pub mod block;
pub mod cgraph;
pub mod config;
pub mod dimensions;
pub mod floorplan;
pub mod net;
pub mod parse;
pub mod point;
pub mod report;
pub mod seqpair;

pub use anneal::{Annealer, Solution};
pub use config::AnnealConfig;
pub use floorplan::Floorplan;
