pub mod aligners;
pub mod alignment;
pub(crate) mod cell;
pub(crate) mod dump;
pub mod error;
pub(crate) mod matrix;
pub mod scoring;
pub(crate) mod traceback;

pub use aligners::{AlignOptions, AlignOptionsBuilder, LocalAligner};
pub use bio::alignment::pairwise::{MatchFunc, MatchParams};
pub use alignment::{AlignmentStats, Anchors, Peak};
pub use error::AlignError;
pub use scoring::Scoring;
