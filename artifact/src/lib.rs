//! staged output files, written all together or not at all

mod build;
mod common;

pub use build::{stamp_matches, up_to_date, Builder};
pub use common::{ArtifactError, ArtifactResult};
