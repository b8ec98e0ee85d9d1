//! turns a Tiled map into a deduplicated tile atlas, a palette and a map header

mod config;
pub mod emit;
mod error;
mod locate;
mod pipeline;
pub mod tiled;

pub use config::{load_platform, Args, Config, DEFAULT_AUTHOR, DEFAULT_HEADER_LINE, DEFAULT_MAIL};
pub use error::{TileMinError, TileMinResult};
pub use locate::{locate, resolve, MapLocation};
pub use pipeline::{is_fresh, load_project, process, run, stage, Output, Project, RunStatus};
