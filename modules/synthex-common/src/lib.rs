pub mod config;
pub mod types;

pub use config::{Config, PollSettings};
pub use types::*;
