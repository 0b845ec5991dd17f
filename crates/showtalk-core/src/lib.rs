//! Shared types, configuration, and errors for the showtalk workspace.

pub mod config;
pub mod error;
pub mod types;

pub use config::ShowtalkConfig;
pub use error::{Result, ShowtalkError};
pub use types::*;
