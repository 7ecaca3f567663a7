pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod hosting;
pub mod logging;
pub mod manifest;
pub mod ui;

pub use error::{DepBumpError, Result};
