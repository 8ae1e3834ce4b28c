pub use crate::errors::{HarnessError, RunError};

pub mod cli;
pub mod compare;
pub mod config;
pub mod diff;
pub mod discovery;
pub mod errors;
pub mod locate;
pub mod logging;
pub mod test_harness;
