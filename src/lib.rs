pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod report;
pub mod scanner;
pub mod simulator;

pub use client::InferenceClient;
pub use config::Config;
pub use error::{InspectError, Result};
