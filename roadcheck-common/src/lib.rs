//! Common utilities for the roadcheck toolkit

pub mod error;

pub use error::{Error, Result};
