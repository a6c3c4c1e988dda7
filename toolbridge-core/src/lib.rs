//! Core types for toolbridge
//!
//! This crate provides the configuration, logging setup, error types and
//! the in-memory conversation session store shared by both tool sets.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod utils;

pub use error::{Error, Result};
