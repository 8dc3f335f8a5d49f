//! # QCALL Common Library
//!
//! Shared code for the QCALL announcement services:
//! - Bootstrap configuration (TOML file + built-in defaults)
//! - HTTP request/response types
//! - Common error type
//! - Timestamp helpers

pub mod api;
pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
