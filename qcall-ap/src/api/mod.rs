//! REST API for the announcement service

pub mod handlers;
pub mod server;

pub use server::{create_router, run, AppContext};
