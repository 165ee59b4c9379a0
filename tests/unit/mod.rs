//! Unit tests module organization

pub mod config;
pub mod cube;
pub mod middleware;
