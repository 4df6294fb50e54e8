//! Shared types and forecasting logic for the inventory forecast platform
//!
//! This crate holds everything that has no I/O: the product snapshot model,
//! the projection engine and input validation. It is used by the backend and,
//! via WASM, by the browser-side simulator.

pub mod forecast;
pub mod models;
pub mod types;
pub mod validation;

pub use forecast::*;
pub use models::*;
pub use types::*;
pub use validation::*;
