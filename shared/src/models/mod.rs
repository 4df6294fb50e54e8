//! Domain models for the inventory forecast platform

mod policy;
mod product;
mod projection;
pub mod wire;

pub use policy::*;
pub use product::*;
pub use projection::*;
