//! The stable-fluids solver: field storage, boundary rules, the three
//! solver stages and the per-step orchestrator.

pub mod boundary;
pub mod config;
pub mod grid;
pub mod navier;
pub mod numeric;
pub mod poisson;
pub mod source;
pub mod task;
pub mod transport;
