//! CLI command implementations.

pub mod combine;
pub mod status;
pub mod unlock;
