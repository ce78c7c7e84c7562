//! Report output backends

pub mod json;
pub mod text;
