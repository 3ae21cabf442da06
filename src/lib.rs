//! An in-memory item store served over a JSON REST API.

pub mod app;
pub mod feature;
pub mod infra;
