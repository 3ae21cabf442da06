//! The features of the service, each with its API, service and storage.

pub mod health;
pub mod item;
