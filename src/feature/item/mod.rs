//! Items: a named, described record kept in memory.

pub mod item_api;
pub mod item_repository;
pub mod item_service;
pub mod item_validation;
