//! Health probes for orchestrators and load balancers.

pub mod health_api;
