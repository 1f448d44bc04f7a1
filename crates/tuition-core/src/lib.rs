//! Vacancy application lifecycle, vacancy catalog, and parent request workflows for a
//! tutoring marketplace, plus the HTTP routers and in-memory gateway that serve them.

pub mod config;
pub mod error;
pub mod identity;
pub mod notifications;
pub mod store;
pub mod telemetry;
pub mod workflows;
