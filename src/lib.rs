//! Client for a short-term rental marketplace API.
//!
//! Landlords ("locadores") publish listings and decide on reservation
//! requests; renters ("locatários") search, book and review. Everything the
//! marketplace knows lives behind its HTTP API; this crate holds re-fetchable
//! copies, the reservation lifecycle rules, and the two role dashboards.

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod session;
pub mod validation;
pub mod views;

pub use error::{Error, Result};
