//! services/api/src/lib.rs
//!
//! The HTTP service around `recipe_feed_core`: configuration, the PostgreSQL
//! adapter, and the axum web layer. The binaries in `src/bin` wire these up.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
