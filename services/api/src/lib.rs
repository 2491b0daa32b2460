//! services/api/src/lib.rs
//!
//! The thin external collaborator around `momentum_core`: a SQLite storage
//! adapter, configuration, and the HTTP surface.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
