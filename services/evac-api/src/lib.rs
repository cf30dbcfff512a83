//! Evacuation planning service.
//!
//! Ships the `evac-api` binary. The library surface exists so integration
//! tests can build the router over any storage backend.

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
pub mod state;
