//! Pictura: image posts and likes over a Postgres ledger, a blob store and a
//! read-through listing cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
