// src/lib.rs
// ────────────────────────────────────────────────────────────────────────────
// Public library entry point.  Re-export everything for both `main.rs` and
// integration tests.

#[macro_use]
pub mod macros;

pub mod comms;
pub mod config;
pub mod db;
pub mod mission;
pub mod schema;
pub mod sql;
