//! Common test utilities for fosgraph integration tests
//!
//! Exporter-format row fixtures and a small builder for graphs assembled
//! record by record.

#![allow(dead_code)]

pub mod fixtures;
pub mod graph_builder;

pub use fixtures::{EDGE_ROWS, FULL_NAME_ROWS, NODE_ROWS};
pub use graph_builder::{ingest_fixture, GraphBuilder};
