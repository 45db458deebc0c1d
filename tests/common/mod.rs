//! Common test utilities for all integration tests.
//!
//! Provides a throwaway registry layout (identity document plus SQLite data
//! source) and helpers to build providers and contexts on top of it.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

pub mod test_db;
