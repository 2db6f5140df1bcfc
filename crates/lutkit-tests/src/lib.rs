//! Integration tests for lutkit crates.
//!
//! End-to-end exports through the real backends, checked on disk.
