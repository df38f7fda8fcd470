//! Helpers shared by the integration test binaries.

#![allow(dead_code)]

pub mod project_zip;

#[path = "../../src/test_support/socket_guard.rs"]
pub mod socket_guard;
