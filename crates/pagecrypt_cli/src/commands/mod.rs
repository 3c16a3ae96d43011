//! CLI command implementations.

pub mod crypto;
pub mod info;
pub mod selftest;
pub mod vectors;
