//! Infrastructure layer for chatrelay.
//!
//! Concrete pieces behind the abstractions in `chatrelay-core`: an in-memory
//! chat backend, the TOML config loader and a filesystem upload helper.

pub mod backend;
pub mod config;
pub mod upload;
