//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - `locate` - Fetch a single fix
//! - `track` - Foreground or background tracking, optionally uploading
//! - `upload` - Send one location record to the collector
//! - `init` - Write a default config file
//! - `common` - Shared argument types and helpers

pub mod common;
pub mod init;
pub mod locate;
pub mod track;
pub mod upload;
