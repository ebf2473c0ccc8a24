// src/storage/mod.rs
//! Directory (user pool) backends.

pub mod cognito_client;
pub mod directory;
pub mod memory_directory;
