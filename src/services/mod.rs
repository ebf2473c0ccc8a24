// src/services/mod.rs
//! Token workflow stages and the HTTP surface built on them.

pub mod api_server;
pub mod directory_reconciler;
pub mod token_issuer;
pub mod token_service;
pub mod verification_client;
