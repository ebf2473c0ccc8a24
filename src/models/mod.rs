// src/models/mod.rs
//! Request-scoped data structures.

pub mod cpf;
pub mod profile;
pub mod trigger;
