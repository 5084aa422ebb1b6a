//! `msa-member` — member service shell with its own bearer-token check.

pub mod app;
pub mod config;
pub mod security;
