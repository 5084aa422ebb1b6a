//! `msa-gateway` — edge gateway: authenticates every request, then forwards
//! it to the owning service.

pub mod app;
pub mod config;
pub mod context;
pub mod errors;
pub mod middleware;
pub mod proxy;
pub mod request_path;
