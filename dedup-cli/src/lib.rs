//! Configuration console for a record deduplication backend
//!
//! - [`api`]: HTTP client and wire types for the backend
//! - [`session`]: file configurations, column mappings, processing modes and
//!   the [`session::Console`] driving them
//! - [`config`]: configuration file and environment overrides
//! - [`cli`]: command-line front end

pub mod api;
pub mod cli;
pub mod config;
pub mod session;
