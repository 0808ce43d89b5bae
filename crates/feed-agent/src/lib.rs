//! Livefeed agent: configuration, loop wiring and the HTTP API

pub mod api;
pub mod config;
pub mod pipeline;
