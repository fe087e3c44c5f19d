#![forbid(unsafe_code)]

//! Library surface for the channel-export tools.
//!
//! Binaries share the config loader, the API clients, and the pipeline
//! through this crate; everything network-facing sits behind the
//! [`youtube::VideoPlatform`] and [`transcript::TranscriptProvider`] traits
//! so tests can substitute fixtures.

pub mod aggregate;
pub mod config;
pub mod export;
pub mod input;
pub mod pipeline;
pub mod record;
pub mod transcript;
pub mod youtube;
