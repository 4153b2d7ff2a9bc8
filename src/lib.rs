//! Client-side engine for a podcast generation backend.
//!
//! The crate keeps a local working copy of one podcast draft — metadata,
//! context, participants and transcript — tracks which parts diverge from
//! the backend of record, and reconciles them in coordinated batches
//! ([`draft`]). Once a draft is complete, [`generation`] starts the audio
//! job and follows it over a reconnecting progress channel.

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod generation;
pub mod ui;
pub mod wizard;

pub use config::PodforgeConfig;
pub use error::PodforgeError;
