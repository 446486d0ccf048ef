//! Orchestration layer for the Rahat Coding Wala studio panels
//!
//! Turns chat messages, camera frames, picked files and microphone transcripts
//! into Gemini calls (chat, image, hairstyle edits, Veo video, maps-grounded
//! search, business naming), then normalizes and classifies what comes back.

pub mod ai;
pub mod app;
pub mod capture;
pub mod error;
pub mod models;
pub mod prompts;

pub use error::{Error, Result};
