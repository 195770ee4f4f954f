//! Subpipe - Video to Multilingual Subtitle Pipeline
//!
//! Downloads a video, extracts its audio, recognizes speech with whisper and
//! writes SRT captions in the spoken language, in English, and in any number
//! of languages translated from the English captions.

pub mod artifacts;
pub mod cli;
pub mod command;
pub mod config;
pub mod download;
pub mod error;
pub mod language;
pub mod media;
pub mod progress;
pub mod segment;
pub mod stage;
pub mod subtitle;
pub mod transcribe;
pub mod translate;
pub mod workflow;
