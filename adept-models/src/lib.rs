//! Text generation for adept.
//!
//! This crate provides:
//! - A provider trait for chat-completion backends
//! - An OpenAI-compatible provider (also usable against local servers that
//!   expose the same API)
//! - Credential management for API keys
//! - The [`TextGenerator`] seam the interview engine depends on
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │       TextGenerator (prompt -> text)        │
//! │  ┌───────────────────────────────────────┐  │
//! │  │   ChatGenerator<P: ModelProvider>     │  │
//! │  │     model, temperature, max tokens    │  │
//! │  └───────────────────────────────────────┘  │
//! └─────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────┐
//! │        OpenAiProvider  ──▶  ApiKey          │
//! │            (CredentialStore: keyring + env) │
//! └─────────────────────────────────────────────┘
//! ```

mod error;
mod generator;

pub mod auth;
pub mod providers;

pub use error::{Error, Result};
pub use generator::{ChatGenerator, Generation, GeneratorConfig, TextGenerator};
