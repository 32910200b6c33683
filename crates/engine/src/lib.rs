//! Chatbridge engine library.
//!
//! Answers game chat: commands directly, free text through a language model
//! reached over an OpenAI-compatible API (or an in-process fallback).
//!
//! ## Structure
//!
//! - `use_cases/` - Chat orchestration (conversation, session, prompt)
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
