//! Use cases - User story orchestration.
//!
//! Use cases orchestrate infrastructure ports to fulfill user stories.

pub mod chat;
