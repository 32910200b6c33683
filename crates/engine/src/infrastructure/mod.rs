//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod backend_state;
pub mod completion;
pub mod console;
pub mod in_process;
pub mod ports;
pub mod probe;
pub mod random;
pub mod remote_http;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;
