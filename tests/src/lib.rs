//! Cross-crate tests that drive the engine against in-memory capture backends.

pub mod fakes;
pub mod logs;
pub mod util;

#[cfg(test)]
mod discovery;
