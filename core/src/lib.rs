//! The capture and injection engine.
//!
//! One [`DiscoverySession`] drives a listener and an injector thread per
//! interface over a single shared capture handle.

pub mod cancel;
pub mod capture;
pub mod discovery;
pub mod injector;
pub mod listener;
pub mod session;
pub mod system;

pub use cancel::CancellationToken;
pub use capture::{CaptureBackend, CaptureStats, SharedCapture, Unblocker};
pub use session::{DiscoverySession, SessionResult};
pub use system::{SystemRepo, SystemRepository};
