use std::io;

use thiserror::Error;

/// Failures that skip an interface or a whole discovery run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no interface with an IPv6 address is available for discovery")]
    NoCandidateInterface,

    #[error("failed to open a capture handle on {interface}: {reason}")]
    CaptureOpen { interface: String, reason: String },

    #[error("interface {0} has no MAC address")]
    MissingMac(String),

    #[error("interface {0} has no IPv6 link-local address")]
    MissingLinkLocal(String),

    #[error("failed to read from the capture handle: {0}")]
    CaptureRead(String),

    #[error("failed to send a frame: {0}")]
    Send(String),

    #[error("a worker thread of {0} panicked during teardown")]
    WorkerPanicked(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
