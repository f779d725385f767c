//! Error taxonomy for planet builds
//!
//! Every failure surfaces to the immediate caller; nothing here aborts the
//! host process.

use thiserror::Error;

/// Errors produced by planet synthesis and the offload protocol.
#[derive(Debug, Error)]
pub enum PlanetError {
    /// Options rejected before any build work started.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Numeric failure detected at the build boundary (NaN/infinity in an
    /// output buffer). The whole build fails; no partial buffers escape.
    #[error("computation fault: {0}")]
    ComputationFault(String),

    /// The worker never answered, answered out of band, or the channel died.
    #[error("protocol fault: {0}")]
    ProtocolFault(String),
}
