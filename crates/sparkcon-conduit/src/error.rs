/// Errors that can occur in conduit operations.
#[derive(Debug, thiserror::Error)]
pub enum ConduitError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] sparkcon_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] sparkcon_frame::FrameError),

    /// A read was requested while no transport is bound.
    #[error("conduit is not bound to a transport")]
    NotBound,
}

impl ConduitError {
    /// True when the bound link reported end of stream.
    pub fn is_connection_closed(&self) -> bool {
        matches!(
            self,
            ConduitError::Frame(sparkcon_frame::FrameError::ConnectionClosed)
        )
    }
}

pub type Result<T> = std::result::Result<T, ConduitError>;
