use sparkcon_frame::FramerConfig;
use sparkcon_transport::SerialConfig;

/// Settings for a [`Conduit`](crate::Conduit).
#[derive(Debug, Clone, Default)]
pub struct ConduitConfig {
    /// Serial line settings used by [`Conduit::bind`](crate::Conduit::bind).
    pub serial: SerialConfig,
    /// Framer settings for received bytes.
    pub framer: FramerConfig,
}
