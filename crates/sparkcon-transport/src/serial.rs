use std::io::{Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Baud rate used by Spark firmware.
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Serial line settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed. Default: 57600.
    pub baud_rate: u32,
    /// Read timeout for blocking reads. A timed-out read is not an error for
    /// the layers above, it just yields no bytes.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(100),
        }
    }
}

/// Serial port transport.
///
/// Opened 8N1 without flow control, matching the controller firmware.
pub struct SerialStream {
    port: Box<dyn SerialPort>,
    device: String,
}

impl SerialStream {
    /// Open a serial device with default settings.
    pub fn open(device: &str) -> Result<Self> {
        Self::open_with_config(device, &SerialConfig::default())
    }

    /// Open a serial device with explicit settings.
    pub fn open_with_config(device: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(device, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.timeout)
            .open()
            .map_err(|source| TransportError::Open {
                device: device.to_string(),
                source,
            })?;

        info!(device, baud_rate = config.baud_rate, "opened serial port");

        Ok(Self {
            port,
            device: device.to_string(),
        })
    }

    /// The device path this stream was opened on.
    pub fn device(&self) -> &str {
        &self.device
    }
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl Transport for SerialStream {
    fn set_request_to_send(&mut self, level: bool) -> Result<()> {
        debug!(device = %self.device, level, "setting RTS");
        self.port
            .write_request_to_send(level)
            .map_err(TransportError::Control)
    }

    fn try_clone_transport(&self) -> Result<Self> {
        let port = self.port.try_clone().map_err(TransportError::Control)?;
        Ok(Self {
            port,
            device: self.device.clone(),
        })
    }

    fn transport_name(&self) -> &str {
        "serial"
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("device", &self.device)
            .finish()
    }
}
