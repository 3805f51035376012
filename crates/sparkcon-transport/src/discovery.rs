//! Serial port enumeration and Spark device matching.

use serialport::{SerialPortInfo, SerialPortType};
use tracing::debug;

use crate::error::{Result, TransportError};

/// USB vendor/product ids of supported controllers.
pub const KNOWN_HWIDS: &[(u16, u16)] = &[
    // Particle Photon
    (0x2B04, 0xC006),
    // Particle P1
    (0x2B04, 0xC008),
];

/// Description of one serial port visible to the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path (e.g. `/dev/ttyACM0`, `COM3`).
    pub device: String,
    /// Human-readable description, when the OS reports one.
    pub description: Option<String>,
    /// USB vendor id, for USB ports.
    pub vid: Option<u16>,
    /// USB product id, for USB ports.
    pub pid: Option<u16>,
    /// USB serial number, for USB ports.
    pub serial_number: Option<String>,
}

impl PortInfo {
    /// Hardware id string in the conventional `USB VID:PID=xxxx:xxxx` form.
    pub fn hwid(&self) -> String {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => match &self.serial_number {
                Some(serial) => format!("USB VID:PID={vid:04X}:{pid:04X} SER={serial}"),
                None => format!("USB VID:PID={vid:04X}:{pid:04X}"),
            },
            _ => "n/a".to_string(),
        }
    }

    /// Whether the port belongs to a known controller.
    pub fn is_recognized(&self) -> bool {
        match (self.vid, self.pid) {
            (Some(vid), Some(pid)) => KNOWN_HWIDS.contains(&(vid, pid)),
            _ => false,
        }
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                device: info.port_name,
                description: usb.product.or(usb.manufacturer),
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                serial_number: usb.serial_number,
            },
            SerialPortType::PciPort => Self::plain(info.port_name, "PCI"),
            SerialPortType::BluetoothPort => Self::plain(info.port_name, "Bluetooth"),
            SerialPortType::Unknown => Self {
                device: info.port_name,
                description: None,
                vid: None,
                pid: None,
                serial_number: None,
            },
        }
    }
}

impl PortInfo {
    fn plain(device: String, description: &str) -> Self {
        Self {
            device,
            description: Some(description.to_string()),
            vid: None,
            pid: None,
            serial_number: None,
        }
    }
}

/// Enumerate every serial port visible to the OS.
pub fn list_all_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    Ok(ports.into_iter().map(PortInfo::from).collect())
}

/// Enumerate serial ports that belong to a known controller.
pub fn list_recognized_ports() -> Result<Vec<PortInfo>> {
    Ok(list_all_ports()?
        .into_iter()
        .filter(PortInfo::is_recognized)
        .collect())
}

/// Resolve the device path to connect to.
///
/// An explicit device is returned unchanged without touching the OS.
/// Otherwise recognized ports are enumerated and filtered by serial number.
pub fn detect_device(explicit: Option<&str>, serial_number: Option<&str>) -> Result<String> {
    if let Some(device) = explicit {
        return Ok(device.to_string());
    }
    let ports = list_recognized_ports()?;
    select_device(&ports, None, serial_number)
}

/// Pick a device path out of an already-enumerated set of recognized ports.
pub fn select_device(
    ports: &[PortInfo],
    explicit: Option<&str>,
    serial_number: Option<&str>,
) -> Result<String> {
    if let Some(device) = explicit {
        return Ok(device.to_string());
    }

    let selected = ports.iter().find(|port| match serial_number {
        Some(serial) => port.serial_number.as_deref() == Some(serial),
        None => true,
    });

    match selected {
        Some(port) => {
            debug!(device = %port.device, hwid = %port.hwid(), "detected device");
            Ok(port.device.clone())
        }
        None => Err(TransportError::NoDeviceFound {
            serial_number: serial_number.map(str::to_string),
        }),
    }
}
