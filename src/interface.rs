use pcap::Device;

use crate::error::DumpError;

/// Sentinel device name libpcap resolves to "all interfaces".
pub const ANY_INTERFACE: &str = "any";

/// The interface attributes relevant to default selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub up: bool,
    pub loopback: bool,
}

impl From<&Device> for InterfaceInfo {
    fn from(device: &Device) -> Self {
        Self {
            name: device.name.clone(),
            up: device.flags.is_up(),
            loopback: device.flags.is_loopback(),
        }
    }
}

/// Returns the first interface that is up and not a loopback, in list order.
pub fn select_default(interfaces: &[InterfaceInfo]) -> Option<&str> {
    interfaces
        .iter()
        .find(|iface| iface.up && !iface.loopback)
        .map(|iface| iface.name.as_str())
}

pub fn get_available_devices() -> Result<Vec<Device>, DumpError> {
    Device::list().map_err(DumpError::Devices)
}

/// Picks the interface to listen on when none was given, falling back to `any`.
pub fn default_interface() -> String {
    let interfaces: Vec<InterfaceInfo> = match get_available_devices() {
        Ok(devices) => devices.iter().map(InterfaceInfo::from).collect(),
        Err(e) => {
            tracing::debug!("{}", e);
            Vec::new()
        }
    };

    select_default(&interfaces)
        .unwrap_or(ANY_INTERFACE)
        .to_string()
}
