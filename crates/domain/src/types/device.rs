//! Device, service and application-type payloads

use serde::{Deserialize, Serialize};

use crate::constants::{BULK_SERVICE_ID, MULTI_PORT_SERVICE_ID};

/// Device entry from the account device list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "deviceaddress", default)]
    pub device_address: String,
    #[serde(rename = "devicetype", default)]
    pub device_type: String,
    #[serde(rename = "devicealias", default)]
    pub device_alias: String,
    #[serde(rename = "ownerusername", default)]
    pub owner_username: String,
    #[serde(default)]
    pub scripting: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Device name lookup result (GraphQL).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedDevice {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub services: Vec<DefinedService>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedService {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Entry in the application-type catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationType {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub port: i32,
    #[serde(default)]
    pub proxy: bool,
    #[serde(default)]
    pub protocol: String,
}

/// Transport protocol encoded in a service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceProtocol {
    Tcp,
    Udp,
}

impl ServiceProtocol {
    pub fn from_service_type(service_type: i32) -> Self {
        if service_type & 0x8000 != 0 {
            Self::Udp
        } else {
            Self::Tcp
        }
    }
}

/// Input for full service registration.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistrationInfo {
    pub name: String,
    /// Hex service type string sent as `devicetype`.
    pub service_type: String,
    pub service_type_id: i32,
    /// Defaults to the generated UID when empty.
    pub hardware_id: Option<String>,
}

/// A registered service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub uid: String,
    pub secret: String,
    #[serde(rename = "hardwareid")]
    pub hardware_id: String,
    #[serde(rename = "type")]
    pub service_type: i32,
    pub overload: i32,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub disabled: bool,
}

impl Service {
    pub fn is_multi_port(&self) -> bool {
        self.service_type == MULTI_PORT_SERVICE_ID || self.overload == MULTI_PORT_SERVICE_ID
    }

    pub fn protocol(&self) -> ServiceProtocol {
        ServiceProtocol::from_service_type(self.service_type)
    }

    /// Overload value for a service type: bulk services register as multi-port.
    pub fn overload_for(service_type_id: i32) -> i32 {
        if service_type_id == BULK_SERVICE_ID {
            MULTI_PORT_SERVICE_ID
        } else {
            0
        }
    }
}

/// Credentials issued by bulk registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCredentials {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub secret: String,
}

/// Service settings resolved from a bulk registration template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub service_type: i32,
    pub disabled: bool,
}

/// Hardware description reported during bulk registration.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub registration_key: String,
    pub hardware_id: String,
    pub cpu_id: String,
    pub mac_address: String,
    pub version: String,
    pub os_label: String,
}
