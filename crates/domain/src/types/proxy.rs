//! Proxy connection payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateProxyRequest {
    #[serde(rename = "deviceaddress", skip_serializing_if = "String::is_empty")]
    pub device_address: String,
    #[serde(rename = "devicetype", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<i32>,
    #[serde(rename = "hostip", skip_serializing_if = "String::is_empty")]
    pub host_ip: String,
    /// `"true"` asks the service to hold the reply until the connection is up.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub wait: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub isolate: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub concurrent: bool,
    #[serde(rename = "proxyType", skip_serializing_if = "String::is_empty")]
    pub proxy_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConnectionInfo {
    #[serde(rename = "connectionid", default)]
    pub connection_id: String,
    #[serde(rename = "sessionID", default)]
    pub session_id: String,
    #[serde(rename = "initiatorUID", default)]
    pub initiator_uid: String,
    #[serde(rename = "targetUID", default)]
    pub target_uid: String,
    #[serde(rename = "proxyserver", default)]
    pub proxy_server: String,
    #[serde(rename = "proxyport", default)]
    pub proxy_port: String,
    #[serde(default)]
    pub proxy: String,
    #[serde(rename = "proxyServerPort", default)]
    pub proxy_server_port: u16,
    #[serde(rename = "proxyURL", default)]
    pub proxy_url: String,
    #[serde(rename = "reverseProxy", default)]
    pub reverse_proxy: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateProxyResponse {
    #[serde(default)]
    pub connection: ProxyConnectionInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteProxyRequest {
    #[serde(rename = "deviceaddress", skip_serializing_if = "String::is_empty")]
    pub device_address: String,
    #[serde(rename = "connectionid", skip_serializing_if = "String::is_empty")]
    pub connection_id: String,
}

impl DeleteProxyRequest {
    pub fn new(device_address: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Self { device_address: device_address.into(), connection_id: connection_id.into() }
    }
}
