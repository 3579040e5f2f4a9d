//! Domain types and wire payloads

pub mod certificate;
pub mod credentials;
pub mod device;
pub mod envelope;
pub mod proxy;

pub use certificate::{CertificateRequest, CertificateResponse};
pub use credentials::{AuthResponse, Credentials};
pub use device::{
    ApplicationType, DefinedDevice, DefinedService, Device, DeviceInfo, DeviceList, Service,
    ServiceConfig, ServiceCredentials, ServiceProtocol, ServiceRegistrationInfo,
};
pub use envelope::{EnvelopeStatus, Outcome, UpstreamEnvelope};
pub use proxy::{CreateProxyRequest, CreateProxyResponse, DeleteProxyRequest, ProxyConnectionInfo};
