use k8s_openapi::api::core::v1::Service;
use std::fmt;

/// Port used when the backend is only known by name.
pub const DEFAULT_PORT: i32 = 80;

/// The Service a route forwards to.
///
/// A bare name carries no port information, a resolved `Service` carries its
/// declared ports.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceReference {
    Name(String),
    Service(Box<Service>),
}

impl ServiceReference {
    pub fn name(&self) -> String {
        match self {
            ServiceReference::Name(name) => name.clone(),
            ServiceReference::Service(service) => {
                service.metadata.name.clone().unwrap_or_default()
            }
        }
    }

    fn first_port(&self) -> Option<i32> {
        match self {
            ServiceReference::Name(_) => None,
            ServiceReference::Service(service) => service
                .spec
                .as_ref()
                .and_then(|spec| spec.ports.as_ref())
                .and_then(|ports| ports.first())
                .map(|port| port.port),
        }
    }
}

impl From<&str> for ServiceReference {
    fn from(name: &str) -> Self {
        ServiceReference::Name(name.to_string())
    }
}

impl From<String> for ServiceReference {
    fn from(name: String) -> Self {
        ServiceReference::Name(name)
    }
}

impl From<Service> for ServiceReference {
    fn from(service: Service) -> Self {
        ServiceReference::Service(Box::new(service))
    }
}

/// Picks the port the route forwards to: an explicit override, else the first
/// port of a resolved Service, else [`DEFAULT_PORT`] for a bare name.
///
/// An explicit port of 0 counts as unset. Returns `None` only for a resolved
/// Service without ports.
pub fn resolve_port(explicit: Option<i32>, backend: &ServiceReference) -> Option<i32> {
    if let Some(port) = explicit.filter(|port| *port != 0) {
        return Some(port);
    }
    match backend {
        ServiceReference::Name(_) => Some(DEFAULT_PORT),
        ServiceReference::Service(_) => backend.first_port(),
    }
}

/// Forward reference to a Service that may not exist yet. It is turned into a
/// [`ServiceReference::Service`] by looking it up at apply time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceHandle {
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Backend of a declared route before anything has been looked up.
#[derive(Clone, Debug, PartialEq)]
pub enum Backend {
    Ready(ServiceReference),
    Lookup(ServiceHandle),
}

#[cfg(test)]
pub(crate) fn service(name: &str, ports: &[i32]) -> Service {
    use k8s_openapi::api::core::v1::{ServicePort, ServiceSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(
                ports
                    .iter()
                    .map(|port| ServicePort {
                        port: *port,
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        status: None,
    }
}
