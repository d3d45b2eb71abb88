use crate::route::backend::{Backend, ServiceHandle, ServiceReference};
use crate::route::{RouteSpec, DEFAULT_ENTRY_POINT};
use serde::Deserialize;
use std::fs::File;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to read config file: {0}")]
    IO(std::io::Error),

    #[error("Unable to deserialize config file: {0}")]
    Parse(serde_yml::Error),

    #[error("Route '{route}' looks up Service {handle}, which needs a cluster connection")]
    Unresolved { route: String, handle: ServiceHandle },
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub namespace: String,
    #[serde(default = "default_entry_points")]
    pub entry_points: Vec<String>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

fn default_entry_points() -> Vec<String> {
    vec![DEFAULT_ENTRY_POINT.to_string()]
}

#[derive(Debug, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    pub prefix: String,
    pub service: ServiceConfig,
    pub port: Option<i32>,
    pub strip_prefix: Option<bool>,
    pub namespace: Option<String>,
}

/// `service: mlflow` names the Service; `service: { lookup: mlflow }` reads the
/// Service from the cluster to pick up its ports.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ServiceConfig {
    Name(String),
    Lookup { lookup: String },
}

/// A configured route whose backend may still need a lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub backend: Backend,
    namespace: String,
    prefix: String,
    strip_prefix: Option<bool>,
    port: Option<i32>,
    entry_points: Vec<String>,
}

impl Declaration {
    /// Completes the route with a resolved backend.
    pub fn into_spec(self, backend: ServiceReference) -> RouteSpec {
        RouteSpec {
            namespace: self.namespace,
            prefix: self.prefix,
            backend,
            strip_prefix: self.strip_prefix,
            port: self.port,
            entry_points: self.entry_points,
        }
    }
}

impl Config {
    pub fn declarations(&self) -> Vec<Declaration> {
        self.routes
            .iter()
            .map(|route| {
                let namespace = route
                    .namespace
                    .clone()
                    .unwrap_or_else(|| self.namespace.clone());
                let backend = match &route.service {
                    ServiceConfig::Name(name) => Backend::Ready(name.as_str().into()),
                    ServiceConfig::Lookup { lookup } => Backend::Lookup(ServiceHandle {
                        namespace: namespace.clone(),
                        name: lookup.clone(),
                    }),
                };
                Declaration {
                    name: route.name.clone(),
                    backend,
                    namespace,
                    prefix: route.prefix.clone(),
                    strip_prefix: route.strip_prefix,
                    port: route.port,
                    entry_points: self.entry_points.clone(),
                }
            })
            .collect()
    }

    /// Route specs for routes that need no cluster lookup.
    pub fn offline_specs(&self) -> Result<Vec<(String, RouteSpec)>, Error> {
        self.declarations()
            .into_iter()
            .map(|declaration| match declaration.backend.clone() {
                Backend::Ready(reference) => {
                    Ok((declaration.name.clone(), declaration.into_spec(reference)))
                }
                Backend::Lookup(handle) => Err(Error::Unresolved {
                    route: declaration.name,
                    handle,
                }),
            })
            .collect()
    }
}

pub fn load(filename: &str) -> Result<Config, Error> {
    let file = File::open(filename).map_err(Error::IO)?;
    serde_yml::from_reader(file).map_err(Error::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
namespace: mlflow
routes:
  - name: mlflow
    prefix: /mlflow
    service: mlflow
  - name: api
    prefix: /api
    service: api-svc
    port: 3000
    strip_prefix: false
    namespace: apps
"#;

    fn parse(s: &str) -> Config {
        serde_yml::from_str(s).unwrap()
    }

    #[test]
    fn defaults_entry_points_to_web() {
        assert_eq!(parse(CONFIG).entry_points, vec!["web"]);
    }

    #[test]
    fn offline_specs_carry_route_settings() {
        let specs = parse(CONFIG).offline_specs().unwrap();
        assert_eq!(specs.len(), 2);

        let (name, mlflow) = &specs[0];
        assert_eq!(name, "mlflow");
        assert_eq!(mlflow, &RouteSpec::new("mlflow", "/mlflow", "mlflow"));

        let (name, api) = &specs[1];
        assert_eq!(name, "api");
        assert_eq!(api.namespace, "apps");
        assert_eq!(api.port, Some(3000));
        assert_eq!(api.strip_prefix, Some(false));
        assert_eq!(api.backend, ServiceReference::Name("api-svc".into()));
    }

    #[test]
    fn lookup_backend_becomes_handle_in_route_namespace() {
        let config = parse(
            r#"
namespace: mlflow
entry_points: [websecure]
routes:
  - name: tracking
    prefix: /mlflow
    service:
      lookup: mlflow-tracking
"#,
        );
        let declarations = config.declarations();
        assert_eq!(
            declarations[0].backend,
            Backend::Lookup(ServiceHandle {
                namespace: "mlflow".into(),
                name: "mlflow-tracking".into(),
            })
        );

        let spec = declarations[0]
            .clone()
            .into_spec(crate::route::backend::service("mlflow-tracking", &[5000]).into());
        assert_eq!(spec.entry_points, vec!["websecure"]);
        assert_eq!(spec.backend.name(), "mlflow-tracking");
    }

    #[test]
    fn into_spec_keeps_route_settings_around_resolved_backend() {
        let declaration = parse(CONFIG).declarations().remove(1);
        assert_eq!(declaration.backend, Backend::Ready("api-svc".into()));

        let backend = ServiceReference::from(crate::route::backend::service("api-svc", &[3000]));
        let spec = declaration.into_spec(backend.clone());
        assert_eq!(
            spec,
            RouteSpec::new("apps", "/api", backend)
                .with_port(3000)
                .with_strip_prefix(false)
        );
    }

    #[test]
    fn offline_specs_refuse_lookups() {
        let config = parse(
            r#"
namespace: mlflow
routes:
  - name: tracking
    prefix: /mlflow
    service: { lookup: mlflow }
"#,
        );
        let err = config.offline_specs().unwrap_err();
        assert!(matches!(err, Error::Unresolved { ref route, .. } if route == "tracking"));
        assert_eq!(
            err.to_string(),
            "Route 'tracking' looks up Service mlflow/mlflow, which needs a cluster connection"
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load("/nonexistent/mlplatform/ingress.yaml"),
            Err(Error::IO(_))
        ));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = serde_yml::from_str::<Config>("routes: 3").map_err(Error::Parse);
        assert!(matches!(err, Err(Error::Parse(_))));
    }
}
