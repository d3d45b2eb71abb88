use k8s_openapi::serde::{Deserialize, Serialize};
use kube::CustomResource;
use schemars::JsonSchema;

#[derive(Debug, Clone, PartialEq, CustomResource, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "traefik.io",
    version = "v1alpha1",
    kind = "IngressRoute",
    doc = "IngressRoute is the Traefik CRD for HTTP routers",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct IngressRouteSpec {
    pub entry_points: Vec<String>,
    pub routes: Vec<Route>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Route {
    #[serde(rename = "match")]
    pub matches: String,
    pub kind: RouteKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middlewares: Vec<MiddlewareRef>,
    pub services: Vec<ServiceRef>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RouteKind {
    #[default]
    Rule,
}

/// Reference to a `Middleware`, resolved by Traefik in the route's namespace
/// unless `namespace` is set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MiddlewareRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Kubernetes Service a route forwards to. A missing port is left for the
/// API server to reject.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ServiceRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_traefik_field_names() {
        let route = IngressRoute::new(
            "mlflow-ingress-route",
            IngressRouteSpec {
                entry_points: vec!["web".into()],
                routes: vec![Route {
                    matches: "PathPrefix(`/mlflow`)".into(),
                    kind: RouteKind::Rule,
                    middlewares: vec![MiddlewareRef {
                        name: "mlflow-trailing-slash".into(),
                        namespace: None,
                    }],
                    services: vec![ServiceRef {
                        name: "mlflow".into(),
                        port: Some(80),
                        namespace: None,
                    }],
                }],
                tls: None,
            },
        );

        let value = serde_json::to_value(&route).unwrap();
        assert_eq!(value["apiVersion"], "traefik.io/v1alpha1");
        assert_eq!(value["kind"], "IngressRoute");
        assert_eq!(
            value["spec"],
            json!({
                "entryPoints": ["web"],
                "routes": [{
                    "match": "PathPrefix(`/mlflow`)",
                    "kind": "Rule",
                    "middlewares": [{ "name": "mlflow-trailing-slash" }],
                    "services": [{ "name": "mlflow", "port": 80 }],
                }],
            })
        );
    }

    #[test]
    fn omits_unknown_service_port() {
        let service = ServiceRef {
            name: "portless".into(),
            port: None,
            namespace: None,
        };
        assert_eq!(
            serde_json::to_value(&service).unwrap(),
            json!({ "name": "portless" })
        );
    }

    #[test]
    fn reads_back_route_from_yaml() {
        let yaml = r#"
entryPoints: [web, websecure]
routes:
  - match: PathPrefix(`/api`)
    kind: Rule
    services:
      - name: api
        port: 3000
tls:
  secretName: api-cert
"#;
        let spec: IngressRouteSpec = serde_yml::from_str(yaml).unwrap();
        assert_eq!(spec.entry_points, vec!["web", "websecure"]);
        assert!(spec.routes[0].middlewares.is_empty());
        assert_eq!(spec.routes[0].services[0].port, Some(3000));
        assert_eq!(spec.tls.unwrap().secret_name.as_deref(), Some("api-cert"));
    }
}
