//! Path-prefixed Traefik routing.
//!
//! A route is published under a URL prefix and backed by a Kubernetes
//! Service. Building it yields two middlewares and one `IngressRoute`:
//!
//! * a temporary redirect from `<prefix>` to `<prefix>/`,
//! * optionally, stripping `<prefix>` before the request reaches the Service,
//! * the `IngressRoute` matching `PathPrefix(<prefix>)` with those
//!   middlewares, redirect first.
//!
//! Building never fails and performs no validation. Malformed input (an empty
//! prefix, a Service without ports) is rejected by the cluster when applied.

pub mod backend;
pub mod plan;

use crate::MANAGER;
use backend::{resolve_port, ServiceReference};
use crds::{
    IngressRoute, IngressRouteSpec, Middleware, MiddlewareRef, MiddlewareSpec, RedirectRegex,
    Route, RouteKind, ServiceRef, StripPrefix,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use plan::{Manifest, ObjectRef, Step};
use std::collections::BTreeMap;

pub const TRAILING_SLASH_SUFFIX: &str = "-trailing-slash";
pub const STRIP_PREFIX_SUFFIX: &str = "-strip-prefix";
pub const INGRESS_ROUTE_SUFFIX: &str = "-ingress-route";

/// Traefik's plain HTTP entry point.
pub const DEFAULT_ENTRY_POINT: &str = "web";

#[derive(Clone, Debug, PartialEq)]
pub struct RouteSpec {
    pub namespace: String,
    pub prefix: String,
    pub backend: ServiceReference,
    /// `None` strips the prefix.
    pub strip_prefix: Option<bool>,
    pub port: Option<i32>,
    pub entry_points: Vec<String>,
}

impl RouteSpec {
    pub fn new(
        namespace: impl Into<String>,
        prefix: impl Into<String>,
        backend: impl Into<ServiceReference>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            prefix: prefix.into(),
            backend: backend.into(),
            strip_prefix: None,
            port: None,
            entry_points: vec![DEFAULT_ENTRY_POINT.to_string()],
        }
    }

    pub fn with_port(mut self, port: i32) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_strip_prefix(mut self, strip: bool) -> Self {
        self.strip_prefix = Some(strip);
        self
    }

    pub fn with_entry_points(mut self, entry_points: Vec<String>) -> Self {
        self.entry_points = entry_points;
        self
    }

    pub fn strips_prefix(&self) -> bool {
        self.strip_prefix.unwrap_or(true)
    }
}

/// Objects derived from one route declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteBundle {
    redirect: Middleware,
    strip_prefix: Option<Middleware>,
    route: IngressRoute,
}

impl RouteBundle {
    pub fn redirect(&self) -> &Middleware {
        &self.redirect
    }

    pub fn strip_prefix(&self) -> Option<&Middleware> {
        self.strip_prefix.as_ref()
    }

    pub fn route(&self) -> &IngressRoute {
        &self.route
    }

    /// Middlewares in the order the route applies them.
    pub fn middlewares(&self) -> Vec<&Middleware> {
        std::iter::once(&self.redirect)
            .chain(self.strip_prefix.as_ref())
            .collect()
    }

    /// Steps for submitting the bundle. The route depends on every middleware
    /// it references.
    pub fn plan(&self) -> Vec<Step> {
        let mut steps: Vec<Step> = self
            .middlewares()
            .into_iter()
            .map(|m| Step {
                manifest: Manifest::Middleware(m.clone()),
                depends_on: vec![],
            })
            .collect();
        let depends_on = steps.iter().map(|s| s.manifest.object_ref()).collect();
        steps.push(Step {
            manifest: Manifest::IngressRoute(self.route.clone()),
            depends_on,
        });
        steps
    }
}

/// Regex matching a URL that ends in `prefix` without a trailing slash. The
/// prefix is embedded as is, behind a backslash escaping its leading `/`.
pub fn redirect_regex(prefix: &str) -> String {
    format!("^.*\\{}$", prefix)
}

/// Traefik rule matching every path under `prefix`. The prefix is not escaped.
pub fn match_rule(prefix: &str) -> String {
    format!("PathPrefix(`{}`)", prefix)
}

fn metadata(instance: &str, name: String, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: Some(namespace.to_string()),
        labels: Some(BTreeMap::from([
            ("app.kubernetes.io/instance".to_string(), instance.to_string()),
            ("app.kubernetes.io/managed-by".to_string(), MANAGER.to_string()),
        ])),
        ..Default::default()
    }
}

fn middleware(instance: &str, suffix: &str, namespace: &str, spec: MiddlewareSpec) -> Middleware {
    Middleware {
        metadata: metadata(instance, format!("{}{}", instance, suffix), namespace),
        spec,
    }
}

/// Derives the routing objects for `spec`. Object names are `name` plus a
/// fixed suffix, so the same input always yields the same objects.
pub fn build(name: &str, spec: &RouteSpec) -> RouteBundle {
    let redirect = middleware(
        name,
        TRAILING_SLASH_SUFFIX,
        &spec.namespace,
        MiddlewareSpec {
            redirect_regex: Some(RedirectRegex {
                regex: redirect_regex(&spec.prefix),
                replacement: format!("{}/", spec.prefix),
                permanent: false,
            }),
            strip_prefix: None,
        },
    );

    let strip_prefix = spec.strips_prefix().then(|| {
        middleware(
            name,
            STRIP_PREFIX_SUFFIX,
            &spec.namespace,
            MiddlewareSpec {
                redirect_regex: None,
                strip_prefix: Some(StripPrefix {
                    prefixes: vec![spec.prefix.clone()],
                }),
            },
        )
    });

    let middlewares = std::iter::once(&redirect)
        .chain(strip_prefix.as_ref())
        .map(|m| MiddlewareRef {
            name: ObjectRef::of(m).name,
            namespace: None,
        })
        .collect();

    let route = IngressRoute {
        metadata: metadata(
            name,
            format!("{}{}", name, INGRESS_ROUTE_SUFFIX),
            &spec.namespace,
        ),
        spec: IngressRouteSpec {
            entry_points: spec.entry_points.clone(),
            routes: vec![Route {
                matches: match_rule(&spec.prefix),
                kind: RouteKind::Rule,
                middlewares,
                services: vec![ServiceRef {
                    name: spec.backend.name(),
                    port: resolve_port(spec.port, &spec.backend),
                    namespace: None,
                }],
            }],
            tls: None,
        },
    };

    RouteBundle {
        redirect,
        strip_prefix,
        route,
    }
}
