mod ingressroute;
mod middleware;

pub use ingressroute::{
    IngressRoute, IngressRouteSpec, MiddlewareRef, Route, RouteKind, ServiceRef, Tls,
};
pub use middleware::{Middleware, MiddlewareSpec, RedirectRegex, StripPrefix};
