pub mod config;
pub mod k8s;
pub mod render;
pub mod route;

/// Field manager for server-side apply and `managed-by` label value.
pub const MANAGER: &str = "mlplatform-ingress";
