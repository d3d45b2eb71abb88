use crate::config::Declaration;
use crate::k8s::Object;
use crate::route::plan::{order, Manifest, ObjectRef, PlanError};
use crate::route::{build, RouteBundle};
use async_trait::async_trait;
use kube::api::{Patch, PatchParams};
use kube::Api;
use log::{debug, info};
use thiserror::Error;

/// Receives manifests in dependency order.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn submit(&self, manifest: &Manifest) -> Result<(), anyhow::Error>;
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Unable to submit {object}: {reason}")]
    Rejected {
        object: ObjectRef,
        reason: anyhow::Error,
    },
}

/// Server-side applies manifests through the Kubernetes API.
pub struct KubeSink {
    client: kube::Client,
    params: PatchParams,
}

impl KubeSink {
    pub fn new(client: kube::Client, field_manager: &str) -> Self {
        Self {
            client,
            params: PatchParams::apply(field_manager).force(),
        }
    }

    async fn apply<T: Object>(&self, object: &T) -> Result<(), anyhow::Error> {
        let meta = object.meta();
        let namespace = meta.namespace.clone().unwrap_or_default();
        let name = meta.name.clone().unwrap_or_default();
        let api: Api<T> = Api::namespaced(self.client.clone(), &namespace);
        api.patch(&name, &self.params, &Patch::Apply(object)).await?;
        Ok(())
    }
}

#[async_trait]
impl Sink for KubeSink {
    async fn submit(&self, manifest: &Manifest) -> Result<(), anyhow::Error> {
        match manifest {
            Manifest::Middleware(m) => self.apply(m).await,
            Manifest::IngressRoute(r) => self.apply(r).await,
        }
    }
}

/// Submits every object of the bundle, dependencies first. Stops at the first
/// rejected object; nothing is retried.
pub async fn submit<S>(bundle: &RouteBundle, sink: &S) -> Result<usize, SubmitError>
where
    S: Sink + ?Sized,
{
    let steps = order(bundle.plan())?;
    debug!("Submitting {} objects", steps.len());
    for step in &steps {
        let object = step.manifest.object_ref();
        if let Err(reason) = sink.submit(&step.manifest).await {
            return Err(SubmitError::Rejected { object, reason });
        }
        info!("Applied {}", object);
    }
    Ok(steps.len())
}

/// Resolves each declared backend and submits the resulting bundle, one
/// route after another. Returns the number of applied objects.
pub async fn apply_declarations(
    declarations: Vec<Declaration>,
    client: kube::Client,
    field_manager: &str,
) -> Result<usize, anyhow::Error> {
    let sink = KubeSink::new(client.clone(), field_manager);
    let mut applied = 0;
    for declaration in declarations {
        let name = declaration.name.clone();
        let backend = declaration.backend.clone().resolve(client.clone()).await?;
        let bundle = build(&name, &declaration.into_spec(backend));
        let count = submit(&bundle, &sink).await?;
        info!("Route '{}' applied ({} objects)", name, count);
        applied += count;
    }
    Ok(applied)
}
