use crate::route::plan::{order, PlanError};
use crate::route::RouteBundle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Unable to serialize manifest: {0}")]
    Serialize(#[from] serde_yml::Error),
}

/// Multi-document YAML of every bundle's objects, each bundle in dependency
/// order. Suitable for review or `kubectl apply -f -`.
pub fn render<'a, I>(bundles: I) -> Result<String, Error>
where
    I: IntoIterator<Item = &'a RouteBundle>,
{
    let mut documents = Vec::new();
    for bundle in bundles {
        for step in order(bundle.plan())? {
            documents.push(serde_yml::to_string(&step.manifest)?);
        }
    }
    Ok(documents.join("---\n"))
}
