use crate::route::backend::{Backend, ServiceHandle, ServiceReference};
use k8s_openapi::api::core::v1::Service;
use kube::Api;
use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Service {0} does not exist")]
    NotFound(ServiceHandle),

    #[error("Unable to look up Service {handle}: {source}")]
    Kube {
        handle: ServiceHandle,
        source: kube::Error,
    },
}

impl ServiceHandle {
    /// Fetches the Service so its declared ports can be used.
    pub async fn resolve(&self, client: kube::Client) -> Result<ServiceReference, LookupError> {
        debug!("Looking up Service {}", self);
        let api: Api<Service> = Api::namespaced(client, &self.namespace);
        match api.get_opt(&self.name).await {
            Ok(Some(service)) => Ok(service.into()),
            Ok(None) => Err(LookupError::NotFound(self.clone())),
            Err(source) => Err(LookupError::Kube {
                handle: self.clone(),
                source,
            }),
        }
    }
}

impl Backend {
    pub async fn resolve(self, client: kube::Client) -> Result<ServiceReference, LookupError> {
        match self {
            Backend::Ready(reference) => Ok(reference),
            Backend::Lookup(handle) => handle.resolve(client).await,
        }
    }
}
