use crds::{IngressRoute, Middleware};
use kube::Resource;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Identity of an emitted object inside the cluster.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    pub fn of<K>(object: &K) -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        let meta = object.meta();
        Self {
            kind: K::kind(&()).into_owned(),
            namespace: meta.namespace.clone().unwrap_or_default(),
            name: meta.name.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}/{}'", self.kind, self.namespace, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
    Middleware(Middleware),
    IngressRoute(IngressRoute),
}

impl Manifest {
    pub fn object_ref(&self) -> ObjectRef {
        match self {
            Manifest::Middleware(m) => ObjectRef::of(m),
            Manifest::IngressRoute(r) => ObjectRef::of(r),
        }
    }
}

/// A manifest together with the objects that must exist before it.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub manifest: Manifest,
    pub depends_on: Vec<ObjectRef>,
}

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("{object} depends on {missing}, which is not part of the plan")]
    MissingDependency { object: ObjectRef, missing: ObjectRef },

    #[error("dependency cycle involving {0}")]
    Cycle(ObjectRef),
}

/// Orders steps so every object comes after its dependencies. Steps that are
/// ready at the same time keep their relative order.
pub fn order(steps: Vec<Step>) -> Result<Vec<Step>, PlanError> {
    let known: HashSet<ObjectRef> = steps.iter().map(|s| s.manifest.object_ref()).collect();
    for step in &steps {
        if let Some(missing) = step.depends_on.iter().find(|d| !known.contains(*d)) {
            return Err(PlanError::MissingDependency {
                object: step.manifest.object_ref(),
                missing: missing.clone(),
            });
        }
    }

    let mut pending = steps;
    let mut done = HashSet::with_capacity(pending.len());
    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let Some(next) = pending
            .iter()
            .position(|s| s.depends_on.iter().all(|d| done.contains(d)))
        else {
            return Err(PlanError::Cycle(pending[0].manifest.object_ref()));
        };
        let step = pending.remove(next);
        done.insert(step.manifest.object_ref());
        ordered.push(step);
    }
    Ok(ordered)
}
