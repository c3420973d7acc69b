//! Deployment plan
//!
//! A plan is an ordered list of resource steps. The reference plan is a
//! linear chain, but any DAG is accepted and reduced to a topological
//! order before execution.

use crate::error::{EngineError, Result};
use docstack_cloud::ResourceKind;
use std::collections::HashSet;

/// One step of a provisioning plan
#[derive(Debug, Clone)]
pub struct ResourceStep {
    pub kind: ResourceKind,
    pub required: bool,
    /// Step whose produced resource this one needs as input
    pub depends_on: Option<ResourceKind>,
}

impl ResourceStep {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            required: true,
            depends_on: None,
        }
    }

    pub fn depends_on(mut self, dependency: ResourceKind) -> Self {
        self.depends_on = Some(dependency);
        self
    }
}

/// The reference plan for a document-processing deployment
pub fn default_plan() -> Vec<ResourceStep> {
    vec![
        ResourceStep::new(ResourceKind::ResourceGroup),
        ResourceStep::new(ResourceKind::StorageAccount),
        ResourceStep::new(ResourceKind::StorageContainer).depends_on(ResourceKind::StorageAccount),
        ResourceStep::new(ResourceKind::FormRecognizer),
        ResourceStep::new(ResourceKind::SearchService),
    ]
}

/// Order the steps so no step precedes its dependency.
///
/// The input order is preserved wherever the dependencies allow, so a plan
/// that is already a valid total order comes back unchanged. Duplicate
/// kinds, dependencies on kinds absent from the plan, and cycles are
/// rejected.
pub fn topo_sort(steps: Vec<ResourceStep>) -> Result<Vec<ResourceStep>> {
    let mut seen = HashSet::new();
    for step in &steps {
        if !seen.insert(step.kind) {
            return Err(EngineError::Validation(format!(
                "Duplicate step in deployment plan: {}",
                step.kind
            )));
        }
    }

    for step in &steps {
        if let Some(dependency) = step.depends_on {
            if !seen.contains(&dependency) {
                return Err(EngineError::Validation(format!(
                    "Step {} depends on {}, which is not in the plan",
                    step.kind, dependency
                )));
            }
        }
    }

    let mut remaining = steps;
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut emitted: HashSet<ResourceKind> = HashSet::new();

    while !remaining.is_empty() {
        let position = remaining.iter().position(|step| {
            step.depends_on
                .map(|dep| emitted.contains(&dep))
                .unwrap_or(true)
        });

        match position {
            Some(idx) => {
                let step = remaining.remove(idx);
                emitted.insert(step.kind);
                ordered.push(step);
            }
            None => {
                let stuck: Vec<String> =
                    remaining.iter().map(|s| s.kind.to_string()).collect();
                return Err(EngineError::Validation(format!(
                    "Dependency cycle in deployment plan: {}",
                    stuck.join(", ")
                )));
            }
        }
    }

    Ok(ordered)
}
