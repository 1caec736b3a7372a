//! Statement transforms and the pipeline that applies them.
//!
//! Transforms are total: they always yield a statement, and the
//! rewritten statement keeps the same classification as its input.

use crate::rewrite::{JoinMerger, PathSimplifier, Rewrite};
use crate::statement::QueryStatement;
use tracing::{debug, trace};

/// A named statement-to-statement transformation.
pub trait QueryTransform: Send + Sync {
    /// Unique name for this transform
    fn name(&self) -> &'static str;

    fn transform(&self, statement: QueryStatement) -> QueryStatement;
}

/// Merges joins of basic patterns everywhere in the statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenPatterns;

impl QueryTransform for FlattenPatterns {
    fn name(&self) -> &'static str {
        "flatten-patterns"
    }

    fn transform(&self, statement: QueryStatement) -> QueryStatement {
        statement.rewrite(&JoinMerger)
    }
}

/// Simplifies every property path in the statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifyPaths;

impl QueryTransform for SimplifyPaths {
    fn name(&self) -> &'static str {
        "simplify-paths"
    }

    fn transform(&self, statement: QueryStatement) -> QueryStatement {
        statement.rewrite(&PathSimplifier)
    }
}

/// Ordered list of transforms.
#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn QueryTransform>>,
}

impl TransformPipeline {
    pub fn builder() -> TransformPipelineBuilder {
        TransformPipelineBuilder::default()
    }

    /// Flatten, then simplify paths
    pub fn standard() -> Self {
        Self::builder()
            .with(FlattenPatterns)
            .with(SimplifyPaths)
            .build()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn run(&self, statement: QueryStatement) -> QueryStatement {
        debug!(
            statement = statement.name(),
            steps = self.transforms.len(),
            "running transform pipeline"
        );
        self.transforms
            .iter()
            .fold(statement, |statement, transform| {
                trace!(transform = transform.name(), "applying transform");
                transform.transform(statement)
            })
    }
}

impl std::fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("transforms", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct TransformPipelineBuilder {
    transforms: Vec<Box<dyn QueryTransform>>,
}

impl TransformPipelineBuilder {
    pub fn with<T: QueryTransform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Add a transform only when `enabled`
    pub fn with_if<T: QueryTransform + 'static>(self, enabled: bool, transform: T) -> Self {
        if enabled {
            self.with(transform)
        } else {
            self
        }
    }

    pub fn build(self) -> TransformPipeline {
        TransformPipeline {
            transforms: self.transforms,
        }
    }
}
