// ABOUTME: Composite operation that runs child operations strictly in order.
// ABOUTME: Stops at the first failure and returns that child's error unchanged.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::Operation;
use super::error::OperationError;
use crate::client::{Client, NameResolver};

/// Ordered list of operations executed one after another.
///
/// Each child runs to completion, health gate included, before the next
/// starts. Partial progress from earlier children is not undone on failure.
#[derive(Debug, Default)]
pub struct SequenceOperation {
    operations: Vec<Box<dyn Operation>>,
}

impl SequenceOperation {
    pub fn new(operations: Vec<Box<dyn Operation>>) -> Self {
        Self { operations }
    }

    pub fn push(&mut self, operation: impl Operation + 'static) {
        self.operations.push(Box::new(operation));
    }

    pub fn operations(&self) -> &[Box<dyn Operation>] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl FromIterator<Box<dyn Operation>> for SequenceOperation {
    fn from_iter<I: IntoIterator<Item = Box<dyn Operation>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl Operation for SequenceOperation {
    async fn execute(
        &self,
        client: &dyn Client,
        cancel: &CancellationToken,
    ) -> Result<(), OperationError> {
        let total = self.operations.len();
        for (idx, op) in self.operations.iter().enumerate() {
            tracing::debug!(step = idx + 1, total, operation = %op, "executing operation");
            if let Err(e) = op.execute(client, cancel).await {
                tracing::warn!(step = idx + 1, total, operation = %op, error = %e, "operation failed");
                return Err(e);
            }
        }
        Ok(())
    }

    fn format(&self, resolver: &dyn NameResolver) -> String {
        self.operations
            .iter()
            .map(|op| format!("- {}", op.format(resolver)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for SequenceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops = self
            .operations
            .iter()
            .map(|op| op.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "SequenceOperation[{}]", ops)
    }
}
