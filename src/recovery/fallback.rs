//! Fallback strategy for failed post-processing stages

use crate::error::{PipelineError, PipelineResult};
use tracing::{debug, warn};

/// Result of running a stage under [`FallbackExecutor`].
#[derive(Debug)]
pub struct FallbackOutcome<T> {
    pub items: Vec<T>,
    /// Set when the primary failed and the input was handed through.
    pub error: Option<PipelineError>,
}

impl<T> FallbackOutcome<T> {
    pub fn used_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs a transformation over a borrowed input and, when it fails, returns
/// the input itself.
pub struct FallbackExecutor<P> {
    primary: P,
    operation_name: &'static str,
}

impl<P> FallbackExecutor<P> {
    pub fn new<T>(operation_name: &'static str, primary: P) -> Self
    where
        P: FnOnce(&[T]) -> PipelineResult<Vec<T>>,
    {
        Self {
            primary,
            operation_name,
        }
    }

    pub fn execute<T>(self, input: Vec<T>) -> FallbackOutcome<T>
    where
        P: FnOnce(&[T]) -> PipelineResult<Vec<T>>,
    {
        match (self.primary)(&input) {
            Ok(items) => {
                debug!(
                    operation = self.operation_name,
                    before = input.len(),
                    after = items.len(),
                    "stage applied"
                );
                FallbackOutcome { items, error: None }
            }
            Err(error) => {
                warn!(
                    operation = self.operation_name,
                    code = %error.code(),
                    category = error.code().category(),
                    error = %error,
                    "stage failed, keeping its input"
                );
                FallbackOutcome {
                    items: input,
                    error: Some(error),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowId;

    #[test]
    fn test_fallback_keeps_input() {
        let outcome = FallbackExecutor::new("double", |_: &[i32]| {
            Err(PipelineError::UnknownRow(RowId::from("x")))
        })
        .execute(vec![1, 2, 3]);

        assert!(outcome.used_fallback());
        assert_eq!(outcome.items, vec![1, 2, 3]);
    }

    #[test]
    fn test_primary_result_is_used() {
        let outcome = FallbackExecutor::new("double", |items: &[i32]| {
            Ok(items.iter().map(|v| v * 2).collect())
        })
        .execute(vec![1, 2, 3]);

        assert!(!outcome.used_fallback());
        assert_eq!(outcome.items, vec![2, 4, 6]);
    }
}
