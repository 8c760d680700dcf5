//! Stages that keep their slot in the chain without rewriting anything.

use super::{Stage, StageContext};
use crate::error::PipelineResult;
use crate::model::EstimateLineItem;

macro_rules! identity_stage {
    ($(#[$doc:meta])* $ty:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $ty;

        impl Stage for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn apply(
                &self,
                items: &[EstimateLineItem],
                _context: &StageContext<'_>,
            ) -> PipelineResult<Vec<EstimateLineItem>> {
                Ok(items.to_vec())
            }
        }
    };
}

identity_stage!(
    /// Empty rows produce no items and rewrite none.
    EmptyRowStage,
    "empty_row"
);
identity_stage!(
    /// Reserved for assembly grouping.
    AssemblyStage,
    "assembly"
);
identity_stage!(
    /// Dividers are boundaries read by later stages.
    DividerStage,
    "divider"
);
