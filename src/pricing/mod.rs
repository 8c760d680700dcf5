//! Estimate pricing pipeline.
//!
//! Data flows one way: [`RowDirectory`] → row invocation →
//! [`PostProcessingChain`] → [`aggregate`]. The validation tracker is read
//! once, as a gate in front of the chain.

pub mod aggregate;
pub mod calculator;
pub mod directory;
pub mod format;
pub mod invocation;
pub mod pass;
pub mod stages;

pub use aggregate::aggregate;
pub use calculator::{
    AsyncCalculatorRegistry, AsyncRowCalculator, CalculatorRegistry, RecordedCalculator,
    Registry, RowCalculator,
};
pub use directory::{Checkpoint, RowDirectory, Window};
pub use format::{format_currency, format_percent, round2};
pub use invocation::{price_rows, price_rows_async};
pub use pass::{EstimatePipeline, PricingPass};
pub use stages::{PostProcessingChain, Stage, StageContext};
