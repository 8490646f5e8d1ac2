//! Hot-path market-data core for a single instrument:
//! - fixed-capacity rolling window of price bars with zero-copy views
//! - feature schema, name→slot index and dense-vector assembly
//! - bounded producer/consumer queue with an explicit full-queue policy
//! - atomically-swapped decision configuration snapshot
//! - the pipeline stage wiring them together

mod assemble;
mod bar;
mod config;
mod observability;
mod pipeline;
mod queue;
mod schema;
mod window;

pub use assemble::{build_vector, fill_vector, fill_vector_indexed, AssembleError};
pub use bar::{Bar, FeatureRow};
pub use config::{DecisionConfig, DecisionConfigProvider, DecisionSettings};
pub use observability::{
    init_logging, log_app_start, LogFormat, LoggingConfig, LoggingInitError,
};
pub use pipeline::{FeatureEngine, PipelineConfig, PipelineError, PipelineReport, PipelineStage};
pub use queue::{
    bounded_queue, FullPolicy, QueueConfig, QueueError, QueueReceiver, QueueSender, SendOutcome,
};
pub use schema::{assert_schema_compatible, FeatureSchema, SchemaError, SchemaIndex};
pub use window::{RollingWindow, WindowError};
