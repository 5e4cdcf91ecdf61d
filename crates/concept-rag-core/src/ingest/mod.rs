pub mod pipeline;
pub mod worker_pool;

pub use pipeline::{IngestContext, IngestOutcome, PipelineError};
pub use worker_pool::{run_ingest, IngestEvent, IngestSummary};
