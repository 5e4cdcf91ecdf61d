//! Observability (C16, §2 "ambient"): structured logging setup, trace-id
//! propagation, and operation timing, built as a shared `tracing` helper
//! so every tool call and ingest stage transition logs the same way.

use std::time::Instant;
use uuid::Uuid;

/// One trace id per tool call / per ingest run (§2: "A `trace_id` (UUID v4)
/// is generated per tool call / per ingest run").
pub fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Wraps an operation with start/end `info` logs carrying `trace_id`,
/// `operation`, and `duration_ms` (§2: "Every tool invocation and every
/// ingest stage transition logs at `info` with structured fields").
pub struct OperationTimer {
    trace_id: String,
    operation: &'static str,
    started_at: Instant,
}

impl OperationTimer {
    pub fn start(operation: &'static str, trace_id: &str) -> Self {
        tracing::info!(trace_id = %trace_id, operation, "operation started");
        Self {
            trace_id: trace_id.to_string(),
            operation,
            started_at: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration_ms = self.started_at.elapsed().as_millis();
        tracing::info!(
            trace_id = %self.trace_id,
            operation = self.operation,
            duration_ms,
            "operation finished"
        );
    }

    pub fn finish_with_error(self, error: &str) {
        let duration_ms = self.started_at.elapsed().as_millis();
        tracing::warn!(
            trace_id = %self.trace_id,
            operation = self.operation,
            duration_ms,
            error,
            "operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_ids_are_unique() {
        assert_ne!(new_trace_id(), new_trace_id());
    }

    #[test]
    fn timer_records_elapsed_time() {
        let timer = OperationTimer::start("test_op", &new_trace_id());
        std::thread::sleep(std::time::Duration::from_millis(1));
        timer.finish();
    }
}
