//! TTY progress display for parallel ingest workers, driven by the
//! `IngestEvent` stream the worker pool emits. One bar tracks overall
//! progress; the current file/action scrolls through its message line.

use concept_rag_core::IngestEvent;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

pub async fn drive(mut events: mpsc::UnboundedReceiver<IngestEvent>) {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );

    while let Some(event) = events.recv().await {
        if event.total as u64 != bar.length().unwrap_or(0) {
            bar.set_length(event.total as u64);
        }
        bar.set_position(event.processed as u64);
        bar.set_message(format!("{} {}", event.action, event.current_file));
    }

    bar.finish_with_message("ingest complete");
}
