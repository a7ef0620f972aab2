//! Artifact serialization and the batch export driver.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::aggregate::{process_participant, ParticipantDocument};
use crate::config::PipelineConfig;
use crate::discover::list_participants;

/// Writes a participant's document as pretty-printed JSON, replacing any
/// previous artifact for the same participant outright.
pub fn write_document(
    processed_dir: &Path,
    participant_id: &str,
    document: &ParticipantDocument,
) -> Result<PathBuf> {
    std::fs::create_dir_all(processed_dir)
        .with_context(|| format!("creating output directory {}", processed_dir.display()))?;

    let path = processed_dir.join(format!("{participant_id}.json"));
    let body = serde_json::to_vec_pretty(document)?;
    std::fs::write(&path, body)
        .with_context(|| format!("writing artifact {}", path.display()))?;

    Ok(path)
}

/// Runs the pipeline for every participant directory under the input root.
///
/// Participants are independent, so they run as semaphore-bounded tokio
/// tasks; one participant's failure is logged and never aborts the batch.
pub async fn run_export(config: &PipelineConfig) -> Result<()> {
    let participants = list_participants(&config.input_dir)?;
    info!(
        participant_count = participants.len(),
        input_dir = %config.input_dir.display(),
        "Starting export run"
    );

    let semaphore = Arc::new(tokio::sync::Semaphore::new(config.concurrency.max(1)));
    let mut tasks = Vec::new();

    for participant_id in participants {
        let sem = semaphore.clone();
        let config = config.clone();

        tasks.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore never closed");

            let participant_dir = config.input_dir.join(&participant_id);
            match process_participant(&participant_dir, &config.rolling_windows) {
                Ok(document) => {
                    match write_document(&config.processed_dir, &participant_id, &document) {
                        Ok(path) => {
                            info!(
                                participant_id,
                                categories = document.len(),
                                path = %path.display(),
                                "Participant exported"
                            );
                            true
                        }
                        Err(e) => {
                            error!(participant_id, error = %e, "Failed to write artifact");
                            false
                        }
                    }
                }
                Err(e) => {
                    error!(participant_id, error = %e, "Participant processing failed");
                    false
                }
            }
        }));
    }

    let mut exported = 0usize;
    let mut failed = 0usize;
    for task in tasks {
        match task.await {
            Ok(true) => exported += 1,
            _ => failed += 1,
        }
    }

    info!(exported, failed, "Export run finished");
    Ok(())
}
