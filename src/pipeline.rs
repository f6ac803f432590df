use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::models::events::WorkerEvent;
use crate::models::result::ResultRow;
use crate::providers::ClassificationProvider;
use crate::services::classify_service;
use crate::services::extract_service::{extract_mapping, Extraction};
use crate::services::reconcile_service;
use crate::services::structure_service;
use crate::services::template_service::{self, PromptTemplates};
use crate::settings::{ClassifySettings, REFINE_FOLDER_DEPTH};

/// Everything one classification run needs. The provider and templates are
/// resolved up front so the worker carries no ambient state.
pub struct ClassifyJob {
    pub files: Vec<String>,
    pub settings: ClassifySettings,
    pub templates: PromptTemplates,
    pub provider: Arc<dyn ClassificationProvider>,
}

/// Handle to a running classification worker. Events arrive on `events`
/// until a final [`WorkerEvent::Done`].
pub struct WorkerHandle {
    pub events: UnboundedReceiver<WorkerEvent>,
    cancel: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Request a stop. Observed before the next batch is dispatched; a batch
    /// already in flight is not aborted.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Validate the selection and launch the classification worker. A selection
/// with nothing classifiable is rejected here, before any task spawns;
/// skipped files are reported as log events.
pub fn spawn_classification(job: ClassifyJob) -> Result<WorkerHandle, AppError> {
    let outcome = classify_service::validate_files(&job.files);
    if outcome.valid.is_empty() {
        return Err(AppError::NoValidFiles(
            "All selected files have invalid extensions.".to_string(),
        ));
    }

    let (tx, rx) = mpsc::unbounded_channel();
    for (file, ext) in &outcome.skipped {
        let _ = tx.send(WorkerEvent::Log(format!(
            "Skipped invalid file: {file} (extension not allowed, detected: '{ext}')"
        )));
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let task = tokio::spawn(run_batches(
        outcome.valid,
        job.settings,
        job.templates,
        job.provider,
        Arc::clone(&cancel),
        tx,
    ));

    Ok(WorkerHandle {
        events: rx,
        cancel,
        task,
    })
}

/// The worker loop. Batches run strictly in order; a per-batch failure is
/// reported and the loop continues, while an unreachable endpoint aborts
/// the whole run. Every batch emits exactly one `BatchResult`, possibly
/// empty, so the table updates once per batch.
async fn run_batches(
    valid_files: Vec<String>,
    settings: ClassifySettings,
    templates: PromptTemplates,
    provider: Arc<dyn ClassificationProvider>,
    cancel: Arc<AtomicBool>,
    events: UnboundedSender<WorkerEvent>,
) {
    let settings = settings.clamped();
    let template = templates.classification(settings.template).to_string();
    let num_batches = classify_service::batch_count(valid_files.len(), settings.batch_size);
    let mut aborted = false;

    for (batch_index, batch) in valid_files.chunks(settings.batch_size).enumerate() {
        if cancel.load(Ordering::Relaxed) {
            let _ = events.send(WorkerEvent::Log(
                "Classification stopped before the next batch.".to_string(),
            ));
            break;
        }

        let percent = classify_service::batch_percent(batch_index, num_batches);
        let _ = events.send(WorkerEvent::Progress {
            percent,
            message: format!(
                "Sending batch {}/{num_batches} for classification...",
                batch_index + 1
            ),
        });
        tracing::debug!(batch = batch_index + 1, files = batch.len(), "dispatching batch");

        let prompt = classify_service::build_batch_prompt(
            &template,
            batch,
            &settings.project_root,
            settings.folder_depth,
        );
        let _ = events.send(WorkerEvent::Progress {
            percent,
            message: format!(
                "Waiting for the reply to batch {}/{num_batches}...",
                batch_index + 1
            ),
        });

        let reply = match provider.invoke(&prompt).await {
            Ok(reply) => reply,
            Err(err) if err.is_unreachable() => {
                tracing::error!(%err, "provider endpoint unreachable, aborting run");
                let _ = events.send(WorkerEvent::Error {
                    message: format!("Provider endpoint is unreachable: {err}"),
                    fatal: true,
                });
                aborted = true;
                break;
            }
            Err(err) => {
                tracing::warn!(batch = batch_index + 1, %err, "batch failed");
                let _ = events.send(WorkerEvent::Error {
                    message: format!("Error in batch {}: {err}", batch_index + 1),
                    fatal: false,
                });
                continue;
            }
        };

        let _ = events.send(WorkerEvent::Log(format!(
            "Raw reply for batch {}:\n{reply}",
            batch_index + 1
        )));

        let rows = match extract_mapping(&reply) {
            Extraction::Mapping(pairs) => classify_service::rows_from_mapping(
                &pairs,
                batch,
                &valid_files,
                &settings.project_root,
            ),
            Extraction::Absent { reason, .. } => {
                let _ = events.send(WorkerEvent::Log(format!(
                    "No mapping in the reply to batch {}: {reason}",
                    batch_index + 1
                )));
                Vec::new()
            }
        };
        for row in &rows {
            let _ = events.send(WorkerEvent::Log(format!(
                "{} -> {}",
                row.source, row.destination
            )));
        }
        let _ = events.send(WorkerEvent::BatchResult { batch_index, rows });
    }

    if !aborted {
        let _ = events.send(WorkerEvent::Progress {
            percent: 100,
            message: "Classification complete.".to_string(),
        });
    }
    let _ = events.send(WorkerEvent::Done);
}

// ---------------------------------------------------------------------------
// Refinement round
// ---------------------------------------------------------------------------

/// Result of one refinement round. When the reply held no usable mapping
/// the rows come back unchanged and `diagnostic` says why.
#[derive(Debug)]
pub struct RefinementOutcome {
    pub rows: Vec<ResultRow>,
    pub updated: usize,
    pub raw_reply: String,
    pub diagnostic: Option<String>,
}

/// Run one refinement round over the table: the selected rows and the
/// operator's feedback go to the provider, and the reply's mapping is
/// merged back by basename. Rows not named in the reply are untouched.
pub async fn refine_rows(
    rows: Vec<ResultRow>,
    feedback: &str,
    settings: &ClassifySettings,
    templates: &PromptTemplates,
    provider: &dyn ClassificationProvider,
) -> Result<RefinementOutcome, AppError> {
    let selected = template_service::format_selected_rows(&rows, &settings.project_root);
    if selected.is_empty() {
        return Err(AppError::General(
            "No rows selected for refinement".to_string(),
        ));
    }

    let structure = structure_service::folder_tree_or_placeholder(
        Path::new(&settings.project_root),
        REFINE_FOLDER_DEPTH,
    );
    let prompt =
        template_service::render_refinement(&templates.refine, &selected, feedback, &structure);
    let reply = provider.invoke(&prompt).await?;

    match extract_mapping(&reply) {
        Extraction::Mapping(pairs) => {
            let mut rows = rows;
            let updated =
                reconcile_service::merge_refinement(&mut rows, &pairs, &settings.project_root);
            Ok(RefinementOutcome {
                rows,
                updated,
                raw_reply: reply,
                diagnostic: None,
            })
        }
        Extraction::Absent { reason, .. } => Ok(RefinementOutcome {
            rows,
            updated: 0,
            raw_reply: reply,
            diagnostic: Some(reason),
        }),
    }
}
