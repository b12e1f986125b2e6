//! Stage runner: apply one stage to every eligible record concurrently.
//!
//! Each eligible record gets its own task. A failing or panicking task turns
//! into a failed copy of its input record; it never cancels its siblings and
//! never removes a record from the output. Ineligible records pass through
//! untouched and are counted as skipped.
//!
//! Concurrency is bounded by the [`crate::RemoteCaller`] each stage calls
//! through, not by the runner.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use triage_core::{Error, Result, TicketRecord};

/// Pipeline stage identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Fetch,
    Synthesize,
    Categorize,
    Diagnose,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Fetch => "fetch",
            StageKind::Synthesize => "synthesize",
            StageKind::Categorize => "categorize",
            StageKind::Diagnose => "diagnose",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pipeline phase.
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    /// Whether the previous stages left this record ready for this one.
    fn is_eligible(&self, record: &TicketRecord) -> bool;

    /// Produce the enriched record. The input is never modified.
    async fn process(&self, record: &TicketRecord) -> Result<TicketRecord>;

    /// Record `err` on a record this stage could not process.
    fn mark_failed(&self, record: &mut TicketRecord, err: &Error);
}

/// Called once for each record a stage attempted.
pub trait ProgressHook: Send + Sync {
    fn on_item(&self, stage: StageKind, ticket_id: &str, record: &TicketRecord, success: bool);
}

impl<F> ProgressHook for F
where
    F: Fn(StageKind, &str, &TicketRecord, bool) + Send + Sync,
{
    fn on_item(&self, stage: StageKind, ticket_id: &str, record: &TicketRecord, success: bool) {
        self(stage, ticket_id, record, success)
    }
}

/// Progress hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressHook for NoopProgress {
    fn on_item(&self, _: StageKind, _: &str, _: &TicketRecord, _: bool) {}
}

/// Per-stage counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStats {
    pub stage: StageKind,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

impl StageStats {
    fn new(stage: StageKind) -> Self {
        Self {
            stage,
            attempted: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// Same length as the input, in input order.
    pub records: Vec<TicketRecord>,
    pub stats: StageStats,
}

/// Run `stage` over `records`.
pub async fn run_stage(
    stage: Arc<dyn Stage>,
    records: Vec<TicketRecord>,
    progress: &dyn ProgressHook,
) -> StageOutcome {
    let kind = stage.kind();
    let started = Instant::now();
    let mut stats = StageStats::new(kind);

    let mut tasks = JoinSet::new();
    let mut done = vec![false; records.len()];
    for (idx, record) in records.iter().enumerate() {
        if !stage.is_eligible(record) {
            stats.skipped += 1;
            done[idx] = true;
            continue;
        }
        stats.attempted += 1;
        let stage = Arc::clone(&stage);
        let input = record.clone();
        tasks.spawn(async move {
            let (record, ok) = process_one(stage.as_ref(), input).await;
            (idx, record, ok)
        });
    }

    info!(
        subsystem = "pipeline",
        component = "runner",
        stage = %kind,
        attempted = stats.attempted,
        skipped = stats.skipped,
        "Stage started"
    );

    let mut records = records;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, record, ok)) => {
                notify(progress, kind, &record, ok);
                if ok {
                    stats.succeeded += 1;
                } else {
                    stats.failed += 1;
                }
                records[idx] = record;
                done[idx] = true;
            }
            Err(e) => error!(
                subsystem = "pipeline",
                component = "runner",
                stage = %kind,
                error = ?e,
                "Stage task aborted"
            ),
        }
    }

    // Tasks lost to an abort still leave a failed record behind.
    for (idx, record) in records.iter_mut().enumerate() {
        if done[idx] {
            continue;
        }
        let err = Error::Internal(format!("{} task was aborted", kind));
        stage.mark_failed(record, &err);
        stats.failed += 1;
        notify(progress, kind, record, false);
    }

    stats.duration_ms = started.elapsed().as_millis() as u64;
    info!(
        subsystem = "pipeline",
        component = "runner",
        stage = %kind,
        succeeded = stats.succeeded,
        failed = stats.failed,
        skipped = stats.skipped,
        duration_ms = stats.duration_ms,
        "Stage finished"
    );

    StageOutcome { records, stats }
}

async fn process_one(stage: &dyn Stage, input: TicketRecord) -> (TicketRecord, bool) {
    let kind = stage.kind();
    let outcome = AssertUnwindSafe(stage.process(&input)).catch_unwind().await;
    let err = match outcome {
        Ok(Ok(updated)) => {
            debug!(stage = %kind, ticket_id = %updated.ticket_id, "Stage succeeded");
            return (updated, true);
        }
        Ok(Err(err)) => err,
        Err(panic) => Error::Internal(format!(
            "{} stage panicked: {}",
            kind,
            panic_message(&*panic)
        )),
    };

    warn!(
        subsystem = "pipeline",
        component = "runner",
        stage = %kind,
        ticket_id = %input.ticket_id,
        error_kind = %err.kind(),
        error = %err,
        "Stage failed for ticket"
    );
    let mut record = input;
    stage.mark_failed(&mut record, &err);
    (record, false)
}

fn notify(progress: &dyn ProgressHook, kind: StageKind, record: &TicketRecord, ok: bool) {
    let call = std::panic::catch_unwind(AssertUnwindSafe(|| {
        progress.on_item(kind, &record.ticket_id, record, ok)
    }));
    if call.is_err() {
        warn!(stage = %kind, ticket_id = %record.ticket_id, "Progress hook panicked");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use triage_core::{ErrorKind, ProcessingStatus, StageFailure};

    /// Fails ids containing "fail", panics on ids containing "panic",
    /// skips ids starting with "skip".
    struct ScriptedStage;

    #[async_trait]
    impl Stage for ScriptedStage {
        fn kind(&self) -> StageKind {
            StageKind::Fetch
        }

        fn is_eligible(&self, record: &TicketRecord) -> bool {
            !record.ticket_id.starts_with("skip")
        }

        async fn process(&self, record: &TicketRecord) -> Result<TicketRecord> {
            tokio::task::yield_now().await;
            if record.ticket_id.contains("fail") {
                return Err(Error::Request("upstream 502".into()));
            }
            if record.ticket_id.contains("panic") {
                panic!("bad record {}", record.ticket_id);
            }
            let mut updated = record.clone();
            updated.subject = format!("processed {}", record.ticket_id);
            updated.processing_status = ProcessingStatus::Success;
            Ok(updated)
        }

        fn mark_failed(&self, record: &mut TicketRecord, err: &Error) {
            record.processing_status = ProcessingStatus::Failed;
            record.error = Some(StageFailure::from(err));
        }
    }

    fn records(ids: &[&str]) -> Vec<TicketRecord> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| TicketRecord::pending(*id, Some(i as u32 + 1)))
            .collect()
    }

    #[derive(Default)]
    struct RecordingHook {
        seen: Mutex<Vec<(String, bool)>>,
    }

    impl ProgressHook for RecordingHook {
        fn on_item(&self, _: StageKind, ticket_id: &str, _: &TicketRecord, success: bool) {
            self.seen.lock().unwrap().push((ticket_id.to_string(), success));
        }
    }

    #[tokio::test]
    async fn test_count_and_order_preserved() {
        let input = records(&["1", "fail-2", "3", "skip-4", "panic-5"]);
        let outcome = run_stage(Arc::new(ScriptedStage), input.clone(), &NoopProgress).await;

        assert_eq!(outcome.records.len(), input.len());
        let ids: Vec<_> = outcome.records.iter().map(|r| r.ticket_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "fail-2", "3", "skip-4", "panic-5"]);
        assert_eq!(outcome.stats.attempted, 4);
        assert_eq!(outcome.stats.succeeded, 2);
        assert_eq!(outcome.stats.failed, 2);
        assert_eq!(outcome.stats.skipped, 1);
    }

    #[tokio::test]
    async fn test_failed_record_keeps_input_and_gains_error() {
        let outcome = run_stage(Arc::new(ScriptedStage), records(&["fail-1"]), &NoopProgress).await;
        let record = &outcome.records[0];
        assert_eq!(record.processing_status, ProcessingStatus::Failed);
        assert_eq!(record.serial_no, Some(1));
        let error = record.error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::Request);
        assert!(error.message.contains("upstream 502"));
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let outcome = run_stage(
            Arc::new(ScriptedStage),
            records(&["panic-1", "2"]),
            &NoopProgress,
        )
        .await;

        let panicked = &outcome.records[0];
        assert_eq!(panicked.processing_status, ProcessingStatus::Failed);
        let error = panicked.error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::Internal);
        assert!(error.message.contains("bad record panic-1"));
        assert_eq!(outcome.records[1].subject, "processed 2");
    }

    #[tokio::test]
    async fn test_skipped_records_untouched() {
        let input = records(&["skip-1"]);
        let outcome = run_stage(Arc::new(ScriptedStage), input.clone(), &NoopProgress).await;
        assert_eq!(outcome.records, input);
        assert_eq!(outcome.stats.attempted, 0);
    }

    #[tokio::test]
    async fn test_hook_called_once_per_attempted_item() {
        let hook = RecordingHook::default();
        run_stage(
            Arc::new(ScriptedStage),
            records(&["1", "fail-2", "skip-3", "4"]),
            &hook,
        )
        .await;

        let mut seen = hook.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("1".to_string(), true),
                ("4".to_string(), true),
                ("fail-2".to_string(), false),
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_hook_does_not_corrupt_accounting() {
        let hook = |_: StageKind, id: &str, _: &TicketRecord, _: bool| {
            if id == "1" {
                panic!("hook exploded");
            }
        };
        let outcome = run_stage(Arc::new(ScriptedStage), records(&["1", "2"]), &hook).await;

        assert_eq!(outcome.stats.succeeded, 2);
        assert!(outcome
            .records
            .iter()
            .all(|r| r.processing_status == ProcessingStatus::Success));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_event_carries_schema_fields() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        run_stage(Arc::new(ScriptedStage), records(&["fail-1"]), &NoopProgress).await;

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|l| l.contains("Stage failed for ticket"))
            .expect("failure event logged");
        for field in [
            "subsystem=",
            "component=",
            "stage=fetch",
            "ticket_id=fail-1",
            "error_kind=request",
            "error=",
        ] {
            assert!(line.contains(field), "missing {field} in {line}");
        }
    }

    #[tokio::test]
    async fn test_empty_input() {
        let outcome = run_stage(Arc::new(ScriptedStage), Vec::new(), &NoopProgress).await;
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.attempted, 0);
    }

    #[test]
    fn test_stage_kind_names() {
        assert_eq!(StageKind::Diagnose.as_str(), "diagnose");
        assert_eq!(
            serde_json::to_string(&StageKind::Synthesize).unwrap(),
            "\"synthesize\""
        );
    }
}
