//! # Cleanup Module
//!
//! Drives deletion of reclaimable entries through the tool boundary.
//!
//! Deletions are strictly sequential, in listing order, one attempt per
//! entry. Outcomes are recorded and the run always moves on to the next
//! entry; nothing here is fatal. Cancellation stops issuing further
//! calls but never rolls back completed deletions.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::core::report::ReportEntry;
use crate::core::tool::{DeleteOutcome, DriverTool};
use crate::events::{DeleteEvent, Event, EventSender};

/// One deletion attempt and how it went
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionRecord {
    pub published_name: String,
    pub size_bytes: u64,
    pub outcome: DeleteOutcome,
}

/// Accounting for a whole cleanup run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupSummary {
    /// Entries a deletion call was issued for
    pub attempted: usize,
    pub deleted: usize,
    pub refused_in_use: usize,
    pub failed: usize,
    /// Bytes actually freed; only deleted entries count
    pub reclaimed_bytes: u64,
    /// Bytes the targets promised up front
    pub expected_bytes: u64,
    /// True when cancellation stopped the run early
    pub cancelled: bool,
    pub duration_ms: u64,
}

/// Result of a cleanup run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupResult {
    pub records: Vec<DeletionRecord>,
    pub summary: CleanupSummary,
}

/// Run a cleanup without progress reporting or cancellation.
pub fn run_cleanup(tool: &dyn DriverTool, targets: &[ReportEntry]) -> CleanupResult {
    run_cleanup_with_events(
        tool,
        targets,
        &AtomicBool::new(false),
        &crate::events::null_sender(),
    )
}

/// Delete the given entries one at a time, in the order given.
///
/// The cancel flag is checked before each call. A tool-level error on
/// one entry (the utility vanished mid-run, say) is recorded as a
/// failed outcome for that entry and the run continues.
pub fn run_cleanup_with_events(
    tool: &dyn DriverTool,
    targets: &[ReportEntry],
    cancel: &AtomicBool,
    events: &EventSender,
) -> CleanupResult {
    let start = Instant::now();
    let expected_bytes: u64 = targets.iter().map(|e| e.size_bytes).sum();
    events.send(Event::Delete(DeleteEvent::Started {
        total_entries: targets.len(),
        expected_bytes,
    }));

    let mut records = Vec::with_capacity(targets.len());
    let mut summary = CleanupSummary {
        expected_bytes,
        ..Default::default()
    };

    for entry in targets {
        if cancel.load(Ordering::Relaxed) {
            summary.cancelled = true;
            break;
        }

        events.send(Event::Delete(DeleteEvent::Attempting {
            published_name: entry.published_name.clone(),
        }));

        let outcome = match tool.delete_driver(&entry.published_name) {
            Ok(outcome) => outcome,
            Err(error) => DeleteOutcome::Failed {
                code: None,
                output: error.to_string(),
            },
        };

        summary.attempted += 1;
        match &outcome {
            DeleteOutcome::Deleted => {
                summary.deleted += 1;
                summary.reclaimed_bytes += entry.size_bytes;
            }
            DeleteOutcome::RefusedInUse => summary.refused_in_use += 1,
            DeleteOutcome::Failed { .. } => summary.failed += 1,
        }

        events.send(Event::Delete(DeleteEvent::Outcome {
            published_name: entry.published_name.clone(),
            outcome: outcome.clone(),
            size_bytes: entry.size_bytes,
        }));

        records.push(DeletionRecord {
            published_name: entry.published_name.clone(),
            size_bytes: entry.size_bytes,
            outcome,
        });
    }

    summary.duration_ms = start.elapsed().as_millis() as u64;
    events.send(Event::Delete(DeleteEvent::Completed {
        reclaimed_bytes: summary.reclaimed_bytes,
        expected_bytes,
    }));

    CleanupResult { records, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::events::EventChannel;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, Mutex};

    struct ScriptedTool {
        outcomes: HashMap<String, DeleteOutcome>,
        calls: Mutex<Vec<String>>,
        cancel_after_first: Option<Arc<AtomicBool>>,
    }

    impl ScriptedTool {
        fn new(outcomes: &[(&str, DeleteOutcome)]) -> Self {
            Self {
                outcomes: outcomes
                    .iter()
                    .map(|(name, outcome)| (name.to_string(), outcome.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
                cancel_after_first: None,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DriverTool for ScriptedTool {
        fn enumerate(&self) -> Result<String, ToolError> {
            Ok(String::new())
        }

        fn delete_driver(&self, published_name: &str) -> Result<DeleteOutcome, ToolError> {
            self.calls.lock().unwrap().push(published_name.to_string());
            if let Some(cancel) = &self.cancel_after_first {
                cancel.store(true, Ordering::Relaxed);
            }
            self.outcomes
                .get(published_name)
                .cloned()
                .ok_or(ToolError::NotFound)
        }
    }

    fn target(name: &str, size_bytes: u64) -> ReportEntry {
        ReportEntry {
            published_name: name.to_string(),
            provider: "Contoso".to_string(),
            class_name: "Display".to_string(),
            raw_date: "01/02/2020".to_string(),
            raw_version: "1.0".to_string(),
            folder_path: PathBuf::from(format!("/store/{name}_x")),
            size_bytes,
            duplicate_of: Some("oem0.inf".to_string()),
        }
    }

    #[test]
    fn deletes_sequentially_in_listing_order() {
        let tool = ScriptedTool::new(&[
            ("oem1.inf", DeleteOutcome::Deleted),
            ("oem2.inf", DeleteOutcome::Deleted),
            ("oem3.inf", DeleteOutcome::Deleted),
        ]);
        let targets = vec![
            target("oem2.inf", 10),
            target("oem1.inf", 20),
            target("oem3.inf", 30),
        ];

        let result = run_cleanup(&tool, &targets);

        assert_eq!(tool.calls(), vec!["oem2.inf", "oem1.inf", "oem3.inf"]);
        assert_eq!(result.summary.deleted, 3);
        assert_eq!(result.summary.reclaimed_bytes, 60);
        assert_eq!(result.summary.expected_bytes, 60);
        assert!(!result.summary.cancelled);
    }

    #[test]
    fn refusal_does_not_count_toward_reclaimed() {
        let tool = ScriptedTool::new(&[
            ("oem1.inf", DeleteOutcome::Deleted),
            ("oem2.inf", DeleteOutcome::RefusedInUse),
        ]);
        let targets = vec![target("oem1.inf", 300), target("oem2.inf", 500)];

        let result = run_cleanup(&tool, &targets);

        assert_eq!(result.summary.reclaimed_bytes, 300);
        assert_eq!(result.summary.expected_bytes, 800);
        assert_eq!(result.summary.deleted, 1);
        assert_eq!(result.summary.refused_in_use, 1);
        assert_eq!(result.summary.attempted, 2);
    }

    #[test]
    fn failure_is_recorded_and_the_run_continues() {
        let tool = ScriptedTool::new(&[
            (
                "oem1.inf",
                DeleteOutcome::Failed {
                    code: Some(5),
                    output: "access denied".to_string(),
                },
            ),
            ("oem2.inf", DeleteOutcome::Deleted),
        ]);
        let targets = vec![target("oem1.inf", 100), target("oem2.inf", 200)];

        let result = run_cleanup(&tool, &targets);

        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.summary.deleted, 1);
        assert_eq!(result.summary.reclaimed_bytes, 200);
        assert!(matches!(
            result.records[0].outcome,
            DeleteOutcome::Failed { code: Some(5), .. }
        ));
    }

    #[test]
    fn tool_error_on_one_entry_is_not_fatal() {
        // No scripted outcome for oem9 makes the fake return Err
        let tool = ScriptedTool::new(&[("oem2.inf", DeleteOutcome::Deleted)]);
        let targets = vec![target("oem9.inf", 100), target("oem2.inf", 200)];

        let result = run_cleanup(&tool, &targets);

        assert_eq!(result.summary.attempted, 2);
        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.summary.deleted, 1);
        assert!(matches!(
            result.records[0].outcome,
            DeleteOutcome::Failed { code: None, .. }
        ));
    }

    #[test]
    fn cancellation_stops_before_the_next_call() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut tool = ScriptedTool::new(&[
            ("oem1.inf", DeleteOutcome::Deleted),
            ("oem2.inf", DeleteOutcome::Deleted),
        ]);
        tool.cancel_after_first = Some(Arc::clone(&cancel));
        let targets = vec![target("oem1.inf", 100), target("oem2.inf", 200)];

        let result = run_cleanup_with_events(
            &tool,
            &targets,
            &cancel,
            &crate::events::null_sender(),
        );

        assert_eq!(tool.calls(), vec!["oem1.inf"]);
        assert!(result.summary.cancelled);
        assert_eq!(result.summary.attempted, 1);
        assert_eq!(result.summary.reclaimed_bytes, 100);
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn empty_target_list_still_reports_lifecycle() {
        let tool = ScriptedTool::new(&[]);
        let (sender, receiver) = EventChannel::new();

        let result = run_cleanup_with_events(
            &tool,
            &[],
            &AtomicBool::new(false),
            &sender,
        );
        drop(sender);

        assert_eq!(result.summary.attempted, 0);
        assert_eq!(result.summary.reclaimed_bytes, 0);

        let events: Vec<Event> = receiver.iter().collect();
        assert!(matches!(
            events.first(),
            Some(Event::Delete(DeleteEvent::Started { total_entries: 0, .. }))
        ));
        assert!(matches!(
            events.last(),
            Some(Event::Delete(DeleteEvent::Completed { reclaimed_bytes: 0, .. }))
        ));
    }

    #[test]
    fn outcome_events_carry_sizes() {
        let tool = ScriptedTool::new(&[("oem1.inf", DeleteOutcome::Deleted)]);
        let (sender, receiver) = EventChannel::new();

        run_cleanup_with_events(
            &tool,
            &[target("oem1.inf", 4242)],
            &AtomicBool::new(false),
            &sender,
        );
        drop(sender);

        let saw_outcome = receiver.iter().any(|event| {
            matches!(
                event,
                Event::Delete(DeleteEvent::Outcome {
                    size_bytes: 4242,
                    outcome: DeleteOutcome::Deleted,
                    ..
                })
            )
        });
        assert!(saw_outcome);
    }
}
