//! Pipeline execution implementation.

use crate::core::catalog::parse_enumeration;
use crate::core::classifier::classify;
use crate::core::report::{build_report, CleanupReport};
use crate::core::repository::{correlate_with_events, RepositoryConfig};
use crate::core::tool::{DriverTool, PnpUtil};
use crate::error::DriverCleanerError;
use crate::events::{
    null_sender, EnumerateEvent, Event, EventSender, PipelineEvent, PipelinePhase,
    PipelineSummary,
};
use std::path::PathBuf;
use std::time::Instant;

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// The finished report, sorted and with duplicates marked
    pub report: CleanupReport,
    /// Staged drivers the utility enumerated
    pub total_drivers: usize,
    /// Drivers superseded by a newer member of their class
    pub superseded_drivers: usize,
    /// Non-fatal anomalies encountered along the way
    pub warnings: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Builder for the pipeline
pub struct PipelineBuilder {
    repository: Option<RepositoryConfig>,
    tool: Option<Box<dyn DriverTool>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            repository: None,
            tool: None,
        }
    }

    /// Point the correlator at explicit filesystem locations
    pub fn repository(mut self, config: RepositoryConfig) -> Self {
        self.repository = Some(config);
        self
    }

    /// Derive the repository locations from a Windows installation root
    pub fn system_root(self, root: impl Into<PathBuf>) -> Self {
        self.repository(RepositoryConfig::from_system_root(root))
    }

    /// Replace the driver tool (tests substitute a scripted one)
    pub fn tool(mut self, tool: Box<dyn DriverTool>) -> Self {
        self.tool = Some(tool);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline {
            repository: self.repository,
            tool: self.tool.unwrap_or_else(|| Box::new(PnpUtil::new())),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The duplicate detection pipeline
pub struct Pipeline {
    repository: Option<RepositoryConfig>,
    tool: Box<dyn DriverTool>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, DriverCleanerError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(
        &self,
        events: &EventSender,
    ) -> Result<PipelineResult, DriverCleanerError> {
        events.send(Event::Pipeline(PipelineEvent::Started));

        match self.execute(events) {
            Ok(result) => Ok(result),
            Err(error) => {
                events.send(Event::Pipeline(PipelineEvent::Error {
                    message: error.to_string(),
                }));
                Err(error)
            }
        }
    }

    fn execute(&self, events: &EventSender) -> Result<PipelineResult, DriverCleanerError> {
        let start_time = Instant::now();

        // Phase 1: Enumerating
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Enumerating,
        }));
        events.send(Event::Enumerate(EnumerateEvent::Started));

        let output = self.tool.enumerate()?;
        let catalog = parse_enumeration(&output)?;
        let total_drivers = catalog.len();

        events.send(Event::Enumerate(EnumerateEvent::Completed { total_drivers }));

        if catalog.is_empty() {
            let duration_ms = start_time.elapsed().as_millis() as u64;
            events.send(Event::Pipeline(PipelineEvent::Completed {
                summary: PipelineSummary {
                    total_drivers: 0,
                    superseded_drivers: 0,
                    repository_entries: 0,
                    reclaimable_entries: 0,
                    reclaimable_bytes: 0,
                    duration_ms,
                },
            }));

            return Ok(PipelineResult {
                report: CleanupReport::default(),
                total_drivers: 0,
                superseded_drivers: 0,
                warnings: Vec::new(),
                duration_ms,
            });
        }

        let repository = self.resolve_repository()?;

        // Phase 2: Analyzing. Classification works on the catalog alone
        // and correlation on the filesystem alone, so the two run side
        // by side.
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Analyzing,
        }));

        let (duplicates, correlation) = rayon::join(
            || classify(&catalog),
            || correlate_with_events(&repository, events),
        );
        let correlation = correlation?;

        let mut warnings = Vec::new();
        for warning in &correlation.warnings {
            warnings.push(warning.to_string());
        }

        // Phase 3: Reporting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Reporting,
        }));

        let report = build_report(&catalog, &duplicates, correlation.entries);
        let duration_ms = start_time.elapsed().as_millis() as u64;

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_drivers,
                superseded_drivers: duplicates.len(),
                repository_entries: report.entries.len(),
                reclaimable_entries: report.reclaimable_count(),
                reclaimable_bytes: report.reclaimable_bytes,
                duration_ms,
            },
        }));

        Ok(PipelineResult {
            report,
            total_drivers,
            superseded_drivers: duplicates.len(),
            warnings,
            duration_ms,
        })
    }

    fn resolve_repository(&self) -> Result<RepositoryConfig, DriverCleanerError> {
        if let Some(config) = &self.repository {
            return Ok(config.clone());
        }
        match std::env::var_os("SystemRoot") {
            Some(root) => Ok(RepositoryConfig::from_system_root(PathBuf::from(root))),
            None => Err(DriverCleanerError::Config(
                "no repository configured and SystemRoot is not set".to_string(),
            )),
        }
    }
}
