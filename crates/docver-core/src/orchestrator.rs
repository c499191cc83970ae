//! Version workflow orchestrator
//!
//! Sequences one run:
//! 1. Locate the source document's container
//! 2. Resolve the trigger user
//! 3. Provision the version ledger (section → rich text → table → sheet → headers)
//! 4. Resolve the next version
//! 5. Copy the document into the archive folder
//! 6. Record the version row
//! 7. Strip versioning automations from the snapshot
//!
//! Each step consumes the previous step's output, so the order is fixed.
//! The first failure aborts the run; no partial cleanup is attempted.

use crate::automation::{AutomationCleaner, TriggerUserResolver};
use crate::config::WorkflowConfig;
use crate::error::WorkflowResult;
use crate::provisioner::{StructureProvisioner, VersionLedger};
use crate::recorder::TableRecorder;
use crate::resolver::VersionResolver;
use crate::services::{Collaborators, DocumentService};
use crate::snapshot::SnapshotCreator;
use crate::types::{AutomationId, FileDetail, ResourceId, SourceDocument, VersionRow};
use crate::version::VersionInfo;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Outcome of one successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRunReport {
    /// Correlation id of the run, also recorded on its tracing span
    pub run_id: Uuid,
    /// Source document and its container
    pub source: SourceDocument,
    /// Ledger structure used for the run
    pub ledger: VersionLedger,
    /// Version assigned to the snapshot
    pub version: VersionInfo,
    /// The new snapshot
    pub snapshot: FileDetail,
    /// Row written to the ledger
    pub row: VersionRow,
    /// Automations removed from the snapshot
    pub removed_automations: Vec<AutomationId>,
}

/// Runs the create-version workflow for one document
pub struct VersionWorkflow {
    config: WorkflowConfig,
    documents: Arc<dyn DocumentService>,
    trigger_users: TriggerUserResolver,
    provisioner: StructureProvisioner,
    resolver: VersionResolver,
    snapshots: SnapshotCreator,
    recorder: TableRecorder,
    cleaner: AutomationCleaner,
}

impl VersionWorkflow {
    /// Create workflow
    #[must_use]
    pub fn new(config: WorkflowConfig, collaborators: &Collaborators) -> Self {
        Self {
            config,
            documents: collaborators.documents.clone(),
            trigger_users: TriggerUserResolver::new(collaborators),
            provisioner: StructureProvisioner::new(collaborators),
            resolver: VersionResolver::new(collaborators),
            snapshots: SnapshotCreator::new(collaborators),
            recorder: TableRecorder::new(collaborators),
            cleaner: AutomationCleaner::new(collaborators),
        }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Execute one run
    ///
    /// # Errors
    /// The first failing step's error. A failure after the snapshot copy
    /// leaves the copy (and possibly an inserted row) behind; re-running
    /// then creates another snapshot.
    pub async fn run(&self) -> WorkflowResult<VersionRunReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("create_version", %run_id, document = %self.config.document_id);
        self.run_steps(run_id).instrument(span).await
    }

    async fn run_steps(&self, run_id: Uuid) -> WorkflowResult<VersionRunReport> {
        let document = &self.config.document_id;

        let container = self.documents.container_of(document).await?;
        let source = SourceDocument {
            document: document.clone(),
            container,
        };
        tracing::info!(container = %source.container, "source document located");

        let triggered_by = self
            .trigger_users
            .resolve_trigger_user(&source.resource(), self.config.trigger_user_id.as_ref())
            .await?;

        let ledger = self.provisioner.provision(&source.document).await?;

        let version = self.resolver.resolve_next(&source.document, &ledger.sheet).await?;

        let mut snapshot = self.snapshots.create_snapshot(&source).await?;
        if self.config.rename_snapshot {
            snapshot = self.snapshots.label_snapshot(snapshot, &version).await?;
        }

        let row = self
            .recorder
            .record_version(&self.config, &ledger, &version, &snapshot, &triggered_by)
            .await?;

        let removed_automations = self
            .cleaner
            .strip_automations(&ResourceId::for_document(&snapshot.id))
            .await?;
        tracing::info!(%version, snapshot = %snapshot.id, "version created");

        Ok(VersionRunReport {
            run_id,
            source,
            ledger,
            version,
            snapshot,
            row,
            removed_automations,
        })
    }
}

impl std::fmt::Debug for VersionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionWorkflow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
