//! Version ledger row recording

use crate::config::WorkflowConfig;
use crate::error::WorkflowResult;
use crate::provisioner::VersionLedger;
use crate::services::{Collaborators, SpreadsheetService, TableService};
use crate::types::{CellRange, FileDetail, FileId, TableEdit, VersionRow, DEFAULT_SELECTION};
use crate::version::VersionInfo;
use std::sync::Arc;

/// Row new versions are written to
const NEWEST_ROW: u32 = 1;

/// Writes one ledger row per created version
#[derive(Clone)]
pub struct TableRecorder {
    tables: Arc<dyn TableService>,
    spreadsheets: Arc<dyn SpreadsheetService>,
}

impl TableRecorder {
    /// Create recorder
    #[must_use]
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            tables: collaborators.tables.clone(),
            spreadsheets: collaborators.spreadsheets.clone(),
        }
    }

    /// Insert a row directly beneath the header and fill it
    ///
    /// Existing rows shift down by one; the ledger is never re-sorted.
    ///
    /// # Errors
    /// Collaborator failures.
    pub async fn record_version(
        &self,
        config: &WorkflowConfig,
        ledger: &VersionLedger,
        version: &VersionInfo,
        snapshot: &FileDetail,
        triggered_by: &str,
    ) -> WorkflowResult<VersionRow> {
        self.tables
            .edit_table(&ledger.table.id, &[TableEdit::row_below_header()])
            .await?;

        let row = VersionRow {
            version: version.to_string(),
            doc_name: snapshot.name.clone(),
            link: config.document_link(&snapshot.id),
            created_by: triggered_by.to_string(),
            created_at: snapshot.created_at.clone(),
            selected: DEFAULT_SELECTION.to_string(),
        };

        self.write_row(&config.document_id, ledger, row.clone()).await?;
        tracing::info!(version = %row.version, "version row recorded");
        Ok(row)
    }

    async fn write_row(&self, document: &FileId, ledger: &VersionLedger, row: VersionRow) -> WorkflowResult<()> {
        self.spreadsheets
            .update_range(
                document,
                &ledger.sheet,
                CellRange::ledger_row(NEWEST_ROW),
                vec![row.into_cells()],
            )
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for TableRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRecorder").finish_non_exhaustive()
    }
}
