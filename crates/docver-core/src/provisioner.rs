//! Version ledger structure provisioning
//!
//! Ensures the "Version History" section, its rich-text block, the embedded
//! ledger table and the table's backing sheet exist, then (re)writes the
//! header row. Every step re-discovers existing structure by name or type
//! before creating anything, so a run that failed part-way can be re-run
//! end to end without duplicating sections or tables.
//!
//! The one non-idempotent sub-step is the table insert, which is guarded by
//! the rich-text revision. On conflict the caller restarts from
//! [`StructureProvisioner::fetch_section_rich_text`].

use crate::error::{WorkflowError, WorkflowResult};
use crate::services::{Collaborators, DocumentService, RichTextService, SpreadsheetService, TableService};
use crate::types::{
    CellRange, FileId, NewSection, RichTextBlock, RichTextEdit, RichTextElement, RichTextId,
    SectionId, SheetId, TableRef, LEDGER_HEADERS, VERSION_HISTORY_SECTION,
};
use std::sync::Arc;

/// Identifiers of a provisioned version ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLedger {
    /// "Version History" section
    pub section: SectionId,
    /// Rich-text block of the section, at the revision fetched this run
    pub rich_text: RichTextBlock,
    /// Ledger table
    pub table: TableRef,
    /// Sheet backing the table
    pub sheet: SheetId,
}

/// Creates or discovers the version ledger structure
#[derive(Clone)]
pub struct StructureProvisioner {
    documents: Arc<dyn DocumentService>,
    rich_text: Arc<dyn RichTextService>,
    tables: Arc<dyn TableService>,
    spreadsheets: Arc<dyn SpreadsheetService>,
}

impl StructureProvisioner {
    /// Create provisioner over the workflow's collaborators
    #[must_use]
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            documents: collaborators.documents.clone(),
            rich_text: collaborators.rich_text.clone(),
            tables: collaborators.tables.clone(),
            spreadsheets: collaborators.spreadsheets.clone(),
        }
    }

    /// Run every provisioning step in order
    ///
    /// # Errors
    /// The first failing step's error; nothing is rolled back.
    pub async fn provision(&self, document: &FileId) -> WorkflowResult<VersionLedger> {
        let section = self.ensure_section(document).await?;
        let rich_text = self.fetch_section_rich_text(document, &section).await?;
        let table = self.ensure_table(&rich_text).await?;
        let sheet = self.fetch_table_sheet_id(&table).await?;
        self.ensure_headers(document, &sheet).await?;

        Ok(VersionLedger {
            section,
            rich_text,
            table,
            sheet,
        })
    }

    /// Find or create the "Version History" section
    ///
    /// # Errors
    /// Collaborator failures from listing or creating sections.
    pub async fn ensure_section(&self, document: &FileId) -> WorkflowResult<SectionId> {
        let sections = self.documents.list_sections(document).await?;

        if let Some(existing) = sections.into_iter().find(|s| s.name == VERSION_HISTORY_SECTION) {
            tracing::info!(section = %existing.id, "Version History section exists");
            return Ok(existing.id);
        }

        let created = self
            .documents
            .create_section(document, &NewSection::version_history())
            .await?;
        tracing::info!(section = %created.id, "Version History section created");
        Ok(created.id)
    }

    /// Fetch the section's rich-text block and current revision
    ///
    /// # Errors
    /// Collaborator failures.
    pub async fn fetch_section_rich_text(
        &self,
        document: &FileId,
        section: &SectionId,
    ) -> WorkflowResult<RichTextBlock> {
        let block = self.rich_text.section_rich_text(document, section).await?;
        tracing::debug!(rich_text = %block.id, revision = %block.revision, "fetched section rich text");
        Ok(block)
    }

    /// Find or insert the ledger table
    ///
    /// The insert uses `block.revision` as fetched; a stale revision fails
    /// with a conflict and is not retried here.
    ///
    /// # Errors
    /// Collaborator failures, or [`WorkflowError::TableNotFound`] when the
    /// table is still missing after a successful insert.
    pub async fn ensure_table(&self, block: &RichTextBlock) -> WorkflowResult<TableRef> {
        if let Some(table) = self.discover_table(&block.id).await? {
            tracing::info!(table = %table.id, revision = %table.revision, "version table exists");
            return Ok(table);
        }

        tracing::info!(rich_text = %block.id, "no table found in the Version History section");
        self.rich_text
            .edit_rich_text(block, &[RichTextEdit::ledger_table()])
            .await?;

        // The edit response does not carry the final table id.
        let table = self
            .discover_table(&block.id)
            .await?
            .ok_or_else(|| WorkflowError::TableNotFound {
                rich_text: block.id.clone(),
            })?;
        tracing::info!(table = %table.id, "version table created");
        Ok(table)
    }

    /// First table element of a rich-text block
    async fn discover_table(&self, rich_text: &RichTextId) -> WorkflowResult<Option<TableRef>> {
        let elements = self.rich_text.elements(rich_text).await?;
        tracing::debug!(count = elements.len(), "rich text elements");

        Ok(elements
            .into_iter()
            .find_map(|element| match element {
                RichTextElement::Table(table) => Some(table),
                RichTextElement::Other(_) => None,
            }))
    }

    /// Sheet backing a table
    ///
    /// # Errors
    /// Collaborator failures.
    pub async fn fetch_table_sheet_id(&self, table: &TableRef) -> WorkflowResult<SheetId> {
        let properties = self.tables.properties(&table.id).await?;
        tracing::debug!(table = %table.id, sheet = %properties.sheet, "version table sheet");
        Ok(properties.sheet)
    }

    /// Overwrite the header row
    ///
    /// Always written, never appended, so a header row is never duplicated.
    ///
    /// # Errors
    /// Collaborator failures.
    pub async fn ensure_headers(&self, document: &FileId, sheet: &SheetId) -> WorkflowResult<()> {
        let headers = LEDGER_HEADERS.iter().map(|h| (*h).to_string()).collect();
        self.spreadsheets
            .update_range(document, sheet, CellRange::ledger_row(0), vec![headers])
            .await?;
        tracing::info!("table headers updated");
        Ok(())
    }
}

impl std::fmt::Debug for StructureProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureProvisioner").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use crate::services::{MockDocumentService, MockRichTextService, MockSpreadsheetService};
    use crate::types::{Revision, Section, TableId};

    fn block() -> RichTextBlock {
        RichTextBlock {
            id: RichTextId::from("rt-1"),
            revision: Revision::from("7"),
        }
    }

    #[tokio::test]
    async fn ensure_section_reuses_existing_by_name() {
        let mut documents = MockDocumentService::new();
        documents.expect_list_sections().times(1).returning(|_| {
            Ok(vec![
                Section {
                    id: SectionId::from("s-1"),
                    name: "Summary".into(),
                },
                Section {
                    id: SectionId::from("s-2"),
                    name: VERSION_HISTORY_SECTION.into(),
                },
            ])
        });
        documents.expect_create_section().never();

        let provisioner = StructureProvisioner::new(&Collaborators {
            documents: Arc::new(documents),
            ..Collaborators::unexpected()
        });

        let section = provisioner.ensure_section(&FileId::from("doc")).await.unwrap();
        assert_eq!(section, SectionId::from("s-2"));
    }

    #[tokio::test]
    async fn ensure_section_creates_first_non_printing_section() {
        let mut documents = MockDocumentService::new();
        documents.expect_list_sections().returning(|_| Ok(vec![]));
        documents
            .expect_create_section()
            .withf(|_, section| section.name == VERSION_HISTORY_SECTION && section.index == 0 && section.non_printing)
            .times(1)
            .returning(|_, section| {
                Ok(Section {
                    id: SectionId::from("s-new"),
                    name: section.name.clone(),
                })
            });

        let provisioner = StructureProvisioner::new(&Collaborators {
            documents: Arc::new(documents),
            ..Collaborators::unexpected()
        });

        let section = provisioner.ensure_section(&FileId::from("doc")).await.unwrap();
        assert_eq!(section, SectionId::from("s-new"));
    }

    #[tokio::test]
    async fn ensure_table_takes_first_table_element() {
        let mut rich_text = MockRichTextService::new();
        rich_text.expect_elements().returning(|_| {
            Ok(vec![
                RichTextElement::Other("paragraph".into()),
                RichTextElement::Table(TableRef {
                    id: TableId::from("t-1"),
                    revision: Revision::from("1"),
                }),
                RichTextElement::Table(TableRef {
                    id: TableId::from("t-2"),
                    revision: Revision::from("1"),
                }),
            ])
        });
        rich_text.expect_edit_rich_text().never();

        let provisioner = StructureProvisioner::new(&Collaborators {
            rich_text: Arc::new(rich_text),
            ..Collaborators::unexpected()
        });

        let table = provisioner.ensure_table(&block()).await.unwrap();
        assert_eq!(table.id, TableId::from("t-1"));
    }

    #[tokio::test]
    async fn ensure_table_conflict_is_not_retried() {
        let mut rich_text = MockRichTextService::new();
        rich_text.expect_elements().times(1).returning(|_| Ok(vec![]));
        rich_text
            .expect_edit_rich_text()
            .times(1)
            .returning(|_, _| Err(CollaboratorError::Conflict("stale revision".into())));

        let provisioner = StructureProvisioner::new(&Collaborators {
            rich_text: Arc::new(rich_text),
            ..Collaborators::unexpected()
        });

        let err = provisioner.ensure_table(&block()).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn ensure_table_fails_when_insert_leaves_no_table() {
        let mut rich_text = MockRichTextService::new();
        rich_text.expect_elements().times(2).returning(|_| Ok(vec![]));
        rich_text
            .expect_edit_rich_text()
            .withf(|block, edits| {
                block.revision.as_str() == "7" && edits.len() == 1 && edits[0] == RichTextEdit::ledger_table()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let provisioner = StructureProvisioner::new(&Collaborators {
            rich_text: Arc::new(rich_text),
            ..Collaborators::unexpected()
        });

        let err = provisioner.ensure_table(&block()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::TableNotFound { .. }));
    }

    #[tokio::test]
    async fn ensure_headers_overwrites_first_row() {
        let mut spreadsheets = MockSpreadsheetService::new();
        spreadsheets
            .expect_update_range()
            .withf(|doc, sheet, range, values| {
                doc.as_str() == "doc"
                    && sheet.as_str() == "sheet-1"
                    && range.to_string() == "A1:F1"
                    && values.len() == 1
                    && values[0] == LEDGER_HEADERS
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let provisioner = StructureProvisioner::new(&Collaborators {
            spreadsheets: Arc::new(spreadsheets),
            ..Collaborators::unexpected()
        });

        provisioner
            .ensure_headers(&FileId::from("doc"), &SheetId::from("sheet-1"))
            .await
            .unwrap();
    }
}
