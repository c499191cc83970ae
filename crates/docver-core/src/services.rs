//! Collaborator service contracts
//!
//! Every remote dependency of the workflow sits behind one of these traits.
//! Implementations decode wire responses into the typed values of
//! [`crate::types`] and map failures to [`CollaboratorError`].

use crate::error::CollaboratorError;
use crate::types::{
    Automation, AutomationId, CellRange, FileDetail, FileId, FileKind, NewSection, ResourceId,
    RichTextBlock, RichTextEdit, RichTextElement, RichTextId, Section, SectionId, SheetId,
    SheetValues, TableEdit, TableId, TableProperties, User,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Result of a collaborator call
pub type ServiceResult<T> = Result<T, CollaboratorError>;

/// Document structure
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// All sections of a document, in document order
    async fn list_sections(&self, document: &FileId) -> ServiceResult<Vec<Section>>;

    /// Create a section
    async fn create_section(&self, document: &FileId, section: &NewSection) -> ServiceResult<Section>;

    /// Container holding the document
    async fn container_of(&self, document: &FileId) -> ServiceResult<FileId>;
}

/// Rich-text content of sections
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RichTextService: Send + Sync {
    /// Rich-text block of a section with its current revision
    async fn section_rich_text(
        &self,
        document: &FileId,
        section: &SectionId,
    ) -> ServiceResult<RichTextBlock>;

    /// Elements of a rich-text block, in content order
    async fn elements(&self, rich_text: &RichTextId) -> ServiceResult<Vec<RichTextElement>>;

    /// Apply edits against a revision
    ///
    /// A stale revision fails with [`CollaboratorError::Conflict`].
    async fn edit_rich_text(&self, block: &RichTextBlock, edits: &[RichTextEdit]) -> ServiceResult<()>;
}

/// Embedded tables
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableService: Send + Sync {
    /// Table properties
    async fn properties(&self, table: &TableId) -> ServiceResult<TableProperties>;

    /// Apply structural edits (row insertion)
    async fn edit_table(&self, table: &TableId, edits: &[TableEdit]) -> ServiceResult<()>;
}

/// Spreadsheet data behind tables
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Raw values of a sheet, header row first
    async fn raw_values(&self, spreadsheet: &FileId, sheet: &SheetId) -> ServiceResult<SheetValues>;

    /// Overwrite a cell range
    async fn update_range(
        &self,
        spreadsheet: &FileId,
        sheet: &SheetId,
        range: CellRange,
        values: SheetValues,
    ) -> ServiceResult<()>;
}

/// File storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileService: Send + Sync {
    /// Files in a container matching name and kind
    async fn list_files(
        &self,
        container: &FileId,
        name: &str,
        kind: &FileKind,
    ) -> ServiceResult<Vec<FileDetail>>;

    /// Create a folder
    async fn create_folder(&self, container: &FileId, name: &str) -> ServiceResult<FileDetail>;

    /// Copy a file into a container, returning the id of the copy
    async fn copy_file(&self, file: &FileId, destination: &FileId) -> ServiceResult<FileId>;

    /// File detail record
    async fn file_detail(&self, file: &FileId) -> ServiceResult<FileDetail>;

    /// Rename a file
    async fn rename_file(&self, file: &FileId, name: &str) -> ServiceResult<()>;
}

/// Trigger automations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AutomationService: Send + Sync {
    /// Automations bound to a resource
    async fn list_automations(&self, resource: &ResourceId) -> ServiceResult<Vec<Automation>>;

    /// Delete an automation
    async fn delete_automation(&self, automation: &AutomationId) -> ServiceResult<()>;
}

/// Organization user directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectoryService: Send + Sync {
    /// All users
    async fn list_users(&self) -> ServiceResult<Vec<User>>;
}

/// Every collaborator the workflow talks to
#[derive(Clone)]
pub struct Collaborators {
    /// Document structure
    pub documents: Arc<dyn DocumentService>,
    /// Rich-text content
    pub rich_text: Arc<dyn RichTextService>,
    /// Tables
    pub tables: Arc<dyn TableService>,
    /// Spreadsheets
    pub spreadsheets: Arc<dyn SpreadsheetService>,
    /// File storage
    pub files: Arc<dyn FileService>,
    /// Automations
    pub automations: Arc<dyn AutomationService>,
    /// User directory
    pub users: Arc<dyn UserDirectoryService>,
}

impl Collaborators {
    /// Use one backend for every collaborator
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: DocumentService
            + RichTextService
            + TableService
            + SpreadsheetService
            + FileService
            + AutomationService
            + UserDirectoryService
            + 'static,
    {
        Self {
            documents: backend.clone(),
            rich_text: backend.clone(),
            tables: backend.clone(),
            spreadsheets: backend.clone(),
            files: backend.clone(),
            automations: backend.clone(),
            users: backend,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

#[cfg(test)]
impl Collaborators {
    /// Mocks without expectations; any call panics
    pub(crate) fn unexpected() -> Self {
        Self {
            documents: Arc::new(MockDocumentService::new()),
            rich_text: Arc::new(MockRichTextService::new()),
            tables: Arc::new(MockTableService::new()),
            spreadsheets: Arc::new(MockSpreadsheetService::new()),
            files: Arc::new(MockFileService::new()),
            automations: Arc::new(MockAutomationService::new()),
            users: Arc::new(MockUserDirectoryService::new()),
        }
    }
}
