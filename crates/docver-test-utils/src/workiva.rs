//! In-memory Workiva platform
//!
//! Implements every collaborator trait over plain collections. Rich-text
//! edits check revisions, tables are backed by sheets, and copying a
//! document copies the automations bound to it.

use async_trait::async_trait;
use docver_core::prelude::*;
use docver_core::{
    AutomationService, DocumentService, FileService, RichTextService, SpreadsheetService,
    TableService, UserDirectoryService,
};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Collaborator operations, for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    ListSections,
    CreateSection,
    ContainerOf,
    SectionRichText,
    Elements,
    EditRichText,
    TableProperties,
    EditTable,
    RawValues,
    UpdateRange,
    ListFiles,
    CreateFolder,
    CopyFile,
    FileDetail,
    RenameFile,
    ListAutomations,
    DeleteAutomation,
    ListUsers,
}

#[derive(Debug, Clone)]
struct FakeSection {
    section: Section,
    rich_text: RichTextId,
}

#[derive(Debug, Clone)]
struct FakeRichText {
    document: FileId,
    revision: u64,
    elements: Vec<FakeElement>,
}

#[derive(Debug, Clone)]
enum FakeElement {
    Table(TableId),
    Other(String),
}

#[derive(Debug, Clone)]
struct FakeTable {
    sheet: SheetId,
    columns: usize,
    revision: u64,
}

#[derive(Debug, Default)]
struct State {
    files: Vec<FileDetail>,
    sections: HashMap<FileId, Vec<FakeSection>>,
    rich_texts: HashMap<RichTextId, FakeRichText>,
    tables: HashMap<TableId, FakeTable>,
    sheets: HashMap<(FileId, SheetId), SheetValues>,
    automations: Vec<Automation>,
    users: Vec<User>,
    calls: HashMap<FakeOp, usize>,
    failures: HashMap<FakeOp, CollaboratorError>,
    next_id: u64,
    clock: i64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn now(&mut self) -> String {
        self.clock += 60;
        chrono::DateTime::from_timestamp(1_700_000_000 + self.clock, 0)
            .unwrap_or_default()
            .to_rfc3339()
    }

    /// Count the call and pop an injected failure, if any
    fn enter(&mut self, op: FakeOp) -> ServiceResult<()> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn file(&self, id: &FileId) -> ServiceResult<&FileDetail> {
        self.files
            .iter()
            .find(|f| &f.id == id)
            .ok_or_else(|| not_found("file", id))
    }

    fn add_section(&mut self, document: &FileId, name: &str, index: usize) -> Section {
        let section = Section {
            id: SectionId::new(self.next_id("section")),
            name: name.to_string(),
        };
        let rich_text = RichTextId::new(self.next_id("richtext"));
        self.rich_texts.insert(
            rich_text.clone(),
            FakeRichText {
                document: document.clone(),
                revision: 1,
                elements: vec![FakeElement::Other("paragraph".to_string())],
            },
        );

        let sections = self.sections.entry(document.clone()).or_default();
        let index = index.min(sections.len());
        sections.insert(
            index,
            FakeSection {
                section: section.clone(),
                rich_text,
            },
        );
        section
    }

    fn insert_table(&mut self, rich_text: &RichTextId, columns: usize, rows: usize) -> ServiceResult<TableId> {
        let document = self
            .rich_texts
            .get(rich_text)
            .map(|rt| rt.document.clone())
            .ok_or_else(|| not_found("rich text", rich_text))?;

        let table = TableId::new(self.next_id("table"));
        let sheet = SheetId::new(self.next_id("sheet"));
        self.sheets
            .insert((document, sheet.clone()), vec![vec![String::new(); columns]; rows]);
        self.tables.insert(
            table.clone(),
            FakeTable {
                sheet,
                columns,
                revision: 1,
            },
        );

        if let Some(rt) = self.rich_texts.get_mut(rich_text) {
            rt.elements.insert(0, FakeElement::Table(table.clone()));
            rt.revision += 1;
        }
        Ok(table)
    }

    fn ledger(&self, document: &FileId) -> Option<(TableId, SheetId)> {
        let section = self
            .sections
            .get(document)?
            .iter()
            .find(|s| s.section.name == VERSION_HISTORY_SECTION)?;
        let table = self.rich_texts.get(&section.rich_text)?.elements.iter().find_map(|e| match e {
            FakeElement::Table(id) => Some(id.clone()),
            FakeElement::Other(_) => None,
        })?;
        let sheet = self.tables.get(&table)?.sheet.clone();
        Some((table, sheet))
    }
}

fn not_found(what: &str, id: &impl std::fmt::Display) -> CollaboratorError {
    CollaboratorError::api(404, format!("{what} {id} not found"))
}

/// In-memory stand-in for the Workiva platform APIs
#[derive(Debug, Default)]
pub struct InMemoryWorkiva {
    state: Mutex<State>,
}

impl InMemoryWorkiva {
    /// Create empty platform
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    /// Add a document file inside `container`
    pub fn add_document(&self, name: &str, container: &FileId) -> FileId {
        let mut state = self.state.lock();
        let id = FileId::new(state.next_id("doc"));
        let created_at = state.now();
        state.files.push(FileDetail {
            id: id.clone(),
            name: name.to_string(),
            kind: FileKind::Document,
            container: Some(container.clone()),
            created_at,
        });
        state.sections.entry(id.clone()).or_default();
        id
    }

    /// Add a folder inside `container`
    pub fn add_folder(&self, name: &str, container: &FileId) -> FileId {
        let mut state = self.state.lock();
        let id = FileId::new(state.next_id("folder"));
        let created_at = state.now();
        state.files.push(FileDetail {
            id: id.clone(),
            name: name.to_string(),
            kind: FileKind::Folder,
            container: Some(container.clone()),
            created_at,
        });
        id
    }

    /// Append a section to a document
    pub fn add_section(&self, document: &FileId, name: &str) -> SectionId {
        let mut state = self.state.lock();
        state.add_section(document, name, usize::MAX).id
    }

    /// Add a "Version History" section whose table holds `rows`
    pub fn add_ledger(&self, document: &FileId, rows: &[&[&str]]) -> TableId {
        let mut state = self.state.lock();
        state.add_section(document, VERSION_HISTORY_SECTION, 0);
        let rich_text = state.sections[document]
            .iter()
            .find(|s| s.section.name == VERSION_HISTORY_SECTION)
            .map(|s| s.rich_text.clone())
            .unwrap_or_else(|| unreachable!("section was just added"));

        let table = state
            .insert_table(&rich_text, LEDGER_COLUMNS, 0)
            .unwrap_or_else(|err| panic!("seeding ledger: {err}"));
        let sheet = state.tables[&table].sheet.clone();
        state.sheets.insert(
            (document.clone(), sheet),
            rows.iter()
                .map(|row| row.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        );
        table
    }

    /// Bind an automation to a resource
    pub fn add_automation(
        &self,
        resource: &ResourceId,
        name: &str,
        status: Option<&str>,
        user: Option<&str>,
    ) -> AutomationId {
        let mut state = self.state.lock();
        let id = AutomationId::new(state.next_id("automation"));
        state.automations.push(Automation {
            id: id.clone(),
            name: name.to_string(),
            resource: resource.clone(),
            latest_execution_status: status.map(str::to_string),
            latest_execution_user: user.map(UserId::from),
        });
        id
    }

    /// Add a directory user
    pub fn add_user(&self, id: &str, display_name: &str) {
        self.state.lock().users.push(User {
            id: UserId::from(id),
            display_name: display_name.to_string(),
        });
    }

    /// Fail the next call of `op` with `err`
    pub fn fail_next(&self, op: FakeOp, err: CollaboratorError) {
        self.state.lock().failures.insert(op, err);
    }

    /// Advance a rich-text revision as a concurrent editor would
    pub fn touch_rich_text(&self, rich_text: &RichTextId) {
        if let Some(rt) = self.state.lock().rich_texts.get_mut(rich_text) {
            rt.revision += 1;
        }
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Number of calls made to `op`
    #[must_use]
    pub fn call_count(&self, op: FakeOp) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Sections of a document, in order
    #[must_use]
    pub fn sections(&self, document: &FileId) -> Vec<Section> {
        self.state
            .lock()
            .sections
            .get(document)
            .map(|s| s.iter().map(|s| s.section.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of tables in a rich-text block
    #[must_use]
    pub fn table_count(&self, rich_text: &RichTextId) -> usize {
        self.state
            .lock()
            .rich_texts
            .get(rich_text)
            .map(|rt| rt.elements.iter().filter(|e| matches!(e, FakeElement::Table(_))).count())
            .unwrap_or(0)
    }

    /// Full contents of the document's version ledger sheet
    #[must_use]
    pub fn ledger_values(&self, document: &FileId) -> Option<SheetValues> {
        let state = self.state.lock();
        let (_, sheet) = state.ledger(document)?;
        state.sheets.get(&(document.clone(), sheet)).cloned()
    }

    /// Files directly inside `container`
    #[must_use]
    pub fn files_in(&self, container: &FileId) -> Vec<FileDetail> {
        self.state
            .lock()
            .files
            .iter()
            .filter(|f| f.container.as_ref() == Some(container))
            .cloned()
            .collect()
    }

    /// Automations bound to a resource
    #[must_use]
    pub fn automations_on(&self, resource: &ResourceId) -> Vec<Automation> {
        self.state
            .lock()
            .automations
            .iter()
            .filter(|a| &a.resource == resource)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DocumentService for InMemoryWorkiva {
    async fn list_sections(&self, document: &FileId) -> ServiceResult<Vec<Section>> {
        let mut state = self.state.lock();
        state.enter(FakeOp::ListSections)?;
        state.file(document)?;
        Ok(state
            .sections
            .get(document)
            .map(|s| s.iter().map(|s| s.section.clone()).collect())
            .unwrap_or_default())
    }

    async fn create_section(&self, document: &FileId, section: &NewSection) -> ServiceResult<Section> {
        let mut state = self.state.lock();
        state.enter(FakeOp::CreateSection)?;
        state.file(document)?;
        Ok(state.add_section(document, &section.name, section.index as usize))
    }

    async fn container_of(&self, document: &FileId) -> ServiceResult<FileId> {
        let mut state = self.state.lock();
        state.enter(FakeOp::ContainerOf)?;
        state
            .file(document)?
            .container
            .clone()
            .ok_or_else(|| CollaboratorError::InvalidResponse(format!("file {document} has no container")))
    }
}

#[async_trait]
impl RichTextService for InMemoryWorkiva {
    async fn section_rich_text(&self, document: &FileId, section: &SectionId) -> ServiceResult<RichTextBlock> {
        let mut state = self.state.lock();
        state.enter(FakeOp::SectionRichText)?;
        let rich_text = state
            .sections
            .get(document)
            .and_then(|s| s.iter().find(|s| &s.section.id == section))
            .map(|s| s.rich_text.clone())
            .ok_or_else(|| not_found("section", section))?;
        let revision = state.rich_texts[&rich_text].revision;
        Ok(RichTextBlock {
            id: rich_text,
            revision: Revision::new(revision.to_string()),
        })
    }

    async fn elements(&self, rich_text: &RichTextId) -> ServiceResult<Vec<RichTextElement>> {
        let mut state = self.state.lock();
        state.enter(FakeOp::Elements)?;
        let rt = state
            .rich_texts
            .get(rich_text)
            .ok_or_else(|| not_found("rich text", rich_text))?;
        Ok(rt
            .elements
            .iter()
            .map(|e| match e {
                FakeElement::Table(id) => RichTextElement::Table(TableRef {
                    id: id.clone(),
                    revision: Revision::new(state.tables[id].revision.to_string()),
                }),
                FakeElement::Other(kind) => RichTextElement::Other(kind.clone()),
            })
            .collect())
    }

    async fn edit_rich_text(&self, block: &RichTextBlock, edits: &[RichTextEdit]) -> ServiceResult<()> {
        let mut state = self.state.lock();
        state.enter(FakeOp::EditRichText)?;
        let current = state
            .rich_texts
            .get(&block.id)
            .map(|rt| rt.revision)
            .ok_or_else(|| not_found("rich text", &block.id))?;
        if block.revision.as_str() != current.to_string() {
            return Err(CollaboratorError::Conflict(format!(
                "revision {} is stale, current is {current}",
                block.revision
            )));
        }

        for edit in edits {
            match edit {
                RichTextEdit::InsertTable { columns, rows, .. } => {
                    state.insert_table(&block.id, *columns as usize, *rows as usize)?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TableService for InMemoryWorkiva {
    async fn properties(&self, table: &TableId) -> ServiceResult<TableProperties> {
        let mut state = self.state.lock();
        state.enter(FakeOp::TableProperties)?;
        let table = state.tables.get(table).ok_or_else(|| not_found("table", table))?;
        Ok(TableProperties {
            sheet: table.sheet.clone(),
        })
    }

    async fn edit_table(&self, table: &TableId, edits: &[TableEdit]) -> ServiceResult<()> {
        let mut state = self.state.lock();
        state.enter(FakeOp::EditTable)?;
        let (sheet, columns) = state
            .tables
            .get(table)
            .map(|t| (t.sheet.clone(), t.columns))
            .ok_or_else(|| not_found("table", table))?;
        let document = state
            .sheets
            .keys()
            .find(|(_, s)| s == &sheet)
            .map(|(d, _)| d.clone())
            .ok_or_else(|| not_found("sheet", &sheet))?;

        for edit in edits {
            let TableEdit::InsertRows { count, next_to, side } = edit;
            let values = state.sheets.entry((document.clone(), sheet.clone())).or_default();
            let at = match side {
                RowSide::PutBefore => *next_to as usize,
                RowSide::PutAfter => *next_to as usize + 1,
            }
            .min(values.len());
            for _ in 0..*count {
                values.insert(at, vec![String::new(); columns]);
            }
        }
        if let Some(t) = state.tables.get_mut(table) {
            t.revision += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl SpreadsheetService for InMemoryWorkiva {
    async fn raw_values(&self, spreadsheet: &FileId, sheet: &SheetId) -> ServiceResult<SheetValues> {
        let mut state = self.state.lock();
        state.enter(FakeOp::RawValues)?;
        let mut values = state
            .sheets
            .get(&(spreadsheet.clone(), sheet.clone()))
            .cloned()
            .ok_or_else(|| not_found("sheet", sheet))?;
        // Only filled rows are reported.
        while values.last().is_some_and(|row| row.iter().all(String::is_empty)) {
            values.pop();
        }
        Ok(values)
    }

    async fn update_range(
        &self,
        spreadsheet: &FileId,
        sheet: &SheetId,
        range: CellRange,
        values: SheetValues,
    ) -> ServiceResult<()> {
        let mut state = self.state.lock();
        state.enter(FakeOp::UpdateRange)?;
        let cells = state
            .sheets
            .get_mut(&(spreadsheet.clone(), sheet.clone()))
            .ok_or_else(|| not_found("sheet", sheet))?;

        for (offset, row_values) in values.into_iter().enumerate() {
            let row = range.first_row as usize + offset;
            if row > range.last_row as usize {
                break;
            }
            if cells.len() <= row {
                cells.resize(row + 1, Vec::new());
            }
            for (col_offset, value) in row_values.into_iter().enumerate() {
                let col = range.first_column as usize + col_offset;
                if col > range.last_column as usize {
                    break;
                }
                if cells[row].len() <= col {
                    cells[row].resize(col + 1, String::new());
                }
                cells[row][col] = value;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FileService for InMemoryWorkiva {
    async fn list_files(&self, container: &FileId, name: &str, kind: &FileKind) -> ServiceResult<Vec<FileDetail>> {
        let mut state = self.state.lock();
        state.enter(FakeOp::ListFiles)?;
        Ok(state
            .files
            .iter()
            .filter(|f| f.container.as_ref() == Some(container) && f.name == name && &f.kind == kind)
            .cloned()
            .collect())
    }

    async fn create_folder(&self, container: &FileId, name: &str) -> ServiceResult<FileDetail> {
        let mut state = self.state.lock();
        state.enter(FakeOp::CreateFolder)?;
        let folder = FileDetail {
            id: FileId::new(state.next_id("folder")),
            name: name.to_string(),
            kind: FileKind::Folder,
            container: Some(container.clone()),
            created_at: state.now(),
        };
        state.files.push(folder.clone());
        Ok(folder)
    }

    async fn copy_file(&self, file: &FileId, destination: &FileId) -> ServiceResult<FileId> {
        let mut state = self.state.lock();
        state.enter(FakeOp::CopyFile)?;
        let source = state.file(file)?.clone();

        let copy = FileId::new(state.next_id("doc"));
        let created_at = state.now();
        state.files.push(FileDetail {
            id: copy.clone(),
            container: Some(destination.clone()),
            created_at,
            ..source
        });

        let source_resource = ResourceId::for_document(file);
        let copy_resource = ResourceId::for_document(&copy);
        let bound: Vec<Automation> = state
            .automations
            .iter()
            .filter(|a| a.resource == source_resource)
            .cloned()
            .collect();
        for automation in bound {
            let id = AutomationId::new(state.next_id("automation"));
            state.automations.push(Automation {
                id,
                resource: copy_resource.clone(),
                latest_execution_status: None,
                latest_execution_user: None,
                ..automation
            });
        }
        Ok(copy)
    }

    async fn file_detail(&self, file: &FileId) -> ServiceResult<FileDetail> {
        let mut state = self.state.lock();
        state.enter(FakeOp::FileDetail)?;
        state.file(file).cloned()
    }

    async fn rename_file(&self, file: &FileId, name: &str) -> ServiceResult<()> {
        let mut state = self.state.lock();
        state.enter(FakeOp::RenameFile)?;
        let detail = state
            .files
            .iter_mut()
            .find(|f| &f.id == file)
            .ok_or_else(|| not_found("file", file))?;
        detail.name = name.to_string();
        Ok(())
    }
}

#[async_trait]
impl AutomationService for InMemoryWorkiva {
    async fn list_automations(&self, resource: &ResourceId) -> ServiceResult<Vec<Automation>> {
        let mut state = self.state.lock();
        state.enter(FakeOp::ListAutomations)?;
        Ok(state
            .automations
            .iter()
            .filter(|a| &a.resource == resource)
            .cloned()
            .collect())
    }

    async fn delete_automation(&self, automation: &AutomationId) -> ServiceResult<()> {
        let mut state = self.state.lock();
        state.enter(FakeOp::DeleteAutomation)?;
        let before = state.automations.len();
        state.automations.retain(|a| &a.id != automation);
        if state.automations.len() == before {
            return Err(not_found("automation", automation));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectoryService for InMemoryWorkiva {
    async fn list_users(&self) -> ServiceResult<Vec<User>> {
        let mut state = self.state.lock();
        state.enter(FakeOp::ListUsers)?;
        Ok(state.users.clone())
    }
}
