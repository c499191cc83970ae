//! Core types for Docver
//!
//! Defines the typed values exchanged with the remote collaborators:
//! - Identifiers (files, sections, rich text, tables, sheets, automations)
//! - Document structure (sections, rich-text blocks, tables)
//! - Spreadsheet ranges and the version ledger row
//! - File storage records, automations and directory users

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the bookkeeping section inside the source document
pub const VERSION_HISTORY_SECTION: &str = "Version History";

/// Name of the archive folder created next to the source document
pub const ARCHIVE_FOLDER: &str = "Document Versions";

/// Automation that runs this workflow
pub const CREATE_VERSION_AUTOMATION: &str = "Create Version";

/// Automation that restores a recorded version
pub const ROLLBACK_VERSION_AUTOMATION: &str = "Rollback Version";

/// Display name recorded when the trigger user cannot be resolved
pub const UNKNOWN_USER: &str = "Unknown";

/// Execution status of a finished automation run
pub const SUCCEEDED_STATUS: &str = "SUCCEEDED";

/// Column titles of the version ledger table
pub const LEDGER_HEADERS: [&str; LEDGER_COLUMNS] = [
    "Version",
    "Doc Name",
    "Link",
    "Created By",
    "Created At",
    "Select Version",
];

/// Number of columns in the version ledger table
pub const LEDGER_COLUMNS: usize = 6;

/// Default value of the "Select Version" column for new rows
pub const DEFAULT_SELECTION: &str = "No";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw identifier
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Raw identifier
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// File storage identifier (documents, folders, snapshots)
    FileId
);
string_id!(
    /// Document section identifier
    SectionId
);
string_id!(
    /// Rich-text block identifier
    RichTextId
);
string_id!(
    /// Embedded table identifier
    TableId
);
string_id!(
    /// Spreadsheet sheet identifier
    SheetId
);
string_id!(
    /// Automation identifier
    AutomationId
);
string_id!(
    /// User directory identifier
    UserId
);
string_id!(
    /// Optimistic-concurrency token of a rich-text block or table
    Revision
);
string_id!(
    /// Resource URL automations are bound to
    ResourceId
);

impl ResourceId {
    /// Resource URL of a document file
    #[must_use]
    pub fn for_document(document: &FileId) -> Self {
        Self(format!("wurl://docs.v1/doc:{document}/"))
    }
}

/// Source document of a run and the container it lives in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Document file id (also the spreadsheet id of its tables)
    pub document: FileId,
    /// Parent container of the document
    pub container: FileId,
}

impl SourceDocument {
    /// Resource the document's automations are bound to
    #[inline]
    #[must_use]
    pub fn resource(&self) -> ResourceId {
        ResourceId::for_document(&self.document)
    }
}

/// Named region of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section id
    pub id: SectionId,
    /// Display name
    pub name: String,
}

/// Section creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSection {
    /// Display name
    pub name: String,
    /// Position among the document's sections
    pub index: u32,
    /// Excluded from printing/export
    pub non_printing: bool,
}

impl NewSection {
    /// The "Version History" section: first, non-printing
    #[must_use]
    pub fn version_history() -> Self {
        Self {
            name: VERSION_HISTORY_SECTION.to_string(),
            index: 0,
            non_printing: true,
        }
    }
}

/// Editable content container of a section
///
/// The revision changes with every edit, so it is re-fetched per run and
/// never cached across steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichTextBlock {
    /// Rich-text id
    pub id: RichTextId,
    /// Current revision token
    pub revision: Revision,
}

/// Element of a rich-text block's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RichTextElement {
    /// Embedded table
    Table(TableRef),
    /// Any other element (paragraph, image, ...), by type name
    Other(String),
}

impl RichTextElement {
    /// Table reference if this element is a table
    #[inline]
    #[must_use]
    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Self::Table(table) => Some(table),
            Self::Other(_) => None,
        }
    }
}

/// Reference to an embedded table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Table id
    pub id: TableId,
    /// Table revision at discovery time
    pub revision: Revision,
}

/// Position inside rich-text content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPosition {
    /// Paragraph index
    pub paragraph_index: u32,
    /// Character offset within the paragraph
    pub offset: u32,
}

impl InsertPosition {
    /// Very beginning of the content
    pub const START: Self = Self {
        paragraph_index: 0,
        offset: 0,
    };
}

/// Content mutation of a rich-text block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RichTextEdit {
    /// Insert an empty table
    InsertTable {
        /// Column count
        columns: u32,
        /// Row count
        rows: u32,
        /// Insert position
        at: InsertPosition,
    },
}

impl RichTextEdit {
    /// Insert the version ledger table at document start
    #[must_use]
    pub fn ledger_table() -> Self {
        Self::InsertTable {
            columns: LEDGER_COLUMNS as u32,
            rows: 1,
            at: InsertPosition::START,
        }
    }
}

/// Table properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProperties {
    /// Backing spreadsheet sheet
    pub sheet: SheetId,
}

/// Which side of the anchor row new rows go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSide {
    /// Above the anchor
    PutBefore,
    /// Below the anchor
    PutAfter,
}

impl RowSide {
    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PutBefore => "putBefore",
            Self::PutAfter => "putAfter",
        }
    }
}

/// Table content mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEdit {
    /// Insert empty rows next to a zero-based anchor row
    InsertRows {
        /// Number of rows
        count: u32,
        /// Anchor row index
        next_to: u32,
        /// Side of the anchor
        side: RowSide,
    },
}

impl TableEdit {
    /// One row directly beneath the header row
    #[must_use]
    pub fn row_below_header() -> Self {
        Self::InsertRows {
            count: 1,
            next_to: 0,
            side: RowSide::PutAfter,
        }
    }
}

/// Raw sheet values, row-major; empty cells are empty strings
pub type SheetValues = Vec<Vec<String>>;

/// Rectangular cell range, zero-based and inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// First row
    pub first_row: u32,
    /// Last row
    pub last_row: u32,
    /// First column
    pub first_column: u32,
    /// Last column
    pub last_column: u32,
}

impl CellRange {
    /// A whole ledger row (`A{n}:F{n}`)
    #[must_use]
    pub fn ledger_row(row: u32) -> Self {
        Self {
            first_row: row,
            last_row: row,
            first_column: 0,
            last_column: LEDGER_COLUMNS as u32 - 1,
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_name(self.first_column),
            self.first_row + 1,
            column_name(self.last_column),
            self.last_row + 1
        )
    }
}

fn column_name(mut index: u32) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Kind of a file storage object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    /// Folder
    Folder,
    /// Document
    Document,
    /// Spreadsheet
    Spreadsheet,
    /// Anything else, by wire name
    Other(String),
}

impl FileKind {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Folder => "Folder",
            Self::Document => "Document",
            Self::Spreadsheet => "Spreadsheet",
            Self::Other(kind) => kind,
        }
    }

    /// Parse a wire name
    #[must_use]
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "Folder" => Self::Folder,
            "Document" => Self::Document,
            "Spreadsheet" => Self::Spreadsheet,
            other => Self::Other(other.to_string()),
        }
    }
}

/// File storage record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDetail {
    /// File id
    pub id: FileId,
    /// Display name
    pub name: String,
    /// Kind
    pub kind: FileKind,
    /// Parent container, if any
    pub container: Option<FileId>,
    /// Creation timestamp as reported by file storage
    pub created_at: String,
}

/// Trigger automation bound to a document resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automation {
    /// Automation id
    pub id: AutomationId,
    /// Display name
    pub name: String,
    /// Bound resource
    pub resource: ResourceId,
    /// Status of the latest execution, if it ever ran
    pub latest_execution_status: Option<String>,
    /// User who started the latest execution
    pub latest_execution_user: Option<UserId>,
}

impl Automation {
    /// Whether this is one of the versioning automations
    #[inline]
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.name == CREATE_VERSION_AUTOMATION || self.name == ROLLBACK_VERSION_AUTOMATION
    }

    /// Whether the latest execution finished successfully
    #[inline]
    #[must_use]
    pub fn latest_execution_succeeded(&self) -> bool {
        self.latest_execution_status.as_deref() == Some(SUCCEEDED_STATUS)
    }
}

/// User directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Display name
    pub display_name: String,
}

/// One row of the version ledger table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRow {
    /// Version string
    pub version: String,
    /// Snapshot file name
    pub doc_name: String,
    /// Link to the snapshot
    pub link: String,
    /// Display name of the trigger user
    pub created_by: String,
    /// Snapshot creation timestamp
    pub created_at: String,
    /// Rollback selector
    pub selected: String,
}

impl VersionRow {
    /// Cells in column order
    #[must_use]
    pub fn into_cells(self) -> Vec<String> {
        vec![
            self.version,
            self.doc_name,
            self.link,
            self.created_by,
            self.created_at,
            self.selected,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_for_document() {
        let resource = ResourceId::for_document(&FileId::from("abc123"));
        assert_eq!(resource.as_str(), "wurl://docs.v1/doc:abc123/");
    }

    #[test]
    fn ledger_ranges_render_a1_notation() {
        assert_eq!(CellRange::ledger_row(0).to_string(), "A1:F1");
        assert_eq!(CellRange::ledger_row(1).to_string(), "A2:F2");
    }

    #[test]
    fn column_names_past_z() {
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn reserved_automation_names() {
        let mut automation = Automation {
            id: AutomationId::from("a1"),
            name: CREATE_VERSION_AUTOMATION.to_string(),
            resource: ResourceId::from("wurl://docs.v1/doc:x/"),
            latest_execution_status: Some("RUNNING".to_string()),
            latest_execution_user: None,
        };
        assert!(automation.is_reserved());
        assert!(!automation.latest_execution_succeeded());

        automation.name = "Publish".to_string();
        automation.latest_execution_status = Some(SUCCEEDED_STATUS.to_string());
        assert!(!automation.is_reserved());
        assert!(automation.latest_execution_succeeded());
    }

    #[test]
    fn version_row_cell_order() {
        let row = VersionRow {
            version: "0.1.0".into(),
            doc_name: "Report".into(),
            link: "https://h/a/1/doc/f".into(),
            created_by: "Ada".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            selected: DEFAULT_SELECTION.into(),
        };
        let cells = row.into_cells();
        assert_eq!(cells.len(), LEDGER_COLUMNS);
        assert_eq!(cells[0], "0.1.0");
        assert_eq!(cells[5], "No");
    }

    #[test]
    fn file_kind_wire_names() {
        assert_eq!(FileKind::from_wire("Folder"), FileKind::Folder);
        assert_eq!(FileKind::from_wire("Presentation").as_str(), "Presentation");
    }
}
