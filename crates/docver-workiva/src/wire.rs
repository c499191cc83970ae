//! Wire formats of the Workiva platform APIs
//!
//! Response DTOs decode only the fields the workflow reads and convert into
//! `docver_core` types at this boundary. Request bodies are built with
//! `serde_json::json!`.

use docver_core::prelude::*;
use serde::Deserialize;
use serde_json::{json, Value};

// ============================================================================
// Responses
// ============================================================================

/// One page of a `data` list, linked by `@nextLink`
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub(crate) data: Vec<T>,
    #[serde(rename = "@nextLink", default)]
    pub(crate) next_link: Option<String>,
}

impl<T> Page<T> {
    /// First item, or an invalid-response error naming `what`
    pub(crate) fn first(self, what: &str) -> ServiceResult<T> {
        self.data
            .into_iter()
            .next()
            .ok_or_else(|| CollaboratorError::InvalidResponse(format!("empty {what} response")))
    }
}

/// Revisions arrive as strings or numbers depending on the endpoint
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireRevision {
    Text(String),
    Number(u64),
}

impl From<WireRevision> for Revision {
    fn from(revision: WireRevision) -> Self {
        match revision {
            WireRevision::Text(text) => Revision::new(text),
            WireRevision::Number(number) => Revision::new(number.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SectionDto {
    id: String,
    name: String,
}

impl From<SectionDto> for Section {
    fn from(dto: SectionDto) -> Self {
        Section {
            id: SectionId::new(dto.id),
            name: dto.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RichTextRefDto {
    id: String,
    revision: WireRevision,
}

impl From<RichTextRefDto> for RichTextBlock {
    fn from(dto: RichTextRefDto) -> Self {
        RichTextBlock {
            id: RichTextId::new(dto.id),
            revision: dto.revision.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RichTextContentDto {
    #[serde(default = "Vec::new")]
    pub(crate) elements: Vec<ElementDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ElementDto {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    table: Option<TableElementDto>,
}

#[derive(Debug, Deserialize)]
struct TableElementDto {
    table: TableLinkDto,
}

#[derive(Debug, Deserialize)]
struct TableLinkDto {
    table: String,
    revision: WireRevision,
}

impl TryFrom<ElementDto> for RichTextElement {
    type Error = CollaboratorError;

    fn try_from(dto: ElementDto) -> Result<Self, Self::Error> {
        if dto.kind != "table" {
            return Ok(RichTextElement::Other(dto.kind));
        }
        let link = dto
            .table
            .ok_or_else(|| CollaboratorError::InvalidResponse("table element without table link".to_string()))?
            .table;
        Ok(RichTextElement::Table(TableRef {
            id: TableId::new(link.table),
            revision: link.revision.into(),
        }))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TablePropertiesDto {
    sheet: String,
}

impl From<TablePropertiesDto> for TableProperties {
    fn from(dto: TablePropertiesDto) -> Self {
        TableProperties {
            sheet: SheetId::new(dto.sheet),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SheetValuesDto {
    #[serde(default = "Vec::new")]
    values: Vec<Vec<Value>>,
}

impl From<SheetValuesDto> for SheetValues {
    fn from(dto: SheetValuesDto) -> Self {
        dto.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect()
    }
}

/// Raw cell value as text; empty cells become empty strings
fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdDto {
    pub(crate) id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileDto {
    id: String,
    name: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    container: Option<String>,
    #[serde(default)]
    created: Option<TimestampDto>,
}

#[derive(Debug, Deserialize)]
struct TimestampDto {
    #[serde(rename = "dateTime")]
    date_time: String,
}

impl From<FileDto> for FileDetail {
    fn from(dto: FileDto) -> Self {
        FileDetail {
            id: FileId::new(dto.id),
            name: dto.name,
            kind: dto.kind.as_deref().map_or(FileKind::Other(String::new()), FileKind::from_wire),
            container: dto.container.map(FileId::new),
            created_at: dto.created.map(|c| c.date_time).unwrap_or_default(),
        }
    }
}

/// HAL-style automation listing
#[derive(Debug, Deserialize)]
pub(crate) struct AutomationPage {
    #[serde(rename = "_embedded", default)]
    embedded: Option<EmbeddedAutomations>,
    #[serde(rename = "_links", default)]
    links: Option<HalLinks>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedAutomations {
    #[serde(default = "Vec::new")]
    automations: Vec<AutomationDto>,
}

#[derive(Debug, Deserialize)]
struct HalLinks {
    #[serde(default)]
    next: Option<HalLink>,
}

#[derive(Debug, Deserialize)]
struct HalLink {
    href: String,
}

impl AutomationPage {
    /// Automations on this page, bound to `resource`
    pub(crate) fn into_parts(self, resource: &ResourceId) -> (Vec<Automation>, Option<String>) {
        let automations = self
            .embedded
            .map(|e| e.automations)
            .unwrap_or_default()
            .into_iter()
            .map(|dto| dto.into_automation(resource.clone()))
            .collect();
        let next = self.links.and_then(|l| l.next).map(|n| n.href);
        (automations, next)
    }
}

#[derive(Debug, Deserialize)]
struct AutomationDto {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(rename = "_summary", default)]
    summary: Option<SummaryDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDto {
    #[serde(default)]
    latest_execution_status: Option<String>,
    #[serde(default)]
    latest_execution_context: Option<ExecutionContextDto>,
}

#[derive(Debug, Deserialize)]
struct ExecutionContextDto {
    #[serde(default)]
    execution: Option<ExecutionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionDto {
    #[serde(default)]
    user_id: Option<String>,
}

impl AutomationDto {
    fn into_automation(self, resource: ResourceId) -> Automation {
        let (status, user) = match self.summary {
            Some(summary) => (
                summary.latest_execution_status,
                summary
                    .latest_execution_context
                    .and_then(|c| c.execution)
                    .and_then(|e| e.user_id),
            ),
            None => (None, None),
        };
        Automation {
            id: AutomationId::new(self.id),
            name: self.name,
            resource,
            latest_execution_status: status,
            latest_execution_user: user.map(UserId::new),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDto {
    id: String,
    #[serde(default)]
    display_name: String,
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        User {
            id: UserId::new(dto.id),
            display_name: dto.display_name,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

pub(crate) fn new_section_body(section: &NewSection) -> Value {
    json!({
        "name": section.name,
        "index": section.index,
        "nonPrinting": section.non_printing,
    })
}

pub(crate) fn rich_text_edit_body(block: &RichTextBlock, edits: &[RichTextEdit]) -> Value {
    let data: Vec<Value> = edits
        .iter()
        .map(|edit| match edit {
            RichTextEdit::InsertTable { columns, rows, at } => json!({
                "type": "insertTable",
                "insertTable": {
                    "columnCount": columns,
                    "insertAt": {"offset": at.offset, "paragraphIndex": at.paragraph_index},
                    "rowCount": rows,
                },
            }),
        })
        .collect();
    json!({
        "revision": block.revision.as_str(),
        "isolateEdits": false,
        "data": data,
    })
}

pub(crate) fn table_edit_body(edits: &[TableEdit]) -> Value {
    let data: Vec<Value> = edits
        .iter()
        .map(|edit| match edit {
            TableEdit::InsertRows { count, next_to, side } => json!({
                "type": "insertRows",
                "insertRows": {"count": count, "nextTo": next_to, "side": side.as_str()},
            }),
        })
        .collect();
    json!({ "data": data })
}

pub(crate) fn range_body(values: &SheetValues) -> Value {
    json!({ "values": values })
}

pub(crate) fn folder_body(container: &FileId, name: &str) -> Value {
    json!({
        "name": name,
        "kind": FileKind::Folder.as_str(),
        "container": container.as_str(),
    })
}

pub(crate) fn copy_body(destination: &FileId) -> Value {
    json!({ "destinationContainer": destination.as_str() })
}

pub(crate) fn rename_body(name: &str) -> Value {
    json!({ "name": name })
}

/// OData filter selecting files by container, name and kind
pub(crate) fn file_filter(container: &FileId, name: &str, kind: &FileKind) -> String {
    format!(
        "container eq '{}' and name eq '{}' and kind eq '{}'",
        odata_quote(container.as_str()),
        odata_quote(name),
        odata_quote(kind.as_str())
    )
}

fn odata_quote(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rich_text_elements_decode_tables_and_others() {
        let body = json!({
            "data": [{
                "elements": [
                    {"type": "paragraph"},
                    {"type": "table", "table": {"table": {"table": "tbl-1", "revision": 7}}},
                    {"type": "table", "table": {"table": {"table": "tbl-2", "revision": "r9"}}}
                ]
            }]
        });
        let page: Page<RichTextContentDto> = serde_json::from_value(body).unwrap();
        let elements: Vec<RichTextElement> = page
            .first("rich text")
            .unwrap()
            .elements
            .into_iter()
            .map(RichTextElement::try_from)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(elements[0], RichTextElement::Other("paragraph".to_string()));
        assert_eq!(
            elements[1],
            RichTextElement::Table(TableRef {
                id: TableId::from("tbl-1"),
                revision: Revision::from("7"),
            })
        );
        assert_eq!(elements[2].as_table().unwrap().revision, Revision::from("r9"));
    }

    #[test]
    fn table_element_without_link_is_invalid() {
        let dto: ElementDto = serde_json::from_value(json!({"type": "table"})).unwrap();
        let err = RichTextElement::try_from(dto).unwrap_err();
        assert!(matches!(err, CollaboratorError::InvalidResponse(_)));
    }

    #[test]
    fn sheet_values_flatten_to_text() {
        let page: Page<SheetValuesDto> = serde_json::from_value(json!({
            "data": [{"values": [["Version", null], ["2.0.1", 3]]}]
        }))
        .unwrap();
        let values: SheetValues = page.first("sheet").unwrap().into();
        assert_eq!(
            values,
            vec![
                vec!["Version".to_string(), String::new()],
                vec!["2.0.1".to_string(), "3".to_string()],
            ]
        );
    }

    #[test]
    fn file_detail_reads_created_timestamp() {
        let dto: FileDto = serde_json::from_value(json!({
            "id": "doc-9",
            "name": "Quarterly Report",
            "kind": "Document",
            "container": "folder-1",
            "created": {"dateTime": "2024-06-01T12:00:00Z"}
        }))
        .unwrap();
        let detail = FileDetail::from(dto);
        assert_eq!(detail.kind, FileKind::Document);
        assert_eq!(detail.container, Some(FileId::from("folder-1")));
        assert_eq!(detail.created_at, "2024-06-01T12:00:00Z");
    }

    #[test]
    fn automations_decode_summary_and_next_link() {
        let page: AutomationPage = serde_json::from_value(json!({
            "_embedded": {"automations": [
                {
                    "_id": "a-1",
                    "name": "Create Version",
                    "_summary": {
                        "latestExecutionStatus": "STARTED",
                        "latestExecutionContext": {"execution": {"userId": "user-ada"}}
                    }
                },
                {"_id": "a-2", "name": "Publish Report"}
            ]},
            "_links": {"next": {"href": "https://api.example/automations?page=2"}}
        }))
        .unwrap();
        let resource = ResourceId::from("wurl://docs.v1/doc:doc-1/");
        let (automations, next) = page.into_parts(&resource);

        assert_eq!(automations.len(), 2);
        assert_eq!(automations[0].latest_execution_status.as_deref(), Some("STARTED"));
        assert_eq!(automations[0].latest_execution_user, Some(UserId::from("user-ada")));
        assert_eq!(automations[1].latest_execution_status, None);
        assert_eq!(automations[1].resource, resource);
        assert_eq!(next.as_deref(), Some("https://api.example/automations?page=2"));
    }

    #[test]
    fn insert_table_payload_matches_wire_shape() {
        let block = RichTextBlock {
            id: RichTextId::from("rt-1"),
            revision: Revision::from("12"),
        };
        assert_eq!(
            rich_text_edit_body(&block, &[RichTextEdit::ledger_table()]),
            json!({
                "revision": "12",
                "isolateEdits": false,
                "data": [{
                    "type": "insertTable",
                    "insertTable": {
                        "columnCount": 6,
                        "insertAt": {"offset": 0, "paragraphIndex": 0},
                        "rowCount": 1
                    }
                }]
            })
        );
    }

    #[test]
    fn insert_rows_payload_matches_wire_shape() {
        assert_eq!(
            table_edit_body(&[TableEdit::row_below_header()]),
            json!({"data": [{
                "type": "insertRows",
                "insertRows": {"count": 1, "nextTo": 0, "side": "putAfter"}
            }]})
        );
    }

    #[test]
    fn file_filter_escapes_quotes() {
        assert_eq!(
            file_filter(&FileId::from("c-1"), "Bob's Versions", &FileKind::Folder),
            "container eq 'c-1' and name eq 'Bob''s Versions' and kind eq 'Folder'"
        );
    }
}
