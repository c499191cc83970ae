//! Workiva platform API client
//!
//! One `reqwest` client implements every collaborator trait:
//! - Bearer-token auth on every request
//! - `@nextLink` (and HAL `_links.next`) pagination on list endpoints
//! - HTTP 409/412 map to [`CollaboratorError::Conflict`]
//! - Transport failures map to [`CollaboratorError::Network`]

use crate::config::ClientConfig;
use crate::wire::{self, AutomationPage, FileDto, IdDto, Page};
use async_trait::async_trait;
use docver_core::prelude::*;
use docver_core::{
    AutomationService, DocumentService, FileService, RichTextService, SpreadsheetService,
    TableService, UserDirectoryService,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

/// HTTP implementation of the collaborator traits
pub struct WorkivaClient {
    http: Client,
    config: ClientConfig,
}

impl WorkivaClient {
    /// Create client
    ///
    /// # Errors
    /// [`CollaboratorError::Network`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> ServiceResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CollaboratorError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> ServiceResult<Response> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| CollaboratorError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        tracing::debug!(%status, %message, "request rejected");
        Err(status_error(status, message))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ServiceResult<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> ServiceResult<()> {
        self.send(request).await.map(|_| ())
    }

    /// Follow `@nextLink` until the last page
    async fn get_all<T: DeserializeOwned>(&self, first: RequestBuilder) -> ServiceResult<Vec<T>> {
        let mut page: Page<T> = self.send_json(first).await?;
        let mut items = std::mem::take(&mut page.data);
        while let Some(next) = page.next_link.take() {
            page = self.send_json(self.http.get(next)).await?;
            items.append(&mut page.data);
        }
        Ok(items)
    }
}

impl std::fmt::Debug for WorkivaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkivaClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Map a non-success status to a collaborator error
fn status_error(status: StatusCode, message: String) -> CollaboratorError {
    match status.as_u16() {
        409 | 412 => CollaboratorError::Conflict(message),
        code => CollaboratorError::api(code, message),
    }
}

#[async_trait]
impl DocumentService for WorkivaClient {
    async fn list_sections(&self, document: &FileId) -> ServiceResult<Vec<Section>> {
        let url = self.url(&format!("/platform/v1/documents/{document}/sections"));
        let sections: Vec<wire::SectionDto> = self.get_all(self.http.get(url)).await?;
        Ok(sections.into_iter().map(Section::from).collect())
    }

    async fn create_section(&self, document: &FileId, section: &NewSection) -> ServiceResult<Section> {
        let url = self.url(&format!("/platform/v1/documents/{document}/sections"));
        let created: wire::SectionDto = self
            .send_json(self.http.post(url).json(&wire::new_section_body(section)))
            .await?;
        Ok(created.into())
    }

    async fn container_of(&self, document: &FileId) -> ServiceResult<FileId> {
        self.file_detail(document).await?.container.ok_or_else(|| {
            CollaboratorError::InvalidResponse(format!("file {document} has no container"))
        })
    }
}

#[async_trait]
impl RichTextService for WorkivaClient {
    async fn section_rich_text(&self, document: &FileId, section: &SectionId) -> ServiceResult<RichTextBlock> {
        let url = self.url(&format!(
            "/platform/v1/documents/{document}/sections/{section}/richText"
        ));
        let page: Page<wire::RichTextRefDto> = self.send_json(self.http.get(url)).await?;
        Ok(page.first("section rich text")?.into())
    }

    async fn elements(&self, rich_text: &RichTextId) -> ServiceResult<Vec<RichTextElement>> {
        let url = self.url(&format!("/platform/v1/content/richText/{rich_text}"));
        let page: Page<wire::RichTextContentDto> = self.send_json(self.http.get(url)).await?;
        page.first("rich text content")?
            .elements
            .into_iter()
            .map(RichTextElement::try_from)
            .collect()
    }

    async fn edit_rich_text(&self, block: &RichTextBlock, edits: &[RichTextEdit]) -> ServiceResult<()> {
        let url = self.url(&format!("/platform/v1/content/richText/{}/edit", block.id));
        self.send_empty(self.http.post(url).json(&wire::rich_text_edit_body(block, edits)))
            .await
    }
}

#[async_trait]
impl TableService for WorkivaClient {
    async fn properties(&self, table: &TableId) -> ServiceResult<TableProperties> {
        let url = self.url(&format!("/platform/v1/content/tables/{table}/properties"));
        let properties: wire::TablePropertiesDto = self.send_json(self.http.get(url)).await?;
        Ok(properties.into())
    }

    async fn edit_table(&self, table: &TableId, edits: &[TableEdit]) -> ServiceResult<()> {
        let url = self.url(&format!("/platform/v1/content/tables/{table}/edit"));
        self.send_empty(self.http.post(url).json(&wire::table_edit_body(edits)))
            .await
    }
}

#[async_trait]
impl SpreadsheetService for WorkivaClient {
    async fn raw_values(&self, spreadsheet: &FileId, sheet: &SheetId) -> ServiceResult<SheetValues> {
        let url = self.url(&format!(
            "/platform/v1/spreadsheets/{spreadsheet}/sheets/{sheet}/values"
        ));
        let page: Page<wire::SheetValuesDto> = self
            .send_json(self.http.get(url).query(&[("valueStyle", "raw")]))
            .await?;
        Ok(page.first("sheet values")?.into())
    }

    async fn update_range(
        &self,
        spreadsheet: &FileId,
        sheet: &SheetId,
        range: CellRange,
        values: SheetValues,
    ) -> ServiceResult<()> {
        let url = self.url(&format!(
            "/platform/v1/spreadsheets/{spreadsheet}/sheets/{sheet}/values/{range}"
        ));
        self.send_empty(self.http.put(url).json(&wire::range_body(&values)))
            .await
    }
}

#[async_trait]
impl FileService for WorkivaClient {
    async fn list_files(&self, container: &FileId, name: &str, kind: &FileKind) -> ServiceResult<Vec<FileDetail>> {
        let request = self
            .http
            .get(self.url("/platform/v1/files"))
            .query(&[("$filter", wire::file_filter(container, name, kind))]);
        let files: Vec<FileDto> = self.get_all(request).await?;
        // The filter is advisory on some clusters; re-check locally.
        Ok(files
            .into_iter()
            .map(FileDetail::from)
            .filter(|f| f.name == name && &f.kind == kind && f.container.as_ref() == Some(container))
            .collect())
    }

    async fn create_folder(&self, container: &FileId, name: &str) -> ServiceResult<FileDetail> {
        let created: FileDto = self
            .send_json(
                self.http
                    .post(self.url("/platform/v1/files"))
                    .json(&wire::folder_body(container, name)),
            )
            .await?;
        Ok(created.into())
    }

    async fn copy_file(&self, file: &FileId, destination: &FileId) -> ServiceResult<FileId> {
        let url = self.url(&format!("/platform/v1/files/{file}/copy"));
        let page: Page<IdDto> = self
            .send_json(self.http.post(url).json(&wire::copy_body(destination)))
            .await?;
        Ok(FileId::new(page.first("file copy")?.id))
    }

    async fn file_detail(&self, file: &FileId) -> ServiceResult<FileDetail> {
        let url = self.url(&format!("/platform/v1/files/{file}"));
        let detail: FileDto = self.send_json(self.http.get(url)).await?;
        Ok(detail.into())
    }

    async fn rename_file(&self, file: &FileId, name: &str) -> ServiceResult<()> {
        let url = self.url(&format!("/platform/v1/files/{file}"));
        self.send_empty(self.http.patch(url).json(&wire::rename_body(name)))
            .await
    }
}

#[async_trait]
impl AutomationService for WorkivaClient {
    async fn list_automations(&self, resource: &ResourceId) -> ServiceResult<Vec<Automation>> {
        let first = self
            .http
            .get(self.url("/automations/v1/automations"))
            .query(&[("resourceId", resource.as_str())]);

        let page: AutomationPage = self.send_json(first).await?;
        let (mut automations, mut next) = page.into_parts(resource);
        while let Some(href) = next {
            let page: AutomationPage = self.send_json(self.http.get(href)).await?;
            let (more, following) = page.into_parts(resource);
            automations.extend(more);
            next = following;
        }
        Ok(automations)
    }

    async fn delete_automation(&self, automation: &AutomationId) -> ServiceResult<()> {
        let url = self.url(&format!("/automations/v1/automations/{automation}"));
        self.send_empty(self.http.delete(url)).await
    }
}

#[async_trait]
impl UserDirectoryService for WorkivaClient {
    async fn list_users(&self) -> ServiceResult<Vec<User>> {
        let users: Vec<wire::UserDto> = self.get_all(self.http.get(self.url("/admin/v1/users"))).await?;
        Ok(users.into_iter().map(User::from).collect())
    }
}
