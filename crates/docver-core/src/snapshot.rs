//! Snapshot creation in the archive folder

use crate::error::WorkflowResult;
use crate::services::{Collaborators, FileService};
use crate::types::{FileDetail, FileKind, SourceDocument, ARCHIVE_FOLDER};
use crate::version::VersionInfo;
use std::sync::Arc;

/// Copies the source document into the "Document Versions" folder
#[derive(Clone)]
pub struct SnapshotCreator {
    files: Arc<dyn FileService>,
}

impl SnapshotCreator {
    /// Create snapshot creator
    #[must_use]
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            files: collaborators.files.clone(),
        }
    }

    /// Copy the source document into the archive folder
    ///
    /// The folder is looked up first and created only if absent. The copy
    /// itself is never deduplicated: every call produces one new file.
    ///
    /// # Errors
    /// Collaborator failures.
    pub async fn create_snapshot(&self, source: &SourceDocument) -> WorkflowResult<FileDetail> {
        let folder = self.ensure_archive_folder(source).await?;

        let copy = self.files.copy_file(&source.document, &folder.id).await?;
        let detail = self.files.file_detail(&copy).await?;
        tracing::info!(snapshot = %detail.id, name = %detail.name, "snapshot created");
        Ok(detail)
    }

    /// Rename a snapshot to carry its version, returning the updated record
    ///
    /// # Errors
    /// Collaborator failures.
    pub async fn label_snapshot(&self, snapshot: FileDetail, version: &VersionInfo) -> WorkflowResult<FileDetail> {
        let name = format!("{} v{}", snapshot.name, version);
        self.files.rename_file(&snapshot.id, &name).await?;
        tracing::info!(snapshot = %snapshot.id, %name, "snapshot renamed");
        Ok(FileDetail { name, ..snapshot })
    }

    async fn ensure_archive_folder(&self, source: &SourceDocument) -> WorkflowResult<FileDetail> {
        let existing = self
            .files
            .list_files(&source.container, ARCHIVE_FOLDER, &FileKind::Folder)
            .await?;

        if let Some(folder) = existing.into_iter().next() {
            tracing::info!(folder = %folder.id, "archive folder exists");
            return Ok(folder);
        }

        let folder = self.files.create_folder(&source.container, ARCHIVE_FOLDER).await?;
        tracing::info!(folder = %folder.id, "archive folder created");
        Ok(folder)
    }
}

impl std::fmt::Debug for SnapshotCreator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCreator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockFileService;
    use crate::types::FileId;
    use mockall::predicate::eq;

    fn source() -> SourceDocument {
        SourceDocument {
            document: FileId::from("doc"),
            container: FileId::from("parent"),
        }
    }

    fn folder(id: &str) -> FileDetail {
        FileDetail {
            id: FileId::from(id),
            name: ARCHIVE_FOLDER.to_string(),
            kind: FileKind::Folder,
            container: Some(FileId::from("parent")),
            created_at: "2024-05-01T00:00:00Z".to_string(),
        }
    }

    fn copy_detail() -> FileDetail {
        FileDetail {
            id: FileId::from("copy-1"),
            name: "Quarterly Report".to_string(),
            kind: FileKind::Document,
            container: Some(FileId::from("versions")),
            created_at: "2024-05-02T10:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn reuses_existing_archive_folder() {
        let mut files = MockFileService::new();
        files
            .expect_list_files()
            .withf(|container, name, kind| {
                container.as_str() == "parent" && name == ARCHIVE_FOLDER && *kind == FileKind::Folder
            })
            .returning(|_, _, _| Ok(vec![folder("versions")]));
        files.expect_create_folder().never();
        files
            .expect_copy_file()
            .with(eq(FileId::from("doc")), eq(FileId::from("versions")))
            .times(1)
            .returning(|_, _| Ok(FileId::from("copy-1")));
        files.expect_file_detail().returning(|_| Ok(copy_detail()));

        let creator = SnapshotCreator::new(&Collaborators {
            files: Arc::new(files),
            ..Collaborators::unexpected()
        });

        let snapshot = creator.create_snapshot(&source()).await.unwrap();
        assert_eq!(snapshot, copy_detail());
    }

    #[tokio::test]
    async fn creates_archive_folder_when_missing() {
        let mut files = MockFileService::new();
        files.expect_list_files().returning(|_, _, _| Ok(vec![]));
        files
            .expect_create_folder()
            .withf(|container, name| container.as_str() == "parent" && name == ARCHIVE_FOLDER)
            .times(1)
            .returning(|_, _| Ok(folder("new-folder")));
        files
            .expect_copy_file()
            .with(eq(FileId::from("doc")), eq(FileId::from("new-folder")))
            .times(1)
            .returning(|_, _| Ok(FileId::from("copy-1")));
        files.expect_file_detail().returning(|_| Ok(copy_detail()));

        let creator = SnapshotCreator::new(&Collaborators {
            files: Arc::new(files),
            ..Collaborators::unexpected()
        });

        creator.create_snapshot(&source()).await.unwrap();
    }

    #[tokio::test]
    async fn label_appends_version() {
        let mut files = MockFileService::new();
        files
            .expect_rename_file()
            .withf(|id, name| id.as_str() == "copy-1" && name == "Quarterly Report v1.3.0")
            .times(1)
            .returning(|_, _| Ok(()));

        let creator = SnapshotCreator::new(&Collaborators {
            files: Arc::new(files),
            ..Collaborators::unexpected()
        });

        let labeled = creator
            .label_snapshot(copy_detail(), &VersionInfo::new(1, 3, 0))
            .await
            .unwrap();
        assert_eq!(labeled.name, "Quarterly Report v1.3.0");
        assert_eq!(labeled.id, FileId::from("copy-1"));
    }
}
