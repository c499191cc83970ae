//! Testing utilities for Docver workspace
//!
//! Shared in-memory platform, fixtures, and workflow setup.

#![allow(missing_docs)]

mod workiva;

pub use workiva::{FakeOp, InMemoryWorkiva};

use docver_core::prelude::*;
use std::sync::Arc;

/// Container holding every fixture document
pub const WORKSPACE_FOLDER: &str = "workspace-root";

/// Display name of the fixture user who triggers runs
pub const TRIGGER_USER_NAME: &str = "Ada Lovelace";

/// Directory id of the fixture trigger user
pub const TRIGGER_USER_ID: &str = "user-ada";

/// A platform with one source document and its automations
#[derive(Debug)]
pub struct Fixture {
    pub platform: Arc<InMemoryWorkiva>,
    pub document: FileId,
    pub container: FileId,
}

impl Fixture {
    /// Collaborators backed by the fixture platform
    #[must_use]
    pub fn collaborators(&self) -> Collaborators {
        Collaborators::from_backend(self.platform.clone())
    }

    /// Workflow configuration for the fixture document
    #[must_use]
    pub fn config(&self) -> WorkflowConfig {
        WorkflowConfig::new(self.document.clone()).with_link_settings("app.wdesk.com", "acct-1")
    }

    /// Workflow over the fixture platform
    #[must_use]
    pub fn workflow(&self) -> VersionWorkflow {
        self.workflow_with(self.config())
    }

    /// Workflow with custom configuration
    #[must_use]
    pub fn workflow_with(&self, config: WorkflowConfig) -> VersionWorkflow {
        VersionWorkflow::new(config, &self.collaborators())
    }

    /// Resource the source document's automations are bound to
    #[must_use]
    pub fn source_resource(&self) -> ResourceId {
        ResourceId::for_document(&self.document)
    }

    /// Archive folder, if it exists
    #[must_use]
    pub fn archive_folder(&self) -> Option<FileDetail> {
        self.platform
            .files_in(&self.container)
            .into_iter()
            .find(|f| f.name == ARCHIVE_FOLDER && f.kind == FileKind::Folder)
    }

    /// Snapshots in the archive folder
    #[must_use]
    pub fn snapshots(&self) -> Vec<FileDetail> {
        self.archive_folder()
            .map(|folder| self.platform.files_in(&folder.id))
            .unwrap_or_default()
    }
}

/// Document without a "Version History" section, with the versioning
/// automations bound and one run of "Create Version" in flight
pub fn empty_document() -> Fixture {
    let platform = Arc::new(InMemoryWorkiva::new());
    let container = FileId::from(WORKSPACE_FOLDER);
    let document = platform.add_document("Quarterly Report", &container);
    platform.add_section(&document, "Cover");

    let resource = ResourceId::for_document(&document);
    platform.add_automation(&resource, CREATE_VERSION_AUTOMATION, Some("STARTED"), Some(TRIGGER_USER_ID));
    platform.add_automation(&resource, ROLLBACK_VERSION_AUTOMATION, Some(SUCCEEDED_STATUS), Some("user-bob"));
    platform.add_automation(&resource, "Publish Report", None, None);

    platform.add_user(TRIGGER_USER_ID, TRIGGER_USER_NAME);
    platform.add_user("user-bob", "Bob Builder");

    Fixture {
        platform,
        document,
        container,
    }
}

/// Document whose ledger already holds the header and the given rows
pub fn document_with_versions(rows: &[&[&str]]) -> Fixture {
    let fixture = empty_document();
    let mut all: Vec<&[&str]> = Vec::with_capacity(rows.len() + 1);
    all.push(&LEDGER_HEADERS);
    all.extend_from_slice(rows);
    fixture.platform.add_ledger(&fixture.document, &all);
    fixture
}

/// Cells of a ledger row as owned strings
pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| (*c).to_string()).collect()
}
