//! Functional tests for version ledger provisioning.
//!
//! These tests exercise StructureProvisioner against the in-memory platform:
//! - Section and table discovery never creates duplicates on re-runs.
//! - Table insertion is guarded by the rich-text revision.
//! - Headers are overwritten in place.

use docver_core::prelude::*;
use docver_core::{RestartPoint, SpreadsheetService, StructureProvisioner};
use docver_test_utils::{document_with_versions, empty_document, row, FakeOp};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn ensure_section_twice_yields_one_section() {
    let fixture = empty_document();
    let provisioner = StructureProvisioner::new(&fixture.collaborators());

    let first = provisioner.ensure_section(&fixture.document).await.unwrap();
    let second = provisioner.ensure_section(&fixture.document).await.unwrap();

    assert_eq!(first, second);
    let named: Vec<Section> = fixture
        .platform
        .sections(&fixture.document)
        .into_iter()
        .filter(|s| s.name == VERSION_HISTORY_SECTION)
        .collect();
    assert_eq!(named.len(), 1);
    assert_eq!(fixture.platform.call_count(FakeOp::CreateSection), 1);
}

#[tokio::test]
async fn version_history_section_is_created_first() {
    let fixture = empty_document();
    let provisioner = StructureProvisioner::new(&fixture.collaborators());

    provisioner.ensure_section(&fixture.document).await.unwrap();

    let sections = fixture.platform.sections(&fixture.document);
    assert_eq!(sections[0].name, VERSION_HISTORY_SECTION);
    assert_eq!(sections[1].name, "Cover");
}

#[tokio::test]
async fn ensure_table_twice_creates_exactly_one_table() {
    let fixture = empty_document();
    let provisioner = StructureProvisioner::new(&fixture.collaborators());
    let section = provisioner.ensure_section(&fixture.document).await.unwrap();

    let block = provisioner
        .fetch_section_rich_text(&fixture.document, &section)
        .await
        .unwrap();
    let first = provisioner.ensure_table(&block).await.unwrap();

    let refreshed = provisioner
        .fetch_section_rich_text(&fixture.document, &section)
        .await
        .unwrap();
    let second = provisioner.ensure_table(&refreshed).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(fixture.platform.table_count(&block.id), 1);
    assert_eq!(fixture.platform.call_count(FakeOp::EditRichText), 1);
}

#[tokio::test]
async fn stale_revision_conflicts_and_refetch_recovers() {
    let fixture = empty_document();
    let provisioner = StructureProvisioner::new(&fixture.collaborators());
    let section = provisioner.ensure_section(&fixture.document).await.unwrap();
    let block = provisioner
        .fetch_section_rich_text(&fixture.document, &section)
        .await
        .unwrap();

    // Someone else edits the section between fetch and insert.
    fixture.platform.touch_rich_text(&block.id);

    let err = provisioner.ensure_table(&block).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.restart_point(), RestartPoint::RichTextFetch);
    assert_eq!(fixture.platform.table_count(&block.id), 0);

    let fresh = provisioner
        .fetch_section_rich_text(&fixture.document, &section)
        .await
        .unwrap();
    assert_ne!(fresh.revision, block.revision);
    provisioner.ensure_table(&fresh).await.unwrap();
    assert_eq!(fixture.platform.table_count(&block.id), 1);
}

#[tokio::test]
async fn provision_rerun_after_failure_does_not_duplicate_structure() {
    let fixture = empty_document();
    let provisioner = StructureProvisioner::new(&fixture.collaborators());

    fixture
        .platform
        .fail_next(FakeOp::TableProperties, CollaboratorError::Network("timeout".into()));
    let err = provisioner.provision(&fixture.document).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Collaborator(CollaboratorError::Network(_))));

    let ledger = provisioner.provision(&fixture.document).await.unwrap();

    assert_eq!(fixture.platform.call_count(FakeOp::CreateSection), 1);
    assert_eq!(fixture.platform.call_count(FakeOp::EditRichText), 1);
    assert_eq!(fixture.platform.table_count(&ledger.rich_text.id), 1);
}

#[tokio::test]
async fn headers_overwrite_in_place() {
    let fixture = document_with_versions(&[&["1.0.0", "Old", "link", "Bob", "t", "No"]]);
    let provisioner = StructureProvisioner::new(&fixture.collaborators());

    provisioner.provision(&fixture.document).await.unwrap();
    provisioner.provision(&fixture.document).await.unwrap();

    let values = fixture.platform.ledger_values(&fixture.document).unwrap();
    assert_eq!(values.len(), 2);
    assert_eq!(values[0], row(&LEDGER_HEADERS));
    assert_eq!(values[1][0], "1.0.0");
    assert_eq!(fixture.platform.call_count(FakeOp::EditRichText), 0);
}

#[tokio::test]
async fn mangled_headers_are_restored() {
    let fixture = document_with_versions(&[]);
    let provisioner = StructureProvisioner::new(&fixture.collaborators());
    let ledger = provisioner.provision(&fixture.document).await.unwrap();

    let spreadsheets = fixture.collaborators().spreadsheets;
    spreadsheets
        .update_range(
            &fixture.document,
            &ledger.sheet,
            CellRange::ledger_row(0),
            vec![row(&["v", "", "", "", "", ""])],
        )
        .await
        .unwrap();

    provisioner.ensure_headers(&fixture.document, &ledger.sheet).await.unwrap();

    let values = fixture.platform.ledger_values(&fixture.document).unwrap();
    assert_eq!(values, vec![row(&LEDGER_HEADERS)]);
}
