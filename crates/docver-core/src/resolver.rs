//! Next-version resolution from the ledger table

use crate::error::WorkflowResult;
use crate::services::{Collaborators, SpreadsheetService};
use crate::types::{FileId, SheetId};
use crate::version::{VersionInfo, VersionPart, SEED_VERSION};
use std::sync::Arc;

/// Row holding the most recent version (directly beneath the header)
const LATEST_ROW: usize = 1;

/// Computes the version of the snapshot about to be created
#[derive(Clone)]
pub struct VersionResolver {
    spreadsheets: Arc<dyn SpreadsheetService>,
}

impl VersionResolver {
    /// Create resolver
    #[must_use]
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            spreadsheets: collaborators.spreadsheets.clone(),
        }
    }

    /// Next version for the ledger in `sheet`
    ///
    /// With only a header row (or nothing) the seed version `0.1.0` is
    /// returned as is. Otherwise the newest entry gets a minor bump,
    /// whatever its patch value.
    ///
    /// # Errors
    /// Collaborator failures, a format error for a malformed stored
    /// version, or an overflow error when its minor component is at the limit.
    pub async fn resolve_next(&self, spreadsheet: &FileId, sheet: &SheetId) -> WorkflowResult<VersionInfo> {
        let values = self.spreadsheets.raw_values(spreadsheet, sheet).await?;

        if values.len() <= LATEST_ROW {
            tracing::info!("no previous versions found");
            return Ok(SEED_VERSION);
        }

        let latest = values[LATEST_ROW].first().map(String::as_str).unwrap_or_default();
        tracing::info!(latest, "latest version");

        let next = VersionInfo::parse(latest)?.bumped(VersionPart::Minor)?;
        tracing::info!(%next, "next version");
        Ok(next)
    }
}

impl std::fmt::Debug for VersionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{VersionError, WorkflowError};
    use crate::services::MockSpreadsheetService;
    use crate::types::{SheetValues, LEDGER_HEADERS};

    fn header() -> Vec<String> {
        LEDGER_HEADERS.iter().map(|h| (*h).to_string()).collect()
    }

    fn resolver_over(values: SheetValues) -> VersionResolver {
        let mut spreadsheets = MockSpreadsheetService::new();
        spreadsheets
            .expect_raw_values()
            .times(1)
            .returning(move |_, _| Ok(values.clone()));

        VersionResolver::new(&Collaborators {
            spreadsheets: Arc::new(spreadsheets),
            ..Collaborators::unexpected()
        })
    }

    async fn resolve(values: SheetValues) -> WorkflowResult<VersionInfo> {
        resolver_over(values)
            .resolve_next(&FileId::from("doc"), &SheetId::from("sheet"))
            .await
    }

    #[tokio::test]
    async fn empty_sheet_seeds_first_version() {
        assert_eq!(resolve(vec![]).await.unwrap().to_string(), "0.1.0");
    }

    #[tokio::test]
    async fn header_only_seeds_first_version() {
        assert_eq!(resolve(vec![header()]).await.unwrap().to_string(), "0.1.0");
    }

    #[tokio::test]
    async fn newest_row_gets_minor_bump() {
        let mut latest = vec!["1.2.3".to_string()];
        latest.resize(6, String::new());
        let older = vec!["1.1.0".to_string()];

        let next = resolve(vec![header(), latest, older]).await.unwrap();
        assert_eq!(next.to_string(), "1.3.0");
    }

    #[tokio::test]
    async fn malformed_version_propagates_format_error() {
        let err = resolve(vec![header(), vec!["v2".to_string()]]).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Version(VersionError::Format(_))));
    }

    #[tokio::test]
    async fn minor_at_limit_is_overflow_error() {
        let err = resolve(vec![header(), vec!["1.4294967295.0".to_string()]]).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Version(VersionError::Overflow(_))));
    }

    #[tokio::test]
    async fn empty_version_cell_is_format_error() {
        let err = resolve(vec![header(), vec![]]).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Version(VersionError::Format(_))));
    }
}
