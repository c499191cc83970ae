//! Workflow configuration loaded from the environment

use crate::error::ConfigError;
use crate::types::{FileId, UserId};

/// Required id of the source document
pub const DOCUMENT_ID_VAR: &str = "DOCUMENT_ID";
/// Host used in snapshot links
pub const CLUSTER_DOMAIN_VAR: &str = "WORKIVA_CLUSTER_DOMAIN";
/// Account used in snapshot links
pub const ACCOUNT_ID_VAR: &str = "WORKIVA_ACCOUNT_ID";
/// Rename snapshots to include their version
pub const RENAME_SNAPSHOT_VAR: &str = "DOCVER_RENAME_SNAPSHOT";
/// Explicit trigger user, skipping automation inspection
pub const TRIGGER_USER_ID_VAR: &str = "DOCVER_TRIGGER_USER_ID";

/// Workflow configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Source document
    pub document_id: FileId,
    /// Cluster host for snapshot links
    pub cluster_domain: String,
    /// Account id for snapshot links
    pub account_id: String,
    /// Rename each snapshot to `"{name} v{version}"`
    pub rename_snapshot: bool,
    /// Trigger user supplied by the invoking context
    pub trigger_user_id: Option<UserId>,
}

impl WorkflowConfig {
    /// Create configuration for a document with default settings
    #[inline]
    #[must_use]
    pub fn new(document_id: impl Into<FileId>) -> Self {
        Self {
            document_id: document_id.into(),
            cluster_domain: String::new(),
            account_id: String::new(),
            rename_snapshot: false,
            trigger_user_id: None,
        }
    }

    /// Load from process environment
    ///
    /// # Errors
    /// [`ConfigError::Missing`] if `DOCUMENT_ID` is unset or blank,
    /// [`ConfigError::Invalid`] for malformed optional values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    ///
    /// # Errors
    /// Same as [`WorkflowConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let document_id = non_blank(DOCUMENT_ID_VAR).ok_or(ConfigError::Missing(DOCUMENT_ID_VAR))?;

        let cluster_domain = non_blank(CLUSTER_DOMAIN_VAR).unwrap_or_default();
        let account_id = non_blank(ACCOUNT_ID_VAR).unwrap_or_default();
        if cluster_domain.is_empty() || account_id.is_empty() {
            tracing::warn!(
                "{} or {} not set; snapshot links will be incomplete",
                CLUSTER_DOMAIN_VAR,
                ACCOUNT_ID_VAR
            );
        }

        let rename_snapshot = match non_blank(RENAME_SNAPSHOT_VAR) {
            Some(value) => parse_flag(RENAME_SNAPSHOT_VAR, &value)?,
            None => false,
        };

        Ok(Self {
            document_id: FileId::new(document_id.trim()),
            cluster_domain,
            account_id,
            rename_snapshot,
            trigger_user_id: non_blank(TRIGGER_USER_ID_VAR).map(UserId::new),
        })
    }

    /// With link settings
    #[inline]
    #[must_use]
    pub fn with_link_settings(
        mut self,
        cluster_domain: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        self.cluster_domain = cluster_domain.into();
        self.account_id = account_id.into();
        self
    }

    /// With snapshot renaming
    #[inline]
    #[must_use]
    pub fn with_rename_snapshot(mut self, rename: bool) -> Self {
        self.rename_snapshot = rename;
        self
    }

    /// With explicit trigger user
    #[inline]
    #[must_use]
    pub fn with_trigger_user(mut self, user: impl Into<UserId>) -> Self {
        self.trigger_user_id = Some(user.into());
        self
    }

    /// Link to a document in the web UI
    #[must_use]
    pub fn document_link(&self, document: &FileId) -> String {
        format!(
            "https://{}/a/{}/doc/{}",
            self.cluster_domain, self.account_id, document
        )
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(key, format!("expected a boolean, got '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_document_id_is_configuration_error() {
        let err = WorkflowConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(DOCUMENT_ID_VAR)));

        let err = WorkflowConfig::from_lookup(lookup(&[(DOCUMENT_ID_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(DOCUMENT_ID_VAR)));
    }

    #[test]
    fn loads_all_values() {
        let config = WorkflowConfig::from_lookup(lookup(&[
            (DOCUMENT_ID_VAR, "doc-1"),
            (CLUSTER_DOMAIN_VAR, "app.wdesk.com"),
            (ACCOUNT_ID_VAR, "acct"),
            (RENAME_SNAPSHOT_VAR, "true"),
            (TRIGGER_USER_ID_VAR, "user-9"),
        ]))
        .unwrap();

        assert_eq!(config.document_id, FileId::from("doc-1"));
        assert!(config.rename_snapshot);
        assert_eq!(config.trigger_user_id, Some(UserId::from("user-9")));
        assert_eq!(
            config.document_link(&FileId::from("snap")),
            "https://app.wdesk.com/a/acct/doc/snap"
        );
    }

    #[test]
    fn optional_values_default() {
        let config = WorkflowConfig::from_lookup(lookup(&[(DOCUMENT_ID_VAR, "doc-1")])).unwrap();
        assert_eq!(config, WorkflowConfig::new("doc-1"));
    }

    #[test]
    fn invalid_flag_is_rejected() {
        let err = WorkflowConfig::from_lookup(lookup(&[
            (DOCUMENT_ID_VAR, "doc-1"),
            (RENAME_SNAPSHOT_VAR, "sometimes"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: RENAME_SNAPSHOT_VAR, .. }));
    }
}
