//! `docver` - run the create-version workflow for one document

use anyhow::Context;
use clap::Command;
use docver_core::{Collaborators, VersionWorkflow, WorkflowConfig};
use docver_workiva::{ClientConfig, WorkivaClient};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Set to `json` for structured log output
const LOG_FORMAT_VAR: &str = "DOCVER_LOG_FORMAT";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Command::new("docver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Snapshot a Workiva document and record it in its version ledger")
        .long_about(
            "Snapshot a Workiva document and record it in its version ledger.\n\n\
             Configuration is read from the environment:\n  \
             DOCUMENT_ID              source document (required)\n  \
             WORKIVA_ACCESS_TOKEN     API bearer token (required)\n  \
             WORKIVA_CLUSTER_DOMAIN   host used in snapshot links\n  \
             WORKIVA_ACCOUNT_ID       account used in snapshot links\n  \
             WORKIVA_API_BASE_URL     API base URL\n  \
             WORKIVA_TIMEOUT_SECS     per-request timeout\n  \
             DOCVER_RENAME_SNAPSHOT   append the version to the snapshot name\n  \
             DOCVER_TRIGGER_USER_ID   record this user instead of scanning automations\n  \
             DOCVER_LOG_FORMAT        'json' for structured logs",
        )
        .get_matches();

    init_tracing();

    let workflow_config = WorkflowConfig::from_env().context("loading workflow configuration")?;
    let client_config = ClientConfig::from_env().context("loading Workiva client configuration")?;
    let client = WorkivaClient::new(client_config).context("building Workiva client")?;

    let collaborators = Collaborators::from_backend(Arc::new(client));
    let workflow = VersionWorkflow::new(workflow_config, &collaborators);

    let report = match workflow.run().await {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(error = %err, restart = ?err.restart_point(), "create version failed");
            return Err(err.into());
        }
    };

    tracing::info!(
        run_id = %report.run_id,
        version = %report.version,
        snapshot = %report.snapshot.id,
        name = %report.snapshot.name,
        table = %report.ledger.table.id,
        created_by = %report.row.created_by,
        removed_automations = report.removed_automations.len(),
        "create version complete"
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_VAR).is_ok_and(|v| v.trim().eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
