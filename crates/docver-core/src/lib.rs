//! Docver Core - versioned snapshots with an embedded version ledger
//!
//! Drives one create-version run against a source document:
//! - Provisions the "Version History" section, ledger table and headers
//! - Resolves the next semantic version from the ledger
//! - Copies the document into the "Document Versions" folder
//! - Records the version row beneath the header
//! - Strips versioning automations from the new snapshot
//!
//! All remote calls go through the collaborator traits in [`services`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docver_core::{Collaborators, VersionWorkflow, WorkflowConfig};
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let config = WorkflowConfig::from_env()?;
//! let workflow = VersionWorkflow::new(config, &collaborators);
//!
//! let report = workflow.run().await?;
//! println!("Created version {}", report.version);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod automation;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod provisioner;
pub mod recorder;
pub mod resolver;
pub mod services;
pub mod snapshot;
pub mod types;
pub mod version;

// Re-exports for convenience
pub use automation::{AutomationCleaner, TriggerUserResolver};
pub use config::WorkflowConfig;
pub use error::{
    CollaboratorError, ConfigError, RestartPoint, VersionError, WorkflowError, WorkflowResult,
};
pub use orchestrator::{VersionRunReport, VersionWorkflow};
pub use provisioner::{StructureProvisioner, VersionLedger};
pub use recorder::TableRecorder;
pub use resolver::VersionResolver;
pub use services::{
    AutomationService, Collaborators, DocumentService, FileService, RichTextService,
    ServiceResult, SpreadsheetService, TableService, UserDirectoryService,
};
pub use snapshot::SnapshotCreator;
pub use version::{VersionInfo, VersionPart, SEED_VERSION};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for implementing collaborators and running the workflow
    pub use crate::types::*;
    pub use crate::{
        Collaborators, CollaboratorError, ServiceResult, VersionInfo, VersionWorkflow,
        WorkflowConfig, WorkflowError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
