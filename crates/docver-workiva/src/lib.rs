//! Docver Workiva - platform API client for the create-version workflow
//!
//! [`WorkivaClient`] implements every `docver_core` collaborator trait over
//! the Workiva REST APIs, so a single client backs a whole run:
//!
//! ```rust,ignore
//! use docver_core::{Collaborators, VersionWorkflow, WorkflowConfig};
//! use docver_workiva::{ClientConfig, WorkivaClient};
//! use std::sync::Arc;
//!
//! let client = WorkivaClient::new(ClientConfig::from_env()?)?;
//! let workflow = VersionWorkflow::new(
//!     WorkflowConfig::from_env()?,
//!     &Collaborators::from_backend(Arc::new(client)),
//! );
//! let report = workflow.run().await?;
//! ```

#![warn(unreachable_pub)]

pub mod client;
pub mod config;
mod wire;

pub use client::WorkivaClient;
pub use config::ClientConfig;
