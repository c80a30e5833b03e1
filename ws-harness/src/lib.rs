//! ws-harness: verifies workspace updates end to end.
//!
//! A scenario creates a fixture workspace through the HTTP API, drives the
//! update form, waits for the response and navigation, then diffs the stored
//! record against an expected projection. The fixture is always deleted.

pub mod assertion;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod lifecycle;
pub mod pipeline;
pub mod scenario;

pub use assertion::{AssertionReport, ExpectedWorkspace, Mismatch, OwnerGrantMode, StateAssertionEngine};
pub use client::{Ack, HttpWorkspaceApi, WorkspaceApi};
pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use form::{FormDriver, Submission, WorkspaceUpdateForm};
pub use lifecycle::{WorkspaceLifecycleManager, WorkspaceState};
pub use pipeline::{PipelineOutcome, Stage, UpdatePipeline};
pub use scenario::{unique_workspace_name, Scenario, ScenarioContext, ScenarioOutcome};
