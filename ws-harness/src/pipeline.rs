//! Submit an update and verify it, one typed stage at a time:
//! `Submit -> AwaitAck -> AwaitNavigation -> FetchState -> Assert`.

use std::fmt;
use std::time::Duration;

use tracing::{info, instrument};
use ws_core::{Workspace, WorkspacePatch};

use crate::assertion::{ExpectedWorkspace, StateAssertionEngine};
use crate::client::Ack;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::form::{FormDriver, Submission, OVERVIEW_APP};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Submit,
    AwaitAck,
    AwaitNavigation,
    FetchState,
    Assert,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Submit => "submit",
            Stage::AwaitAck => "await-ack",
            Stage::AwaitNavigation => "await-navigation",
            Stage::FetchState => "fetch-state",
            Stage::Assert => "assert",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful run observed.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub sent: WorkspacePatch,
    pub ack: Ack,
    pub location: String,
    pub workspace: Workspace,
}

#[derive(Clone)]
pub struct UpdatePipeline {
    engine: StateAssertionEngine,
    ack_timeout: Duration,
    navigation_timeout: Duration,
    expected_status: u16,
}

impl UpdatePipeline {
    pub fn new(engine: StateAssertionEngine, config: &HarnessConfig) -> Self {
        Self {
            engine,
            ack_timeout: config.request_timeout,
            navigation_timeout: config.navigation_timeout,
            expected_status: 200,
        }
    }

    async fn submit<D: FormDriver + ?Sized>(form: &mut D) -> HarnessResult<WorkspacePatch> {
        match form.click_update().await? {
            Submission::Sent(patch) => Ok(patch),
            Submission::Blocked(violations) => Err(HarnessError::Validation(violations)),
        }
    }

    async fn await_ack<D: FormDriver + ?Sized>(&self, form: &mut D) -> HarnessResult<Ack> {
        let ack = form.wait_for_update(self.ack_timeout).await?;
        if ack.status != self.expected_status {
            return Err(HarnessError::transport(
                Some(ack.status),
                format!("expected status {}", self.expected_status),
            ));
        }
        Ok(ack)
    }

    /// Run every stage against `form`; the first failure names its stage.
    #[instrument(skip(self, form, expected))]
    pub async fn run<D: FormDriver + ?Sized>(
        &self,
        form: &mut D,
        id: &str,
        expected: &ExpectedWorkspace,
    ) -> HarnessResult<PipelineOutcome> {
        let sent = Self::submit(form).await.map_err(|e| e.at(Stage::Submit))?;

        let ack = self.await_ack(form).await.map_err(|e| e.at(Stage::AwaitAck))?;

        let location = form
            .wait_for_location(OVERVIEW_APP, self.navigation_timeout)
            .await
            .map_err(|e| e.at(Stage::AwaitNavigation))?;

        let workspace = self
            .engine
            .manager()
            .fetch(id)
            .await
            .map_err(|e| e.at(Stage::FetchState))?;

        self.engine
            .diff(&workspace, expected)
            .into_result()
            .map_err(|e| e.at(Stage::Assert))?;

        info!(revision = workspace.revision, %location, "update verified");
        Ok(PipelineOutcome {
            sent,
            ack,
            location,
            workspace,
        })
    }
}
