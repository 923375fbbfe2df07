//! Line-delimited JSON command handler
//!
//! One command per input line, one response per output line:
//!
//! ```text
//! {"command":"submit_report","member":"0x..","epoch_id":10,"beacon_balance":"100","beacon_validators":5}
//! {"ok":true,"result":{"Collecting":{"frame_id":1,"support":1,"quorum":2}}}
//! ```
//!
//! A malformed line produces an error response and the loop keeps going.

use qc_18_beacon_oracle::{
    BeaconSpec, CompletedFrame, EpochRange, FrameStatus, FrameWindow, MemberAddress, OracleApi,
    OracleError, ReportData, ReportSubmission, TimeSource, Timestamp,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum OracleCommand {
    SubmitReport {
        member: MemberAddress,
        epoch_id: u64,
        #[serde_as(as = "DisplayFromStr")]
        beacon_balance: u128,
        beacon_validators: u64,
        /// Submission time, defaults to the system clock
        #[serde(default)]
        now: Option<Timestamp>,
    },
    AddMember {
        member: MemberAddress,
    },
    RemoveMember {
        member: MemberAddress,
    },
    SetQuorum {
        quorum: u32,
    },
    SetBeaconSpec {
        epochs_per_frame: u64,
        slots_per_epoch: u64,
        seconds_per_slot: u64,
        genesis_time: u64,
    },
    Status,
    Members,
    Variants,
}

/// Result of the `status` command
#[derive(Clone, Debug, Serialize)]
pub struct StatusView {
    pub spec: BeaconSpec,
    pub frame: FrameWindow,
    pub status: FrameStatus,
    pub reportable: EpochRange,
    pub quorum: u32,
    pub members: usize,
    pub last_completed_epoch: u64,
    pub last_completed: Option<CompletedFrame>,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Parse(serde_json::Error),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("failed to encode result: {0}")]
    Encode(serde_json::Error),
}

impl CommandError {
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::Parse(_) => "parse",
            CommandError::Oracle(err) => err.kind().as_str(),
            CommandError::Encode(_) => "internal",
        }
    }
}

/// Single response line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl CommandResponse {
    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            kind: None,
        }
    }

    pub fn failure(err: &CommandError) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(err.to_string()),
            kind: Some(err.kind().to_string()),
        }
    }
}

pub struct CommandHandler<A, T>
where
    A: OracleApi,
    T: TimeSource,
{
    api: Arc<A>,
    time: Arc<T>,
}

impl<A, T> CommandHandler<A, T>
where
    A: OracleApi,
    T: TimeSource,
{
    pub fn new(api: Arc<A>, time: Arc<T>) -> Self {
        Self { api, time }
    }

    /// Parse and execute one input line
    pub async fn handle_line(&self, line: &str) -> CommandResponse {
        let outcome = match serde_json::from_str::<OracleCommand>(line) {
            Ok(command) => self.execute(command).await,
            Err(err) => Err(CommandError::Parse(err)),
        };

        match outcome {
            Ok(result) => CommandResponse::success(result),
            Err(err) => {
                debug!(error = %err, kind = err.kind(), "Command failed");
                CommandResponse::failure(&err)
            }
        }
    }

    pub async fn execute(&self, command: OracleCommand) -> Result<Value, CommandError> {
        match command {
            OracleCommand::SubmitReport {
                member,
                epoch_id,
                beacon_balance,
                beacon_validators,
                now,
            } => {
                let now = now.unwrap_or_else(|| self.time.now());
                let report = ReportData::new(epoch_id, beacon_balance, beacon_validators);
                let status = self
                    .api
                    .submit_report(ReportSubmission::new(member, report, now))
                    .await?;
                encode(&status)
            }
            OracleCommand::AddMember { member } => {
                self.api.add_member(member).await?;
                encode(&self.api.get_members().await)
            }
            OracleCommand::RemoveMember { member } => {
                let completed = self.api.remove_member(member).await?;
                encode(&completed)
            }
            OracleCommand::SetQuorum { quorum } => {
                let completed = self.api.set_quorum(quorum).await?;
                encode(&completed)
            }
            OracleCommand::SetBeaconSpec {
                epochs_per_frame,
                slots_per_epoch,
                seconds_per_slot,
                genesis_time,
            } => {
                let spec = BeaconSpec::new(
                    epochs_per_frame,
                    slots_per_epoch,
                    seconds_per_slot,
                    genesis_time,
                )?;
                self.api.set_beacon_spec(spec).await?;
                encode(&spec)
            }
            OracleCommand::Status => encode(&self.status().await),
            OracleCommand::Members => encode(&self.api.get_members().await),
            OracleCommand::Variants => encode(&self.api.get_current_variants().await),
        }
    }

    async fn status(&self) -> StatusView {
        let now = self.time.now();
        StatusView {
            spec: self.api.get_beacon_spec().await,
            frame: self.api.get_current_frame().await,
            status: self.api.get_current_frame_status().await,
            reportable: self.api.get_reportable_epoch_range(now).await,
            quorum: self.api.get_quorum().await,
            members: self.api.get_members().await.len(),
            last_completed_epoch: self.api.get_last_completed_epoch().await,
            last_completed: self.api.get_last_completed_report().await,
        }
    }

    /// Serve commands from `reader` until EOF or shutdown
    pub async fn run<Rd, W>(
        &self,
        reader: Rd,
        mut writer: W,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()>
    where
        Rd: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Command loop stopping on shutdown");
                        return Ok(());
                    }
                    continue;
                }
            };

            let Some(line) = line else {
                info!("Command input closed");
                return Ok(());
            };
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&line).await;
            if !response.ok {
                warn!(
                    error = response.error.as_deref().unwrap_or_default(),
                    "Command rejected"
                );
            }
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }
    }
}

fn encode<V: Serialize>(value: &V) -> Result<Value, CommandError> {
    serde_json::to_value(value).map_err(CommandError::Encode)
}
