//! Push notifications delivered by the event bus.
//!
//! The envelope is kept loose (`detail` stays raw JSON so it can be forwarded
//! downstream untouched) while the detail itself is decoded into a closed set
//! of typed variants selected by detail type. Anything that does not decode is
//! dropped by the correlator without an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::payload_fields;

/// Event-bus envelope as delivered to the node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(default)]
    pub region: String,
    pub source: String,
    #[serde(rename = "detail-type", alias = "detailType")]
    pub detail_type: String,
    #[serde(default)]
    pub detail: Value,
}

impl PushEvent {
    pub fn new(
        region: impl Into<String>,
        source: impl Into<String>,
        detail_type: impl Into<String>,
        detail: Value,
    ) -> Self {
        Self {
            region: region.into(),
            source: source.into(),
            detail_type: detail_type.into(),
            detail,
        }
    }
}

/// Identifier and state pulled out of a decoded detail. Error messages are
/// not part of it; the operation kind extracts those from the raw detail for
/// both completion channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub identifier: String,
    pub state: String,
}

/// Pipeline execution state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineExecutionDetail {
    pub pipeline: Option<String>,
    #[serde(rename = "execution-id")]
    pub execution_id: Option<String>,
    pub state: Option<String>,
    pub version: Option<Value>,
}

impl PipelineExecutionDetail {
    pub const DETAIL_TYPE: &'static str = "CodePipeline Pipeline Execution State Change";
    pub const SOURCE: &'static str = "aws.codepipeline";
}

/// Machine image state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageStateDetail {
    pub image_id: Option<String>,
    pub state: Option<String>,
    pub error_message: Option<String>,
}

impl ImageStateDetail {
    pub const DETAIL_TYPE: &'static str = "EC2 AMI State Change";
    pub const SOURCE: &'static str = "aws.ec2";
}

/// Container task state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateDetail {
    pub task_arn: Option<String>,
    pub last_status: Option<String>,
    pub desired_status: Option<String>,
    pub stop_code: Option<String>,
    pub stopped_reason: Option<String>,
    #[serde(default)]
    pub containers: Vec<TaskContainerDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskContainerDetail {
    pub name: Option<String>,
    pub exit_code: Option<i64>,
    pub reason: Option<String>,
}

impl TaskStateDetail {
    pub const DETAIL_TYPE: &'static str = "ECS Task State Change";
    pub const SOURCE: &'static str = "aws.ecs";

    /// Every container that reported an exit code exited cleanly
    pub fn all_containers_succeeded(&self) -> bool {
        !self.containers.is_empty()
            && self
                .containers
                .iter()
                .all(|container| container.exit_code == Some(0))
    }
}

/// Closed set of detail shapes the tracker understands
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
    PipelineExecution(PipelineExecutionDetail),
    ImageState(ImageStateDetail),
    TaskState(TaskStateDetail),
}

impl EventDetail {
    /// Decode `detail` by detail type; `None` for unknown types or shapes
    pub fn decode(detail_type: &str, detail: &Value) -> Option<Self> {
        match detail_type {
            PipelineExecutionDetail::DETAIL_TYPE => serde_json::from_value(detail.clone())
                .ok()
                .map(Self::PipelineExecution),
            ImageStateDetail::DETAIL_TYPE => serde_json::from_value(detail.clone())
                .ok()
                .map(Self::ImageState),
            TaskStateDetail::DETAIL_TYPE => serde_json::from_value(detail.clone())
                .ok()
                .map(Self::TaskState),
            _ => None,
        }
    }

    pub fn detail_type(&self) -> &'static str {
        match self {
            Self::PipelineExecution(_) => PipelineExecutionDetail::DETAIL_TYPE,
            Self::ImageState(_) => ImageStateDetail::DETAIL_TYPE,
            Self::TaskState(_) => TaskStateDetail::DETAIL_TYPE,
        }
    }

    /// Identifier and state, or `None` when either is missing
    pub fn observation(&self) -> Option<Observation> {
        let (identifier, state) = match self {
            Self::PipelineExecution(detail) => (&detail.execution_id, &detail.state),
            Self::ImageState(detail) => (&detail.image_id, &detail.state),
            Self::TaskState(detail) => (&detail.task_arn, &detail.last_status),
        };

        let identifier = identifier.clone().filter(|id| !id.is_empty())?;
        let state = state.clone().filter(|state| !state.is_empty())?;
        Some(Observation { identifier, state })
    }
}

/// Vendor error message from a raw detail, checking the top level first and
/// then a nested `detail` object
pub fn error_message_from(detail: &Value) -> Option<String> {
    let lookup = |value: &Value| {
        value
            .get(payload_fields::ERROR_MESSAGE)
            .or_else(|| value.get("errorMessage"))
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    };

    lookup(detail).or_else(|| {
        detail
            .get(payload_fields::DETAIL)
            .and_then(|nested| lookup(nested))
    })
}
