use serde_json::Value;

use super::{default_terminal_state, OperationKind};
use crate::models::PipelineExecutionDetail;
use crate::state_machine::TerminalStatus;

/// Pipeline executions (RunPipeline)
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineKind;

impl OperationKind for PipelineKind {
    fn kind(&self) -> &str {
        "pipeline"
    }

    fn id_field(&self) -> &str {
        "executionId"
    }

    fn payload_type(&self) -> &str {
        "aws.codepipeline.execution"
    }

    fn event_source(&self) -> &str {
        PipelineExecutionDetail::SOURCE
    }

    fn detail_type(&self) -> &str {
        PipelineExecutionDetail::DETAIL_TYPE
    }

    fn translate_terminal_state(&self, state: &str, _detail: &Value) -> Option<TerminalStatus> {
        // A superseded execution never finishes on its own
        if state.eq_ignore_ascii_case("SUPERSEDED") {
            return Some(TerminalStatus::Stopped);
        }
        default_terminal_state(state)
    }

    fn payload_name(&self, detail: &Value) -> Option<String> {
        detail
            .get("pipeline")
            .or_else(|| detail.get("pipelineName"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}
