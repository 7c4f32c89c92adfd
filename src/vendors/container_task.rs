use serde_json::Value;

use super::OperationKind;
use crate::models::push_event::error_message_from;
use crate::models::TaskStateDetail;
use crate::state_machine::TerminalStatus;

const USER_INITIATED_STOP: &str = "UserInitiated";

/// One-off container tasks
///
/// A task only ever reports `STOPPED` when it ends; the outcome comes from the
/// stop code and the containers' exit codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerTaskKind;

impl OperationKind for ContainerTaskKind {
    fn kind(&self) -> &str {
        "task"
    }

    fn id_field(&self) -> &str {
        "taskArn"
    }

    fn payload_type(&self) -> &str {
        "aws.ecs.task"
    }

    fn event_source(&self) -> &str {
        TaskStateDetail::SOURCE
    }

    fn detail_type(&self) -> &str {
        TaskStateDetail::DETAIL_TYPE
    }

    fn detail_filter(&self) -> Value {
        serde_json::json!({ "lastStatus": ["STOPPED"] })
    }

    fn translate_terminal_state(&self, state: &str, detail: &Value) -> Option<TerminalStatus> {
        if !state.eq_ignore_ascii_case("STOPPED") {
            return None;
        }

        let Ok(task) = serde_json::from_value::<TaskStateDetail>(detail.clone()) else {
            return Some(TerminalStatus::Failed);
        };

        if task.stop_code.as_deref() == Some(USER_INITIATED_STOP) {
            Some(TerminalStatus::Stopped)
        } else if task.all_containers_succeeded() {
            Some(TerminalStatus::Succeeded)
        } else {
            Some(TerminalStatus::Failed)
        }
    }

    fn payload_name(&self, detail: &Value) -> Option<String> {
        detail
            .get("group")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn error_message(&self, detail: &Value) -> Option<String> {
        serde_json::from_value::<TaskStateDetail>(detail.clone())
            .ok()
            .and_then(|task| {
                task.stopped_reason.or_else(|| {
                    task.containers
                        .into_iter()
                        .find(|container| container.exit_code != Some(0))
                        .and_then(|container| container.reason)
                })
            })
            .or_else(|| error_message_from(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_running_task_is_not_terminal() {
        let kind = ContainerTaskKind;
        assert_eq!(kind.translate_terminal_state("RUNNING", &json!({})), None);
        assert_eq!(kind.translate_terminal_state("DEPROVISIONING", &json!({})), None);
    }

    #[test]
    fn test_stopped_task_outcomes() {
        let kind = ContainerTaskKind;

        let clean = json!({"lastStatus": "STOPPED", "stopCode": "EssentialContainerExited",
            "containers": [{"name": "app", "exitCode": 0}]});
        assert_eq!(
            kind.translate_terminal_state("STOPPED", &clean),
            Some(TerminalStatus::Succeeded)
        );

        let crashed = json!({"lastStatus": "STOPPED", "stopCode": "EssentialContainerExited",
            "stoppedReason": "Essential container in task exited",
            "containers": [{"name": "app", "exitCode": 1}]});
        assert_eq!(
            kind.translate_terminal_state("STOPPED", &crashed),
            Some(TerminalStatus::Failed)
        );
        assert_eq!(
            kind.error_message(&crashed).as_deref(),
            Some("Essential container in task exited")
        );

        let cancelled = json!({"lastStatus": "STOPPED", "stopCode": "UserInitiated",
            "containers": [{"name": "app", "exitCode": 143}]});
        assert_eq!(
            kind.translate_terminal_state("STOPPED", &cancelled),
            Some(TerminalStatus::Stopped)
        );
    }

    #[test]
    fn test_error_message_falls_back_to_container_reason() {
        let kind = ContainerTaskKind;
        let oom = json!({"taskArn": "arn:task/3", "lastStatus": "STOPPED",
            "containers": [{"name": "init", "exitCode": 0},
                           {"name": "app", "exitCode": 137, "reason": "OutOfMemoryError"}]});
        assert_eq!(kind.error_message(&oom).as_deref(), Some("OutOfMemoryError"));
        assert_eq!(
            kind.error_message(&json!({"ErrorMessage": "boom"})).as_deref(),
            Some("boom")
        );
    }
}
