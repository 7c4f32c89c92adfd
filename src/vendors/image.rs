use serde_json::Value;

use super::OperationKind;
use crate::models::push_event::error_message_from;
use crate::models::ImageStateDetail;
use crate::state_machine::TerminalStatus;

/// Machine image bakes and copies (CreateImage, CopyImage)
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageKind;

impl OperationKind for ImageKind {
    fn kind(&self) -> &str {
        "image"
    }

    fn id_field(&self) -> &str {
        "imageId"
    }

    fn payload_type(&self) -> &str {
        "aws.ec2.image"
    }

    fn event_source(&self) -> &str {
        ImageStateDetail::SOURCE
    }

    fn detail_type(&self) -> &str {
        ImageStateDetail::DETAIL_TYPE
    }

    fn translate_terminal_state(&self, state: &str, _detail: &Value) -> Option<TerminalStatus> {
        match state.to_ascii_lowercase().as_str() {
            "available" => Some(TerminalStatus::Succeeded),
            "failed" | "error" | "invalid" => Some(TerminalStatus::Failed),
            "deregistered" | "disabled" => Some(TerminalStatus::Stopped),
            _ => None,
        }
    }

    fn payload_name(&self, detail: &Value) -> Option<String> {
        detail
            .get("Name")
            .or_else(|| detail.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn error_message(&self, detail: &Value) -> Option<String> {
        detail
            .get("StateReason")
            .and_then(|reason| reason.get("Message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| error_message_from(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_states() {
        let kind = ImageKind;
        let detail = json!({});
        assert_eq!(
            kind.translate_terminal_state("available", &detail),
            Some(TerminalStatus::Succeeded)
        );
        assert_eq!(
            kind.translate_terminal_state("failed", &detail),
            Some(TerminalStatus::Failed)
        );
        assert_eq!(
            kind.translate_terminal_state("deregistered", &detail),
            Some(TerminalStatus::Stopped)
        );
        assert_eq!(kind.translate_terminal_state("pending", &detail), None);
        assert_eq!(kind.translate_terminal_state("transient", &detail), None);
    }

    #[test]
    fn test_state_reason_message() {
        let kind = ImageKind;
        let detail = json!({"StateReason": {"Code": "Client.Error", "Message": "snapshot deleted"}});
        assert_eq!(kind.error_message(&detail).as_deref(), Some("snapshot deleted"));
        assert_eq!(
            kind.error_message(&json!({"ErrorMessage": "boom"})).as_deref(),
            Some("boom")
        );
    }
}
