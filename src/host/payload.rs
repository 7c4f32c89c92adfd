use serde_json::{Map, Value};

use crate::constants::payload_fields;
use crate::models::TerminalTransition;
use crate::vendors::OperationKind;

/// Build the emitted payload for a terminal transition.
///
/// ```text
/// { "<kind>": { "name"?, "<id field>": key, "status": ..., "state": ... },
///   "detail": <raw vendor detail> }
/// ```
///
/// The shape depends only on the transition, so push and poll resolution of
/// the same outcome produce the same payload.
pub fn build_payload(
    kind: &dyn OperationKind,
    correlation_key: &str,
    transition: &TerminalTransition,
) -> Value {
    let mut summary = Map::new();
    if let Some(name) = kind.payload_name(&transition.detail) {
        summary.insert("name".to_string(), Value::String(name));
    }
    summary.insert(
        kind.id_field().to_string(),
        Value::String(correlation_key.to_string()),
    );
    summary.insert(
        payload_fields::STATUS.to_string(),
        Value::String(transition.status.to_string()),
    );
    summary.insert(
        payload_fields::STATE.to_string(),
        Value::String(transition.vendor_state.clone()),
    );

    let mut payload = Map::new();
    payload.insert(kind.kind().to_string(), Value::Object(summary));
    payload.insert(payload_fields::DETAIL.to_string(), transition.detail.clone());
    Value::Object(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResolutionChannel;
    use crate::state_machine::TerminalStatus;
    use crate::vendors::{ImageKind, PipelineKind};
    use serde_json::json;

    #[test]
    fn test_image_payload_shape() {
        let detail = json!({"ImageId": "ami-1", "State": "available"});
        let transition = TerminalTransition::new(
            TerminalStatus::Succeeded,
            "available",
            detail.clone(),
            ResolutionChannel::Push,
        );

        let payload = build_payload(&ImageKind, "ami-1", &transition);
        assert_eq!(
            payload,
            json!({
                "image": {"imageId": "ami-1", "status": "succeeded", "state": "available"},
                "detail": detail
            })
        );
    }

    #[test]
    fn test_channel_does_not_change_payload() {
        let detail = json!({"pipeline": "deploy", "execution-id": "exec-1", "state": "FAILED"});
        let by_push = TerminalTransition::new(
            TerminalStatus::Failed,
            "FAILED",
            detail.clone(),
            ResolutionChannel::Push,
        );
        let by_poll = TerminalTransition::new(
            TerminalStatus::Failed,
            "FAILED",
            detail,
            ResolutionChannel::Poll,
        );

        let push_payload = build_payload(&PipelineKind, "exec-1", &by_push);
        assert_eq!(push_payload, build_payload(&PipelineKind, "exec-1", &by_poll));
        assert_eq!(push_payload["pipeline"]["name"], "deploy");
        assert_eq!(push_payload["pipeline"]["executionId"], "exec-1");
    }
}
