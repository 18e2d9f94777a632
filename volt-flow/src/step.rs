use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::definition::InputField;

/// Outcome of one engine invocation, as seen by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStatus {
    Complete,
    Incomplete,
    Error,
}

/// What an incomplete step asks the caller to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    View,
    Redirection,
}

/// Payload of a step: inputs to collect, where to redirect, and opaque
/// key/values the client should echo back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputField>,
    #[serde(rename = "redirectURL", default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional_data: HashMap<String, String>,
}

impl StepData {
    fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.redirect_url.is_none() && self.additional_data.is_empty()
    }
}

/// What the caller must do next with a flow.
///
/// An incomplete step always says how it suspended (`View` or
/// `Redirection`); complete and error steps carry no type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    pub flow_id: Uuid,
    pub status: FlowStatus,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<StepType>,
    #[serde(default, skip_serializing_if = "StepData::is_empty")]
    pub data: StepData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl FlowStep {
    pub fn view(
        flow_id: Uuid,
        inputs: Vec<InputField>,
        additional_data: HashMap<String, String>,
    ) -> Self {
        Self {
            flow_id,
            status: FlowStatus::Incomplete,
            step_type: Some(StepType::View),
            data: StepData {
                inputs,
                redirect_url: None,
                additional_data,
            },
            assertion: None,
            failure_reason: None,
        }
    }

    pub fn redirection(
        flow_id: Uuid,
        redirect_url: impl Into<String>,
        additional_data: HashMap<String, String>,
    ) -> Self {
        Self {
            flow_id,
            status: FlowStatus::Incomplete,
            step_type: Some(StepType::Redirection),
            data: StepData {
                inputs: Vec::new(),
                redirect_url: Some(redirect_url.into()),
                additional_data,
            },
            assertion: None,
            failure_reason: None,
        }
    }

    pub fn complete(flow_id: Uuid, assertion: Option<String>) -> Self {
        Self {
            flow_id,
            status: FlowStatus::Complete,
            step_type: None,
            data: StepData::default(),
            assertion,
            failure_reason: None,
        }
    }

    pub fn error(flow_id: Uuid, failure_reason: impl Into<String>) -> Self {
        Self {
            flow_id,
            status: FlowStatus::Error,
            step_type: None,
            data: StepData::default(),
            assertion: None,
            failure_reason: Some(failure_reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_step_serializes_with_fixed_field_names() {
        let step = FlowStep::view(
            Uuid::nil(),
            vec![InputField::required("username", "string")],
            HashMap::from([("otpSent".to_string(), "true".to_string())]),
        );
        let json = serde_json::to_value(&step).expect("serialize");
        assert_eq!(json["status"], "INCOMPLETE");
        assert_eq!(json["type"], "VIEW");
        assert_eq!(json["data"]["inputs"][0]["name"], "username");
        assert_eq!(json["data"]["inputs"][0]["type"], "string");
        assert_eq!(json["data"]["inputs"][0]["required"], true);
        assert_eq!(json["data"]["additionalData"]["otpSent"], "true");
        assert!(json.get("assertion").is_none());
    }

    #[test]
    fn redirection_step_carries_url() {
        let step = FlowStep::redirection(Uuid::nil(), "https://idp.example/authorize", HashMap::new());
        let json = serde_json::to_value(&step).expect("serialize");
        assert_eq!(json["type"], "REDIRECTION");
        assert_eq!(json["data"]["redirectURL"], "https://idp.example/authorize");
    }

    #[test]
    fn terminal_steps_have_no_type() {
        let done = FlowStep::complete(Uuid::nil(), Some("assertion-token".into()));
        let json = serde_json::to_value(&done).expect("serialize");
        assert_eq!(json["status"], "COMPLETE");
        assert!(json.get("type").is_none());
        assert_eq!(json["assertion"], "assertion-token");

        let failed = FlowStep::error(Uuid::nil(), "invalid credentials");
        let json = serde_json::to_value(&failed).expect("serialize");
        assert_eq!(json["status"], "ERROR");
        assert!(json.get("type").is_none());
        assert_eq!(json["failureReason"], "invalid credentials");
    }
}
