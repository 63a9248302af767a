//! Typed result payloads produced when a simulated step completes.
//!
//! Every known shape echoes the input the step received so a propagation
//! chain can be audited from the snapshot alone. Payloads that match none of
//! the known shapes are kept verbatim in [`StepResult::Data`].

use crate::mock::model::StepType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MOCK_LLM_MODEL: &str = "mock-llm";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepResult {
    Http(HttpResult),
    Code(CodeResult),
    Wait(WaitResult),
    Notify(NotifyResult),
    Llm(LlmResult),
    Data(Map<String, Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpResult {
    pub status: u16,
    pub body: HttpBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpBody {
    pub step: String,
    pub received: Value,
    pub tick: i64,
    pub server_now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CodeResult {
    pub ok: bool,
    pub step: String,
    pub result: ComputedFrom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComputedFrom {
    pub computed_from: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WaitResult {
    pub status: String,
    pub signal_key: Value,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotifyResult {
    pub success: bool,
    pub sent_at: DateTime<Utc>,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LlmResult {
    pub model: String,
    pub text: String,
    pub input: Value,
}

impl StepResult {
    /// Builds the completion payload for a step of `step_type`.
    pub fn for_step(
        step_type: &StepType,
        step_id: &str,
        input: Value,
        tick: i64,
        now: DateTime<Utc>,
    ) -> Self {
        match step_type {
            StepType::Http => StepResult::Http(HttpResult {
                status: 200,
                body: HttpBody {
                    step: step_id.to_string(),
                    received: input,
                    tick,
                    server_now: now,
                },
            }),
            StepType::Code => StepResult::Code(CodeResult {
                ok: true,
                step: step_id.to_string(),
                result: ComputedFrom {
                    computed_from: input,
                },
            }),
            StepType::Wait => StepResult::Wait(WaitResult {
                status: "succeeded".to_string(),
                signal_key: input,
                at: now,
            }),
            StepType::Notify => StepResult::Notify(NotifyResult {
                success: true,
                sent_at: now,
                input,
            }),
            StepType::Llm => StepResult::Llm(LlmResult {
                model: MOCK_LLM_MODEL.to_string(),
                text: format!("summary({step_id}): ok"),
                input,
            }),
            StepType::Other(_) => {
                let mut data = Map::new();
                data.insert("ok".to_string(), Value::Bool(true));
                data.insert("step".to_string(), Value::String(step_id.to_string()));
                data.insert("input".to_string(), input);
                StepResult::Data(data)
            }
        }
    }

    /// The input this step received, as echoed in its payload.
    pub fn received_input(&self) -> Option<&Value> {
        match self {
            StepResult::Http(http) => Some(&http.body.received),
            StepResult::Code(code) => Some(&code.result.computed_from),
            StepResult::Wait(wait) => Some(&wait.signal_key),
            StepResult::Notify(notify) => Some(&notify.input),
            StepResult::Llm(llm) => Some(&llm.input),
            StepResult::Data(data) => data.get("input"),
        }
    }

    /// JSON form used when the result is threaded into the next step's input.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
