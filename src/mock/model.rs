use crate::mock::error::{EntityKind, MockError};
use crate::mock::result::StepResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub const STATE_VERSION: u32 = 1;

/// The whole simulated world, persisted as one snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default = "default_state_version")]
    pub version: u32,
    #[serde(default)]
    pub tick: i64,
    #[serde(default)]
    pub workspaces: BTreeMap<String, Workspace>,
}

fn default_state_version() -> u32 {
    STATE_VERSION
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            tick: 0,
            workspaces: BTreeMap::new(),
        }
    }
}

impl State {
    pub fn workspace(&self, workspace_id: &str) -> Result<&Workspace, MockError> {
        self.workspaces
            .get(workspace_id)
            .ok_or_else(|| MockError::not_found(EntityKind::Workspace, workspace_id))
    }

    pub fn workspace_mut(&mut self, workspace_id: &str) -> Result<&mut Workspace, MockError> {
        self.workspaces
            .get_mut(workspace_id)
            .ok_or_else(|| MockError::not_found(EntityKind::Workspace, workspace_id))
    }

    /// Returns the workspace, inserting an empty one when absent.
    pub fn ensure_workspace(&mut self, workspace_id: &str) -> &mut Workspace {
        self.workspaces
            .entry(workspace_id.to_string())
            .or_insert_with(|| Workspace::new(workspace_id))
    }
}

/// Collections default to empty when absent from the snapshot, so older or
/// hand-edited files load without any missing-map checks downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub flows: BTreeMap<String, Flow>,
    #[serde(default)]
    pub runs: BTreeMap<String, Run>,
    #[serde(default)]
    pub connections: BTreeMap<String, Value>,
    #[serde(default)]
    pub triggers: BTreeMap<String, Value>,
    #[serde(default)]
    pub registry: BTreeMap<String, Value>,
    #[serde(default)]
    pub purchases: BTreeMap<String, Value>,
    #[serde(default)]
    pub entitlements: BTreeMap<String, Value>,
    #[serde(default)]
    pub payouts: BTreeMap<String, Value>,
    #[serde(default)]
    pub instances: BTreeMap<String, Value>,
    #[serde(default)]
    pub waits: BTreeMap<String, Value>,
    #[serde(default)]
    pub revenue_events: Vec<RevenueEvent>,
    #[serde(default)]
    pub demand_top: Vec<DemandEntry>,
}

impl Workspace {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            plan: String::new(),
            owner: String::new(),
            updated_at: Utc::now(),
            flows: BTreeMap::new(),
            runs: BTreeMap::new(),
            connections: BTreeMap::new(),
            triggers: BTreeMap::new(),
            registry: BTreeMap::new(),
            purchases: BTreeMap::new(),
            entitlements: BTreeMap::new(),
            payouts: BTreeMap::new(),
            instances: BTreeMap::new(),
            waits: BTreeMap::new(),
            revenue_events: Vec::new(),
            demand_top: Vec::new(),
        }
    }

    pub fn flow(&self, slug: &str) -> Result<&Flow, MockError> {
        self.flows
            .get(slug)
            .ok_or_else(|| MockError::not_found(EntityKind::Flow, slug))
    }

    pub fn run(&self, run_id: &str) -> Result<&Run, MockError> {
        self.runs
            .get(run_id)
            .ok_or_else(|| MockError::not_found(EntityKind::Run, run_id))
    }

    pub fn insert_flow(&mut self, flow: Flow) {
        self.flows.insert(flow.slug.clone(), flow);
    }

    pub fn insert_run(&mut self, run: Run) {
        self.runs.insert(run.workflow_id.clone(), run);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_active_version")]
    pub active_version: u32,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub spine: String,
    #[serde(default)]
    pub steps: Vec<FlowStep>,
}

fn default_active_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub input_schema: String,
    #[serde(default)]
    pub output_schema: String,
    #[serde(default)]
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    Http,
    Code,
    Wait,
    Notify,
    Llm,
    Other(String),
}

impl StepType {
    pub fn as_str(&self) -> &str {
        match self {
            StepType::Http => "http",
            StepType::Code => "code",
            StepType::Wait => "wait",
            StepType::Notify => "notify",
            StepType::Llm => "llm",
            StepType::Other(tag) => tag.as_str(),
        }
    }
}

impl From<String> for StepType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "http" => StepType::Http,
            "code" => StepType::Code,
            "wait" => StepType::Wait,
            "notify" => StepType::Notify,
            "llm" => StepType::Llm,
            _ => StepType::Other(value),
        }
    }
}

impl From<&str> for StepType {
    fn from(value: &str) -> Self {
        StepType::from(value.to_string())
    }
}

impl From<StepType> for String {
    fn from(value: StepType) -> Self {
        match value {
            StepType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Waiting,
    Retrying,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Waiting => "waiting",
            RunStatus::Retrying => "retrying",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Retrying,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_active(self) -> bool {
        matches!(self, StepStatus::Running | StepStatus::Retrying)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Retrying => "retrying",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub workflow_id: String,
    pub flow_slug: String,
    pub version: u32,
    pub status: RunStatus,
    #[serde(default)]
    pub triggered_by: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub input_preview: Value,
    #[serde(default)]
    pub result_preview: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepExecution>,
}

impl Run {
    /// Index of the step in `running` or `retrying`; at most one exists.
    pub fn active_step_index(&self) -> Option<usize> {
        self.steps.iter().position(|step| step.status.is_active())
    }

    pub fn next_pending_index(&self) -> Option<usize> {
        self.steps
            .iter()
            .position(|step| step.status == StepStatus::Pending)
    }

    /// Result of the latest completed step in sequence order.
    pub fn last_completed_result(&self) -> Option<&StepResult> {
        self.steps
            .iter()
            .rev()
            .filter(|step| step.status == StepStatus::Completed)
            .find_map(|step| step.result_preview.as_ref())
    }

    pub fn step(&self, step_id: &str) -> Option<&StepExecution> {
        self.steps.iter().find(|step| step.step_id == step_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepExecution {
    pub step_id: String,
    pub step_type: StepType,
    #[serde(default)]
    pub title: String,
    pub status: StepStatus,
    #[serde(default)]
    pub attempt: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: i64,
    #[serde(default)]
    pub input_preview: Option<Value>,
    #[serde(default)]
    pub result_preview: Option<StepResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StepExecution {
    /// Copies identity from the flow definition so history survives later flow edits.
    pub fn pending(step: &FlowStep) -> Self {
        Self {
            step_id: step.id.clone(),
            step_type: step.step_type.clone(),
            title: step.title.clone(),
            status: StepStatus::Pending,
            attempt: 0,
            started_at: None,
            completed_at: None,
            duration_ms: 0,
            input_preview: None,
            result_preview: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueEvent {
    pub id: String,
    #[serde(default)]
    pub flow_slug: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub amount_cents: i64,
    #[serde(default)]
    pub currency: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandEntry {
    pub query: String,
    #[serde(default)]
    pub flow_slug: Option<String>,
    #[serde(default)]
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_type_round_trips_unknown_tags() {
        let step: FlowStep = serde_json::from_str(r#"{"id":"s1","type":"store"}"#).expect("parse");
        assert_eq!(step.step_type, StepType::Other("store".to_string()));
        let encoded = serde_json::to_value(&step).expect("encode");
        assert_eq!(encoded["type"], "store");

        let http: StepType = serde_json::from_str(r#""http""#).expect("parse");
        assert_eq!(http, StepType::Http);
    }

    #[test]
    fn workspace_collections_default_when_absent() {
        let ws: Workspace = serde_json::from_str(r#"{"id":"ws-1"}"#).expect("parse");
        assert!(ws.flows.is_empty());
        assert!(ws.runs.is_empty());
        assert!(ws.waits.is_empty());
        assert!(ws.revenue_events.is_empty());
    }

    #[test]
    fn ensure_workspace_inserts_once() {
        let mut state = State::default();
        state.ensure_workspace("ws-a").name = "Alpha".to_string();
        assert_eq!(state.ensure_workspace("ws-a").name, "Alpha");
        assert_eq!(state.workspaces.len(), 1);
        assert!(state.workspace("ws-b").expect_err("missing").is_not_found());
    }

    #[test]
    fn run_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Cancelled).expect("encode"),
            "\"cancelled\""
        );
        assert_eq!(RunStatus::Retrying.to_string(), "retrying");
    }
}
