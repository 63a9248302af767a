use crate::mock::error::{EntityKind, MockError};
use crate::mock::fault::{FaultPolicy, TickModuloFault, TRANSIENT_FAULT_MESSAGE};
use crate::mock::model::{Flow, Run, RunStatus, State, StepExecution, StepStatus, Workspace};
use crate::mock::result::StepResult;
use crate::shared::ids::generate_run_id;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::fmt;

pub const MANUAL_TRIGGER: &str = "manual";

/// What one tick did to one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    StepStarted { step_id: String },
    StepRetrying { step_id: String },
    StepResumed { step_id: String, attempt: u32 },
    StepCompleted {
        step_id: String,
        next_step_id: Option<String>,
    },
    RunCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickEvent {
    pub tick: i64,
    pub run_id: String,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    pub ticks: i64,
    pub final_tick: i64,
    pub events: Vec<TickEvent>,
    pub completed_runs: Vec<String>,
}

impl AdvanceReport {
    fn record(&mut self, tick: i64, run: &Run, outcome: RunOutcome) {
        let run_id = run.workflow_id.as_str();
        if run.status == RunStatus::Completed {
            self.completed_runs.push(run_id.to_string());
        }
        self.events.push(TickEvent {
            tick,
            run_id: run_id.to_string(),
            outcome,
        });
    }
}

/// Simulates flow runs for one workspace of a loaded [`State`].
///
/// The engine never touches the disk. Callers load the snapshot, invoke an
/// operation, and save only when the operation succeeded.
pub struct MockEngine {
    workspace_id: String,
    fault_policy: Box<dyn FaultPolicy>,
    clock: Box<dyn Fn() -> DateTime<Utc>>,
}

impl fmt::Debug for MockEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockEngine")
            .field("workspace_id", &self.workspace_id)
            .finish_non_exhaustive()
    }
}

impl MockEngine {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            fault_policy: Box::new(TickModuloFault::default()),
            clock: Box::new(Utc::now),
        }
    }

    pub fn with_fault_policy(mut self, fault_policy: impl FaultPolicy + 'static) -> Self {
        self.fault_policy = Box::new(fault_policy);
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn workspace<'s>(&self, state: &'s State) -> Result<&'s Workspace, MockError> {
        state.workspace(&self.workspace_id)
    }

    /// Flows sorted by slug.
    pub fn list_flows<'s>(&self, state: &'s State) -> Result<Vec<&'s Flow>, MockError> {
        let mut flows = self.workspace(state)?.flows.values().collect::<Vec<_>>();
        flows.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(flows)
    }

    pub fn get_flow<'s>(&self, state: &'s State, slug: &str) -> Result<&'s Flow, MockError> {
        self.workspace(state)?.flow(slug)
    }

    /// Runs newest first, optionally restricted to one flow.
    pub fn list_runs<'s>(
        &self,
        state: &'s State,
        flow_slug: Option<&str>,
    ) -> Result<Vec<&'s Run>, MockError> {
        let mut runs = self
            .workspace(state)?
            .runs
            .values()
            .filter(|run| flow_slug.map_or(true, |slug| run.flow_slug == slug))
            .collect::<Vec<_>>();
        runs.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| a.workflow_id.cmp(&b.workflow_id))
        });
        Ok(runs)
    }

    pub fn get_run<'s>(&self, state: &'s State, run_id: &str) -> Result<&'s Run, MockError> {
        self.workspace(state)?.run(run_id)
    }

    /// Starts a run of `flow_slug` under a freshly generated `wf-` id.
    ///
    /// `version == 0` pins the flow's active version.
    pub fn start_run(
        &self,
        state: &mut State,
        flow_slug: &str,
        version: u32,
        input: Value,
    ) -> Result<Run, MockError> {
        self.workspace(state)?.flow(flow_slug)?;
        let run_id = generate_run_id().map_err(MockError::Entropy)?;
        self.start_run_with_id(state, run_id, flow_slug, version, input)
    }

    pub fn start_run_with_id(
        &self,
        state: &mut State,
        run_id: impl Into<String>,
        flow_slug: &str,
        version: u32,
        input: Value,
    ) -> Result<Run, MockError> {
        let now = self.now();
        let workspace = state.workspace_mut(&self.workspace_id)?;
        let flow = workspace
            .flows
            .get(flow_slug)
            .ok_or_else(|| MockError::not_found(EntityKind::Flow, flow_slug))?;

        let mut run = Run {
            workflow_id: run_id.into(),
            flow_slug: flow.slug.clone(),
            version: if version == 0 {
                flow.active_version
            } else {
                version
            },
            status: RunStatus::Running,
            triggered_by: MANUAL_TRIGGER.to_string(),
            started_at: now,
            updated_at: now,
            completed_at: None,
            current_step: None,
            input_preview: input,
            result_preview: None,
            error: None,
            steps: flow.steps.iter().map(StepExecution::pending).collect(),
        };
        promote_next_pending(&mut run, now, None);

        workspace.updated_at = now;
        workspace.insert_run(run.clone());
        Ok(run)
    }

    /// Advances every running run of the workspace by `ticks` ticks (at least one).
    pub fn advance(&self, state: &mut State, ticks: i64) -> Result<AdvanceReport, MockError> {
        let ticks = if ticks <= 0 { 1 } else { ticks };
        self.workspace(state)?;

        let mut report = AdvanceReport {
            ticks,
            ..AdvanceReport::default()
        };
        for _ in 0..ticks {
            state.tick += 1;
            let tick = state.tick;
            let now = self.now();
            let workspace = state.workspace_mut(&self.workspace_id)?;
            for run in workspace.runs.values_mut() {
                if run.status != RunStatus::Running {
                    continue;
                }
                let outcome = advance_run(run, tick, now, self.fault_policy.as_ref());
                report.record(tick, run, outcome);
            }
        }
        report.final_tick = state.tick;
        Ok(report)
    }
}

/// Applies one tick of the step state machine to a running run.
pub fn advance_run(
    run: &mut Run,
    tick: i64,
    now: DateTime<Utc>,
    fault_policy: &dyn FaultPolicy,
) -> RunOutcome {
    run.updated_at = now;

    let Some(index) = run.active_step_index() else {
        return match promote_next_pending(run, now, None) {
            Some(step_id) => RunOutcome::StepStarted { step_id },
            None => {
                complete_run(run, now);
                RunOutcome::RunCompleted
            }
        };
    };

    let run_input = run.input_preview.clone();
    let step = &mut run.steps[index];

    if step.status == StepStatus::Running
        && fault_policy.should_inject_fault(&step.step_type, step.attempt, tick)
    {
        step.status = StepStatus::Retrying;
        step.error = Some(TRANSIENT_FAULT_MESSAGE.to_string());
        step.duration_ms = 0;
        return RunOutcome::StepRetrying {
            step_id: step.step_id.clone(),
        };
    }

    if step.status == StepStatus::Retrying {
        step.status = StepStatus::Running;
        step.attempt = step.attempt.saturating_add(1);
        step.error = None;
        return RunOutcome::StepResumed {
            step_id: step.step_id.clone(),
            attempt: step.attempt,
        };
    }

    step.status = StepStatus::Completed;
    step.completed_at = Some(now);
    step.duration_ms = step
        .started_at
        .map(|started| (now - started).num_milliseconds())
        .unwrap_or(0);
    let input = step.input_preview.get_or_insert(run_input).clone();
    let result = StepResult::for_step(&step.step_type, &step.step_id, input, tick, now);
    let next_input = result.to_value();
    step.result_preview = Some(result);
    step.error = None;
    let step_id = step.step_id.clone();

    match promote_next_pending(run, now, Some(next_input)) {
        Some(next_step_id) => RunOutcome::StepCompleted {
            step_id,
            next_step_id: Some(next_step_id),
        },
        None => {
            complete_run(run, now);
            RunOutcome::StepCompleted {
                step_id,
                next_step_id: None,
            }
        }
    }
}

/// Moves the next pending step to `running` and points the run at it.
///
/// Without an explicit `input` the step receives the latest completed
/// result, or the run input when nothing has completed yet.
fn promote_next_pending(run: &mut Run, now: DateTime<Utc>, input: Option<Value>) -> Option<String> {
    let index = run.next_pending_index()?;
    let input = input.unwrap_or_else(|| {
        run.last_completed_result()
            .map(StepResult::to_value)
            .unwrap_or_else(|| run.input_preview.clone())
    });

    let step = &mut run.steps[index];
    step.status = StepStatus::Running;
    step.attempt = 1;
    step.started_at = Some(now);
    step.input_preview = Some(input);
    step.error = None;
    let step_id = step.step_id.clone();

    run.current_step = Some(step_id.clone());
    run.updated_at = now;
    Some(step_id)
}

pub fn run_success_marker() -> Value {
    json!({ "ok": true, "status": "completed" })
}

fn complete_run(run: &mut Run, now: DateTime<Utc>) {
    run.status = RunStatus::Completed;
    run.current_step = None;
    run.completed_at = Some(now);
    run.result_preview = Some(run_success_marker());
    run.updated_at = now;
}
