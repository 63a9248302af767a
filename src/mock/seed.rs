use crate::mock::engine::run_success_marker;
use crate::mock::model::{
    DemandEntry, Flow, FlowStep, RevenueEvent, Run, RunStatus, State, StepExecution, StepStatus,
    StepType, Workspace,
};
use crate::mock::result::StepResult;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

pub const SEED_COMPLETED_RUN_ID: &str = "wf-5eed00000001";
pub const SEED_FAILED_RUN_ID: &str = "wf-5eed00000002";

type StepSpec = (&'static str, &'static str, &'static str, &'static str);

struct FlowSpec {
    slug: &'static str,
    name: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    active_version: u32,
    spine: &'static str,
    steps: &'static [StepSpec],
}

const FLOW_SPECS: &[FlowSpec] = &[
    FlowSpec {
        slug: "subscription-renewal",
        name: "Subscription renewal",
        description: "Renews a subscription, collects payment and tells the customer.",
        tags: &["billing", "lifecycle"],
        active_version: 3,
        spine: "fetch subscription -> compute renewal -> await payment -> notify -> summarize",
        steps: &[
            ("fetch-subscription", "http", "Fetch subscription", "GET /subscriptions/{id}"),
            ("compute-renewal", "code", "Compute renewal", "price = plan.base * seats"),
            ("await-payment", "wait", "Await payment", "signal: payment.settled"),
            ("notify-customer", "notify", "Notify customer", "email: renewal-receipt"),
            ("summarize-renewal", "llm", "Summarize renewal", "prompt: renewal summary"),
        ],
    },
    FlowSpec {
        slug: "lead-enrichment",
        name: "Lead enrichment",
        description: "Looks up a new lead and scores it for the sales queue.",
        tags: &["sales"],
        active_version: 2,
        spine: "fetch lead -> score -> summarize",
        steps: &[
            ("fetch-lead", "http", "Fetch lead profile", "GET /leads/{email}"),
            ("score-lead", "code", "Score lead", "score = fit * intent"),
            ("summarize-lead", "llm", "Summarize lead", "prompt: lead brief"),
        ],
    },
    FlowSpec {
        slug: "invoice-reminder",
        name: "Invoice reminder",
        description: "Waits out the grace period on an unpaid invoice, then reminds the payer.",
        tags: &["billing", "dunning"],
        active_version: 1,
        spine: "load invoice -> wait grace period -> remind",
        steps: &[
            ("load-invoice", "http", "Load invoice", "GET /invoices/{id}"),
            ("wait-grace-period", "wait", "Wait grace period", "signal: invoice.grace_elapsed"),
            ("send-reminder", "notify", "Send reminder", "email: invoice-reminder"),
        ],
    },
    FlowSpec {
        slug: "support-triage",
        name: "Support triage",
        description: "Classifies an inbound ticket and pages the right rotation.",
        tags: &["support"],
        active_version: 1,
        spine: "classify -> route -> page",
        steps: &[
            ("classify-ticket", "llm", "Classify ticket", "prompt: ticket category"),
            ("route-ticket", "code", "Route ticket", "queue = routes[category]"),
            ("notify-oncall", "notify", "Notify on-call", "pager: support-primary"),
        ],
    },
    FlowSpec {
        slug: "webhook-relay",
        name: "Webhook relay",
        description: "Receives a partner webhook, reshapes it and forwards it downstream.",
        tags: &["integrations"],
        active_version: 4,
        spine: "receive -> transform -> forward -> archive",
        steps: &[
            ("receive-webhook", "http", "Receive webhook", "POST /hooks/partner"),
            ("transform-payload", "code", "Transform payload", "map partner -> internal"),
            ("forward-webhook", "http", "Forward webhook", "POST /internal/events"),
            ("archive-payload", "store", "Archive payload", "bucket: webhook-archive"),
        ],
    },
];

/// Builds the demonstration universe for `workspace_id`.
///
/// Definitions depend only on the id; timestamps are relative to the wall clock.
pub fn seed_default(workspace_id: &str) -> State {
    seed_default_at(workspace_id, Utc::now())
}

pub fn seed_default_at(workspace_id: &str, now: DateTime<Utc>) -> State {
    let mut state = State::default();
    let workspace = state.ensure_workspace(workspace_id);
    workspace.name = "Local sandbox".to_string();
    workspace.plan = "developer".to_string();
    workspace.owner = "dev@localhost".to_string();
    workspace.updated_at = now;

    for spec in FLOW_SPECS {
        workspace.insert_flow(build_flow(spec, now));
    }

    if let Some(flow) = workspace.flows.get("subscription-renewal") {
        let run = completed_history(flow, now - Duration::hours(2));
        workspace.insert_run(run);
    }
    if let Some(flow) = workspace.flows.get("invoice-reminder") {
        let run = failed_history(flow, now - Duration::minutes(45));
        workspace.insert_run(run);
    }

    seed_auxiliary(workspace, now);
    state
}

fn build_flow(spec: &FlowSpec, now: DateTime<Utc>) -> Flow {
    Flow {
        slug: spec.slug.to_string(),
        name: spec.name.to_string(),
        description: spec.description.to_string(),
        tags: spec.tags.iter().map(|tag| tag.to_string()).collect(),
        active_version: spec.active_version,
        updated_at: now - Duration::days(1),
        spine: spec.spine.to_string(),
        steps: spec
            .steps
            .iter()
            .map(|(id, step_type, title, definition)| FlowStep {
                id: id.to_string(),
                step_type: StepType::from(*step_type),
                title: title.to_string(),
                input_schema: "object".to_string(),
                output_schema: "object".to_string(),
                definition: definition.to_string(),
            })
            .collect(),
    }
}

/// A step that ran to completion on `tick`, echoing `input` the way the engine does.
fn completed_step(
    step: &FlowStep,
    input: Value,
    started: DateTime<Utc>,
    attempt: u32,
    tick: i64,
) -> StepExecution {
    let finished = started + Duration::seconds(40);
    let mut execution = StepExecution::pending(step);
    execution.status = StepStatus::Completed;
    execution.attempt = attempt;
    execution.started_at = Some(started);
    execution.completed_at = Some(finished);
    execution.duration_ms = (finished - started).num_milliseconds();
    execution.result_preview = Some(StepResult::for_step(
        &step.step_type,
        &step.id,
        input.clone(),
        tick,
        finished,
    ));
    execution.input_preview = Some(input);
    execution
}

fn completed_history(flow: &Flow, started: DateTime<Utc>) -> Run {
    let input = json!({ "subscriptionId": "sub_1042", "seats": 12 });
    let mut steps = Vec::with_capacity(flow.steps.len());
    let mut next_input = input.clone();
    let mut at = started;
    let mut tick = 0;
    for (index, step) in flow.steps.iter().enumerate() {
        // A leading http step faults on tick 0, resumes on tick 1 and completes on tick 2.
        let attempt = if index == 0 && step.step_type == StepType::Http {
            tick += 2;
            2
        } else {
            tick += 1;
            1
        };
        let execution = completed_step(step, next_input, at, attempt, tick);
        next_input = execution
            .result_preview
            .as_ref()
            .map(StepResult::to_value)
            .unwrap_or(Value::Null);
        at += Duration::minutes(1);
        steps.push(execution);
    }
    let finished = steps
        .last()
        .and_then(|step| step.completed_at)
        .unwrap_or(started);

    Run {
        workflow_id: SEED_COMPLETED_RUN_ID.to_string(),
        flow_slug: flow.slug.clone(),
        version: flow.active_version,
        status: RunStatus::Completed,
        triggered_by: "schedule".to_string(),
        started_at: started,
        updated_at: finished,
        completed_at: Some(finished),
        current_step: None,
        input_preview: input,
        result_preview: Some(run_success_marker()),
        error: None,
        steps,
    }
}

fn failed_history(flow: &Flow, started: DateTime<Utc>) -> Run {
    let input = json!({ "invoiceId": "inv_2201", "amountCents": 4900 });
    let mut steps = flow
        .steps
        .iter()
        .map(StepExecution::pending)
        .collect::<Vec<_>>();
    let mut failed_at = started;
    let mut failed_step = None;

    if let Some(first) = flow.steps.first() {
        let done = completed_step(first, input.clone(), started, 1, 1);
        let handoff = done.result_preview.as_ref().map(StepResult::to_value);
        steps[0] = done;

        if let (Some(second), Some(handoff)) = (flow.steps.get(1), handoff) {
            let begun = started + Duration::minutes(1);
            failed_at = begun + Duration::minutes(30);
            let failing = &mut steps[1];
            failing.status = StepStatus::Failed;
            failing.attempt = 1;
            failing.started_at = Some(begun);
            failing.completed_at = Some(failed_at);
            failing.duration_ms = (failed_at - begun).num_milliseconds();
            failing.input_preview = Some(handoff);
            failing.error = Some("grace signal never arrived".to_string());
            failed_step = Some(second.id.clone());
        }
    }

    Run {
        workflow_id: SEED_FAILED_RUN_ID.to_string(),
        flow_slug: flow.slug.clone(),
        version: flow.active_version,
        status: RunStatus::Failed,
        triggered_by: "webhook".to_string(),
        started_at: started,
        updated_at: failed_at,
        completed_at: Some(failed_at),
        current_step: failed_step.clone(),
        input_preview: input,
        result_preview: None,
        error: failed_step.map(|step| format!("step `{step}` failed")),
        steps,
    }
}

fn seed_auxiliary(workspace: &mut Workspace, now: DateTime<Utc>) {
    workspace.triggers.insert(
        "subscription-renewal".to_string(),
        json!({ "kind": "schedule", "cron": "0 3 * * *" }),
    );
    workspace.triggers.insert(
        "webhook-relay".to_string(),
        json!({ "kind": "webhook", "path": "/hooks/partner" }),
    );
    workspace.connections.insert(
        "billing-api".to_string(),
        json!({ "kind": "http", "baseUrl": "https://billing.invalid" }),
    );

    let revenue = [
        ("rev-001", "subscription-renewal", "purchase", 4900, 6),
        ("rev-002", "lead-enrichment", "purchase", 1900, 5),
        ("rev-003", "subscription-renewal", "renewal", 4900, 2),
        ("rev-004", "webhook-relay", "refund", -900, 1),
    ];
    workspace.revenue_events = revenue
        .iter()
        .map(|(id, flow_slug, kind, amount_cents, days_ago)| RevenueEvent {
            id: id.to_string(),
            flow_slug: flow_slug.to_string(),
            kind: kind.to_string(),
            amount_cents: *amount_cents,
            currency: "USD".to_string(),
            at: now - Duration::days(*days_ago),
        })
        .collect();

    let demand = [
        ("renew subscriptions automatically", Some("subscription-renewal"), 128),
        ("enrich inbound leads", Some("lead-enrichment"), 87),
        ("chase unpaid invoices", Some("invoice-reminder"), 64),
        ("sync crm contacts", None, 31),
    ];
    workspace.demand_top = demand
        .iter()
        .map(|(query, flow_slug, count)| DemandEntry {
            query: query.to_string(),
            flow_slug: flow_slug.map(str::to_string),
            count: *count,
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_history_threads_results_into_inputs() {
        let state = seed_default("ws-test");
        let run = &state.workspaces["ws-test"].runs[SEED_COMPLETED_RUN_ID];
        for pair in run.steps.windows(2) {
            let handoff = pair[0].result_preview.as_ref().map(StepResult::to_value);
            assert_eq!(handoff, pair[1].input_preview);
        }
        assert_eq!(run.steps[0].input_preview.as_ref(), Some(&run.input_preview));
    }

    #[test]
    fn failed_history_stops_at_the_failed_step() {
        let state = seed_default("ws-test");
        let run = &state.workspaces["ws-test"].runs[SEED_FAILED_RUN_ID];
        let statuses = run.steps.iter().map(|s| s.status).collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![StepStatus::Completed, StepStatus::Failed, StepStatus::Pending]
        );
        assert_eq!(run.current_step.as_deref(), Some("wait-grace-period"));
        assert!(run.error.is_some());
    }
}
