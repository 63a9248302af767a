use chrono::{Duration, TimeZone, Utc};
use flowctl::mock::fault::TRANSIENT_FAULT_MESSAGE;
use flowctl::mock::seed::{seed_default_at, SEED_COMPLETED_RUN_ID, SEED_FAILED_RUN_ID};
use flowctl::mock::{seed_default, RunStatus, StepResult, StepStatus, StepType};

#[test]
fn seed_definitions_depend_only_on_the_workspace_id() {
    let earlier = seed_default_at(
        "ws-a",
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    );
    let later = seed_default_at(
        "ws-a",
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
    );
    let a = &earlier.workspaces["ws-a"];
    let b = &later.workspaces["ws-a"];

    assert_eq!(
        a.flows.keys().collect::<Vec<_>>(),
        b.flows.keys().collect::<Vec<_>>()
    );
    for (slug, flow) in &a.flows {
        let other = &b.flows[slug];
        assert_eq!(flow.name, other.name);
        assert_eq!(flow.active_version, other.active_version);
        assert_eq!(flow.steps, other.steps, "steps of {slug}");
    }
    assert_eq!(
        a.runs.keys().collect::<Vec<_>>(),
        b.runs.keys().collect::<Vec<_>>()
    );
    assert_eq!(earlier.tick, 0);
}

#[test]
fn seed_contains_the_documented_flows() {
    let state = seed_default("ws-local");
    let ws = &state.workspaces["ws-local"];
    assert_eq!(ws.id, "ws-local");
    assert_eq!(
        ws.flows.keys().map(String::as_str).collect::<Vec<_>>(),
        vec![
            "invoice-reminder",
            "lead-enrichment",
            "subscription-renewal",
            "support-triage",
            "webhook-relay",
        ]
    );

    let renewal = &ws.flows["subscription-renewal"];
    let types = renewal
        .steps
        .iter()
        .map(|step| step.step_type.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        types,
        vec![
            StepType::Http,
            StepType::Code,
            StepType::Wait,
            StepType::Notify,
            StepType::Llm,
        ]
    );
    let relay = &ws.flows["webhook-relay"];
    assert_eq!(
        relay.steps.last().map(|step| step.step_type.clone()),
        Some(StepType::Other("store".to_string()))
    );
}

#[test]
fn seed_history_is_internally_consistent() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let state = seed_default_at("ws-local", now);
    let ws = &state.workspaces["ws-local"];

    let done = &ws.runs[SEED_COMPLETED_RUN_ID];
    assert_eq!(done.status, RunStatus::Completed);
    assert!(done.current_step.is_none());
    assert!(done.completed_at.is_some());
    assert_eq!(done.steps.len(), ws.flows[&done.flow_slug].steps.len());
    assert!(done
        .steps
        .iter()
        .all(|step| step.status == StepStatus::Completed));
    assert_eq!(done.started_at, now - Duration::hours(2));

    let failed = &ws.runs[SEED_FAILED_RUN_ID];
    assert_eq!(failed.status, RunStatus::Failed);
    let failing = failed
        .step(failed.current_step.as_deref().expect("current step"))
        .expect("failing step");
    assert_eq!(failing.status, StepStatus::Failed);
    assert!(failing.error.is_some());
    assert!(failed.started_at > done.started_at);

    assert!(!ws.revenue_events.is_empty());
    assert!(!ws.demand_top.is_empty());
    assert!(ws.triggers.contains_key("subscription-renewal"));
}

#[test]
fn seed_history_obeys_the_retry_rule() {
    let state = seed_default("ws-local");
    let ws = &state.workspaces["ws-local"];
    let mut retried = 0;
    for run in ws.runs.values() {
        for step in run.steps.iter().filter(|s| s.status != StepStatus::Pending) {
            let label = format!("{}:{}", run.workflow_id, step.step_id);
            if step.step_type == StepType::Http {
                assert!((1..=2).contains(&step.attempt), "{label}");
            } else {
                assert_eq!(step.attempt, 1, "{label}");
                let transient = step
                    .error
                    .as_deref()
                    .is_some_and(|error| error.contains(TRANSIENT_FAULT_MESSAGE));
                assert!(!transient, "{label}");
            }
            if step.attempt == 2 {
                retried += 1;
                let Some(StepResult::Http(http)) = &step.result_preview else {
                    panic!("{label} completed without an http result");
                };
                assert!(http.body.tick >= 2, "{label} tick {}", http.body.tick);
            }
        }
    }
    assert_eq!(retried, 1);
}
