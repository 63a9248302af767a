use flowctl::mock::store::encode_state;
use flowctl::mock::{
    load_state, save_state_atomic, seed_default, MockEngine, MockError, MockStore, State,
};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

#[test]
fn save_then_load_round_trips_with_single_trailing_newline() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("nested/dir/state.json");
    let mut state = seed_default("ws-a");
    state.tick = 41;
    MockEngine::new("ws-a")
        .start_run(&mut state, "lead-enrichment", 0, json!({"lead": "x"}))
        .expect("start");

    save_state_atomic(&path, &state).expect("save");
    let raw = fs::read_to_string(&path).expect("read");
    assert!(raw.ends_with("}\n"));
    assert!(!raw.ends_with("\n\n"));
    assert!(raw.contains("\n  \"tick\": 41"));

    let loaded = load_state(&path).expect("load");
    assert_eq!(loaded.version, state.version);
    assert_eq!(loaded.tick, 41);
    assert_eq!(
        loaded.workspaces.keys().collect::<Vec<_>>(),
        state.workspaces.keys().collect::<Vec<_>>()
    );
    assert_eq!(loaded, state);
}

#[test]
fn save_leaves_no_temp_files_and_replaces_previous_content() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("state.json");
    let mut state = State::default();
    save_state_atomic(&path, &state).expect("first save");
    state.tick = 3;
    save_state_atomic(&path, &state).expect("second save");

    let names = fs::read_dir(temp.path())
        .expect("list")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["state.json".to_string()]);
    assert_eq!(load_state(&path).expect("load").tick, 3);
}

#[cfg(unix)]
#[test]
fn created_parent_directories_use_mode_0755() {
    use std::os::unix::fs::PermissionsExt;
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("fresh/state.json");
    save_state_atomic(&path, &State::default()).expect("save");
    let mode = fs::metadata(temp.path().join("fresh"))
        .expect("meta")
        .permissions()
        .mode();
    // umask may only remove bits
    assert_eq!(mode & 0o777 & !0o755, 0);
    assert_eq!(mode & 0o700, 0o700);
}

#[test]
fn missing_file_is_distinguishable_from_malformed_content() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("state.json");

    let err = load_state(&path).expect_err("missing");
    assert!(matches!(err, MockError::StateMissing { .. }));
    assert!(err.is_not_found());

    fs::write(&path, "{ not json").expect("write");
    let err = load_state(&path).expect_err("malformed");
    assert!(matches!(err, MockError::Malformed { .. }));
    assert!(!err.is_not_found());
}

#[test]
fn sparse_snapshots_load_with_empty_collections() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("state.json");
    fs::write(
        &path,
        r#"{"version":1,"tick":5,"workspaces":{"ws-old":{"id":"ws-old","name":"Old"}}}"#,
    )
    .expect("write");

    let state = load_state(&path).expect("load");
    let ws = state.workspace("ws-old").expect("workspace");
    assert!(ws.flows.is_empty());
    assert!(ws.runs.is_empty());
    assert!(ws.entitlements.is_empty());
    assert!(ws.demand_top.is_empty());

    let report = MockEngine::new("ws-old")
        .advance(&mut state.clone(), 1)
        .expect("advance");
    assert_eq!(report.final_tick, 6);
}

#[test]
fn load_or_seed_seeds_once_and_keeps_malformed_files() {
    let temp = tempdir().expect("tempdir");
    let store = MockStore::new(temp.path().join("mock/state.json"));
    assert!(store.modified_at().expect("mtime").is_none());

    let (seeded, was_seeded) = store.load_or_seed("ws-local").expect("seed");
    assert!(was_seeded);
    assert!(store.path().exists());
    assert!(store.modified_at().expect("mtime").is_some());

    let (loaded, was_seeded) = store.load_or_seed("ws-local").expect("load");
    assert!(!was_seeded);
    assert_eq!(loaded, seeded);

    fs::write(store.path(), "garbage").expect("corrupt");
    let err = store.load_or_seed("ws-local").expect_err("malformed");
    assert!(matches!(err, MockError::Malformed { .. }));
    assert_eq!(fs::read_to_string(store.path()).expect("read"), "garbage");

    let reset = store.reset("ws-local").expect("reset");
    assert_eq!(store.load().expect("reload"), reset);
}

#[test]
fn encoded_snapshot_uses_documented_field_names() {
    let state = seed_default("ws-doc");
    let value: serde_json::Value =
        serde_json::from_slice(&encode_state(&state).expect("encode")).expect("json");
    let ws = &value["workspaces"]["ws-doc"];
    for key in [
        "id",
        "name",
        "plan",
        "owner",
        "updatedAt",
        "flows",
        "runs",
        "revenueEvents",
        "demandTop",
    ] {
        assert!(ws.get(key).is_some(), "workspace key {key}");
    }
    let step = &ws["flows"]["subscription-renewal"]["steps"][0];
    for key in ["id", "type", "title", "inputSchema", "outputSchema", "definition"] {
        assert!(step.get(key).is_some(), "flow step key {key}");
    }
    let run = ws["runs"]
        .as_object()
        .expect("runs")
        .values()
        .next()
        .expect("run");
    for key in [
        "workflowId",
        "flowSlug",
        "version",
        "status",
        "triggeredBy",
        "startedAt",
        "updatedAt",
        "completedAt",
        "currentStep",
        "inputPreview",
        "resultPreview",
        "error",
        "steps",
    ] {
        assert!(run.get(key).is_some(), "run key {key}");
    }
    let execution = &run["steps"][0];
    for key in [
        "stepId",
        "stepType",
        "title",
        "status",
        "attempt",
        "startedAt",
        "completedAt",
        "durationMs",
        "inputPreview",
        "resultPreview",
        "error",
    ] {
        assert!(execution.get(key).is_some(), "step execution key {key}");
    }
}
