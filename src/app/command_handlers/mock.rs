use crate::app::command_support::{map_mock_err, MockContext};
use crate::mock::{Run, RunStatus, State};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub fn cmd_mock(args: &[String]) -> Result<String, String> {
    if args.is_empty() {
        return Err(mock_usage());
    }
    let context = MockContext::resolve()?;
    run_mock_command(&context, args)
}

fn mock_usage() -> String {
    "usage: mock <path|reset|status|flows|flow|runs|run|start|advance> ...".to_string()
}

pub fn run_mock_command(context: &MockContext, args: &[String]) -> Result<String, String> {
    if args.is_empty() {
        return Err(mock_usage());
    }

    match args[0].as_str() {
        "path" => {
            expect_arity(args, 1, "usage: mock path")?;
            Ok(context.state_path().display().to_string())
        }
        "reset" => {
            expect_arity(args, 1, "usage: mock reset")?;
            context
                .store
                .reset(context.workspace_id())
                .map_err(map_mock_err)?;
            context.log(
                "info",
                "mock.reset",
                &format!("workspace={}", context.workspace_id()),
            );
            Ok(format!(
                "state reset\nworkspace={}\npath={}",
                context.workspace_id(),
                context.state_path().display()
            ))
        }
        "status" => {
            expect_arity(args, 1, "usage: mock status")?;
            let state = context.load_or_seed()?;
            status_report(context, &state)
        }
        "flows" => {
            expect_arity(args, 1, "usage: mock flows")?;
            let state = context.load_or_seed()?;
            let engine = context.engine();
            let flows = engine.list_flows(&state).map_err(map_mock_err)?;
            Ok(flows
                .iter()
                .map(|flow| {
                    format!(
                        "{} v{} steps={} {}",
                        flow.slug,
                        flow.active_version,
                        flow.steps.len(),
                        flow.name
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "flow" => {
            expect_arity(args, 2, "usage: mock flow <slug>")?;
            let state = context.load_or_seed()?;
            let flow = context
                .engine()
                .get_flow(&state, &args[1])
                .map_err(map_mock_err)?;
            serde_json::to_string_pretty(flow).map_err(|e| format!("failed to encode flow: {e}"))
        }
        "runs" => {
            let flags = parse_flags(&args[1..], &["--flow"])?;
            if !flags.positional.is_empty() {
                return Err("usage: mock runs [--flow <slug>]".to_string());
            }
            let state = context.load_or_seed()?;
            let engine = context.engine();
            let runs = engine
                .list_runs(&state, flags.values.get("--flow").map(String::as_str))
                .map_err(map_mock_err)?;
            Ok(runs
                .iter()
                .map(|run| run_line(run))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "run" => {
            expect_arity(args, 2, "usage: mock run <run_id>")?;
            let state = context.load_or_seed()?;
            let run = context
                .engine()
                .get_run(&state, &args[1])
                .map_err(map_mock_err)?;
            serde_json::to_string_pretty(run).map_err(|e| format!("failed to encode run: {e}"))
        }
        "start" => {
            let usage = "usage: mock start <slug> [--version N] [--input <json>]";
            let flags = parse_flags(&args[1..], &["--version", "--input"])?;
            let [slug] = flags.positional.as_slice() else {
                return Err(usage.to_string());
            };
            let version = match flags.values.get("--version") {
                Some(raw) => raw.parse::<u32>().map_err(|_| {
                    format!("invalid --version `{raw}`; expected a positive integer")
                })?,
                None => 0,
            };
            let input = match flags.values.get("--input") {
                Some(raw) => serde_json::from_str::<Value>(raw)
                    .map_err(|e| format!("invalid --input json: {e}"))?,
                None => Value::Object(Map::new()),
            };

            let mut state = context.load_or_seed()?;
            let run = context
                .engine()
                .start_run(&mut state, slug, version, input)
                .map_err(map_mock_err)?;
            context.save(&state)?;
            context.log(
                "info",
                "mock.run_started",
                &format!(
                    "run_id={} flow={} version={}",
                    run.workflow_id, run.flow_slug, run.version
                ),
            );
            Ok(format!(
                "run started\nrun_id={}\nflow={}\nversion={}\nstatus={}\ncurrent_step={}",
                run.workflow_id,
                run.flow_slug,
                run.version,
                run.status,
                run.current_step.as_deref().unwrap_or("-")
            ))
        }
        "advance" => {
            let ticks = match args.len() {
                1 => 1,
                2 => args[1]
                    .parse::<i64>()
                    .map_err(|_| format!("invalid tick count `{}`", args[1]))?,
                _ => return Err("usage: mock advance [ticks]".to_string()),
            };
            let mut state = context.load_or_seed()?;
            let report = context
                .engine()
                .advance(&mut state, ticks)
                .map_err(map_mock_err)?;
            context.save(&state)?;
            context.log(
                "info",
                "mock.advanced",
                &format!(
                    "ticks={} tick={} events={} completed={}",
                    report.ticks,
                    report.final_tick,
                    report.events.len(),
                    report.completed_runs.len()
                ),
            );
            let active = count_runs(&state, context.workspace_id(), RunStatus::Running);
            Ok(format!(
                "state advanced\ntick={}\nticks={}\nrunning={}\ncompleted={}",
                report.final_tick,
                report.ticks,
                active,
                report.completed_runs.join(",")
            ))
        }
        other => Err(format!("unknown mock subcommand `{other}`")),
    }
}

fn status_report(context: &MockContext, state: &State) -> Result<String, String> {
    let workspace = state
        .workspace(context.workspace_id())
        .map_err(map_mock_err)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for run in workspace.runs.values() {
        *counts.entry(run.status.to_string()).or_default() += 1;
    }
    let mut lines = vec![
        format!("workspace={}", workspace.id),
        format!("tick={}", state.tick),
        format!("flows={}", workspace.flows.len()),
        format!("runs={}", workspace.runs.len()),
    ];
    lines.extend(
        counts
            .into_iter()
            .map(|(status, count)| format!("runs_{status}={count}")),
    );
    Ok(lines.join("\n"))
}

fn count_runs(state: &State, workspace_id: &str, status: RunStatus) -> usize {
    state
        .workspace(workspace_id)
        .map(|ws| ws.runs.values().filter(|run| run.status == status).count())
        .unwrap_or(0)
}

fn run_line(run: &Run) -> String {
    format!(
        "{} {} v{} {} current={} started={}",
        run.workflow_id,
        run.flow_slug,
        run.version,
        run.status,
        run.current_step.as_deref().unwrap_or("-"),
        run.started_at.to_rfc3339()
    )
}

fn expect_arity(args: &[String], len: usize, usage: &str) -> Result<(), String> {
    if args.len() == len {
        Ok(())
    } else {
        Err(usage.to_string())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ParsedFlags {
    positional: Vec<String>,
    values: BTreeMap<String, String>,
}

fn parse_flags(args: &[String], allowed: &[&str]) -> Result<ParsedFlags, String> {
    let mut parsed = ParsedFlags::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if !arg.starts_with("--") {
            parsed.positional.push(arg.clone());
            continue;
        }
        if !allowed.contains(&arg.as_str()) {
            return Err(format!("unknown option `{arg}`"));
        }
        let value = iter
            .next()
            .ok_or_else(|| format!("option `{arg}` requires a value"))?;
        parsed.values.insert(arg.clone(), value.clone());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RunStatus;
    use tempfile::tempdir;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|v| v.to_string()).collect()
    }

    fn kv(output: &str, key: &str) -> String {
        output
            .lines()
            .find_map(|line| line.strip_prefix(&format!("{key}=")))
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn parse_flags_splits_positional_and_known_options() {
        let parsed = parse_flags(&args(&["slug", "--version", "2"]), &["--version"])
            .expect("parse flags");
        assert_eq!(parsed.positional, vec!["slug".to_string()]);
        assert_eq!(parsed.values.get("--version").map(String::as_str), Some("2"));

        let err = parse_flags(&args(&["--bogus", "1"]), &["--version"]).expect_err("unknown");
        assert_eq!(err, "unknown option `--bogus`");
        let err = parse_flags(&args(&["--version"]), &["--version"]).expect_err("missing");
        assert_eq!(err, "option `--version` requires a value");
    }

    #[test]
    fn start_then_advance_persists_between_commands() {
        let temp = tempdir().expect("tempdir");
        let context = MockContext::from_app_root(temp.path()).expect("context");

        let started = run_mock_command(
            &context,
            &args(&["start", "lead-enrichment", "--input", r#"{"email":"a@b.c"}"#]),
        )
        .expect("start");
        let run_id = kv(&started, "run_id");
        assert!(run_id.starts_with("wf-"));
        assert_eq!(kv(&started, "current_step"), "fetch-lead");
        assert_eq!(kv(&started, "version"), "2");

        let advanced = run_mock_command(&context, &args(&["advance", "20"])).expect("advance");
        assert_eq!(kv(&advanced, "tick"), "20");

        let state = context.store.load().expect("reload");
        let run = &state.workspaces[context.workspace_id()].runs[&run_id];
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[test]
    fn unknown_flow_leaves_snapshot_untouched() {
        let temp = tempdir().expect("tempdir");
        let context = MockContext::from_app_root(temp.path()).expect("context");
        run_mock_command(&context, &args(&["reset"])).expect("reset");
        let before = std::fs::read(context.state_path()).expect("read before");

        let err = run_mock_command(&context, &args(&["start", "missing-flow"]))
            .expect_err("unknown flow");
        assert_eq!(err, "flow `missing-flow` not found");
        assert_eq!(std::fs::read(context.state_path()).expect("read after"), before);
    }

    #[test]
    fn rejects_unknown_subcommand() {
        let temp = tempdir().expect("tempdir");
        let context = MockContext::from_app_root(temp.path()).expect("context");
        let err = run_mock_command(&context, &args(&["bogus"])).expect_err("unknown");
        assert_eq!(err, "unknown mock subcommand `bogus`");
    }
}
