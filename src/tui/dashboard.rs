use crate::app::command_support::{map_mock_err, MockContext};
use crate::mock::{MockEngine, Run, RunStatus, State, StateWatcher, StepStatus};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

const UI_POLL_INTERVAL: Duration = Duration::from_millis(60);

struct DashboardState {
    state: State,
    selected: usize,
    status_line: String,
    last_reload: Instant,
}

impl DashboardState {
    fn new(state: State) -> Self {
        Self {
            state,
            selected: 0,
            status_line: "a advance | r reload | up/down select | q quit".to_string(),
            last_reload: Instant::now(),
        }
    }

    fn runs<'s>(&'s self, engine: &MockEngine) -> Vec<&'s Run> {
        engine.list_runs(&self.state, None).unwrap_or_default()
    }

    fn replace_state(&mut self, state: State, engine: &MockEngine) {
        self.state = state;
        self.last_reload = Instant::now();
        let len = self.runs(engine).len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn select_next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

/// Interactive view of the snapshot; reloads whenever another process rewrites it.
pub fn run_dashboard(context: &MockContext) -> Result<(), String> {
    let engine = context.engine();
    let mut watcher = StateWatcher::new(context.store.clone());
    let initial = watcher
        .poll()
        .map_err(map_mock_err)?
        .ok_or_else(|| format!("no snapshot at {}", context.state_path().display()))?;
    let mut dashboard = DashboardState::new(initial);

    let mut terminal = setup_terminal()?;
    let result = run_event_loop(&mut terminal, context, &engine, &mut watcher, &mut dashboard);
    teardown_terminal(&mut terminal)?;
    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    context: &MockContext,
    engine: &MockEngine,
    watcher: &mut StateWatcher,
    dashboard: &mut DashboardState,
) -> Result<(), String> {
    let refresh_interval = Duration::from_millis(context.settings.watch_poll_millis);
    let mut last_poll = Instant::now();
    loop {
        if last_poll.elapsed() >= refresh_interval {
            last_poll = Instant::now();
            match watcher.poll() {
                Ok(Some(state)) => {
                    dashboard.replace_state(state, engine);
                    dashboard.status_line = format!("reloaded tick={}", dashboard.state.tick);
                }
                Ok(None) => {}
                Err(err) => dashboard.status_line = format!("reload failed: {err}"),
            }
        }
        draw_dashboard(terminal, context, engine, dashboard)?;

        if !event::poll(UI_POLL_INTERVAL).map_err(|e| format!("failed to poll events: {e}"))? {
            continue;
        }
        let Event::Key(key) = event::read().map_err(|e| format!("failed to read event: {e}"))?
        else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            break;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => break,
            KeyCode::Down | KeyCode::Char('j') => {
                let len = dashboard.runs(engine).len();
                dashboard.select_next(len);
            }
            KeyCode::Up | KeyCode::Char('k') => dashboard.select_previous(),
            KeyCode::Char('a') => {
                dashboard.status_line = match advance_once(context, engine, watcher) {
                    Ok(state) => {
                        dashboard.replace_state(state, engine);
                        format!("advanced to tick={}", dashboard.state.tick)
                    }
                    Err(err) => format!("advance failed: {err}"),
                };
            }
            KeyCode::Char('r') => {
                dashboard.status_line = match context.store.load() {
                    Ok(state) => {
                        dashboard.replace_state(state, engine);
                        format!("reloaded tick={}", dashboard.state.tick)
                    }
                    Err(err) => format!("reload failed: {err}"),
                };
            }
            _ => {}
        }
    }
    Ok(())
}

/// Advances the on-disk snapshot, not the possibly stale in-memory copy.
fn advance_once(
    context: &MockContext,
    engine: &MockEngine,
    watcher: &mut StateWatcher,
) -> Result<State, String> {
    let mut state = context.store.load().map_err(map_mock_err)?;
    let report = engine.advance(&mut state, 1).map_err(map_mock_err)?;
    context.save(&state)?;
    watcher.mark_seen().map_err(map_mock_err)?;
    context.log(
        "info",
        "mock.advanced",
        &format!("ticks=1 tick={} source=watch", report.final_tick),
    );
    Ok(state)
}

fn status_color(status: RunStatus) -> Color {
    match status {
        RunStatus::Running | RunStatus::Retrying => Color::Yellow,
        RunStatus::Completed => Color::Green,
        RunStatus::Failed | RunStatus::Cancelled => Color::Red,
        RunStatus::Pending | RunStatus::Waiting => Color::Gray,
    }
}

fn step_color(status: StepStatus) -> Color {
    match status {
        StepStatus::Running => Color::Yellow,
        StepStatus::Retrying => Color::Magenta,
        StepStatus::Completed => Color::Green,
        StepStatus::Failed => Color::Red,
        StepStatus::Pending => Color::Gray,
    }
}

fn step_lines(run: &Run) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::raw(format!("run {} ({} v{})", run.workflow_id, run.flow_slug, run.version)),
        Line::raw(format!(
            "status={} trigger={} current={}",
            run.status,
            run.triggered_by,
            run.current_step.as_deref().unwrap_or("-")
        )),
        Line::raw(String::new()),
    ];
    for step in &run.steps {
        let mut text = format!(
            "{:<22} {:<7} {:<9} attempt={} {}ms",
            step.step_id, step.step_type, step.status, step.attempt, step.duration_ms
        );
        if let Some(error) = &step.error {
            text.push_str(&format!("  error: {error}"));
        }
        lines.push(Line::styled(text, Style::default().fg(step_color(step.status))));
    }
    if let Some(error) = &run.error {
        lines.push(Line::raw(String::new()));
        lines.push(Line::styled(
            format!("error: {error}"),
            Style::default().fg(Color::Red),
        ));
    }
    lines
}

fn draw_dashboard(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    context: &MockContext,
    engine: &MockEngine,
    dashboard: &DashboardState,
) -> Result<(), String> {
    let runs = dashboard.runs(engine);
    terminal
        .draw(|frame| {
            let sections = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4),
                    Constraint::Min(8),
                    Constraint::Length(3),
                ])
                .split(frame.area());

            let header = Paragraph::new(vec![
                Line::raw(format!(
                    "workspace={} tick={} runs={}",
                    context.workspace_id(),
                    dashboard.state.tick,
                    runs.len()
                )),
                Line::raw(format!(
                    "snapshot={} (reloaded {}s ago)",
                    context.state_path().display(),
                    dashboard.last_reload.elapsed().as_secs()
                )),
            ])
            .block(
                Block::default()
                    .title("flowctl watch")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
            frame.render_widget(header, sections[0]);

            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(sections[1]);

            let items = runs
                .iter()
                .map(|run| {
                    ListItem::new(format!(
                        "{} {:<22} {}",
                        run.workflow_id, run.flow_slug, run.status
                    ))
                    .style(Style::default().fg(status_color(run.status)))
                })
                .collect::<Vec<_>>();
            let list = List::new(items)
                .block(Block::default().title("Runs").borders(Borders::ALL))
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
            let mut list_state = ListState::default();
            if !runs.is_empty() {
                list_state.select(Some(dashboard.selected));
            }
            frame.render_stateful_widget(list, body[0], &mut list_state);

            let detail = runs
                .get(dashboard.selected)
                .map(|run| step_lines(run))
                .unwrap_or_else(|| vec![Line::raw("no runs yet; `flowctl mock start <slug>`")]);
            let detail_widget = Paragraph::new(detail)
                .block(Block::default().title("Steps").borders(Borders::ALL))
                .wrap(Wrap { trim: false });
            frame.render_widget(detail_widget, body[1]);

            let status_widget = Paragraph::new(dashboard.status_line.clone())
                .block(Block::default().title("Status").borders(Borders::ALL));
            frame.render_widget(status_widget, sections[2]);
        })
        .map_err(|e| format!("failed to render dashboard: {e}"))?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, String> {
    enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {e}"))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)
        .map_err(|e| format!("failed to enter alternate screen: {e}"))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| format!("failed to initialize terminal: {e}"))
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), String> {
    disable_raw_mode().map_err(|e| format!("failed to disable raw mode: {e}"))?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)
        .map_err(|e| format!("failed to leave alternate screen: {e}"))?;
    terminal
        .show_cursor()
        .map_err(|e| format!("failed to restore cursor: {e}"))?;
    Ok(())
}
