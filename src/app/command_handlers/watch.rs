use crate::app::command_support::MockContext;
use crate::tui::dashboard::run_dashboard;

pub fn cmd_watch(args: &[String]) -> Result<String, String> {
    if !args.is_empty() {
        return Err("usage: watch".to_string());
    }
    let context = MockContext::resolve()?;
    context.load_or_seed()?;
    run_dashboard(&context)?;
    Ok(String::new())
}
