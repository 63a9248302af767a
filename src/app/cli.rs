#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Help,
    Mock,
    Watch,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "help" | "--help" | "-h" => CliVerb::Help,
        "mock" => CliVerb::Mock,
        "watch" => CliVerb::Watch,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  mock path                            Print the simulation snapshot path".to_string(),
        "  mock reset                           Re-seed the simulation snapshot".to_string(),
        "  mock status                          Show the tick counter and run counts".to_string(),
        "  mock flows                           List flows in the workspace".to_string(),
        "  mock flow <slug>                     Show one flow as JSON".to_string(),
        "  mock runs [--flow <slug>]            List runs, newest first".to_string(),
        "  mock run <run_id>                    Show one run as JSON".to_string(),
        "  mock start <slug> [--version N] [--input <json>]".to_string(),
        "                                       Start a simulated run".to_string(),
        "  mock advance [ticks]                 Advance all running runs".to_string(),
        "  watch                                Live dashboard of the simulation".to_string(),
    ]
}

pub(crate) fn help_text() -> String {
    let mut lines = vec![
        "flowctl - author and inspect flows against an offline simulator".to_string(),
        String::new(),
    ];
    lines.extend(cli_help_lines());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_verbs() {
        assert_eq!(parse_cli_verb("mock"), CliVerb::Mock);
        assert_eq!(parse_cli_verb("watch"), CliVerb::Watch);
        assert_eq!(parse_cli_verb("--help"), CliVerb::Help);
        assert_eq!(parse_cli_verb("deploy"), CliVerb::Unknown);
    }

    #[test]
    fn help_lists_every_mock_subcommand() {
        let help = help_text();
        for sub in ["path", "reset", "status", "flows", "runs", "start", "advance"] {
            assert!(help.contains(&format!("mock {sub}")), "missing {sub}");
        }
    }
}
