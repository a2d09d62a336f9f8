use healthboard_core::{AppState, GroupId, LogPeriod, Msg, ViewKind};
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  tab <n|group>            switch tab (t)
  refresh                  refresh the current tab (r)
  /<text>, search <text>   filter the current tab; empty text clears
  critical                 toggle critical-only servers (c)
  toggle <card> <section>  collapse or expand a card section (x)
  sort <column>            sort by column key, again to reverse (o)
  logs <servers>           query event logs for comma-separated servers
  servers <list>           set the server list without querying
  type <name>              pick the log type
  period <token>           10min, 30min, 1h, 2h, 6h, 12h or 24h
  go                       run the log query
  server <name>            show another server's results
  help, quit";

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch(Vec<Msg>),
    Help,
    Redraw,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for the list of commands.")]
    Unknown(String),
    #[error("'{command}' needs {what}.")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error("No tab '{0}'.")]
    UnknownTab(String),
    #[error("Unknown period '{0}'. Use 10min, 30min, 1h, 2h, 6h, 12h or 24h.")]
    UnknownPeriod(String),
    #[error("'{0}' only works on the event log tab.")]
    LogsOnly(&'static str),
}

pub fn parse(line: &str, state: &AppState) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Redraw);
    }
    let on_logs = state.view_state().kind() == ViewKind::EventLog;
    let search = |query: &str| {
        let query = query.trim().to_string();
        if on_logs {
            Msg::LogSearchChanged(query)
        } else {
            Msg::SearchChanged(query)
        }
    };
    if let Some(query) = line.strip_prefix('/') {
        return Ok(Command::Dispatch(vec![search(query)]));
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let logs_only = |command: &'static str| {
        if on_logs {
            Ok(())
        } else {
            Err(CommandError::LogsOnly(command))
        }
    };

    let msg = match word.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => return Ok(Command::Quit),
        "h" | "help" | "?" => return Ok(Command::Help),
        "t" | "tab" => Msg::TabSelected(resolve_tab(required(rest, "tab", "a tab")?, state)?),
        "r" | "refresh" => Msg::RefreshClicked,
        "s" | "search" => search(rest),
        "c" | "critical" => Msg::CriticalFilterToggled,
        "x" | "toggle" => {
            let (card, section) = rest.rsplit_once(char::is_whitespace).ok_or(
                CommandError::MissingArgument {
                    command: "toggle",
                    what: "a card and a section name",
                },
            )?;
            Msg::SectionToggled {
                card: card.trim().to_string(),
                section: section.to_string(),
            }
        }
        "o" | "sort" => Msg::SortClicked(required(rest, "sort", "a column key")?.to_string()),
        "logs" => {
            logs_only("logs")?;
            let servers = required(rest, "logs", "a server list")?;
            return Ok(Command::Dispatch(vec![
                Msg::LogServersChanged(servers.to_string()),
                Msg::LogQuerySubmitted,
            ]));
        }
        "servers" => {
            logs_only("servers")?;
            Msg::LogServersChanged(rest.to_string())
        }
        "type" => {
            logs_only("type")?;
            Msg::LogTypeSelected(required(rest, "type", "a log type name")?.to_string())
        }
        "period" => {
            logs_only("period")?;
            let token = required(rest, "period", "a period token")?;
            Msg::LogPeriodSelected(
                LogPeriod::from_token(token)
                    .ok_or_else(|| CommandError::UnknownPeriod(token.to_string()))?,
            )
        }
        "go" | "query" => {
            logs_only("go")?;
            Msg::LogQuerySubmitted
        }
        "server" => {
            logs_only("server")?;
            Msg::LogServerSelected(required(rest, "server", "a server name")?.to_string())
        }
        _ => return Err(CommandError::Unknown(word.to_string())),
    };
    Ok(Command::Dispatch(vec![msg]))
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    what: &'static str,
) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument { command, what })
    } else {
        Ok(rest)
    }
}

/// Accepts a 1-based tab number or a group id (case-insensitive).
fn resolve_tab(raw: &str, state: &AppState) -> Result<GroupId, CommandError> {
    let tabs = &state.settings().tabs;
    let by_number = raw
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| tabs.get(index));
    by_number
        .or_else(|| {
            tabs.iter()
                .find(|group| group.as_str().eq_ignore_ascii_case(raw))
        })
        .cloned()
        .ok_or_else(|| CommandError::UnknownTab(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use healthboard_core::update;
    use pretty_assertions::assert_eq;

    use super::*;

    fn dispatched(line: &str, state: &AppState) -> Vec<Msg> {
        match parse(line, state) {
            Ok(Command::Dispatch(msgs)) => msgs,
            other => panic!("expected messages for {line:?}, got {other:?}"),
        }
    }

    fn on_event_log() -> AppState {
        update(
            AppState::new(),
            Msg::TabSelected(GroupId::new("LogiEventLog")),
        )
        .0
    }

    #[test]
    fn tabs_by_number_or_name() {
        let state = AppState::new();
        assert_eq!(
            dispatched("tab 2", &state),
            vec![Msg::TabSelected(GroupId::new("ClustersWindows"))]
        );
        assert_eq!(
            dispatched("t kolejkimq", &state),
            vec![Msg::TabSelected(GroupId::new("KolejkiMQ"))]
        );
        assert_eq!(
            parse("tab 99", &state),
            Err(CommandError::UnknownTab("99".to_string()))
        );
    }

    #[test]
    fn search_goes_to_the_active_tab_kind() {
        let state = AppState::new();
        assert_eq!(
            dispatched("/ sql01 ", &state),
            vec![Msg::SearchChanged("sql01".to_string())]
        );
        assert_eq!(
            dispatched("/", &state),
            vec![Msg::SearchChanged(String::new())]
        );
        assert_eq!(
            dispatched("search 4625", &on_event_log()),
            vec![Msg::LogSearchChanged("4625".to_string())]
        );
    }

    #[test]
    fn card_actions() {
        let state = AppState::new();
        assert_eq!(
            dispatched("x SQL01 top-cpu", &state),
            vec![Msg::SectionToggled {
                card: "SQL01".to_string(),
                section: "top-cpu".to_string(),
            }]
        );
        assert_eq!(dispatched("c", &state), vec![Msg::CriticalFilterToggled]);
        assert_eq!(dispatched("refresh", &state), vec![Msg::RefreshClicked]);
        assert!(matches!(
            parse("toggle SQL01", &state),
            Err(CommandError::MissingArgument { command: "toggle", .. })
        ));
    }

    #[test]
    fn log_commands_need_the_log_tab() {
        assert_eq!(
            parse("logs SRV1", &AppState::new()),
            Err(CommandError::LogsOnly("logs"))
        );

        let state = on_event_log();
        assert_eq!(
            dispatched("logs SRV1, SRV2", &state),
            vec![
                Msg::LogServersChanged("SRV1, SRV2".to_string()),
                Msg::LogQuerySubmitted,
            ]
        );
        assert_eq!(
            dispatched("period 12h", &state),
            vec![Msg::LogPeriodSelected(LogPeriod::TwelveHours)]
        );
        assert_eq!(
            parse("period 3h", &state),
            Err(CommandError::UnknownPeriod("3h".to_string()))
        );
        assert_eq!(
            dispatched("server SRV2", &state),
            vec![Msg::LogServerSelected("SRV2".to_string())]
        );
    }

    #[test]
    fn meta_commands() {
        let state = AppState::new();
        assert_eq!(parse("  ", &state), Ok(Command::Redraw));
        assert_eq!(parse("quit", &state), Ok(Command::Quit));
        assert_eq!(parse("?", &state), Ok(Command::Help));
        assert_eq!(
            parse("frobnicate now", &state),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
    }
}
