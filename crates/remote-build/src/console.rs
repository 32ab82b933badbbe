//! Console commands.
//!
//! Lines starting with `:` are view actions; anything else goes to the remote
//! session verbatim.

use remote_build_core::{Error, Result, TokenKind};
use remote_build_view::ViewportPosition;

use crate::app::RemoteBuild;

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// `:filter <re>`
    Filter(String),
    /// `:clear`
    Clear,
    /// `:fold-all`
    FoldAll,
    /// `:scroll <line>`
    Scroll(usize),
    /// `:viewport <x> <y>`
    Viewport(ViewportPosition),
    /// `:pid <line>`, `:name <line>` or `:level <line>`
    Token(TokenKind, String),
    /// `:relaunch`
    Relaunch,
    /// `:quit`
    Quit,
    /// Anything else, for the remote session
    Send(String),
}

/// Console input that could not be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConsoleError {
    /// Known command with bad arguments
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Unrecognised `:` command
    #[error("unknown command ':{0}'")]
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse one line of console input.
    pub fn parse(input: &str) -> std::result::Result<Self, ConsoleError> {
        let Some(command) = input.strip_prefix(':') else {
            return Ok(ConsoleCommand::Send(input.to_string()));
        };

        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command.trim_end(), ""),
        };

        match name {
            "filter" => {
                if rest.is_empty() {
                    return Err(ConsoleError::Usage(":filter <regex>"));
                }
                Ok(ConsoleCommand::Filter(rest.to_string()))
            }
            "clear" => Ok(ConsoleCommand::Clear),
            "fold-all" => Ok(ConsoleCommand::FoldAll),
            "scroll" => rest
                .parse()
                .map(ConsoleCommand::Scroll)
                .map_err(|_| ConsoleError::Usage(":scroll <line>")),
            "viewport" => parse_viewport(rest).ok_or(ConsoleError::Usage(":viewport <x> <y>")),
            "pid" => token(TokenKind::ProcessId, rest, ":pid <log line>"),
            "name" => token(TokenKind::ProcessName, rest, ":name <log line>"),
            "level" => token(TokenKind::MessageLevel, rest, ":level <log line>"),
            "relaunch" => Ok(ConsoleCommand::Relaunch),
            "quit" | "q" => Ok(ConsoleCommand::Quit),
            other => Err(ConsoleError::Unknown(other.to_string())),
        }
    }

    /// Whether the command acts on the view rather than the session.
    pub fn is_view_action(&self) -> bool {
        matches!(
            self,
            ConsoleCommand::Filter(_)
                | ConsoleCommand::Clear
                | ConsoleCommand::FoldAll
                | ConsoleCommand::Scroll(_)
                | ConsoleCommand::Viewport(_)
                | ConsoleCommand::Token(..)
        )
    }

    /// Run the command against `app`. Returns false once the console should stop.
    ///
    /// `scope` is what the display reports at its selection; view actions are
    /// refused unless it is a Remote Build view or the view is still open.
    pub fn execute(self, app: &mut RemoteBuild, scope: Option<&str>) -> Result<bool> {
        if self.is_view_action() && !app.is_enabled_for(scope) {
            return Err(Error::Display("no Remote Build view is active".to_string()));
        }

        match self {
            ConsoleCommand::Filter(pattern) => app.set_filter(&pattern)?,
            ConsoleCommand::Clear => app.clear_view()?,
            ConsoleCommand::FoldAll => app.fold_all(),
            ConsoleCommand::Scroll(row) => app.scroll_to(row),
            ConsoleCommand::Viewport(position) => app.set_viewport_position(position),
            ConsoleCommand::Token(kind, line) => app.filter_by_token(kind, &line)?,
            ConsoleCommand::Relaunch => {
                app.launch()?;
            }
            ConsoleCommand::Quit => {
                app.close();
                return Ok(false);
            }
            ConsoleCommand::Send(line) => app.send(&line)?,
        }
        Ok(true)
    }
}

fn parse_viewport(args: &str) -> Option<ConsoleCommand> {
    let mut parts = args.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ConsoleCommand::Viewport(ViewportPosition::new(x, y)))
}

fn token(
    kind: TokenKind,
    line: &str,
    usage: &'static str,
) -> std::result::Result<ConsoleCommand, ConsoleError> {
    if line.is_empty() {
        return Err(ConsoleError::Usage(usage));
    }
    Ok(ConsoleCommand::Token(kind, line.to_string()))
}
