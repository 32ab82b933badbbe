//! Token extraction from semi-structured log lines.
//!
//! Lines look like `01-02 03:04:05.678 I/ActivityManager( 123): message`:
//! an optional timestamp, a one-letter message level, a process name and a
//! parenthesised process id. Each token has its own parser and turns into a
//! filter pattern that selects every line sharing that token.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{Error, Result};

lazy_static! {
    static ref PROCESS_ID: Regex = Regex::new(r"^[\-\d\s:.]*./.+\( *(\d+)\)").unwrap();
    static ref PROCESS_NAME: Regex = Regex::new(r"^[\-\d\s:.]*./(.+)\( *\d+\)").unwrap();
    static ref MESSAGE_LEVEL: Regex = Regex::new(r"^[\-\d\s:.]*(\w)/.+\( *\d+\)").unwrap();
}

/// Which token to pull out of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Parenthesised process id
    ProcessId,
    /// Process name before the id
    ProcessName,
    /// Single-letter message level
    MessageLevel,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::ProcessId => "process id",
            TokenKind::ProcessName => "process name",
            TokenKind::MessageLevel => "message level",
        };
        f.write_str(name)
    }
}

/// A token extracted from a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogToken {
    /// Process id
    ProcessId(u32),
    /// Process name
    ProcessName(String),
    /// Message level letter
    MessageLevel(char),
}

impl LogToken {
    /// Kind of this token.
    pub fn kind(&self) -> TokenKind {
        match self {
            LogToken::ProcessId(_) => TokenKind::ProcessId,
            LogToken::ProcessName(_) => TokenKind::ProcessName,
            LogToken::MessageLevel(_) => TokenKind::MessageLevel,
        }
    }

    /// Filter pattern selecting every line that carries this token.
    pub fn filter_pattern(&self) -> String {
        match self {
            LogToken::ProcessId(pid) => format!(r"\( *{pid}\)"),
            LogToken::ProcessName(name) => format!(r"{}\( *\d+\)", regex::escape(name)),
            LogToken::MessageLevel(level) => {
                format!(r"{}/.+\( *\d+\)", regex::escape(&level.to_string()))
            }
        }
    }
}

/// Extract the process id.
pub fn extract_process_id(line: &str) -> Result<u32> {
    PROCESS_ID
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or(Error::Extraction(TokenKind::ProcessId))
}

/// Extract the process name.
pub fn extract_process_name(line: &str) -> Result<String> {
    PROCESS_NAME
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(Error::Extraction(TokenKind::ProcessName))
}

/// Extract the message level letter.
pub fn extract_message_level(line: &str) -> Result<char> {
    MESSAGE_LEVEL
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
        .ok_or(Error::Extraction(TokenKind::MessageLevel))
}

/// Extract a token of the given kind.
pub fn extract_token(kind: TokenKind, line: &str) -> Result<LogToken> {
    match kind {
        TokenKind::ProcessId => extract_process_id(line).map(LogToken::ProcessId),
        TokenKind::ProcessName => extract_process_name(line).map(LogToken::ProcessName),
        TokenKind::MessageLevel => extract_message_level(line).map(LogToken::MessageLevel),
    }
}
