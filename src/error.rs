//! Status codes and error propagation.
//!
//! Pickle scripts observe exactly five status codes (spec §6): `error`,
//! `ok`, `return`, `break`, `continue`. Rust code inside the interpreter
//! represents the four non-`ok` codes as [`Signal`], propagated with `?`
//! the same way the teacher's control-flow errors (`BreakError`,
//! `ContinueError`, `ReturnError`) propagate through its execution stack.
//! `ok` is simply `ExecResult::Ok(_)` — there is no `Signal` variant for it.

use std::fmt;
use thiserror::Error;

/// A non-`ok` completion status escaping from a command or nested eval.
///
/// `Signal::Error` always carries the literal, user-visible message (it
/// must begin with `Error`, per spec §7); `Signal::Return` and the loop
/// signals carry no payload of their own because the interpreter's
/// `result` field already holds whatever string accompanies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Error(String),
    Return,
    Break,
    Continue,
}

impl Signal {
    /// The integer status code a script or an embedder observes.
    pub fn code(&self) -> i32 {
        match self {
            Signal::Error(_) => StatusCode::Error as i32,
            Signal::Return => StatusCode::Return as i32,
            Signal::Break => StatusCode::Break as i32,
            Signal::Continue => StatusCode::Continue as i32,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Error(msg) => write!(f, "{msg}"),
            Signal::Return => write!(f, "return"),
            Signal::Break => write!(f, "break"),
            Signal::Continue => write!(f, "continue"),
        }
    }
}

/// Fixed status integers, per spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StatusCode {
    Error = -1,
    Ok = 0,
    Return = 1,
    Break = 2,
    Continue = 3,
}

impl StatusCode {
    pub fn from_signal(signal: Option<&Signal>) -> Self {
        match signal {
            None => StatusCode::Ok,
            Some(s) => match s {
                Signal::Error(_) => StatusCode::Error,
                Signal::Return => StatusCode::Return,
                Signal::Break => StatusCode::Break,
                Signal::Continue => StatusCode::Continue,
            },
        }
    }
}

/// Outcome of evaluating a script fragment or dispatching a command.
///
/// `Ok(String)` is the `ok` result text; `Err(Signal)` is any of the other
/// four codes (the message, for `Signal::Error`, is also the result text).
pub type Outcome = Result<String, Signal>;

/// Internal failure causes, folded into [`Signal::Error`] before they cross
/// a module boundary visible to scripts. Never itself a script-visible
/// status — see SPEC_FULL.md §B.
#[derive(Debug, Clone, Error)]
pub enum PickleError {
    #[error("Error: unterminated brace")]
    UnterminatedBrace,
    #[error("Error: unterminated quote")]
    UnterminatedQuote,
    #[error("Error: unterminated command")]
    UnterminatedCommand,
    #[error("Error: unexpected close bracket")]
    StrayCloseBracket,
    #[error("Error: invalid escape sequence")]
    BadEscape,

    #[error("Error: no such variable \"{0}\"")]
    NoSuchVariable(String),
    #[error("Error: no such command \"{0}\"")]
    NoSuchCommand(String),
    #[error("Error: command \"{0}\" already exists")]
    CommandExists(String),
    #[error("Error: invalid level \"{0}\"")]
    InvalidLevel(String),
    #[error("Error: self-referential link rejected for \"{0}\"")]
    SelfLink(String),

    #[error("Error: wrong # args: should be \"{0}\"")]
    WrongArgs(String),
    #[error("Error: unknown option \"{0}\"")]
    UnknownOption(String),
    #[error("Error: unknown subcommand \"{0}\"")]
    UnknownSubcommand(String),

    #[error("Error: expected integer but got \"{0}\"")]
    BadInteger(String),
    #[error("Error: invalid base \"{0}\"")]
    BadBase(String),
    #[error("Error: division by zero")]
    DivideByZero,
    #[error("Error: negative exponent")]
    NegativeExponent,
    #[error("Error: invalid logarithm")]
    InvalidLogarithm,

    #[error("Error: recursion limit exceeded")]
    RecursionExceeded,
    #[error("Error: string size limit exceeded")]
    StringLimitExceeded,

    #[error("Error: out of memory")]
    OutOfMemory,

    #[error("Error: fatal interpreter failure")]
    Fatal,
}

impl From<PickleError> for Signal {
    fn from(e: PickleError) -> Self {
        Signal::Error(e.to_string())
    }
}
