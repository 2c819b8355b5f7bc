//! The evaluator (spec §4.2): drives the scanner, performs substitutions,
//! assembles argument vectors, and dispatches commands. Owns recursion
//! limits, the trace hook, and the `unknown` fallback.

use crate::alloc::{Allocator, SystemAllocator};
use crate::commands::{self, CommandTable, Handler, PrivateData};
use crate::error::{PickleError, Signal};
use crate::parser::{self, ParserOptions, Scanner, Token, TokenKind};
use crate::value::PString;
use crate::vars::FrameStack;

/// The two independent recursion caps spec §4.2 requires, plus the
/// optional per-string cap spec §9 and the Open Question on `info system
/// length` refer to.
#[derive(Debug, Clone, Copy)]
pub struct EvalLimits {
    /// Cap on `evals`: evaluator re-entrancy (nested `[...]`, `eval`,
    /// `subst`, `uplevel`).
    pub max_eval_depth: usize,
    /// Cap on `level`: call-frame depth (`proc`/`apply` entry).
    pub max_proc_depth: usize,
    /// Per-string length cap. `None` means unlimited — reported to
    /// scripts as `-1` by `info system length` (spec §9 Open Question:
    /// resolved here as "unlimited", not "unknown").
    pub max_string_len: Option<usize>,
}

impl Default for EvalLimits {
    fn default() -> Self {
        EvalLimits { max_eval_depth: 512, max_proc_depth: 512, max_string_len: None }
    }
}

/// The interpreter (spec §3 "Interpreter state").
pub struct Interp {
    allocator: Box<dyn Allocator>,
    result: PString,
    commands: CommandTable,
    frames: FrameStack,
    /// The frame `set`/`unset`/`upvar` and friends act on; equal to
    /// `frames.top_index()` except while an `uplevel` call has retargeted
    /// it (spec §4.3).
    active_frame: usize,
    level: usize,
    evals: usize,
    cmdcount: u64,
    trace_enabled: bool,
    trace_active: bool,
    unknown_active: bool,
    fatal: bool,
    pub limits: EvalLimits,
}

impl Interp {
    /// `new(allocator, arena)`: registers all core commands, initializes an
    /// empty top frame.
    pub fn new() -> Self {
        Interp::with_allocator(Box::new(SystemAllocator))
    }

    pub fn with_allocator(allocator: Box<dyn Allocator>) -> Self {
        let mut interp = Interp {
            allocator,
            result: PString::empty(),
            commands: CommandTable::new(),
            frames: FrameStack::new(),
            active_frame: 0,
            level: 0,
            evals: 0,
            cmdcount: 0,
            trace_enabled: false,
            trace_active: false,
            unknown_active: false,
            fatal: false,
            limits: EvalLimits::default(),
        };
        commands::control::register(&mut interp);
        commands::arith::register(&mut interp);
        commands::string_cmds::register(&mut interp);
        commands::list_cmds::register(&mut interp);
        commands::info::register(&mut interp);
        commands::regex_engine::register(&mut interp);
        interp
    }

    pub fn allocator(&self) -> &dyn Allocator {
        self.allocator.as_ref()
    }

    // ---- result-get / result-set (spec §6) ----

    pub fn result(&self) -> &str {
        self.result.as_str()
    }

    pub fn set_result(&mut self, s: impl Into<PString>) {
        self.result = s.into();
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn mark_fatal(&mut self) {
        self.fatal = true;
    }

    // ---- command-register / command-rename (spec §6, §4.4) ----

    pub fn register_command(&mut self, name: &str, handler: Handler) -> Result<(), PickleError> {
        self.commands.register(name, handler, None)
    }

    pub fn register_command_with(
        &mut self,
        name: &str,
        handler: Handler,
        private: PrivateData,
    ) -> Result<(), PickleError> {
        self.commands.register(name, handler, Some(private))
    }

    pub fn force_register_command(&mut self, name: &str, handler: Handler, private: Option<PrivateData>) {
        self.commands.force_register(name, handler, private);
    }

    pub fn rename_command(&mut self, old: &str, new: &str) -> Result<(), PickleError> {
        self.commands.rename(old, new)
    }

    pub fn unset_command(&mut self, name: &str) -> bool {
        self.commands.unset(name)
    }

    pub fn command_exists(&self, name: &str) -> bool {
        self.commands.exists(name)
    }

    pub fn command_names(&self) -> Vec<String> {
        self.commands.names()
    }

    pub fn command_private(&self, name: &str) -> Option<&PrivateData> {
        self.commands.lookup(name).and_then(|(_, p)| p)
    }

    pub fn command_count(&self) -> u64 {
        self.cmdcount
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.trace_enabled = enabled;
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    // ---- variables (spec §6 var-set/var-get, §4.3) ----

    pub fn current_frame(&self) -> usize {
        self.active_frame
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.depth()
    }

    pub fn var_get(&self, name: &str) -> Option<&str> {
        self.frames.get(self.active_frame, name)
    }

    pub fn var_set(&mut self, name: &str, value: impl Into<PString>) {
        self.frames.set(self.active_frame, name, value.into());
    }

    pub fn var_exists(&self, name: &str) -> bool {
        self.frames.exists(self.active_frame, name)
    }

    pub fn var_unset(&mut self, name: &str) -> bool {
        self.frames.unset(self.active_frame, name)
    }

    pub fn var_names(&self) -> Vec<String> {
        self.frames.names(self.active_frame)
    }

    pub fn var_names_global(&self) -> Vec<String> {
        self.frames.names(0)
    }

    pub fn resolve_level(&self, spec: &str) -> Result<usize, PickleError> {
        self.frames.resolve_level(self.active_frame, spec)
    }

    pub fn link_var(
        &mut self,
        local_name: &str,
        target_level_idx: usize,
        target_name: &str,
    ) -> Result<(), PickleError> {
        self.frames.link(self.active_frame, local_name, target_level_idx, target_name)
    }

    /// `uplevel`: evaluate `script` with `active_frame` retargeted to
    /// `frame_idx` for the duration of the call, restoring it afterward on
    /// every exit path.
    pub fn with_active_frame<T>(
        &mut self,
        frame_idx: usize,
        f: impl FnOnce(&mut Interp) -> T,
    ) -> T {
        let saved = self.active_frame;
        self.active_frame = frame_idx;
        let result = f(self);
        self.active_frame = saved;
        result
    }

    // ---- call-frame push/pop for proc entry / apply (spec §4.4, §5) ----

    pub fn level(&self) -> usize {
        self.level
    }

    /// Push a new call frame and bump `level`, running `f` with it active,
    /// then popping the frame and restoring `level` on every exit path
    /// (spec §5 "Scoped acquisition").
    pub fn with_new_frame(
        &mut self,
        f: impl FnOnce(&mut Interp) -> Result<String, Signal>,
    ) -> Result<String, Signal> {
        if self.level >= self.limits.max_proc_depth {
            return Err(PickleError::RecursionExceeded.into());
        }
        self.level += 1;
        self.frames.push();
        let saved_active = self.active_frame;
        self.active_frame = self.frames.top_index();
        let result = f(self);
        self.frames.pop();
        self.active_frame = saved_active;
        self.level -= 1;
        result
    }

    // ---- evaluator entry points (spec §4.2, §6) ----

    /// `eval(interp, text)`.
    pub fn eval(&mut self, script: &str) -> Result<String, Signal> {
        if self.fatal {
            return Err(PickleError::Fatal.into());
        }
        self.eval_script(script)
    }

    /// `eval-args(interp, argv)`: evaluate a pre-parsed argument vector
    /// directly, skipping the scanner entirely.
    pub fn eval_args(&mut self, argv: &[String]) -> Result<String, Signal> {
        if self.fatal {
            return Err(PickleError::Fatal.into());
        }
        if argv.is_empty() {
            return Ok(String::new());
        }
        self.dispatch(argv.to_vec())
    }

    /// The full substitution-and-dispatch pipeline, used by `eval`, nested
    /// `[...]` commands, loop/conditional bodies, and `uplevel`.
    pub fn eval_script(&mut self, script: &str) -> Result<String, Signal> {
        self.enter_eval()?;
        let out = self.run_script(script, ParserOptions::EVAL);
        self.exit_eval();
        out
    }

    /// `subst`: the same token pipeline, but it never dispatches — it
    /// substitutes variables/commands/escapes in place (per the supplied
    /// toggles) and returns the resulting text, preserving the literal
    /// separators between tokens instead of assembling an argv.
    pub fn subst(&mut self, script: &str, options: ParserOptions) -> Result<String, Signal> {
        self.enter_eval()?;
        let out = self.run_subst(script, options);
        self.exit_eval();
        out
    }

    fn enter_eval(&mut self) -> Result<(), Signal> {
        self.evals += 1;
        if self.evals > self.limits.max_eval_depth {
            self.evals -= 1;
            return Err(PickleError::RecursionExceeded.into());
        }
        Ok(())
    }

    fn exit_eval(&mut self) {
        self.evals -= 1;
    }

    fn run_script(&mut self, script: &str, options: ParserOptions) -> Result<String, Signal> {
        let mut scanner = Scanner::with_options(script, options);
        let mut args: Vec<String> = Vec::new();
        let mut at_boundary = true;
        let mut last_result = String::new();
        loop {
            let tok = scanner.next_token().map_err(Signal::from)?;
            match tok.kind {
                TokenKind::End => {
                    if !args.is_empty() {
                        last_result = self.dispatch(std::mem::take(&mut args))?;
                    }
                    return Ok(last_result);
                }
                TokenKind::Separator => {
                    at_boundary = true;
                }
                TokenKind::Eol => {
                    if !args.is_empty() {
                        last_result = self.dispatch(std::mem::take(&mut args))?;
                    }
                    at_boundary = true;
                }
                TokenKind::Word | TokenKind::VarRef | TokenKind::Command | TokenKind::EscapeWord => {
                    let piece = self.substitute(&scanner, &tok, &options)?;
                    if at_boundary || args.is_empty() {
                        args.push(piece);
                    } else {
                        args.last_mut().unwrap().push_str(&piece);
                    }
                    at_boundary = false;
                }
            }
        }
    }

    fn run_subst(&mut self, script: &str, options: ParserOptions) -> Result<String, Signal> {
        let mut scanner = Scanner::with_options(script, options);
        let mut out = String::new();
        loop {
            let tok = scanner.next_token().map_err(Signal::from)?;
            match tok.kind {
                TokenKind::End => return Ok(out),
                TokenKind::Separator | TokenKind::Eol => out.push_str(scanner.text(&tok)),
                TokenKind::Word => out.push_str(scanner.text(&tok)),
                TokenKind::VarRef | TokenKind::Command | TokenKind::EscapeWord => {
                    out.push_str(&self.substitute(&scanner, &tok, &options)?);
                }
            }
        }
    }

    /// Step 1–3 of the evaluator algorithm (spec §4.2): substitute a single
    /// token into its replacement text.
    fn substitute(
        &mut self,
        scanner: &Scanner,
        tok: &Token,
        options: &ParserOptions,
    ) -> Result<String, Signal> {
        match tok.kind {
            TokenKind::Word => Ok(scanner.text(tok).to_string()),
            TokenKind::VarRef => {
                let name = scanner.text(tok);
                match self.var_get(name) {
                    Some(v) => Ok(v.to_string()),
                    None => Err(PickleError::NoSuchVariable(name.to_string()).into()),
                }
            }
            TokenKind::Command => {
                let inner = scanner.text(tok);
                match self.eval_script(inner) {
                    Ok(s) => Ok(s),
                    // Return/Break/Continue escaping a nested command have no
                    // legitimate consumer here; surface as an error (spec §4.2
                    // "Failure semantics").
                    Err(Signal::Error(m)) => Err(Signal::Error(m)),
                    Err(other) => Err(Signal::Error(format!(
                        "Error: unexpected {} from nested command",
                        other
                    ))),
                }
            }
            TokenKind::EscapeWord => {
                let raw = scanner.text(tok);
                if options.no_escape {
                    Ok(raw.to_string())
                } else {
                    parser::unescape(raw).map_err(|e| e.into())
                }
            }
            TokenKind::Separator | TokenKind::Eol | TokenKind::End => unreachable!(),
        }
    }

    // ---- dispatch (spec §4.2 "Dispatch", §4.4 trace/unknown) ----

    pub fn dispatch(&mut self, argv: Vec<String>) -> Result<String, Signal> {
        if argv.is_empty() {
            return Ok(String::new());
        }
        self.cmdcount += 1;

        if self.trace_enabled && !self.trace_active {
            if let Some((handler, private)) = self.commands.lookup("tracer") {
                let private = private.cloned();
                self.trace_active = true;
                let trace_result = handler(self, &argv, private.as_ref());
                self.trace_active = false;
                if let Err(e) = trace_result {
                    self.trace_enabled = false;
                    return Err(e);
                }
            }
        }

        let name = argv[0].clone();
        match self.commands.lookup(&name) {
            Some((handler, private)) => {
                let private = private.cloned();
                let out = handler(self, &argv, private.as_ref());
                if let Ok(ref s) = out {
                    self.set_result(s.as_str());
                } else if let Err(Signal::Error(ref msg)) = out {
                    self.set_result(msg.as_str());
                }
                out
            }
            None => self.dispatch_unknown(&name, argv),
        }
    }

    fn dispatch_unknown(&mut self, name: &str, argv: Vec<String>) -> Result<String, Signal> {
        if self.unknown_active {
            return Err(PickleError::NoSuchCommand(name.to_string()).into());
        }
        match self.commands.lookup("unknown") {
            Some((handler, private)) => {
                let private = private.cloned();
                let mut full = Vec::with_capacity(argv.len() + 1);
                full.push("unknown".to_string());
                full.extend(argv);
                self.unknown_active = true;
                let out = handler(self, &full, private.as_ref());
                self.unknown_active = false;
                out
            }
            None => Err(PickleError::NoSuchCommand(name.to_string()).into()),
        }
    }
}

impl Default for Interp {
    fn default() -> Self {
        Interp::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_script_is_ok_empty() {
        let mut i = Interp::new();
        let r = i.eval("").unwrap();
        assert_eq!(r, "");
    }

    #[test]
    fn set_and_get_roundtrip() {
        let mut i = Interp::new();
        i.eval("set x hello").unwrap();
        assert_eq!(i.var_get("x"), Some("hello"));
    }

    #[test]
    fn arithmetic_and_nested_command() {
        let mut i = Interp::new();
        let r = i.eval("+ 2 2").unwrap();
        assert_eq!(r, "4");
        let r = i.eval("set y [+ 1 [+ 1 1]]; set y").unwrap();
        assert_eq!(r, "3");
    }

    #[test]
    fn missing_variable_is_error() {
        let mut i = Interp::new();
        let r = i.eval("set z $nope");
        assert!(matches!(r, Err(Signal::Error(_))));
    }

    #[test]
    fn unknown_command_without_fallback_errors() {
        let mut i = Interp::new();
        let r = i.eval("totally-not-a-command");
        assert!(matches!(r, Err(Signal::Error(_))));
    }
}
