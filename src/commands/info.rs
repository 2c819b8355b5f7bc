//! `info` introspection subcommands (spec §4.5 "Introspection `info`").

use crate::commands::glob_match::glob_match;
use crate::commands::PrivateData;
use crate::error::{PickleError, Signal};
use crate::interp::Interp;
use crate::parser::Scanner;

type R = Result<String, Signal>;

fn wrong_args(usage: &str) -> Signal {
    PickleError::WrongArgs(usage.to_string()).into()
}

/// The arithmetic/comparison operator names (spec §4.5 "Arithmetic and
/// comparison"), reported by `info functions` — these are registered as
/// ordinary commands by [`crate::commands::arith`], but scripts expect to
/// be able to ask "which of my commands are math functions" separately
/// from "which are control flow or string/list operators".
const FUNCTIONS: &[&str] = &[
    "+", "-", "*", "/", "%", "**", "<<", ">>", "&", "|", "^", "&&", "||", "==", "!=", "<", "<=",
    ">", ">=", "min", "max", "pow", "log", "!", "~", "not", "invert", "abs", "bool", "negate",
];

pub fn register(interp: &mut Interp) {
    interp.register_command("info", cmd_info).expect("built-in name collision");
}

fn filter_by_pattern(names: Vec<String>, pattern: Option<&str>, max_steps: usize) -> Result<Vec<String>, Signal> {
    match pattern {
        None => Ok(names),
        Some(pat) => {
            let mut out = Vec::new();
            for n in names {
                if glob_match(pat, &n, false, max_steps)? {
                    out.push(n);
                }
            }
            Ok(out)
        }
    }
}

fn cmd_info(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 2 {
        return Err(wrong_args("info subcommand ?arg ...?"));
    }
    let max_steps = interp.limits.max_eval_depth.saturating_mul(256).max(crate::parser::MIN_RECURSION_CAP);
    match argv[1].as_str() {
        "commands" => {
            if argv.len() > 3 {
                return Err(wrong_args("info commands ?pattern?"));
            }
            let mut names = interp.command_names();
            names.sort();
            Ok(filter_by_pattern(names, argv.get(2).map(|s| s.as_str()), max_steps)?.join(" "))
        }
        "procs" => {
            if argv.len() > 3 {
                return Err(wrong_args("info procs ?pattern?"));
            }
            let mut names: Vec<String> = interp
                .command_names()
                .into_iter()
                .filter(|n| matches!(interp.command_private(n), Some(PrivateData::Proc { .. })))
                .collect();
            names.sort();
            Ok(filter_by_pattern(names, argv.get(2).map(|s| s.as_str()), max_steps)?.join(" "))
        }
        "functions" => {
            if argv.len() > 3 {
                return Err(wrong_args("info functions ?pattern?"));
            }
            let names: Vec<String> = FUNCTIONS.iter().map(|s| s.to_string()).collect();
            Ok(filter_by_pattern(names, argv.get(2).map(|s| s.as_str()), max_steps)?.join(" "))
        }
        "locals" => {
            if argv.len() > 3 {
                return Err(wrong_args("info locals ?pattern?"));
            }
            let mut names = interp.var_names();
            names.sort();
            Ok(filter_by_pattern(names, argv.get(2).map(|s| s.as_str()), max_steps)?.join(" "))
        }
        "globals" => {
            if argv.len() > 3 {
                return Err(wrong_args("info globals ?pattern?"));
            }
            let mut names = interp.var_names_global();
            names.sort();
            Ok(filter_by_pattern(names, argv.get(2).map(|s| s.as_str()), max_steps)?.join(" "))
        }
        "level" => {
            if argv.len() != 2 {
                return Err(wrong_args("info level"));
            }
            Ok(interp.level().to_string())
        }
        "cmdcount" => {
            if argv.len() != 2 {
                return Err(wrong_args("info cmdcount"));
            }
            Ok(interp.command_count().to_string())
        }
        "version" => {
            if argv.len() != 2 {
                return Err(wrong_args("info version"));
            }
            Ok(env!("CARGO_PKG_VERSION").to_string())
        }
        "complete" => {
            if argv.len() != 3 {
                return Err(wrong_args("info complete script"));
            }
            Ok(if is_complete(&argv[2]) { "1".to_string() } else { "0".to_string() })
        }
        "exists" => {
            if argv.len() != 3 {
                return Err(wrong_args("info exists name"));
            }
            Ok(if interp.var_exists(&argv[2]) { "1".to_string() } else { "0".to_string() })
        }
        "args" => {
            if argv.len() != 3 {
                return Err(wrong_args("info args name"));
            }
            match interp.command_private(&argv[2]) {
                Some(PrivateData::Proc { params, .. }) => Ok(params.join(" ")),
                None => Err(PickleError::NoSuchCommand(argv[2].clone()).into()),
            }
        }
        "body" => {
            if argv.len() != 3 {
                return Err(wrong_args("info body name"));
            }
            match interp.command_private(&argv[2]) {
                Some(PrivateData::Proc { body, .. }) => Ok(body.clone()),
                None => Err(PickleError::NoSuchCommand(argv[2].clone()).into()),
            }
        }
        "private" => {
            if argv.len() != 3 {
                return Err(wrong_args("info private name"));
            }
            if !interp.command_exists(&argv[2]) {
                return Err(PickleError::NoSuchCommand(argv[2].clone()).into());
            }
            match interp.command_private(&argv[2]) {
                Some(PrivateData::Proc { params, body }) => {
                    Ok(crate::parser::join_list(&[params.join(" "), body.clone()]))
                }
                None => Ok(String::new()),
            }
        }
        "system" => {
            if argv.len() != 3 {
                return Err(wrong_args("info system attr"));
            }
            sub_system(interp, &argv[2])
        }
        other => Err(PickleError::UnknownSubcommand(other.to_string()).into()),
    }
}

/// `info complete script`: does the script scan to completion without
/// leaving an unterminated brace/quote/nested command open? Any other
/// parse failure (e.g. a stray close bracket) still counts as "complete"
/// — the script finished scanning, it just isn't valid.
fn is_complete(script: &str) -> bool {
    let mut scanner = Scanner::new(script);
    loop {
        match scanner.next_token() {
            Ok(tok) if tok.kind == crate::parser::TokenKind::End => return true,
            Ok(_) => continue,
            Err(PickleError::UnterminatedBrace)
            | Err(PickleError::UnterminatedQuote)
            | Err(PickleError::UnterminatedCommand) => return false,
            Err(_) => return true,
        }
    }
}

/// `info system <attr>` (spec §4.5, §9 Open Question on `length`):
/// compile-time/runtime constants an embedder might want to branch on.
fn sub_system(interp: &mut Interp, attr: &str) -> R {
    match attr {
        "pointer-bits" => Ok((std::mem::size_of::<usize>() * 8).to_string()),
        "number-bits" => Ok((std::mem::size_of::<i64>() * 8).to_string()),
        "recursion-cap" => Ok(interp.limits.max_eval_depth.to_string()),
        "proc-recursion-cap" => Ok(interp.limits.max_proc_depth.to_string()),
        // `-1` means "unlimited" when the cap is disabled (spec §9 Open
        // Question, resolved in DESIGN.md), not "unknown".
        "max-string" => Ok(interp.limits.max_string_len.map(|n| n as i64).unwrap_or(-1).to_string()),
        "min-number" => Ok(i64::MIN.to_string()),
        "max-number" => Ok(i64::MAX.to_string()),
        "modules" => Ok("glob regex".to_string()),
        other => Err(PickleError::UnknownOption(other.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_includes_builtins() {
        let mut i = Interp::new();
        let out = i.eval("info commands").unwrap();
        assert!(out.split(' ').any(|c| c == "set"));
    }

    #[test]
    fn procs_lists_user_defined_only() {
        let mut i = Interp::new();
        i.eval("proc sq {x} {* $x $x}").unwrap();
        let out = i.eval("info procs").unwrap();
        assert_eq!(out, "sq");
    }

    #[test]
    fn exists_reports_variable_presence() {
        let mut i = Interp::new();
        assert_eq!(i.eval("info exists nope").unwrap(), "0");
        i.eval("set x 1").unwrap();
        assert_eq!(i.eval("info exists x").unwrap(), "1");
    }

    #[test]
    fn complete_flags_unterminated_brace() {
        let mut i = Interp::new();
        assert_eq!(i.eval("info complete {set x 1}").unwrap(), "1");
        assert_eq!(i.eval(r#"info complete "{set x 1""#).unwrap(), "0");
    }

    #[test]
    fn system_reports_unlimited_string_cap() {
        let mut i = Interp::new();
        assert_eq!(i.eval("info system max-string").unwrap(), "-1");
    }

    #[test]
    fn args_and_body_for_proc() {
        let mut i = Interp::new();
        i.eval("proc add {a b} {+ $a $b}").unwrap();
        assert_eq!(i.eval("info args add").unwrap(), "a b");
        assert_eq!(i.eval("info body add").unwrap(), "+ $a $b");
    }
}
