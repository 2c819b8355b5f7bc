//! Control-flow built-ins (spec §4.5 "Control flow"): `set`, `if`, `while`,
//! `for`, `break`, `continue`, `catch`, `return`, `proc`, `rename`, `unset`,
//! `uplevel`, `upvar`, `eval`, `subst`, `apply`, and the `trace` toggle.

use crate::error::{PickleError, Signal};
use crate::interp::Interp;
use crate::parser::{self, ParserOptions};
use crate::commands::PrivateData;

type R = Result<String, Signal>;

/// Truthiness (spec §4.5 "Truthiness"): false iff case-insensitively `0`,
/// `false`, `off`, or `no`.
pub fn is_truthy(s: &str) -> bool {
    !matches!(s.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no")
}

fn wrong_args(usage: &str) -> Signal {
    PickleError::WrongArgs(usage.to_string()).into()
}

pub fn register(interp: &mut Interp) {
    let table: &[(&str, crate::commands::Handler)] = &[
        ("set", cmd_set),
        ("if", cmd_if),
        ("while", cmd_while),
        ("for", cmd_for),
        ("break", cmd_break),
        ("continue", cmd_continue),
        ("catch", cmd_catch),
        ("return", cmd_return),
        ("proc", cmd_proc),
        ("rename", cmd_rename),
        ("unset", cmd_unset),
        ("uplevel", cmd_uplevel),
        ("upvar", cmd_upvar),
        ("eval", cmd_eval),
        ("subst", cmd_subst),
        ("apply", cmd_apply),
        ("trace", cmd_trace),
    ];
    for (name, handler) in table {
        interp.register_command(name, *handler).expect("built-in name collision");
    }
}

fn cmd_set(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    match argv.len() {
        2 => interp
            .var_get(&argv[1])
            .map(|s| s.to_string())
            .ok_or_else(|| PickleError::NoSuchVariable(argv[1].clone()).into()),
        3 => {
            interp.var_set(&argv[1], argv[2].as_str());
            Ok(argv[2].clone())
        }
        _ => Err(wrong_args("set name ?value?")),
    }
}

fn cmd_if(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    let args = &argv[1..];
    let mut i = 0usize;
    loop {
        if i + 1 >= args.len() {
            return Err(wrong_args("if expr body ?elseif expr body ...? ?else body?"));
        }
        let cond = &args[i];
        let body = &args[i + 1];
        i += 2;
        let cond_result = interp.eval_script(cond)?;
        if is_truthy(&cond_result) {
            return interp.eval_script(body);
        }
        if i >= args.len() {
            return Ok(String::new());
        }
        match args[i].as_str() {
            "elseif" => {
                i += 1;
                continue;
            }
            "else" => {
                i += 1;
                if i >= args.len() {
                    return Err(wrong_args("if expr body ?elseif expr body ...? ?else body?"));
                }
                return interp.eval_script(&args[i]);
            }
            _ => return Err(wrong_args("if expr body ?elseif expr body ...? ?else body?")),
        }
    }
}

fn cmd_while(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 3 {
        return Err(wrong_args("while cond body"));
    }
    let (cond, body) = (&argv[1], &argv[2]);
    loop {
        let c = interp.eval_script(cond)?;
        if !is_truthy(&c) {
            return Ok(String::new());
        }
        match interp.eval_script(body) {
            Ok(_) => {}
            Err(Signal::Break) => return Ok(String::new()),
            Err(Signal::Continue) => {}
            Err(e) => return Err(e),
        }
    }
}

fn cmd_for(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 5 {
        return Err(wrong_args("for init cond step body"));
    }
    let (init, cond, step, body) = (&argv[1], &argv[2], &argv[3], &argv[4]);
    interp.eval_script(init)?;
    loop {
        let c = interp.eval_script(cond)?;
        if !is_truthy(&c) {
            return Ok(String::new());
        }
        match interp.eval_script(body) {
            Ok(_) => {}
            Err(Signal::Break) => return Ok(String::new()),
            Err(Signal::Continue) => {}
            Err(e) => return Err(e),
        }
        interp.eval_script(step)?;
    }
}

fn cmd_break(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 1 {
        return Err(wrong_args("break"));
    }
    Err(Signal::Break)
}

fn cmd_continue(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 1 {
        return Err(wrong_args("continue"));
    }
    Err(Signal::Continue)
}

fn cmd_catch(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 2 || argv.len() > 3 {
        return Err(wrong_args("catch script ?varname?"));
    }
    let outcome = interp.eval_script(&argv[1]);
    let (code, msg) = match outcome {
        Ok(s) => (0i32, s),
        Err(ref sig) => (sig.code(), interp.result().to_string()),
    };
    if let Some(varname) = argv.get(2) {
        interp.var_set(varname, code.to_string());
    }
    Ok(msg)
}

fn cmd_return(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() > 3 {
        return Err(wrong_args("return ?string? ?code?"));
    }
    let value = argv.get(1).cloned().unwrap_or_default();
    let code = match argv.get(2) {
        None => None,
        Some(s) => Some(
            s.parse::<i32>()
                .map_err(|_| Signal::from(PickleError::BadInteger(s.clone())))?,
        ),
    };
    match code {
        None => {
            interp.set_result(value.as_str());
            Err(Signal::Return)
        }
        Some(0) => Ok(value),
        Some(1) => {
            interp.set_result(value.as_str());
            Err(Signal::Return)
        }
        Some(2) => {
            interp.set_result(value.as_str());
            Err(Signal::Break)
        }
        Some(3) => {
            interp.set_result(value.as_str());
            Err(Signal::Continue)
        }
        Some(-1) => Err(Signal::Error(value)),
        Some(_) => Err(wrong_args("return ?string? ?code?")),
    }
}

fn cmd_proc(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 4 {
        return Err(wrong_args("proc name args body"));
    }
    let name = argv[1].clone();
    let params: Vec<String> = argv[2].split_whitespace().map(String::from).collect();
    let body = argv[3].clone();
    interp.force_register_command(&name, proc_call_handler, Some(PrivateData::Proc { params, body }));
    Ok(String::new())
}

/// The shared proc-call handler (spec §4.4 "User procedure call
/// protocol"): binds formals (with a trailing `args` making the procedure
/// variadic), pushes one call frame, evaluates the body, and pops the
/// frame on every exit path.
pub fn proc_call_handler(interp: &mut Interp, argv: &[String], private: Option<&PrivateData>) -> R {
    let (params, body) = match private {
        Some(PrivateData::Proc { params, body }) => (params.clone(), body.clone()),
        None => return Err(Signal::Error("Error: corrupt procedure entry".to_string())),
    };
    let actuals = &argv[1..];
    let variadic = params.last().map(|p| p == "args").unwrap_or(false);
    let required = if variadic { params.len() - 1 } else { params.len() };
    let arity_ok = if variadic { actuals.len() >= required } else { actuals.len() == required };
    if !arity_ok {
        return Err(PickleError::WrongArgs(format!("{} {}", argv[0], params.join(" "))).into());
    }
    interp.with_new_frame(|interp| {
        for (p, a) in params.iter().take(required).zip(actuals.iter()) {
            interp.var_set(p, a.as_str());
        }
        if variadic {
            let rest = actuals[required..].join(" ");
            interp.var_set("args", rest);
        }
        match interp.eval_script(&body) {
            Ok(s) => Ok(s),
            Err(Signal::Return) => Ok(interp.result().to_string()),
            Err(Signal::Break) | Err(Signal::Continue) => {
                Err(Signal::Error("Error: break/continue outside of loop".to_string()))
            }
            Err(e @ Signal::Error(_)) => Err(e),
        }
    })
}

fn cmd_rename(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 3 {
        return Err(wrong_args("rename old new"));
    }
    interp.rename_command(&argv[1], &argv[2])?;
    Ok(String::new())
}

fn cmd_unset(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 2 {
        return Err(wrong_args("unset name ?name ...?"));
    }
    for name in &argv[1..] {
        if !interp.var_unset(name) {
            return Err(PickleError::NoSuchVariable(name.clone()).into());
        }
    }
    Ok(String::new())
}

fn is_level_spec(s: &str) -> bool {
    s.starts_with('#') || s.parse::<i64>().is_ok()
}

fn cmd_uplevel(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    let args = &argv[1..];
    if args.is_empty() {
        return Err(wrong_args("uplevel ?level? script ?script ...?"));
    }
    let (level_spec, script_parts): (&str, &[String]) = if is_level_spec(&args[0]) && args.len() > 1 {
        (&args[0], &args[1..])
    } else {
        ("1", args)
    };
    let target_idx = interp.resolve_level(level_spec)?;
    let script = script_parts.join(" ");
    interp.with_active_frame(target_idx, |interp| interp.eval_script(&script))
}

fn cmd_upvar(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 4 {
        return Err(wrong_args("upvar level other local"));
    }
    let target_idx = interp.resolve_level(&argv[1])?;
    interp.link_var(&argv[3], target_idx, &argv[2])?;
    Ok(String::new())
}

fn cmd_eval(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 2 {
        return Err(wrong_args("eval arg ?arg ...?"));
    }
    let script = argv[1..].join(" ");
    interp.eval_script(&script)
}

fn cmd_subst(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    let mut opts = ParserOptions { no_escape: false, no_variables: false, no_commands: false, no_eval: true };
    let mut i = 1;
    while i < argv.len().saturating_sub(1) {
        match argv[i].as_str() {
            "-nobackslashes" => opts.no_escape = true,
            "-novariables" => opts.no_variables = true,
            "-nocommands" => opts.no_commands = true,
            other => return Err(PickleError::UnknownOption(other.to_string()).into()),
        }
        i += 1;
    }
    if argv.len() < 2 {
        return Err(wrong_args("subst ?-nobackslashes? ?-novariables? ?-nocommands? string"));
    }
    let string = &argv[argv.len() - 1];
    interp.subst(string, opts)
}

fn cmd_apply(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 2 {
        return Err(wrong_args("apply {args body} ?arg ...?"));
    }
    let lambda = parser::split_list(&argv[1])?;
    if lambda.len() != 2 {
        return Err(PickleError::WrongArgs("apply {args body} ?arg ...?".to_string()).into());
    }
    let params: Vec<String> = lambda[0].split_whitespace().map(String::from).collect();
    let body = lambda[1].clone();
    let actuals = &argv[2..];
    let variadic = params.last().map(|p| p == "args").unwrap_or(false);
    let required = if variadic { params.len() - 1 } else { params.len() };
    let arity_ok = if variadic { actuals.len() >= required } else { actuals.len() == required };
    if !arity_ok {
        return Err(PickleError::WrongArgs("apply {args body} ?arg ...?".to_string()).into());
    }
    interp.with_new_frame(|interp| {
        for (p, a) in params.iter().take(required).zip(actuals.iter()) {
            interp.var_set(p, a.as_str());
        }
        if variadic {
            let rest = actuals[required..].join(" ");
            interp.var_set("args", rest);
        }
        match interp.eval_script(&body) {
            Ok(s) => Ok(s),
            Err(Signal::Return) => Ok(interp.result().to_string()),
            Err(Signal::Break) | Err(Signal::Continue) => {
                Err(Signal::Error("Error: break/continue outside of loop".to_string()))
            }
            Err(e @ Signal::Error(_)) => Err(e),
        }
    })
}

fn cmd_trace(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    match argv.len() {
        1 => Ok(if interp.trace_enabled() { "1".to_string() } else { "0".to_string() }),
        2 => match argv[1].as_str() {
            "on" => {
                interp.set_trace(true);
                Ok("1".to_string())
            }
            "off" => {
                interp.set_trace(false);
                Ok("0".to_string())
            }
            _ => Err(PickleError::UnknownOption(argv[1].clone()).into()),
        },
        _ => Err(wrong_args("trace ?on|off?")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_spec() {
        assert!(!is_truthy("0"));
        assert!(!is_truthy("False"));
        assert!(!is_truthy("OFF"));
        assert!(!is_truthy("no"));
        assert!(is_truthy("1"));
        assert!(is_truthy("yes"));
        assert!(is_truthy(""));
    }

    #[test]
    fn while_zero_runs_zero_times() {
        let mut i = Interp::new();
        i.var_set("count", "0");
        let r = i.eval("while 0 {set count [+ $count 1]}").unwrap();
        assert_eq!(r, "");
        assert_eq!(i.var_get("count"), Some("0"));
    }

    #[test]
    fn catch_break_records_status_code() {
        let mut i = Interp::new();
        let r = i.eval("catch {break} err").unwrap();
        assert_eq!(r, "");
        assert_eq!(i.var_get("err"), Some("2"));
    }

    #[test]
    fn return_with_explicit_error_code() {
        let mut i = Interp::new();
        let r = i.eval("return fail -1");
        assert_eq!(r, Err(Signal::Error("fail".to_string())));
    }

    #[test]
    fn proc_arity_and_call() {
        let mut i = Interp::new();
        i.eval("proc sq {x} {* $x $x}").unwrap();
        let r = i.eval("sq 5").unwrap();
        assert_eq!(r, "25");
    }

    #[test]
    fn proc_variadic_args() {
        let mut i = Interp::new();
        i.eval(
            "proc sum_args {args} {set s 0; set rest $args; while {!= $rest {}} {set s [+ $s [lindex $rest 0]]; set rest [lrange $rest 1 end]}; set s}",
        )
        .unwrap();
        let r = i.eval("sum_args 1 2 3 4").unwrap();
        assert_eq!(r, "10");
    }

    #[test]
    fn upvar_aliases_outer_variable() {
        let mut i = Interp::new();
        i.eval("set a 1").unwrap();
        i.eval("proc bump {} {upvar 1 a b; set b 7}").unwrap();
        i.eval("bump").unwrap();
        assert_eq!(i.var_get("a"), Some("7"));
    }
}
