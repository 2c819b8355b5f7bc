//! End-to-end scenarios (spec §8 "End-to-end scenarios" and "Boundary
//! behaviours"), driven entirely through the public embedding API.

use pickle::error::Signal;
use pickle::Interp;

#[test]
fn empty_script_is_ok_with_empty_result() {
    let mut i = Interp::new();
    assert_eq!(i.eval("").unwrap(), "");
}

#[test]
fn arithmetic_seeds() {
    let mut i = Interp::new();
    assert_eq!(i.eval("+ 2 2").unwrap(), "4");
    assert_eq!(i.eval("* -2 9").unwrap(), "-18");
}

#[test]
fn join_seed() {
    let mut i = Interp::new();
    assert_eq!(i.eval("join {a b c} ,").unwrap(), "a,b,c");
}

#[test]
fn return_with_explicit_error_code_seed() {
    let mut i = Interp::new();
    let r = i.eval("return fail -1");
    assert_eq!(r, Err(Signal::Error("fail".to_string())));
}

#[test]
fn proc_call_seed() {
    let mut i = Interp::new();
    i.eval("proc sq {x} {* $x $x}").unwrap();
    assert_eq!(i.eval("sq 5").unwrap(), "25");
}

#[test]
fn while_loop_seed() {
    let mut i = Interp::new();
    i.eval("set z 3; while {< $z 10} {set z [+ $z 1]}").unwrap();
    assert_eq!(i.eval("set z").unwrap(), "10");
}

#[test]
fn variadic_args_accumulate() {
    let mut i = Interp::new();
    i.eval(
        "proc acc {args} {set s 0; set rest $args; while {!= $rest {}} {set s [+ $s [lindex $rest 0]]; set rest [lrange $rest 1 end]}; set s}",
    )
    .unwrap();
    assert_eq!(i.eval("acc 1 2 3 4").unwrap(), "10");
}

#[test]
fn upvar_aliases_outer_scope() {
    let mut i = Interp::new();
    i.eval("set a outer_value").unwrap();
    i.eval("proc bump {} {upvar 1 a b; set b 7}").unwrap();
    i.eval("bump").unwrap();
    assert_eq!(i.var_get("a"), Some("7"));
}

#[test]
fn catch_unknown_command_records_error_code() {
    let mut i = Interp::new();
    let r = i.eval("catch {unknown-cmd-xyz} err").unwrap();
    let _ = r;
    assert_eq!(i.var_get("err"), Some("-1"));
}

#[test]
fn string_match_glob_seed() {
    let mut i = Interp::new();
    assert_eq!(i.eval("string match a*b aaab").unwrap(), "1");
}

#[test]
fn reg_seed_returns_start_end_pair() {
    let mut i = Interp::new();
    assert_eq!(i.eval("reg {^a(b|c)?d$} abd").unwrap(), "0 2");
}

#[test]
fn deeply_nested_commands_beyond_cap_error_with_recursion_message() {
    let mut i = Interp::new();
    i.limits.max_eval_depth = 8;
    let nested = "[".repeat(20) + "+ 1 1" + &"]".repeat(20);
    let script = format!("set x {nested}");
    let r = i.eval(&script);
    match r {
        Err(Signal::Error(msg)) => assert!(msg.to_lowercase().contains("recursion")),
        other => panic!("expected recursion error, got {other:?}"),
    }
}

#[test]
fn string_index_boundary_behaviours() {
    let mut i = Interp::new();
    assert_eq!(i.eval("string index hello -1").unwrap(), "h");
    assert_eq!(i.eval("string index hello 99").unwrap(), "o");
    assert_eq!(i.eval("string index {} 0").unwrap(), "");
}

#[test]
fn string_range_out_of_order_is_empty() {
    let mut i = Interp::new();
    assert_eq!(i.eval("string range hello 3 1").unwrap(), "");
}

#[test]
fn lindex_out_of_range_is_empty() {
    let mut i = Interp::new();
    assert_eq!(i.eval("lindex {a b c} 10").unwrap(), "");
}

#[test]
fn while_zero_runs_zero_times() {
    let mut i = Interp::new();
    let r = i.eval("while 0 {error_would_trigger_if_run}");
    assert_eq!(r, Ok(String::new()));
}

#[test]
fn catch_break_reports_status_code() {
    let mut i = Interp::new();
    i.eval("catch {break} code").unwrap();
    assert_eq!(i.var_get("code"), Some("2"));
}

#[test]
fn rename_round_trip_is_identity() {
    let mut i = Interp::new();
    i.eval("proc greet {} {return hi}").unwrap();
    i.eval("rename greet hello_cmd").unwrap();
    assert_eq!(i.eval("hello_cmd").unwrap(), "hi");
    i.eval("rename hello_cmd greet").unwrap();
    assert_eq!(i.eval("greet").unwrap(), "hi");
}

#[test]
fn list_round_trip_for_arbitrary_elements() {
    let mut i = Interp::new();
    i.eval("set l [list {has space} plain {} {with{brace}}]").unwrap();
    assert_eq!(i.eval("lindex $l 0").unwrap(), "has space");
    assert_eq!(i.eval("lindex $l 1").unwrap(), "plain");
    assert_eq!(i.eval("lindex $l 2").unwrap(), "");
    assert_eq!(i.eval("llength $l").unwrap(), "4");
}

#[test]
fn string_idempotence_properties() {
    let mut i = Interp::new();
    let once = i.eval("string tolower MiXeD").unwrap();
    let cmd = format!("string tolower {once}");
    assert_eq!(i.eval(&cmd).unwrap(), once);

    let rev_once = i.eval("string reverse abcdef").unwrap();
    let rev_cmd = format!("string reverse {rev_once}");
    assert_eq!(i.eval(&rev_cmd).unwrap(), "abcdef");
}

#[test]
fn integer_comparison_is_transitive() {
    let mut i = Interp::new();
    for (a, b, c) in [(1, 2, 3), (-5, 0, 5), (10, 11, 100)] {
        let lt_ab = i.eval(&format!("< {a} {b}")).unwrap();
        let lt_bc = i.eval(&format!("< {b} {c}")).unwrap();
        let lt_ac = i.eval(&format!("< {a} {c}")).unwrap();
        if lt_ab == "1" && lt_bc == "1" {
            assert_eq!(lt_ac, "1");
        }
    }
}

#[test]
fn info_commands_contains_every_registered_builtin() {
    let mut i = Interp::new();
    for name in ["set", "if", "while", "proc", "string", "reg", "lsort", "info"] {
        assert!(i.command_exists(name), "missing builtin {name}");
    }
    let listing = i.eval("info commands").unwrap();
    assert!(listing.split(' ').any(|c| c == "proc"));
}

#[test]
fn frame_depth_returns_to_zero_after_proc_calls() {
    let mut i = Interp::new();
    i.eval("proc noop {} {return ok}").unwrap();
    i.eval("noop").unwrap();
    assert_eq!(i.level(), 0);
}

#[test]
fn apply_lambda_with_variadic_args() {
    let mut i = Interp::new();
    let r = i.eval("apply {{a args} {concat $a $args}} 1 2 3").unwrap();
    assert_eq!(r, "1 2 3");
}

#[test]
fn tr_squeeze_collapses_runs() {
    let mut i = Interp::new();
    assert_eq!(i.eval("string tr s l hello").unwrap(), "helo");
}

#[test]
fn quoted_word_substitutes_variable() {
    let mut i = Interp::new();
    i.eval("set x 5").unwrap();
    assert_eq!(i.eval("set y \"val $x\"").unwrap(), "val 5");
}

#[test]
fn quoted_word_substitutes_nested_command() {
    let mut i = Interp::new();
    assert_eq!(i.eval("set y \"[+ 1 1]\"").unwrap(), "2");
}

#[test]
fn quoted_word_mixes_literal_variable_and_command() {
    let mut i = Interp::new();
    i.eval("set a 2").unwrap();
    assert_eq!(i.eval("set y \"a=$a sum=[+ 1 2] end\"").unwrap(), "a=2 sum=3 end");
}
