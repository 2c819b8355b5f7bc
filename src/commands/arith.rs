//! Arithmetic and comparison built-ins (spec §4.5 "Arithmetic and
//! comparison"): integer-only, signed machine-word width. Floating point is
//! an explicit non-goal.

use crate::error::{PickleError, Signal};
use crate::interp::Interp;
use crate::commands::PrivateData;

type R = Result<String, Signal>;

fn wrong_args(usage: &str) -> Signal {
    PickleError::WrongArgs(usage.to_string()).into()
}

/// Strict decimal parse: rejects empty input, a lone sign, and trailing
/// garbage (spec §4.5 "Numeric conversion is strict when enabled").
fn parse_int(s: &str) -> Result<i64, Signal> {
    if s.is_empty() || s == "+" || s == "-" {
        return Err(PickleError::BadInteger(s.to_string()).into());
    }
    s.parse::<i64>().map_err(|_| PickleError::BadInteger(s.to_string()).into())
}

fn parse_all(argv: &[String]) -> Result<Vec<i64>, Signal> {
    argv.iter().map(|s| parse_int(s)).collect()
}

fn is_truthy_num(n: i64) -> bool {
    n != 0
}

pub fn register(interp: &mut Interp) {
    let table: &[(&str, crate::commands::Handler)] = &[
        ("+", cmd_add),
        ("-", cmd_sub),
        ("*", cmd_mul),
        ("/", cmd_div),
        ("%", cmd_mod),
        ("**", cmd_pow_fold),
        ("<<", cmd_shl),
        (">>", cmd_shr),
        ("&", cmd_band),
        ("|", cmd_bor),
        ("^", cmd_bxor),
        ("&&", cmd_and),
        ("||", cmd_or),
        ("==", cmd_eq),
        ("!=", cmd_ne),
        ("<", cmd_lt),
        ("<=", cmd_le),
        (">", cmd_gt),
        (">=", cmd_ge),
        ("min", cmd_min),
        ("max", cmd_max),
        ("pow", cmd_pow),
        ("log", cmd_log),
        ("!", cmd_not),
        ("~", cmd_invert),
        ("not", cmd_not),
        ("invert", cmd_invert),
        ("abs", cmd_abs),
        ("bool", cmd_bool),
        ("negate", cmd_negate),
    ];
    for (name, handler) in table {
        interp.register_command(name, *handler).expect("built-in name collision");
    }
}

fn fold(argv: &[String], usage: &str, init_ok: bool, f: impl Fn(i64, i64) -> Result<i64, Signal>) -> R {
    if argv.len() < 3 {
        return Err(wrong_args(usage));
    }
    let _ = init_ok;
    let nums = parse_all(&argv[1..])?;
    let mut acc = nums[0];
    for &n in &nums[1..] {
        acc = f(acc, n)?;
    }
    Ok(acc.to_string())
}

fn cmd_add(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "+ a b ?c ...?", true, |a, b| Ok(a.wrapping_add(b)))
}

fn cmd_sub(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "- a b ?c ...?", true, |a, b| Ok(a.wrapping_sub(b)))
}

fn cmd_mul(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "* a b ?c ...?", true, |a, b| Ok(a.wrapping_mul(b)))
}

fn cmd_div(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "/ a b ?c ...?", true, |a, b| {
        if b == 0 {
            Err(PickleError::DivideByZero.into())
        } else {
            Ok(a.wrapping_div(b))
        }
    })
}

fn cmd_mod(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "% a b ?c ...?", true, |a, b| {
        if b == 0 {
            Err(PickleError::DivideByZero.into())
        } else {
            Ok(a.wrapping_rem(b))
        }
    })
}

fn cmd_pow_fold(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "** a b ?c ...?", true, |a, b| {
        if b < 0 {
            return Err(PickleError::NegativeExponent.into());
        }
        Ok(a.checked_pow(b as u32).unwrap_or(0))
    })
}

fn cmd_shl(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "<< a b ?c ...?", true, |a, b| Ok(((a as u64).wrapping_shl(b as u32)) as i64))
}

fn cmd_shr(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, ">> a b ?c ...?", true, |a, b| Ok(((a as u64).wrapping_shr(b as u32)) as i64))
}

fn cmd_band(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "& a b ?c ...?", true, |a, b| Ok(a & b))
}

fn cmd_bor(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "| a b ?c ...?", true, |a, b| Ok(a | b))
}

fn cmd_bxor(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "^ a b ?c ...?", true, |a, b| Ok(a ^ b))
}

fn cmd_and(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "&& a b ?c ...?", true, |a, b| {
        Ok((is_truthy_num(a) && is_truthy_num(b)) as i64)
    })
}

fn cmd_or(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "|| a b ?c ...?", true, |a, b| {
        Ok((is_truthy_num(a) || is_truthy_num(b)) as i64)
    })
}

fn pairwise(argv: &[String], usage: &str, cmp: impl Fn(i64, i64) -> bool) -> R {
    if argv.len() < 3 {
        return Err(wrong_args(usage));
    }
    let nums = parse_all(&argv[1..])?;
    let ok = nums.windows(2).all(|w| cmp(w[0], w[1]));
    Ok(if ok { "1".to_string() } else { "0".to_string() })
}

fn cmd_eq(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    pairwise(argv, "== a b ?c ...?", |a, b| a == b)
}
fn cmd_ne(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    pairwise(argv, "!= a b ?c ...?", |a, b| a != b)
}
fn cmd_lt(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    pairwise(argv, "< a b ?c ...?", |a, b| a < b)
}
fn cmd_le(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    pairwise(argv, "<= a b ?c ...?", |a, b| a <= b)
}
fn cmd_gt(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    pairwise(argv, "> a b ?c ...?", |a, b| a > b)
}
fn cmd_ge(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    pairwise(argv, ">= a b ?c ...?", |a, b| a >= b)
}

fn cmd_min(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "min a b ?c ...?", true, |a, b| Ok(a.min(b)))
}
fn cmd_max(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    fold(argv, "max a b ?c ...?", true, |a, b| Ok(a.max(b)))
}

fn cmd_pow(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 3 {
        return Err(wrong_args("pow base exp"));
    }
    let base = parse_int(&argv[1])?;
    let exp = parse_int(&argv[2])?;
    if exp < 0 {
        return Err(PickleError::NegativeExponent.into());
    }
    Ok(base.checked_pow(exp as u32).unwrap_or(0).to_string())
}

fn cmd_log(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 3 {
        return Err(wrong_args("log x base"));
    }
    let x = parse_int(&argv[1])?;
    let base = parse_int(&argv[2])?;
    if x <= 0 || base < 2 {
        return Err(PickleError::InvalidLogarithm.into());
    }
    let mut n = x;
    let mut count = 0i64;
    while n >= base {
        n /= base;
        count += 1;
    }
    Ok(count.to_string())
}

fn unary(argv: &[String], usage: &str, f: impl Fn(i64) -> i64) -> R {
    if argv.len() != 2 {
        return Err(wrong_args(usage));
    }
    let n = parse_int(&argv[1])?;
    Ok(f(n).to_string())
}

fn cmd_not(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    unary(argv, "! x", |n| if is_truthy_num(n) { 0 } else { 1 })
}
fn cmd_invert(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    unary(argv, "~ x", |n| !n)
}
fn cmd_abs(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    unary(argv, "abs x", |n| n.wrapping_abs())
}
fn cmd_bool(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    unary(argv, "bool x", |n| is_truthy_num(n) as i64)
}
fn cmd_negate(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    unary(argv, "negate x", |n| n.wrapping_neg())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_multiply() {
        let mut i = Interp::new();
        assert_eq!(i.eval("+ 2 2").unwrap(), "4");
        assert_eq!(i.eval("* -2 9").unwrap(), "-18");
    }

    #[test]
    fn division_by_zero_errors() {
        let mut i = Interp::new();
        assert!(i.eval("/ 4 0").is_err());
    }

    #[test]
    fn fold_across_more_than_two_operands() {
        let mut i = Interp::new();
        assert_eq!(i.eval("+ 1 2 3 4").unwrap(), "10");
        assert_eq!(i.eval("min 5 2 9 1").unwrap(), "1");
    }

    #[test]
    fn comparisons_are_pairwise_and() {
        let mut i = Interp::new();
        assert_eq!(i.eval("< 1 2 3").unwrap(), "1");
        assert_eq!(i.eval("< 1 3 2").unwrap(), "0");
    }

    #[test]
    fn pow_rejects_negative_exponent() {
        let mut i = Interp::new();
        assert!(i.eval("pow 2 -1").is_err());
        assert_eq!(i.eval("pow 2 10").unwrap(), "1024");
    }

    #[test]
    fn log_integer_floor() {
        let mut i = Interp::new();
        assert_eq!(i.eval("log 100 10").unwrap(), "2");
        assert_eq!(i.eval("log 7 2").unwrap(), "2");
    }

    #[test]
    fn unary_operators() {
        let mut i = Interp::new();
        assert_eq!(i.eval("! 0").unwrap(), "1");
        assert_eq!(i.eval("! 5").unwrap(), "0");
        assert_eq!(i.eval("abs -7").unwrap(), "7");
        assert_eq!(i.eval("negate 7").unwrap(), "-7");
    }

    #[test]
    fn strict_numeric_conversion_rejects_garbage() {
        let mut i = Interp::new();
        assert!(i.eval("+ 1 abc").is_err());
        assert!(i.eval("+ 1 -").is_err());
    }
}
