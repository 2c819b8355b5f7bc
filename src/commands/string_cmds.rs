//! `string` subcommands (spec §4.5 "String operators"). Pickle values are
//! plain byte strings (Unicode awareness is an explicit Non-goal), so every
//! operation here indexes by byte offset, not by character.

use crate::commands::glob_match::glob_match;
use crate::commands::PrivateData;
use crate::error::{PickleError, Signal};
use crate::interp::Interp;

type R = Result<String, Signal>;

fn wrong_args(usage: &str) -> Signal {
    PickleError::WrongArgs(usage.to_string()).into()
}

pub fn register(interp: &mut Interp) {
    interp.register_command("string", cmd_string).expect("built-in name collision");
}

/// Clamp a (possibly out-of-range or negative) index to the nearest valid
/// byte offset in a string of `len` bytes (spec §8: `-1` clamps to the
/// first byte, an index past the end clamps to the last byte). `len` must
/// be nonzero; callers special-case the empty string first.
fn clamp_index(i: i64, len: usize) -> usize {
    if i < 0 {
        0
    } else if (i as usize) >= len {
        len - 1
    } else {
        i as usize
    }
}

fn parse_idx(s: &str) -> Result<i64, Signal> {
    s.parse::<i64>().map_err(|_| PickleError::BadInteger(s.to_string()).into())
}

fn cmd_string(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    let usage = "string subcommand ?arg ...?";
    if argv.len() < 2 {
        return Err(wrong_args(usage));
    }
    let args = &argv[2..];
    match argv[1].as_str() {
        "length" => sub_length(args),
        "index" => sub_index(args),
        "range" => sub_range(args),
        "toupper" => sub_map(args, "string toupper s", |s| s.to_ascii_uppercase()),
        "tolower" => sub_map(args, "string tolower s", |s| s.to_ascii_lowercase()),
        "reverse" => sub_map(args, "string reverse s", |s| {
            let mut bytes = s.as_bytes().to_vec();
            bytes.reverse();
            bytes_to_string(bytes)
        }),
        "trim" => sub_trim(args, Trim::Both),
        "trimleft" => sub_trim(args, Trim::Left),
        "trimright" => sub_trim(args, Trim::Right),
        "repeat" => sub_repeat(args),
        "first" => sub_first(args),
        "last" => sub_last(args),
        "equal" => sub_equal(args),
        "unequal" => sub_unequal(args),
        "compare" => sub_compare(args, false),
        "compare-no-case" => sub_compare(args, true),
        "is" => sub_is(args),
        "match" => sub_match(interp, args),
        "tr" => sub_tr(args),
        "replace" => sub_replace(args),
        "hash" => sub_hash(args),
        "dec2hex" => sub_dec2hex(args),
        "hex2dec" => sub_hex2dec(args),
        "dec2base" => sub_dec2base(args),
        "base2dec" => sub_base2dec(args),
        "ordinal" => sub_ordinal(args),
        "char" => sub_char(args),
        other => Err(PickleError::UnknownSubcommand(other.to_string()).into()),
    }
}

fn bytes_to_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes.clone()).unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned())
}

fn sub_length(args: &[String]) -> R {
    if args.len() != 1 {
        return Err(wrong_args("string length s"));
    }
    Ok(args[0].len().to_string())
}

fn sub_index(args: &[String]) -> R {
    if args.len() != 2 {
        return Err(wrong_args("string index s i"));
    }
    let s = &args[0];
    if s.is_empty() {
        return Ok(String::new());
    }
    let idx = clamp_index(parse_idx(&args[1])?, s.len());
    Ok(bytes_to_string(vec![s.as_bytes()[idx]]))
}

fn sub_range(args: &[String]) -> R {
    if args.len() != 3 {
        return Err(wrong_args("string range s i j"));
    }
    let s = &args[0];
    if s.is_empty() {
        return Ok(String::new());
    }
    let len = s.len();
    let i = clamp_index(parse_idx(&args[1])?, len);
    let j = clamp_index(parse_idx(&args[2])?, len);
    if i > j {
        return Ok(String::new());
    }
    Ok(bytes_to_string(s.as_bytes()[i..=j].to_vec()))
}

fn sub_map(args: &[String], usage: &str, f: impl Fn(&str) -> String) -> R {
    if args.len() != 1 {
        return Err(wrong_args(usage));
    }
    Ok(f(&args[0]))
}

enum Trim {
    Left,
    Right,
    Both,
}

fn sub_trim(args: &[String], which: Trim) -> R {
    if args.is_empty() || args.len() > 2 {
        return Err(wrong_args("string trim s ?chars?"));
    }
    let s = &args[0];
    let pat: Vec<char> = match args.get(1) {
        Some(chars) => chars.chars().collect(),
        None => vec![' ', '\t', '\n', '\r', '\x0b', '\x0c'],
    };
    let is_trim = |c: char| pat.contains(&c);
    let out = match which {
        Trim::Left => s.trim_start_matches(is_trim).to_string(),
        Trim::Right => s.trim_end_matches(is_trim).to_string(),
        Trim::Both => s.trim_matches(is_trim).to_string(),
    };
    Ok(out)
}

fn sub_repeat(args: &[String]) -> R {
    if args.len() != 2 {
        return Err(wrong_args("string repeat s n"));
    }
    let n = parse_idx(&args[1])?;
    if n < 0 {
        return Err(PickleError::BadInteger(args[1].clone()).into());
    }
    Ok(args[0].repeat(n as usize))
}

fn sub_first(args: &[String]) -> R {
    if args.len() < 2 || args.len() > 3 {
        return Err(wrong_args("string first needle haystack ?start?"));
    }
    let needle = &args[0];
    let haystack = &args[1];
    let start = match args.get(2) {
        Some(s) => clamp_index(parse_idx(s)?, haystack.len().max(1)).min(haystack.len()),
        None => 0,
    };
    if start > haystack.len() {
        return Ok("-1".to_string());
    }
    match haystack[start..].find(needle.as_str()) {
        Some(pos) => Ok((pos + start).to_string()),
        None => Ok("-1".to_string()),
    }
}

fn sub_last(args: &[String]) -> R {
    if args.len() != 2 {
        return Err(wrong_args("string last needle haystack"));
    }
    match args[1].rfind(args[0].as_str()) {
        Some(pos) => Ok(pos.to_string()),
        None => Ok("-1".to_string()),
    }
}

fn sub_equal(args: &[String]) -> R {
    if args.len() != 2 {
        return Err(wrong_args("string equal a b"));
    }
    Ok(if args[0] == args[1] { "1".to_string() } else { "0".to_string() })
}

fn sub_unequal(args: &[String]) -> R {
    if args.len() != 2 {
        return Err(wrong_args("string unequal a b"));
    }
    Ok(if args[0] != args[1] { "1".to_string() } else { "0".to_string() })
}

fn sub_compare(args: &[String], nocase: bool) -> R {
    if args.len() != 2 {
        return Err(wrong_args(if nocase { "string compare-no-case a b" } else { "string compare a b" }));
    }
    let (a, b) = if nocase {
        (args[0].to_ascii_lowercase(), args[1].to_ascii_lowercase())
    } else {
        (args[0].clone(), args[1].clone())
    };
    let ord = match a.cmp(&b) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    };
    Ok(ord.to_string())
}

fn class_holds(class: &str, s: &str) -> Result<bool, Signal> {
    let check_all = |f: fn(u8) -> bool| s.bytes().all(f);
    let r = match class {
        "alnum" => check_all(|b| b.is_ascii_alphanumeric()),
        "alpha" => check_all(|b| b.is_ascii_alphabetic()),
        "digit" => check_all(|b| b.is_ascii_digit()),
        "graph" => check_all(|b| b.is_ascii_graphic()),
        "lower" => check_all(|b| b.is_ascii_lowercase()),
        "print" => check_all(|b| b.is_ascii_graphic() || b == b' '),
        "punct" => check_all(|b| b.is_ascii_punctuation()),
        "space" => check_all(|b| b.is_ascii_whitespace()),
        "upper" => check_all(|b| b.is_ascii_uppercase()),
        "xdigit" => check_all(|b| b.is_ascii_hexdigit()),
        "ascii" => check_all(|b| b.is_ascii()),
        "control" => check_all(|b| b.is_ascii_control()),
        "wordchar" => check_all(|b| b.is_ascii_alphanumeric() || b == b'_'),
        "integer" => !s.is_empty() && s.parse::<i64>().is_ok(),
        "true" => matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes"),
        "false" => matches!(s.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"),
        "boolean" => matches!(
            s.to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes" | "0" | "false" | "off" | "no"
        ),
        other => return Err(PickleError::UnknownOption(other.to_string()).into()),
    };
    Ok(r)
}

fn sub_is(args: &[String]) -> R {
    if args.len() != 2 {
        return Err(wrong_args("string is class s"));
    }
    // Vacuously true on the empty string for the character classes, as
    // the other built-ins' idempotence properties (spec §8) assume.
    if args[1].is_empty() && !matches!(args[0].as_str(), "integer" | "true" | "false" | "boolean") {
        return Ok("1".to_string());
    }
    Ok(if class_holds(&args[0], &args[1])? { "1".to_string() } else { "0".to_string() })
}

fn sub_match(interp: &mut Interp, args: &[String]) -> R {
    let usage = "string match ?-nocase? pattern string";
    let (nocase, rest) = if args.first().map(|s| s.as_str()) == Some("-nocase") {
        (true, &args[1..])
    } else {
        (false, &args[..])
    };
    if rest.len() != 2 {
        return Err(wrong_args(usage));
    }
    let max_steps = interp.limits.max_eval_depth.saturating_mul(256).max(crate::parser::MIN_RECURSION_CAP);
    let ok = glob_match(&rest[0], &rest[1], nocase, max_steps)?;
    Ok(if ok { "1".to_string() } else { "0".to_string() })
}

/// `tr d|r|c|s set1 ?set2? string` (spec §4.5): `d` deletes bytes found in
/// `set1`; `r` replaces each byte found in `set1` with the byte at the
/// same position in `set2` (clamped to its last byte if shorter); `c`
/// keeps only bytes found in `set1`, deleting everything else; `s`
/// squeezes runs of bytes found in `set1` down to a single occurrence.
fn sub_tr(args: &[String]) -> R {
    let usage = "string tr d|r|c|s set1 ?set2? string";
    match args.first().map(|s| s.as_str()) {
        Some("r") => {
            if args.len() != 4 {
                return Err(wrong_args(usage));
            }
            let set1 = args[1].as_bytes();
            let set2 = args[2].as_bytes();
            let input = args[3].as_bytes();
            let mut out = Vec::with_capacity(input.len());
            for &b in input {
                match set1.iter().position(|&x| x == b) {
                    Some(pos) if !set2.is_empty() => {
                        out.push(set2[pos.min(set2.len() - 1)]);
                    }
                    Some(_) => {}
                    None => out.push(b),
                }
            }
            Ok(bytes_to_string(out))
        }
        Some("d") => {
            if args.len() != 3 {
                return Err(wrong_args(usage));
            }
            let set1 = args[1].as_bytes();
            let out: Vec<u8> = args[2].bytes().filter(|b| !set1.contains(b)).collect();
            Ok(bytes_to_string(out))
        }
        Some("c") => {
            if args.len() != 3 {
                return Err(wrong_args(usage));
            }
            let set1 = args[1].as_bytes();
            let out: Vec<u8> = args[2].bytes().filter(|b| set1.contains(b)).collect();
            Ok(bytes_to_string(out))
        }
        Some("s") => {
            if args.len() != 3 {
                return Err(wrong_args(usage));
            }
            let set1 = args[1].as_bytes();
            let mut out = Vec::with_capacity(args[2].len());
            let mut last: Option<u8> = None;
            for b in args[2].bytes() {
                if set1.contains(&b) && last == Some(b) {
                    continue;
                }
                out.push(b);
                last = Some(b);
            }
            Ok(bytes_to_string(out))
        }
        _ => Err(wrong_args(usage)),
    }
}

fn sub_replace(args: &[String]) -> R {
    if args.len() != 4 {
        return Err(wrong_args("string replace s i j new"));
    }
    let s = &args[0];
    if s.is_empty() {
        return Ok(String::new());
    }
    let len = s.len();
    let i = clamp_index(parse_idx(&args[1])?, len);
    let j = clamp_index(parse_idx(&args[2])?, len);
    if i > j {
        return Ok(s.clone());
    }
    let mut out = String::with_capacity(len);
    out.push_str(&s[..i]);
    out.push_str(&args[3]);
    out.push_str(&s[j + 1..]);
    Ok(out)
}

fn sub_hash(args: &[String]) -> R {
    if args.len() != 1 {
        return Err(wrong_args("string hash s"));
    }
    Ok(crate::commands::djb2(&args[0]).to_string())
}

fn sub_dec2hex(args: &[String]) -> R {
    if args.len() != 1 {
        return Err(wrong_args("string dec2hex n"));
    }
    let n = parse_idx(&args[0])?;
    Ok(format!("{:x}", n))
}

fn sub_hex2dec(args: &[String]) -> R {
    if args.len() != 1 {
        return Err(wrong_args("string hex2dec s"));
    }
    let s = args[0].strip_prefix("0x").or_else(|| args[0].strip_prefix("0X")).unwrap_or(&args[0]);
    let n = i64::from_str_radix(s, 16).map_err(|_| Signal::from(PickleError::BadBase(args[0].clone())))?;
    Ok(n.to_string())
}

const BASE_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn sub_dec2base(args: &[String]) -> R {
    if args.len() != 2 {
        return Err(wrong_args("string dec2base n base"));
    }
    let mut n = parse_idx(&args[0])?;
    let base = parse_idx(&args[1])?;
    if !(2..=36).contains(&base) {
        return Err(PickleError::BadBase(args[1].clone()).into());
    }
    let negative = n < 0;
    if negative {
        n = -n;
    }
    if n == 0 {
        return Ok("0".to_string());
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE_DIGITS[(n % base) as usize]);
        n /= base;
    }
    if negative {
        digits.push(b'-');
    }
    digits.reverse();
    Ok(bytes_to_string(digits))
}

fn sub_base2dec(args: &[String]) -> R {
    if args.len() != 2 {
        return Err(wrong_args("string base2dec s base"));
    }
    let base = parse_idx(&args[1])?;
    if !(2..=36).contains(&base) {
        return Err(PickleError::BadBase(args[1].clone()).into());
    }
    let (negative, digits) = match args[0].strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, args[0].as_str()),
    };
    if digits.is_empty() {
        return Err(PickleError::BadInteger(args[0].clone()).into());
    }
    let mut n: i64 = 0;
    for c in digits.chars() {
        let d = c
            .to_ascii_lowercase()
            .to_digit(36)
            .filter(|&d| (d as i64) < base)
            .ok_or_else(|| Signal::from(PickleError::BadInteger(args[0].clone())))?;
        n = n * base + d as i64;
    }
    Ok(if negative { (-n).to_string() } else { n.to_string() })
}

fn sub_ordinal(args: &[String]) -> R {
    if args.len() != 1 {
        return Err(wrong_args("string ordinal s"));
    }
    let b = args[0].as_bytes().first().ok_or_else(|| wrong_args("string ordinal s"))?;
    Ok((*b as i64).to_string())
}

fn sub_char(args: &[String]) -> R {
    if args.len() != 1 {
        return Err(wrong_args("string char n"));
    }
    let n = parse_idx(&args[0])?;
    Ok(bytes_to_string(vec![(n & 0xff) as u8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(i: &mut Interp, s: &str) -> Result<String, Signal> {
        i.eval(s)
    }

    #[test]
    fn length_and_case() {
        let mut i = Interp::new();
        assert_eq!(run(&mut i, "string length hello").unwrap(), "5");
        assert_eq!(run(&mut i, "string toupper hello").unwrap(), "HELLO");
        assert_eq!(run(&mut i, "string tolower HELLO").unwrap(), "hello");
    }

    #[test]
    fn index_boundary_clamps() {
        let mut i = Interp::new();
        assert_eq!(run(&mut i, "string index hello -1").unwrap(), "h");
        assert_eq!(run(&mut i, "string index hello 100").unwrap(), "o");
        assert_eq!(run(&mut i, "string index {} 0").unwrap(), "");
    }

    #[test]
    fn range_clamps_and_empties() {
        let mut i = Interp::new();
        assert_eq!(run(&mut i, "string range hello 1 3").unwrap(), "ell");
        assert_eq!(run(&mut i, "string range hello 3 1").unwrap(), "");
        assert_eq!(run(&mut i, "string range hello -5 100").unwrap(), "hello");
    }

    #[test]
    fn reverse_is_involution() {
        let mut i = Interp::new();
        let once = run(&mut i, "string reverse hello").unwrap();
        assert_eq!(once, "olleh");
        let cmd = format!("string reverse {once}");
        assert_eq!(run(&mut i, &cmd).unwrap(), "hello");
    }

    #[test]
    fn trim_is_idempotent() {
        let mut i = Interp::new();
        let once = run(&mut i, "string trim {  hi  }").unwrap();
        assert_eq!(once, "hi");
    }

    #[test]
    fn match_glob() {
        let mut i = Interp::new();
        assert_eq!(run(&mut i, "string match a*b aaab").unwrap(), "1");
        assert_eq!(run(&mut i, "string match a*b ccc").unwrap(), "0");
    }

    #[test]
    fn is_classes() {
        let mut i = Interp::new();
        assert_eq!(run(&mut i, "string is digit 123").unwrap(), "1");
        assert_eq!(run(&mut i, "string is digit 12a").unwrap(), "0");
        assert_eq!(run(&mut i, "string is integer -5").unwrap(), "1");
        assert_eq!(run(&mut i, "string is true yes").unwrap(), "1");
    }

    #[test]
    fn tr_delete_and_replace() {
        let mut i = Interp::new();
        assert_eq!(run(&mut i, "string tr d aeiou hello").unwrap(), "hll");
        assert_eq!(run(&mut i, "string tr r ab xy habba").unwrap(), "hxyyx");
    }

    #[test]
    fn base_conversions_round_trip() {
        let mut i = Interp::new();
        assert_eq!(run(&mut i, "string dec2hex 255").unwrap(), "ff");
        assert_eq!(run(&mut i, "string hex2dec ff").unwrap(), "255");
        assert_eq!(run(&mut i, "string dec2base 255 16").unwrap(), "ff");
        assert_eq!(run(&mut i, "string base2dec ff 16").unwrap(), "255");
    }
}
