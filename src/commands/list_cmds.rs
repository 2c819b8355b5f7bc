//! List operators (spec §4.5 "List operators"). Lists are strings
//! interpreted via the parser with every substitution toggle off; elements
//! are the resulting word tokens ([`parser::split_list`]).

use crate::commands::glob_match::glob_match;
use crate::commands::PrivateData;
use crate::error::{PickleError, Signal};
use crate::interp::Interp;
use crate::parser::{self, join_list};

type R = Result<String, Signal>;

fn wrong_args(usage: &str) -> Signal {
    PickleError::WrongArgs(usage.to_string()).into()
}

pub fn register(interp: &mut Interp) {
    let table: &[(&str, crate::commands::Handler)] = &[
        ("llength", cmd_llength),
        ("lindex", cmd_lindex),
        ("linsert", cmd_linsert),
        ("lset", cmd_lset),
        ("lreplace", cmd_lreplace),
        ("lrange", cmd_lrange),
        ("lreverse", cmd_lreverse),
        ("lsort", cmd_lsort),
        ("lsearch", cmd_lsearch),
        ("lrepeat", cmd_lrepeat),
        ("lappend", cmd_lappend),
        ("split", cmd_split),
        ("list", cmd_list),
        ("concat", cmd_concat),
        ("conjoin", cmd_conjoin),
        ("join", cmd_join),
    ];
    for (name, handler) in table {
        interp.register_command(name, *handler).expect("built-in name collision");
    }
}

/// Resolve an index spec that may be a plain (possibly negative) integer,
/// `end`, `end-N`, or `end+N`, against a list of `len` elements. Returns
/// the raw (possibly out-of-range) signed offset; callers decide how
/// out-of-range indices behave for their particular operation.
fn parse_list_index(spec: &str, len: usize) -> Result<i64, Signal> {
    let last = len as i64 - 1;
    if spec == "end" {
        return Ok(last);
    }
    if let Some(rest) = spec.strip_prefix("end-") {
        let n: i64 = rest.parse().map_err(|_| Signal::from(PickleError::BadInteger(spec.to_string())))?;
        return Ok(last - n);
    }
    if let Some(rest) = spec.strip_prefix("end+") {
        let n: i64 = rest.parse().map_err(|_| Signal::from(PickleError::BadInteger(spec.to_string())))?;
        return Ok(last + n);
    }
    spec.parse::<i64>().map_err(|_| PickleError::BadInteger(spec.to_string()).into())
}

fn cmd_llength(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 2 {
        return Err(wrong_args("llength list"));
    }
    let elems = parser::split_list(&argv[1])?;
    Ok(elems.len().to_string())
}

fn cmd_lindex(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 3 {
        return Err(wrong_args("lindex list index"));
    }
    let elems = parser::split_list(&argv[1])?;
    let idx = parse_list_index(&argv[2], elems.len())?;
    if idx < 0 || idx as usize >= elems.len() {
        return Ok(String::new());
    }
    Ok(elems[idx as usize].clone())
}

fn cmd_linsert(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 3 {
        return Err(wrong_args("linsert list index element ?element ...?"));
    }
    let mut elems = parser::split_list(&argv[1])?;
    let idx = parse_list_index(&argv[2], elems.len())?;
    let idx = idx.clamp(0, elems.len() as i64) as usize;
    for (offset, e) in argv[3..].iter().enumerate() {
        elems.insert(idx + offset, e.clone());
    }
    Ok(join_list(&elems))
}

fn cmd_lset(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 4 {
        return Err(wrong_args("lset varName index value"));
    }
    let current = interp
        .var_get(&argv[1])
        .map(|s| s.to_string())
        .ok_or_else(|| Signal::from(PickleError::NoSuchVariable(argv[1].clone())))?;
    let mut elems = parser::split_list(&current)?;
    let idx = parse_list_index(&argv[2], elems.len())?;
    if idx < 0 || idx as usize >= elems.len() {
        return Err(PickleError::WrongArgs(format!("index {} out of range", argv[2])).into());
    }
    elems[idx as usize] = argv[3].clone();
    let joined = join_list(&elems);
    interp.var_set(&argv[1], joined.as_str());
    Ok(joined)
}

fn cmd_lreplace(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 4 {
        return Err(wrong_args("lreplace list first last ?element ...?"));
    }
    let mut elems = parser::split_list(&argv[1])?;
    let len = elems.len();
    let first = parse_list_index(&argv[2], len)?.clamp(0, len as i64) as usize;
    let last = parse_list_index(&argv[3], len)?;
    let new_elems = &argv[4..];
    if last < first as i64 {
        // Nothing to remove; the new elements are inserted at `first`.
        for (offset, e) in new_elems.iter().enumerate() {
            elems.insert(first + offset, e.clone());
        }
        return Ok(join_list(&elems));
    }
    let last = (last as usize).min(len.saturating_sub(1));
    let tail: Vec<String> = elems.split_off((last + 1).min(elems.len()));
    elems.truncate(first);
    elems.extend(new_elems.iter().cloned());
    elems.extend(tail);
    Ok(join_list(&elems))
}

fn cmd_lrange(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 4 {
        return Err(wrong_args("lrange list first last"));
    }
    let elems = parser::split_list(&argv[1])?;
    let len = elems.len();
    let first = parse_list_index(&argv[2], len)?.clamp(0, len as i64) as usize;
    let last = parse_list_index(&argv[3], len)?;
    if last < first as i64 || len == 0 {
        return Ok(String::new());
    }
    let last = (last as usize).min(len - 1);
    Ok(join_list(&elems[first..=last]))
}

fn cmd_lreverse(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 2 {
        return Err(wrong_args("lreverse list"));
    }
    let mut elems = parser::split_list(&argv[1])?;
    elems.reverse();
    Ok(join_list(&elems))
}

fn cmd_lsort(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    let usage = "lsort ?-increasing|-decreasing? ?-ascii|-integer? list";
    let mut decreasing = false;
    let mut integer = false;
    let mut i = 1;
    while i + 1 < argv.len() {
        match argv[i].as_str() {
            "-increasing" => decreasing = false,
            "-decreasing" => decreasing = true,
            "-ascii" => integer = false,
            "-integer" => integer = true,
            other => return Err(PickleError::UnknownOption(other.to_string()).into()),
        }
        i += 1;
    }
    if i + 1 != argv.len() {
        return Err(wrong_args(usage));
    }
    let mut elems = parser::split_list(&argv[i])?;
    if integer {
        let mut parsed = Vec::with_capacity(elems.len());
        for e in &elems {
            parsed.push(e.parse::<i64>().map_err(|_| Signal::from(PickleError::BadInteger(e.clone())))?);
        }
        let mut pairs: Vec<(i64, String)> = parsed.into_iter().zip(elems.into_iter()).collect();
        pairs.sort_by_key(|(n, _)| *n);
        elems = pairs.into_iter().map(|(_, s)| s).collect();
    } else {
        elems.sort();
    }
    if decreasing {
        elems.reverse();
    }
    Ok(join_list(&elems))
}

fn cmd_lsearch(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    let usage = "lsearch ?-glob|-exact|-integer? ?-inline? ?-nocase? ?-not? ?-start n? list pattern";
    let mut mode_glob = false;
    let mut mode_integer = false;
    let mut inline = false;
    let mut nocase = false;
    let mut negate = false;
    let mut start = 0usize;
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "-glob" => {
                mode_glob = true;
                i += 1;
            }
            "-exact" => {
                mode_glob = false;
                mode_integer = false;
                i += 1;
            }
            "-integer" => {
                mode_integer = true;
                i += 1;
            }
            "-inline" => {
                inline = true;
                i += 1;
            }
            "-nocase" => {
                nocase = true;
                i += 1;
            }
            "-not" => {
                negate = true;
                i += 1;
            }
            "-start" => {
                let n = argv.get(i + 1).ok_or_else(|| wrong_args(usage))?;
                start = n.parse().map_err(|_| Signal::from(PickleError::BadInteger(n.clone())))?;
                i += 2;
            }
            _ => break,
        }
    }
    if argv.len() - i != 2 {
        return Err(wrong_args(usage));
    }
    let elems = parser::split_list(&argv[i])?;
    let pattern = &argv[i + 1];
    let max_steps = interp.limits.max_eval_depth.saturating_mul(256).max(crate::parser::MIN_RECURSION_CAP);

    let matches = |elem: &str| -> Result<bool, Signal> {
        let ok = if mode_glob {
            glob_match(pattern, elem, nocase, max_steps)?
        } else if mode_integer {
            let a: i64 = elem.parse().map_err(|_| Signal::from(PickleError::BadInteger(elem.to_string())))?;
            let b: i64 = pattern.parse().map_err(|_| Signal::from(PickleError::BadInteger(pattern.clone())))?;
            a == b
        } else if nocase {
            elem.eq_ignore_ascii_case(pattern)
        } else {
            elem == pattern
        };
        Ok(ok != negate)
    };

    for (idx, elem) in elems.iter().enumerate().skip(start) {
        if matches(elem)? {
            return Ok(if inline { elem.clone() } else { idx.to_string() });
        }
    }
    Ok(if inline { String::new() } else { "-1".to_string() })
}

fn cmd_lrepeat(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 3 {
        return Err(wrong_args("lrepeat n element ?element ...?"));
    }
    let n: i64 = argv[1].parse().map_err(|_| Signal::from(PickleError::BadInteger(argv[1].clone())))?;
    if n < 0 {
        return Err(PickleError::BadInteger(argv[1].clone()).into());
    }
    let elems = &argv[2..];
    let mut out = Vec::with_capacity(elems.len() * n as usize);
    for _ in 0..n {
        out.extend(elems.iter().cloned());
    }
    Ok(join_list(&out))
}

fn cmd_lappend(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 2 {
        return Err(wrong_args("lappend varName ?value ...?"));
    }
    let mut elems = match interp.var_get(&argv[1]) {
        Some(s) => parser::split_list(s)?,
        None => Vec::new(),
    };
    elems.extend(argv[2..].iter().cloned());
    let joined = join_list(&elems);
    interp.var_set(&argv[1], joined.as_str());
    Ok(joined)
}

fn cmd_split(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 2 || argv.len() > 3 {
        return Err(wrong_args("split s ?set?"));
    }
    let s = &argv[1];
    match argv.get(2) {
        // An explicit empty set splits into individual bytes (spec §4.5).
        Some(set) if set.is_empty() => {
            let elems: Vec<String> = s.bytes().map(|b| (b as char).to_string()).collect();
            Ok(join_list(&elems))
        }
        Some(set) => {
            let chars: Vec<char> = set.chars().collect();
            let elems: Vec<String> = s.split(|c| chars.contains(&c)).map(String::from).collect();
            Ok(join_list(&elems))
        }
        None => {
            let elems: Vec<String> = s.split_whitespace().map(String::from).collect();
            Ok(join_list(&elems))
        }
    }
}

fn cmd_list(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    Ok(join_list(&argv[1..]))
}

fn cmd_concat(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    let parts: Vec<&str> = argv[1..].iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    Ok(parts.join(" "))
}

fn cmd_conjoin(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 2 {
        return Err(wrong_args("conjoin sep arg ?arg ...?"));
    }
    Ok(argv[2..].join(&argv[1]))
}

fn cmd_join(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() < 2 || argv.len() > 3 {
        return Err(wrong_args("join list ?sep?"));
    }
    let elems = parser::split_list(&argv[1])?;
    let sep = argv.get(2).map(|s| s.as_str()).unwrap_or(" ");
    Ok(elems.join(sep))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_round_trip() {
        let mut i = Interp::new();
        i.eval("set l [list x y z]").unwrap();
        assert_eq!(i.eval("lindex $l 0").unwrap(), "x");
        assert_eq!(i.eval("lindex $l 2").unwrap(), "z");
        assert_eq!(i.eval("llength $l").unwrap(), "3");
    }

    #[test]
    fn join_comma() {
        let mut i = Interp::new();
        assert_eq!(i.eval("join {a b c} ,").unwrap(), "a,b,c");
    }

    #[test]
    fn lindex_out_of_range_is_empty() {
        let mut i = Interp::new();
        assert_eq!(i.eval("lindex {a b c} 10").unwrap(), "");
    }

    #[test]
    fn lrange_with_end_keyword() {
        let mut i = Interp::new();
        assert_eq!(i.eval("lrange {a b c d} 1 end").unwrap(), "b c d");
    }

    #[test]
    fn lappend_creates_and_extends() {
        let mut i = Interp::new();
        i.eval("lappend l a b").unwrap();
        assert_eq!(i.eval("lappend l c").unwrap(), "a b c");
    }

    #[test]
    fn lsort_integer_mode() {
        let mut i = Interp::new();
        assert_eq!(i.eval("lsort -integer {10 2 33 4}").unwrap(), "2 4 10 33");
    }

    #[test]
    fn lsearch_glob_inline() {
        let mut i = Interp::new();
        assert_eq!(i.eval("lsearch -glob -inline {foo bar baz} ba*").unwrap(), "bar");
    }

    #[test]
    fn split_empty_set_splits_bytes() {
        let mut i = Interp::new();
        assert_eq!(i.eval("split ab {}").unwrap(), "a b");
    }

    #[test]
    fn concat_trims_and_joins() {
        let mut i = Interp::new();
        assert_eq!(i.eval("concat {  a  } b {c  }").unwrap(), "a b c");
    }
}
