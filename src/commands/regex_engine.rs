//! The `reg` command (spec §4.5 "Regex engine `reg`"): a small backtracking
//! matcher over `^ $ . * + ? \` with escape classes, grouping `(...)`,
//! alternation `|`, and three greediness modes (lazy, greedy, possessive).

use crate::error::{PickleError, Signal};
use crate::interp::Interp;
use crate::commands::PrivateData;

type R = Result<String, Signal>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum GClass {
    Word,
    NotWord,
    Digit,
    NotDigit,
    Space,
    NotSpace,
}

impl GClass {
    fn matches(self, b: u8) -> bool {
        let word = b.is_ascii_alphanumeric() || b == b'_';
        match self {
            GClass::Word => word,
            GClass::NotWord => !word,
            GClass::Digit => b.is_ascii_digit(),
            GClass::NotDigit => !b.is_ascii_digit(),
            GClass::Space => b.is_ascii_whitespace(),
            GClass::NotSpace => !b.is_ascii_whitespace(),
        }
    }
}

#[derive(Clone)]
enum Atom {
    Literal(u8),
    Any,
    Class(GClass),
    Group(Vec<Vec<AtomQ>>),
    StartAnchor,
    EndAnchor,
}

#[derive(Clone, Copy)]
enum Quant {
    One,
    Opt,
    Star,
    Plus,
}

#[derive(Clone)]
struct AtomQ {
    atom: Atom,
    quant: Quant,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Lazy,
    Greedy,
    Possessive,
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn parse_alt(&mut self) -> Result<Vec<Vec<AtomQ>>, PickleError> {
        let mut branches = vec![self.parse_seq()?];
        while self.peek() == Some(b'|') {
            self.pos += 1;
            branches.push(self.parse_seq()?);
        }
        Ok(branches)
    }

    fn parse_quant(&mut self) -> Quant {
        match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                Quant::Star
            }
            Some(b'+') => {
                self.pos += 1;
                Quant::Plus
            }
            Some(b'?') => {
                self.pos += 1;
                Quant::Opt
            }
            _ => Quant::One,
        }
    }

    fn parse_seq(&mut self) -> Result<Vec<AtomQ>, PickleError> {
        let mut seq = Vec::new();
        loop {
            match self.peek() {
                None | Some(b')') | Some(b'|') => break,
                Some(b'(') => {
                    self.pos += 1;
                    let inner = self.parse_alt()?;
                    if self.peek() == Some(b')') {
                        self.pos += 1;
                    }
                    let quant = self.parse_quant();
                    seq.push(AtomQ { atom: Atom::Group(inner), quant });
                }
                Some(b'^') => {
                    self.pos += 1;
                    seq.push(AtomQ { atom: Atom::StartAnchor, quant: Quant::One });
                }
                Some(b'$') => {
                    self.pos += 1;
                    seq.push(AtomQ { atom: Atom::EndAnchor, quant: Quant::One });
                }
                Some(b'.') => {
                    self.pos += 1;
                    let quant = self.parse_quant();
                    seq.push(AtomQ { atom: Atom::Any, quant });
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let c = self.peek().ok_or(PickleError::BadEscape)?;
                    self.pos += 1;
                    let atom = match c {
                        b'w' => Atom::Class(GClass::Word),
                        b'W' => Atom::Class(GClass::NotWord),
                        b'd' => Atom::Class(GClass::Digit),
                        b'D' => Atom::Class(GClass::NotDigit),
                        b's' => Atom::Class(GClass::Space),
                        b'S' => Atom::Class(GClass::NotSpace),
                        other => Atom::Literal(other),
                    };
                    let quant = self.parse_quant();
                    seq.push(AtomQ { atom, quant });
                }
                Some(b) => {
                    self.pos += 1;
                    let quant = self.parse_quant();
                    seq.push(AtomQ { atom: Atom::Literal(b), quant });
                }
            }
        }
        Ok(seq)
    }
}

fn compile(pattern: &str) -> Result<Vec<Vec<AtomQ>>, PickleError> {
    let mut p = Parser { bytes: pattern.as_bytes(), pos: 0 };
    p.parse_alt()
}

type Cont<'a> = &'a dyn Fn(usize) -> Result<Option<usize>, PickleError>;

struct Matcher<'t> {
    text: &'t [u8],
    mode: Mode,
    nocase: bool,
    steps: std::cell::Cell<usize>,
    max_steps: usize,
}

impl<'t> Matcher<'t> {
    fn bump(&self) -> Result<(), PickleError> {
        let n = self.steps.get() + 1;
        self.steps.set(n);
        if n > self.max_steps {
            return Err(PickleError::RecursionExceeded);
        }
        Ok(())
    }

    fn literal_eq(&self, a: u8, b: u8) -> bool {
        if self.nocase {
            a.to_ascii_lowercase() == b.to_ascii_lowercase()
        } else {
            a == b
        }
    }

    fn match_seq(&self, seq: &[AtomQ], pos: usize, k: Cont) -> Result<Option<usize>, PickleError> {
        self.bump()?;
        if seq.is_empty() {
            return k(pos);
        }
        let rest = &seq[1..];
        self.match_atomq(&seq[0], pos, &|p| self.match_seq(rest, p, k))
    }

    fn match_atomq(&self, aq: &AtomQ, pos: usize, k: Cont) -> Result<Option<usize>, PickleError> {
        self.bump()?;
        match aq.quant {
            Quant::One => self.match_atom(&aq.atom, pos, k),
            Quant::Opt => match self.mode {
                Mode::Lazy => {
                    if let Some(r) = k(pos)? {
                        return Ok(Some(r));
                    }
                    self.match_atom(&aq.atom, pos, k)
                }
                Mode::Greedy => {
                    if let Some(r) = self.match_atom(&aq.atom, pos, k)? {
                        return Ok(Some(r));
                    }
                    k(pos)
                }
                Mode::Possessive => match self.match_atom_single(&aq.atom, pos)? {
                    Some(np) => k(np),
                    None => k(pos),
                },
            },
            Quant::Star => self.repeat(&aq.atom, pos, 0, k),
            Quant::Plus => self.repeat(&aq.atom, pos, 1, k),
        }
    }

    fn match_atom(&self, atom: &Atom, pos: usize, k: Cont) -> Result<Option<usize>, PickleError> {
        self.bump()?;
        match atom {
            Atom::Literal(l) => {
                if pos < self.text.len() && self.literal_eq(*l, self.text[pos]) {
                    k(pos + 1)
                } else {
                    Ok(None)
                }
            }
            Atom::Any => {
                if pos < self.text.len() {
                    k(pos + 1)
                } else {
                    Ok(None)
                }
            }
            Atom::Class(c) => {
                if pos < self.text.len() && c.matches(self.text[pos]) {
                    k(pos + 1)
                } else {
                    Ok(None)
                }
            }
            Atom::StartAnchor => {
                if pos == 0 {
                    k(pos)
                } else {
                    Ok(None)
                }
            }
            Atom::EndAnchor => {
                if pos == self.text.len() {
                    k(pos)
                } else {
                    Ok(None)
                }
            }
            Atom::Group(branches) => {
                for branch in branches {
                    if let Some(r) = self.match_seq(branch, pos, k)? {
                        return Ok(Some(r));
                    }
                }
                Ok(None)
            }
        }
    }

    /// Single-step match with no downstream continuation — used to expand
    /// `*`/`+` repetitions one unit at a time. For a `Group` atom this takes
    /// the first branch that matches anything, rather than exploring every
    /// branch at every repetition (repeated groups are rare in practice;
    /// `Opt` on a group still gets full backtracking via `match_atom`).
    fn match_atom_single(&self, atom: &Atom, pos: usize) -> Result<Option<usize>, PickleError> {
        self.bump()?;
        let identity: Cont = &|p| Ok(Some(p));
        self.match_atom(atom, pos, identity)
    }

    fn repeat(&self, atom: &Atom, pos: usize, min: usize, k: Cont) -> Result<Option<usize>, PickleError> {
        self.bump()?;
        match self.mode {
            Mode::Greedy => self.repeat_greedy(atom, pos, 0, min, k),
            Mode::Lazy => self.repeat_lazy(atom, pos, 0, min, k),
            Mode::Possessive => {
                let mut cur = pos;
                let mut count = 0usize;
                loop {
                    match self.match_atom_single(atom, cur)? {
                        Some(np) if np > cur => {
                            cur = np;
                            count += 1;
                        }
                        _ => break,
                    }
                }
                if count >= min {
                    k(cur)
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn repeat_greedy(
        &self,
        atom: &Atom,
        pos: usize,
        count: usize,
        min: usize,
        k: Cont,
    ) -> Result<Option<usize>, PickleError> {
        self.bump()?;
        if let Some(next_pos) = self.match_atom_single(atom, pos)? {
            if next_pos > pos {
                if let Some(r) = self.repeat_greedy(atom, next_pos, count + 1, min, k)? {
                    return Ok(Some(r));
                }
            }
        }
        if count >= min {
            k(pos)
        } else {
            Ok(None)
        }
    }

    fn repeat_lazy(
        &self,
        atom: &Atom,
        pos: usize,
        count: usize,
        min: usize,
        k: Cont,
    ) -> Result<Option<usize>, PickleError> {
        self.bump()?;
        if count >= min {
            if let Some(r) = k(pos)? {
                return Ok(Some(r));
            }
        }
        if let Some(next_pos) = self.match_atom_single(atom, pos)? {
            if next_pos > pos {
                return self.repeat_lazy(atom, next_pos, count + 1, min, k);
            }
        }
        Ok(None)
    }
}

/// Search `text` from byte `start` for the first non-empty match of
/// `pattern`, returning inclusive `(start, end)` byte offsets or `(-1, -1)`.
pub fn search(
    pattern: &str,
    text: &str,
    nocase: bool,
    mode: Mode,
    start: usize,
    max_steps: usize,
) -> Result<(i64, i64), PickleError> {
    let branches = compile(pattern)?;
    let bytes = text.as_bytes();
    let identity: Cont = &|p| Ok(Some(p));
    let mut s = start.min(bytes.len());
    loop {
        for branch in &branches {
            let matcher = Matcher { text: bytes, mode, nocase, steps: std::cell::Cell::new(0), max_steps };
            if let Some(end) = matcher.match_seq(branch, s, identity)? {
                if end > s {
                    return Ok((s as i64, (end - 1) as i64));
                }
            }
        }
        if s >= bytes.len() {
            return Ok((-1, -1));
        }
        s += 1;
    }
}

fn wrong_args(usage: &str) -> Signal {
    PickleError::WrongArgs(usage.to_string()).into()
}

pub fn register(interp: &mut Interp) {
    interp.register_command("reg", cmd_reg).expect("built-in name collision");
}

fn cmd_reg(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    let usage = "reg ?-nocase? ?-lazy|-greedy|-possessive? ?-start index? pattern string";
    let mut nocase = false;
    let mut mode = Mode::Greedy;
    let mut start = 0usize;
    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "-nocase" => {
                nocase = true;
                i += 1;
            }
            "-lazy" => {
                mode = Mode::Lazy;
                i += 1;
            }
            "-greedy" => {
                mode = Mode::Greedy;
                i += 1;
            }
            "-possessive" => {
                mode = Mode::Possessive;
                i += 1;
            }
            "-start" => {
                let idx = argv.get(i + 1).ok_or_else(|| wrong_args(usage))?;
                start = idx.parse::<usize>().map_err(|_| Signal::from(PickleError::BadInteger(idx.clone())))?;
                i += 2;
            }
            _ => break,
        }
    }
    if argv.len() - i != 2 {
        return Err(wrong_args(usage));
    }
    let pattern = &argv[i];
    let text = &argv[i + 1];
    let max_steps = interp.limits.max_eval_depth.saturating_mul(256).max(crate::parser::MIN_RECURSION_CAP);
    let (s, e) = search(pattern, text, nocase, mode, start, max_steps)?;
    Ok(format!("{s} {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_match() {
        let (s, e) = search("abc", "xxabcxx", false, Mode::Greedy, 0, 10_000).unwrap();
        assert_eq!((s, e), (2, 4));
    }

    #[test]
    fn no_match_returns_minus_one() {
        let (s, e) = search("zzz", "abc", false, Mode::Greedy, 0, 10_000).unwrap();
        assert_eq!((s, e), (-1, -1));
    }

    #[test]
    fn anchored_group_alternation_optional() {
        let (s, e) = search("^a(b|c)?d$", "abd", false, Mode::Greedy, 0, 10_000).unwrap();
        assert_eq!((s, e), (0, 2));
    }

    #[test]
    fn anchored_group_without_optional_branch() {
        let (s, e) = search("^a(b|c)?d$", "ad", false, Mode::Greedy, 0, 10_000).unwrap();
        assert_eq!((s, e), (0, 1));
    }

    #[test]
    fn star_is_greedy_by_default() {
        let (s, e) = search("a.*b", "axxbxxb", false, Mode::Greedy, 0, 10_000).unwrap();
        assert_eq!((s, e), (0, 6));
    }

    #[test]
    fn star_lazy_mode_matches_shortest() {
        let (s, e) = search("a.*b", "axxbxxb", false, Mode::Lazy, 0, 10_000).unwrap();
        assert_eq!((s, e), (0, 3));
    }
}
