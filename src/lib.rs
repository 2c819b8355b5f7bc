//! Pickle: a tiny embeddable command-language interpreter in the TCL/picol
//! lineage (see SPEC_FULL.md). A program is a sequence of commands; each
//! command is a list of words; the first word names a callable; every
//! value is a byte string.
//!
//! Dependency order, leaves first (spec §2): [`alloc`] → [`value`] →
//! [`parser`] → [`vars`] → [`commands`] → [`interp`], with [`error`]
//! threading the five status codes through all of them.

pub mod alloc;
pub mod commands;
pub mod error;
pub mod interp;
pub mod parser;
pub mod value;
pub mod vars;

pub use alloc::{Allocator, SystemAllocator};
pub use error::{PickleError, Signal, StatusCode};
pub use interp::{EvalLimits, Interp};
pub use value::PString;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_scenarios_from_spec_section_8() {
        let mut i = Interp::new();
        assert_eq!(i.eval("+ 2 2").unwrap(), "4");
        assert_eq!(i.eval("* -2 9").unwrap(), "-18");
        assert_eq!(i.eval("join {a b c} ,").unwrap(), "a,b,c");
        assert_eq!(i.eval("return fail -1"), Err(Signal::Error("fail".to_string())));
        i.eval("proc sq {x} {* $x $x}").unwrap();
        assert_eq!(i.eval("sq 5").unwrap(), "25");
        i.eval("set z 3; while {< $z 10} {set z [+ $z 1]}").unwrap();
        assert_eq!(i.eval("set z").unwrap(), "10");
        i.eval("set a 1").unwrap();
        i.eval("proc bump {} {upvar 1 a b; set b 7}").unwrap();
        i.eval("bump").unwrap();
        assert_eq!(i.var_get("a"), Some("7"));
        let r = i.eval("catch {unknown-cmd-xyz} err");
        assert!(r.is_ok());
        assert_eq!(i.var_get("err"), Some("-1"));
        assert_eq!(i.eval("string match a*b aaab").unwrap(), "1");
        assert_eq!(i.eval("reg {^a(b|c)?d$} abd").unwrap(), "0 2");
    }
}
