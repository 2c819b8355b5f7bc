//! Command table (spec §4.4): a fixed-size chained hash table keyed by
//! name, sized so all built-ins fit without resizing, with bucket index
//! computed as a DJB2 hash of the name modulo the table length — an
//! explicit, spec-mandated data structure rather than a generic
//! `std::collections::HashMap`, which does not expose a fixed bucket count
//! or a chosen hash algorithm.

pub mod arith;
pub mod control;
pub mod glob_match;
pub mod info;
pub mod list_cmds;
pub mod regex_engine;
pub mod string_cmds;

use crate::error::{PickleError, Signal};
use crate::interp::Interp;

/// Table size: generous enough that the ~90 built-ins plus a healthy
/// number of user `proc`s hash without excessive chaining.
const TABLE_SIZE: usize = 256;

pub(crate) fn djb2(name: &str) -> u64 {
    let mut hash: u64 = 5381;
    for b in name.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(b as u64);
    }
    hash
}

/// A native command handler: `(interp, argv, private) -> Outcome`.
pub type Handler = fn(&mut Interp, &[String], Option<&PrivateData>) -> Result<String, Signal>;

/// Handler-owned private data. Only user-defined procedures need it today
/// (spec §4.4: "the shared proc-call handler whose private_data is the
/// pair (args-spec, body)"), but the variant is open for future native
/// handlers that need per-registration state.
#[derive(Debug, Clone)]
pub enum PrivateData {
    Proc { params: Vec<String>, body: String },
}

#[derive(Clone)]
struct CommandEntry {
    name: String,
    handler: Handler,
    private: Option<PrivateData>,
}

/// The command table itself: `TABLE_SIZE` buckets, each a chain
/// (`Vec<CommandEntry>`) of entries whose name hashes to that bucket.
pub struct CommandTable {
    buckets: Vec<Vec<CommandEntry>>,
}

impl CommandTable {
    pub fn new() -> Self {
        CommandTable { buckets: (0..TABLE_SIZE).map(|_| Vec::new()).collect() }
    }

    fn bucket_index(&self, name: &str) -> usize {
        (djb2(name) % TABLE_SIZE as u64) as usize
    }

    /// `register(name, handler, private)` — error if name exists.
    pub fn register(
        &mut self,
        name: &str,
        handler: Handler,
        private: Option<PrivateData>,
    ) -> Result<(), PickleError> {
        let idx = self.bucket_index(name);
        if self.buckets[idx].iter().any(|e| e.name == name) {
            return Err(PickleError::CommandExists(name.to_string()));
        }
        self.buckets[idx].push(CommandEntry { name: name.to_string(), handler, private });
        Ok(())
    }

    /// Like `register`, but overwrites an existing entry instead of
    /// erroring — used internally by `proc` re-definition and by `rename`.
    pub fn force_register(&mut self, name: &str, handler: Handler, private: Option<PrivateData>) {
        let idx = self.bucket_index(name);
        if let Some(e) = self.buckets[idx].iter_mut().find(|e| e.name == name) {
            e.handler = handler;
            e.private = private;
        } else {
            self.buckets[idx].push(CommandEntry { name: name.to_string(), handler, private });
        }
    }

    pub fn lookup(&self, name: &str) -> Option<(Handler, Option<&PrivateData>)> {
        let idx = self.bucket_index(name);
        self.buckets[idx]
            .iter()
            .find(|e| e.name == name)
            .map(|e| (e.handler, e.private.as_ref()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// `rename(old, new)` — `new == ""` deletes `old`; otherwise creates
    /// `new` with `old`'s handler/private data (deep-copied, so renaming a
    /// proc is independent of its former name) and deletes `old`.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), PickleError> {
        let idx = self.bucket_index(old);
        let pos = self.buckets[idx]
            .iter()
            .position(|e| e.name == old)
            .ok_or_else(|| PickleError::NoSuchCommand(old.to_string()))?;
        let entry = self.buckets[idx].remove(pos);
        if new.is_empty() {
            return Ok(());
        }
        self.force_register(new, entry.handler, entry.private);
        Ok(())
    }

    pub fn unset(&mut self, name: &str) -> bool {
        let idx = self.bucket_index(name);
        let pos = self.buckets[idx].iter().position(|e| e.name == name);
        match pos {
            Some(p) => {
                self.buckets[idx].remove(p);
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.buckets.iter().flat_map(|b| b.iter().map(|e| e.name.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        CommandTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Interp, _: &[String], _: Option<&PrivateData>) -> Result<String, Signal> {
        Ok(String::new())
    }

    #[test]
    fn register_then_lookup() {
        let mut t = CommandTable::new();
        t.register("foo", noop, None).unwrap();
        assert!(t.lookup("foo").is_some());
    }

    #[test]
    fn register_duplicate_errors() {
        let mut t = CommandTable::new();
        t.register("foo", noop, None).unwrap();
        assert!(t.register("foo", noop, None).is_err());
    }

    #[test]
    fn rename_round_trip_is_identity() {
        let mut t = CommandTable::new();
        t.register("foo", noop, None).unwrap();
        t.rename("foo", "bar").unwrap();
        assert!(t.lookup("bar").is_some());
        assert!(t.lookup("foo").is_none());
        t.rename("bar", "foo").unwrap();
        assert!(t.lookup("foo").is_some());
        assert!(t.lookup("bar").is_none());
    }

    #[test]
    fn rename_to_empty_deletes() {
        let mut t = CommandTable::new();
        t.register("foo", noop, None).unwrap();
        t.rename("foo", "").unwrap();
        assert!(t.lookup("foo").is_none());
    }

    #[test]
    fn djb2_is_deterministic() {
        assert_eq!(djb2("set"), djb2("set"));
        assert_ne!(djb2("set"), djb2("unset"));
    }
}
