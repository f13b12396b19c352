//! Flag diacritic state: a persistent key -> (polarity, value) mapping
//! threaded through path exploration, plus the six-operation check algorithm
//! (U, R, D, C, P, N).
//!
//! `FlagState` is a functional singly-linked list (an `Rc` chain): every
//! update returns a new handle while leaving the old one intact, which is
//! exactly what branching path exploration needs -- many branches can each
//! hold their own flag state without copying a map per branch. Lookup walks
//! the chain from the most recent entry, so a later update for the same key
//! shadows an earlier one rather than mutating it in place.

use std::rc::Rc;

use crate::symbol::{FlagKind, FlagSymbol};

struct Node {
    key: String,
    /// `None` is a tombstone recording that `key` was cleared by a `C` flag.
    entry: Option<(bool, String)>,
    next: Option<Rc<Node>>,
}

/// An immutable flag-diacritic state. Cloning is `O(1)` (an `Rc` bump).
#[derive(Clone, Default)]
pub struct FlagState(Option<Rc<Node>>);

impl FlagState {
    pub fn new() -> Self {
        FlagState(None)
    }

    /// Look up the current (polarity, value) pair for `key`, if set.
    pub fn get(&self, key: &str) -> Option<(bool, &str)> {
        let mut cur = self.0.as_deref();
        while let Some(node) = cur {
            if node.key == key {
                return node.entry.as_ref().map(|(p, v)| (*p, v.as_str()));
            }
            cur = node.next.as_deref();
        }
        None
    }

    /// Return a new state with `key` set to `(polarity, value)`.
    pub fn set(&self, key: &str, polarity: bool, value: &str) -> FlagState {
        self.push(key, Some((polarity, value.to_string())))
    }

    /// Return a new state with `key` cleared, if it was present; otherwise
    /// returns a clone of `self` unchanged.
    pub fn clear(&self, key: &str) -> FlagState {
        if self.get(key).is_some() {
            self.push(key, None)
        } else {
            self.clone()
        }
    }

    fn push(&self, key: &str, entry: Option<(bool, String)>) -> FlagState {
        FlagState(Some(Rc::new(Node {
            key: key.to_string(),
            entry,
            next: self.0.clone(),
        })))
    }

    /// Apply a flag diacritic symbol against this state, following the
    /// per-kind acceptance rule. Returns `None` if the transition carrying
    /// this flag must be rejected.
    pub fn apply(&self, flag: &FlagSymbol) -> Option<FlagState> {
        apply_flag(flag.kind, &flag.key, flag.value.as_deref(), self)
    }
}

/// The core P/C/U/R/D/N algorithm, decoupled from `FlagSymbol` for testing.
pub fn apply_flag(kind: FlagKind, key: &str, value: Option<&str>, state: &FlagState) -> Option<FlagState> {
    match kind {
        FlagKind::U => {
            let v = value.expect("U flag diacritics always carry a value");
            match state.get(key) {
                None => Some(state.set(key, true, v)),
                Some((true, val)) if val == v => Some(state.clone()),
                Some((false, val)) if val != v => Some(state.set(key, true, v)),
                _ => None,
            }
        }
        FlagKind::R => match value {
            Some(v) => {
                if require_condition(state, key, v) {
                    Some(state.clone())
                } else {
                    None
                }
            }
            None => {
                if state.get(key).is_some() {
                    Some(state.clone())
                } else {
                    None
                }
            }
        },
        FlagKind::D => match value {
            Some(v) => {
                if require_condition(state, key, v) {
                    None
                } else {
                    Some(state.clone())
                }
            }
            None => {
                if state.get(key).is_some() {
                    None
                } else {
                    Some(state.clone())
                }
            }
        },
        FlagKind::C => Some(state.clear(key)),
        FlagKind::P => {
            let v = value.expect("P flag diacritics always carry a value");
            Some(state.set(key, true, v))
        }
        FlagKind::N => {
            let v = value.expect("N flag diacritics always carry a value");
            Some(state.set(key, false, v))
        }
    }
}

/// Shared acceptance condition for the two-argument `R`/`D` forms: the key is
/// set and either positively to `value`, or negatively to anything else.
fn require_condition(state: &FlagState, key: &str, value: &str) -> bool {
    match state.get(key) {
        Some((true, val)) => val == value,
        Some((false, val)) => val != value,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s() -> FlagState {
        FlagState::new()
    }

    #[test]
    fn unify_sets_neutral_key() {
        let r = apply_flag(FlagKind::U, "CASE", Some("NOM"), &s()).unwrap();
        assert_eq!(r.get("CASE"), Some((true, "NOM")));
    }

    #[test]
    fn unify_passes_on_same_value() {
        let st = s().set("CASE", true, "NOM");
        let r = apply_flag(FlagKind::U, "CASE", Some("NOM"), &st).unwrap();
        assert_eq!(r.get("CASE"), Some((true, "NOM")));
    }

    #[test]
    fn unify_fails_on_different_value() {
        let st = s().set("CASE", true, "NOM");
        assert!(apply_flag(FlagKind::U, "CASE", Some("GEN"), &st).is_none());
    }

    #[test]
    fn unify_succeeds_after_negative_mismatch() {
        let st = s().set("CASE", false, "NOM");
        let r = apply_flag(FlagKind::U, "CASE", Some("GEN"), &st).unwrap();
        assert_eq!(r.get("CASE"), Some((true, "GEN")));
    }

    #[test]
    fn unify_fails_when_negatively_excluded_value_matches() {
        let st = s().set("CASE", false, "NOM");
        assert!(apply_flag(FlagKind::U, "CASE", Some("NOM"), &st).is_none());
    }

    #[test]
    fn require_two_arg_matches_positive() {
        let st = s().set("NUM", true, "SG");
        assert!(apply_flag(FlagKind::R, "NUM", Some("SG"), &st).is_some());
        assert!(apply_flag(FlagKind::R, "NUM", Some("PL"), &st).is_none());
    }

    #[test]
    fn require_two_arg_matches_negative() {
        let st = s().set("NUM", false, "SG");
        assert!(apply_flag(FlagKind::R, "NUM", Some("PL"), &st).is_some());
        assert!(apply_flag(FlagKind::R, "NUM", Some("SG"), &st).is_none());
    }

    #[test]
    fn require_two_arg_fails_when_absent() {
        assert!(apply_flag(FlagKind::R, "NUM", Some("SG"), &s()).is_none());
    }

    #[test]
    fn require_one_arg_succeeds_iff_present() {
        assert!(apply_flag(FlagKind::R, "NUM", None, &s()).is_none());
        let st = s().set("NUM", true, "SG");
        assert!(apply_flag(FlagKind::R, "NUM", None, &st).is_some());
    }

    #[test]
    fn disallow_two_arg_rejects_exactly_when_require_would_accept() {
        let st = s().set("POSS", true, "1SG");
        assert!(apply_flag(FlagKind::D, "POSS", Some("1SG"), &st).is_none());
        assert!(apply_flag(FlagKind::D, "POSS", Some("2SG"), &st).is_some());
    }

    #[test]
    fn disallow_one_arg_accepts_iff_absent() {
        assert!(apply_flag(FlagKind::D, "POSS", None, &s()).is_some());
        let st = s().set("POSS", true, "1SG");
        assert!(apply_flag(FlagKind::D, "POSS", None, &st).is_none());
    }

    #[test]
    fn clear_removes_key() {
        let st = s().set("CASE", true, "NOM");
        let r = apply_flag(FlagKind::C, "CASE", None, &st).unwrap();
        assert_eq!(r.get("CASE"), None);
    }

    #[test]
    fn clear_is_noop_on_absent_key() {
        let r = apply_flag(FlagKind::C, "CASE", None, &s()).unwrap();
        assert_eq!(r.get("CASE"), None);
    }

    #[test]
    fn clear_idempotence() {
        // Traversing C.K twice with no intermediate setter yields the same
        // state as traversing it once.
        let st = s().set("CASE", true, "NOM");
        let once = apply_flag(FlagKind::C, "CASE", None, &st).unwrap();
        let twice = apply_flag(FlagKind::C, "CASE", None, &once).unwrap();
        assert_eq!(once.get("CASE"), twice.get("CASE"));
        assert_eq!(twice.get("CASE"), None);
    }

    #[test]
    fn positive_set_overwrites_any_prior_value() {
        let st = s().set("CASE", false, "NOM");
        let r = apply_flag(FlagKind::P, "CASE", Some("GEN"), &st).unwrap();
        assert_eq!(r.get("CASE"), Some((true, "GEN")));
    }

    #[test]
    fn negative_set_records_polarity_false() {
        let r = apply_flag(FlagKind::N, "CASE", Some("NOM"), &s()).unwrap();
        assert_eq!(r.get("CASE"), Some((false, "NOM")));
    }

    #[test]
    fn old_handle_is_untouched_by_update() {
        let old = s().set("CASE", true, "NOM");
        let new = old.set("CASE", true, "GEN");
        assert_eq!(old.get("CASE"), Some((true, "NOM")));
        assert_eq!(new.get("CASE"), Some((true, "GEN")));
    }

    #[test]
    fn apply_flag_symbol_dispatches_kind() {
        let flag = FlagSymbol {
            kind: FlagKind::P,
            key: "CASE".to_string(),
            value: Some("NOM".to_string()),
        };
        let st = FlagState::new();
        let r = st.apply(&flag).unwrap();
        assert_eq!(r.get("CASE"), Some((true, "NOM")));
    }
}
