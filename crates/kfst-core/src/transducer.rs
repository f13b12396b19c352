//! The immutable in-memory transducer value.

use indexmap::IndexMap;
use std::cmp::Reverse;
use std::path::Path;

use crate::engine::{self, AlignedLookupIter, LookupIter, PathState, RunFstIter};
use crate::format::{att, binary};
use crate::symbol::Symbol;
use crate::tokenizer;
use crate::{CapacityError, FormatError, TokenizationError};

/// A transducer state index. State 0 is the initial state by convention.
pub type StateId = u32;

/// One outgoing arc: `(next_state, output_symbol, weight)`.
pub type Rule = (StateId, Symbol, f64);

/// Final-state weights, keyed in first-seen (decode or construction) order.
pub type FinalStates = IndexMap<StateId, f64>;

/// Transition table, keyed in first-seen order at both the state and the
/// input-symbol level. Using an order-preserving map here -- rather than
/// `hashbrown::HashMap`, which is what the rest of this crate reaches for --
/// is what lets the textual codec's "stored order" contract mean something:
/// re-encoding a just-decoded transducer reproduces the original line order.
pub type Rules = IndexMap<StateId, IndexMap<Symbol, Vec<Rule>>>;

/// An immutable weighted finite-state transducer.
///
/// Produced once, by one of the decoders or by [`Transducer::from_rules`],
/// and read-only thereafter. Path enumeration ([`crate::engine`]) allocates
/// its own scratch state per call and never mutates a `Transducer`.
#[derive(Debug, Clone)]
pub struct Transducer {
    pub(crate) final_states: FinalStates,
    pub(crate) rules: Rules,
    /// All symbols appearing in any transition, in descending order of
    /// `text()` length (the tokenizer's maximal-munch contract), with ties
    /// broken by the symbol's own total order for determinism.
    pub(crate) symbols: Vec<Symbol>,
    pub debug: bool,
}

impl Transducer {
    /// Low-level constructor: establishes the reverse-length symbol order
    /// that the tokenizer depends on.
    pub fn from_rules(final_states: FinalStates, rules: Rules, symbols: impl IntoIterator<Item = Symbol>, debug: bool) -> Transducer {
        let mut symbols: Vec<Symbol> = symbols.into_iter().collect();
        symbols.sort_by_key(|s| (Reverse(s.text().chars().count()), s.clone()));
        symbols.dedup();
        Transducer {
            final_states,
            rules,
            symbols,
            debug,
        }
    }

    /// All distinct symbols known to this transducer, longest-text-first.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn is_final(&self, state: StateId) -> bool {
        self.final_states.contains_key(&state)
    }

    pub fn final_weight(&self, state: StateId) -> Option<f64> {
        self.final_states.get(&state).copied()
    }

    /// Deduplicated input symbols on all outgoing transitions of `state`.
    ///
    /// `O(arity of state)`: this only walks the rule map for `state`, never
    /// the whole transducer, so callers in tight loops can ask the question
    /// without materializing anything beyond the relevant state's arcs.
    pub fn input_symbols(&self, state: StateId) -> impl Iterator<Item = &Symbol> {
        self.rules.get(&state).into_iter().flat_map(|m| m.keys())
    }

    pub(crate) fn transitions(&self, state: StateId, input: &Symbol) -> &[Rule] {
        self.rules
            .get(&state)
            .and_then(|m| m.get(input))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn transitions_for_state(&self, state: StateId) -> Option<&IndexMap<Symbol, Vec<Rule>>> {
        self.rules.get(&state)
    }

    /// States and their transition maps in stored (first-seen) order.
    pub(crate) fn states_in_stored_order(&self) -> impl Iterator<Item = (StateId, &IndexMap<Symbol, Vec<Rule>>)> {
        self.rules.iter().map(|(&state, m)| (state, m))
    }

    /// Final states and weights in stored (first-seen) order.
    pub(crate) fn final_states_in_stored_order(&self) -> impl Iterator<Item = (StateId, f64)> {
        self.final_states.iter().map(|(&state, &w)| (state, w))
    }

    // ------------------------------------------------------------------
    // Textual (AT&T) codec
    // ------------------------------------------------------------------

    pub fn from_textual_bytes(bytes: &[u8]) -> Result<Transducer, FormatError> {
        att::decode(bytes)
    }

    pub fn from_textual_file(path: impl AsRef<Path>) -> Result<Transducer, FormatError> {
        let bytes = std::fs::read(path)?;
        Self::from_textual_bytes(&bytes)
    }

    pub fn to_textual_bytes(&self) -> Vec<u8> {
        att::encode(self)
    }

    pub fn to_textual_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_textual_bytes())
    }

    // ------------------------------------------------------------------
    // Binary (KFST) codec
    // ------------------------------------------------------------------

    pub fn from_binary_bytes(bytes: &[u8]) -> Result<Transducer, FormatError> {
        binary::decode(bytes)
    }

    pub fn from_binary_file(path: impl AsRef<Path>) -> Result<Transducer, FormatError> {
        let bytes = std::fs::read(path)?;
        Self::from_binary_bytes(&bytes)
    }

    pub fn to_binary_bytes(&self) -> Result<Vec<u8>, CapacityError> {
        binary::encode(self)
    }

    pub fn to_binary_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let bytes = self
            .to_binary_bytes()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, bytes)
    }

    // ------------------------------------------------------------------
    // Tokenisation and path enumeration
    // ------------------------------------------------------------------

    /// Segment `text` into this transducer's alphabet by greedy longest match.
    pub fn split_to_symbols(&self, text: &str, allow_unknown: bool) -> Option<Vec<Symbol>> {
        tokenizer::split_to_symbols(self, text, allow_unknown)
    }

    /// Enumerate every path over `input`, starting from `start`.
    pub fn run_fst(&self, input: Vec<Symbol>, start: PathState) -> RunFstIter<'_> {
        engine::run_fst(self, input, start)
    }

    /// Tokenise, enumerate and collapse `text` into weight-ordered, deduplicated
    /// `(output_string, weight)` pairs.
    pub fn lookup(&self, text: &str, start_state: StateId, allow_unknown: bool) -> Result<LookupIter, TokenizationError> {
        engine::lookup(self, text, start_state, allow_unknown)
    }

    /// As [`Transducer::lookup`], additionally exposing per-output-symbol
    /// input alignment.
    pub fn lookup_aligned(
        &self,
        text: &str,
        start_state: StateId,
        allow_unknown: bool,
    ) -> Result<AlignedLookupIter, TokenizationError> {
        engine::lookup_aligned(self, text, start_state, allow_unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    #[test]
    fn from_rules_sorts_symbols_by_descending_length() {
        let mut rules = Rules::new();
        rules.insert(0, IndexMap::new());
        let t = Transducer::from_rules(
            FinalStates::new(),
            rules,
            [Symbol::string("a"), Symbol::string("abc"), Symbol::string("ab")],
            false,
        );
        let texts: Vec<String> = t.symbols().iter().map(Symbol::text).collect();
        assert_eq!(texts, vec!["abc", "ab", "a"]);
    }

    #[test]
    fn input_symbols_is_scoped_to_one_state() {
        let mut inner = IndexMap::new();
        inner.insert(Symbol::string("a"), vec![(1u32, Symbol::string("A"), 0.0)]);
        let mut rules = Rules::new();
        rules.insert(0u32, inner);
        let t = Transducer::from_rules(FinalStates::new(), rules, [Symbol::string("a"), Symbol::string("A")], false);
        let syms: Vec<&Symbol> = t.input_symbols(0).collect();
        assert_eq!(syms.len(), 1);
        assert!(t.input_symbols(1).next().is_none());
    }

    #[test]
    fn stored_order_matches_insertion_order() {
        let mut rules = Rules::new();
        rules.insert(5, IndexMap::new());
        rules.insert(1, IndexMap::new());
        rules.insert(3, IndexMap::new());
        let t = Transducer::from_rules(FinalStates::new(), rules, [], false);
        let order: Vec<StateId> = t.states_in_stored_order().map(|(s, _)| s).collect();
        assert_eq!(order, vec![5, 1, 3]);
    }
}
