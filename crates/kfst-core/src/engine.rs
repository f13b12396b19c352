//! Nondeterministic path enumeration and the high-level `lookup` query.
//!
//! `run_fst` explores the transducer depth-first over an explicit work
//! stack rather than native recursion, so that long epsilon chains cannot
//! blow the call stack -- one of the two mechanisms the search is allowed
//! to use; the yield order it produces is identical to a recursive,
//! depth-first walk in stored transition order.

use hashbrown::HashSet;

use crate::flags::FlagState;
use crate::symbol::{Symbol, SpecialSymbol};
use crate::transducer::{StateId, Transducer};
use crate::TokenizationError;

/// A snapshot of one branch of path exploration.
#[derive(Debug, Clone)]
pub struct PathState {
    pub state: StateId,
    pub weight: f64,
    pub input_flags: FlagState,
    pub output_flags: FlagState,
    pub output_symbols: Vec<Symbol>,
    /// The input-symbol index that produced each entry of `output_symbols`,
    /// one-to-one. Only meaningful to callers that asked for alignment.
    pub input_indices: Vec<usize>,
}

impl PathState {
    /// The default starting path state: `state`, zero weight, empty flags
    /// and output.
    pub fn initial(state: StateId) -> PathState {
        PathState {
            state,
            weight: 0.0,
            input_flags: FlagState::new(),
            output_flags: FlagState::new(),
            output_symbols: Vec::new(),
            input_indices: Vec::new(),
        }
    }
}

/// One pending call frame: "continue exploring from `path` with
/// `remaining_start` input symbols left to consume."
struct Task {
    path: PathState,
    remaining_start: usize,
    post_input_advance: bool,
}

/// Lazy depth-first enumeration of `(finished, post_input_advance, path_state)`
/// triples, as specified for `run_fst`.
pub struct RunFstIter<'t> {
    transducer: &'t Transducer,
    input: Vec<Symbol>,
    stack: Vec<Task>,
}

impl<'t> RunFstIter<'t> {
    pub fn new(transducer: &'t Transducer, input: Vec<Symbol>, start: PathState) -> RunFstIter<'t> {
        RunFstIter {
            transducer,
            input,
            stack: vec![Task {
                path: start,
                remaining_start: 0,
                post_input_advance: false,
            }],
        }
    }

    fn build_child(
        &self,
        task: &Task,
        transition_isymbol: &Symbol,
        next_state: StateId,
        osymbol: &Symbol,
        weight_delta: f64,
        isymbol: Option<&Symbol>,
    ) -> Option<Task> {
        if self.transducer.debug {
            eprintln!(
                "{} -> {} {transition_isymbol} {osymbol} weight={weight_delta} isymbol={}",
                task.path.state,
                isymbol.map(Symbol::text).unwrap_or_default(),
            );
        }

        let new_output_flags = update_flags(osymbol, &task.path.output_flags)?;
        let new_input_flags = update_flags(transition_isymbol, &task.path.input_flags)?;

        let emitted = if let Some(is) = isymbol {
            if matches!(osymbol, Symbol::Special(SpecialSymbol::Identity)) {
                Some(is.clone())
            } else if !osymbol.is_epsilon() {
                Some(osymbol.clone())
            } else {
                None
            }
        } else if !osymbol.is_epsilon() {
            Some(osymbol.clone())
        } else {
            None
        };

        let mut output_symbols = task.path.output_symbols.clone();
        let mut input_indices = task.path.input_indices.clone();
        if let Some(sym) = emitted {
            input_indices.push(task.remaining_start);
            output_symbols.push(sym);
        }

        let new_path = PathState {
            state: next_state,
            weight: task.path.weight + weight_delta,
            input_flags: new_input_flags,
            output_flags: new_output_flags,
            output_symbols,
            input_indices,
        };

        if transition_isymbol.is_epsilon() {
            let post_input_advance = task.remaining_start == self.input.len();
            Some(Task {
                path: new_path,
                remaining_start: task.remaining_start,
                post_input_advance,
            })
        } else {
            Some(Task {
                path: new_path,
                remaining_start: task.remaining_start + 1,
                post_input_advance: false,
            })
        }
    }
}

impl<'t> Iterator for RunFstIter<'t> {
    type Item = (bool, bool, PathState);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(task) = self.stack.pop() {
            let remaining_empty = task.remaining_start == self.input.len();
            let isymbol = if remaining_empty { None } else { Some(&self.input[task.remaining_start]) };

            let mut children: Vec<Task> = Vec::new();
            if let Some(transitions) = self.transducer.transitions_for_state(task.path.state) {
                for (transition_isymbol, rules) in transitions {
                    let take = transition_isymbol.is_epsilon() || isymbol.is_some_and(|s| s == transition_isymbol);
                    if take {
                        children.extend(
                            rules
                                .iter()
                                .filter_map(|(next_state, osymbol, weight)| {
                                    self.build_child(&task, transition_isymbol, *next_state, osymbol, *weight, isymbol)
                                }),
                        );
                    }
                }

                if let Some(is) = isymbol {
                    if is.is_unknown() {
                        for special in [SpecialSymbol::Unknown, SpecialSymbol::Identity] {
                            let special_symbol = Symbol::Special(special);
                            if let Some(rules) = transitions.get(&special_symbol) {
                                children.extend(rules.iter().filter_map(|(next_state, osymbol, weight)| {
                                    self.build_child(&task, &special_symbol, *next_state, osymbol, *weight, isymbol)
                                }));
                            }
                        }
                    }
                }
            }

            for child in children.into_iter().rev() {
                self.stack.push(child);
            }

            if remaining_empty {
                let finished = self.transducer.is_final(task.path.state);
                let mut reported = task.path;
                if finished {
                    reported.weight += self.transducer.final_weight(reported.state).unwrap_or(0.0);
                }
                return Some((finished, task.post_input_advance, reported));
            }
        }
        None
    }
}

/// Apply a transition's symbol to a flag state: a pass-through for any
/// non-flag symbol, the P/N/U/R/D/C algorithm for a flag diacritic.
fn update_flags(symbol: &Symbol, flags: &FlagState) -> Option<FlagState> {
    match symbol {
        Symbol::Flag(f) => flags.apply(f),
        _ => Some(flags.clone()),
    }
}

/// Enumerate every path of `transducer` over `input`, starting from `start`.
pub fn run_fst(transducer: &Transducer, input: Vec<Symbol>, start: PathState) -> RunFstIter<'_> {
    RunFstIter::new(transducer, input, start)
}

/// Lazy sequence of `(output_string, weight)` pairs, weight-ascending,
/// deduplicated by output string.
pub struct LookupIter {
    inner: std::vec::IntoIter<(String, f64)>,
}

impl Iterator for LookupIter {
    type Item = (String, f64);
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Lazy sequence of `((input_index, symbol) alignment, weight)` pairs.
pub struct AlignedLookupIter {
    inner: std::vec::IntoIter<(Vec<(usize, Symbol)>, f64)>,
}

impl Iterator for AlignedLookupIter {
    type Item = (Vec<(usize, Symbol)>, f64);
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Tokenise `text`, enumerate accepting paths, and return them weight-ascending,
/// deduplicated by output string (lowest-weight attestation wins).
pub fn lookup(transducer: &Transducer, text: &str, start_state: StateId, allow_unknown: bool) -> Result<LookupIter, TokenizationError> {
    let input = crate::tokenizer::split_to_symbols(transducer, text, allow_unknown).ok_or(TokenizationError)?;

    let mut accepted: Vec<(f64, String)> = run_fst(transducer, input, PathState::initial(start_state))
        .filter(|(finished, _, _)| *finished)
        .map(|(_, _, path)| {
            let text: String = path.output_symbols.iter().map(Symbol::text).collect();
            (path.weight, text)
        })
        .collect();
    accepted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for (weight, text) in accepted {
        if seen.insert(text.clone()) {
            out.push((text, weight));
        }
    }

    Ok(LookupIter { inner: out.into_iter() })
}

/// As [`lookup`], but additionally exposes the per-output-symbol input
/// index. Duplicates are detected on `(output_string, alignment)`.
pub fn lookup_aligned(
    transducer: &Transducer,
    text: &str,
    start_state: StateId,
    allow_unknown: bool,
) -> Result<AlignedLookupIter, TokenizationError> {
    let input = crate::tokenizer::split_to_symbols(transducer, text, allow_unknown).ok_or(TokenizationError)?;

    let mut accepted: Vec<(f64, Vec<(usize, Symbol)>, String)> = run_fst(transducer, input, PathState::initial(start_state))
        .filter(|(finished, _, _)| *finished)
        .map(|(_, _, path)| {
            let text: String = path.output_symbols.iter().map(Symbol::text).collect();
            let alignment: Vec<(usize, Symbol)> = path.input_indices.iter().copied().zip(path.output_symbols.iter().cloned()).collect();
            (path.weight, alignment, text)
        })
        .collect();
    accepted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut seen: HashSet<(String, Vec<(usize, Symbol)>)> = HashSet::new();
    let mut out = Vec::new();
    for (weight, alignment, text) in accepted {
        if seen.insert((text, alignment.clone())) {
            out.push((alignment, weight));
        }
    }

    Ok(AlignedLookupIter { inner: out.into_iter() })
}
