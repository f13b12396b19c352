//! The line-oriented AT&T-style textual format.
//!
//! Each non-blank line is a tab-separated record describing either a final
//! state or a transition; see [`decode`] for the exact field shapes. Symbol
//! text is escaped so that a literal tab or space inside a symbol's own text
//! can never be mistaken for a field separator.

use crate::symbol::Symbol;
use crate::transducer::{FinalStates, Rules, StateId};
use crate::{FormatError, Transducer};

const TAB_ESCAPE: &str = "@_TAB_@";
const SPACE_ESCAPE: &str = "@_SPACE_@";

/// Parse a transducer from its textual (AT&T) byte representation.
///
/// Blank lines are skipped. Any other line must have 1, 2, 4 or 5
/// tab-separated fields; anything else is a [`FormatError::BadLine`].
pub fn decode(bytes: &[u8]) -> Result<Transducer, FormatError> {
    let text = std::str::from_utf8(bytes)?;
    let mut final_states = FinalStates::new();
    let mut rules: Rules = Rules::new();
    let mut symbols: Vec<Symbol> = Vec::new();

    for (offset, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let line_no = offset + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        match fields.len() {
            1 => {
                let state = parse_state(fields[0], line_no)?;
                final_states.insert(state, 0.0);
            }
            2 => {
                let state = parse_state(fields[0], line_no)?;
                let weight = parse_weight(fields[1], line_no)?;
                final_states.insert(state, weight);
            }
            4 | 5 => {
                let from = parse_state(fields[0], line_no)?;
                let to = parse_state(fields[1], line_no)?;
                let input = Symbol::parse(&unescape(fields[2]));
                let output = Symbol::parse(&unescape(fields[3]));
                let weight = if fields.len() == 5 { parse_weight(fields[4], line_no)? } else { 0.0 };
                symbols.push(input.clone());
                symbols.push(output.clone());
                rules.entry(from).or_default().entry(input).or_default().push((to, output, weight));
            }
            fields => return Err(FormatError::BadLine { line_no, fields }),
        }
    }

    Ok(Transducer::from_rules(final_states, rules, symbols, false))
}

/// Serialize a transducer to its textual (AT&T) byte representation.
///
/// Deterministic: final states and transitions are written in the
/// transducer's stored order (see [`crate::transducer::Transducer`]).
pub fn encode(t: &Transducer) -> Vec<u8> {
    let mut out = String::new();

    for (state, weight) in t.final_states_in_stored_order() {
        if weight == 0.0 {
            out.push_str(&format!("{state}\n"));
        } else {
            out.push_str(&format!("{state}\t{weight}\n"));
        }
    }

    for (from, transitions) in t.states_in_stored_order() {
        for (input, arcs) in transitions {
            let i = escape(&input.text());
            for (to, output, weight) in arcs {
                let o = escape(&output.text());
                if *weight == 0.0 {
                    out.push_str(&format!("{from}\t{to}\t{i}\t{o}\n"));
                } else {
                    out.push_str(&format!("{from}\t{to}\t{i}\t{o}\t{weight}\n"));
                }
            }
        }
    }

    out.into_bytes()
}

fn parse_state(field: &str, line_no: usize) -> Result<StateId, FormatError> {
    field.parse().map_err(|source| FormatError::BadInteger { line_no, source })
}

fn parse_weight(field: &str, line_no: usize) -> Result<f64, FormatError> {
    field.parse().map_err(|source| FormatError::BadWeight { line_no, source })
}

fn unescape(field: &str) -> String {
    field.replace(TAB_ESCAPE, "\t").replace(SPACE_ESCAPE, " ")
}

fn escape(text: &str) -> String {
    text.replace('\t', TAB_ESCAPE).replace(' ', SPACE_ESCAPE)
}
