//! Greedy longest-match segmentation of a string into a transducer's symbol
//! alphabet.

use crate::symbol::{StringSymbol, Symbol};
use crate::transducer::Transducer;

/// Split `text` into symbols of `t`'s alphabet, scanning symbols longest-text-first.
///
/// At each cursor position the longest `String` symbol whose text is a
/// prefix of the remaining input is emitted. If none matches and
/// `allow_unknown` is true, a single scalar value is emitted as an
/// `unknown` string symbol; if `allow_unknown` is false, the whole call
/// fails and returns `None`.
pub fn split_to_symbols(t: &Transducer, text: &str, allow_unknown: bool) -> Option<Vec<Symbol>> {
    let mut remaining = text;
    let mut out = Vec::new();

    while !remaining.is_empty() {
        let mut matched = false;
        for symbol in t.symbols() {
            if let Symbol::String(s) = symbol {
                if !s.unknown && remaining.starts_with(s.string.as_str()) {
                    out.push(symbol.clone());
                    remaining = &remaining[s.string.len()..];
                    matched = true;
                    break;
                }
            }
        }
        if matched {
            continue;
        }
        if !allow_unknown {
            return None;
        }
        let ch = remaining.chars().next().expect("remaining is non-empty");
        out.push(Symbol::String(StringSymbol {
            string: ch.to_string(),
            unknown: true,
        }));
        remaining = &remaining[ch.len_utf8()..];
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transducer::{FinalStates, Rules};

    fn transducer_with_symbols(texts: &[&str]) -> Transducer {
        Transducer::from_rules(
            FinalStates::new(),
            Rules::new(),
            texts.iter().map(|t| Symbol::string(*t)),
            false,
        )
    }

    #[test]
    fn maximal_munch_prefers_the_longest_symbol() {
        let t = transducer_with_symbols(&["a", "b", "ab"]);
        let symbols = split_to_symbols(&t, "ab", true).unwrap();
        assert_eq!(symbols, vec![Symbol::string("ab")]);
    }

    #[test]
    fn falls_back_to_unknown_scalar_when_nothing_matches() {
        let t = transducer_with_symbols(&["a"]);
        let symbols = split_to_symbols(&t, "a\u{1f408}", true).unwrap();
        assert_eq!(symbols.len(), 2);
        assert!(symbols[1].is_unknown());
        assert_eq!(symbols[1].text(), "\u{1f408}");
    }

    #[test]
    fn fails_without_allow_unknown() {
        let t = transducer_with_symbols(&["a"]);
        assert!(split_to_symbols(&t, "ax", false).is_none());
    }

    #[test]
    fn concatenated_texts_reconstruct_the_input() {
        let t = transducer_with_symbols(&["a", "b"]);
        let symbols = split_to_symbols(&t, "ab", true).unwrap();
        let joined: String = symbols.iter().map(Symbol::text).collect();
        assert_eq!(joined, "ab");
    }
}
