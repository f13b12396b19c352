//! The compressed KFST binary format.
//!
//! A short uncompressed header (magic, version, counts, symbol table) is
//! followed by an LZMA-compressed body holding the transition and
//! final-state records. See the module-level layout table in the project's
//! design notes for the exact byte shapes; this module is the only place
//! that needs to know them.

use hashbrown::HashMap;
use indexmap::IndexMap;
use std::io::{Read, Write};

use crate::symbol::Symbol;
use crate::transducer::{FinalStates, Rule, Rules, StateId};
use crate::{CapacityError, FormatError, Transducer, MAX_ENTRIES, MAX_SYMBOLS};

const MAGIC: &[u8; 4] = b"KFST";
const VERSION: u16 = 0;

/// Parse a transducer from its compressed KFST binary representation.
pub fn decode(bytes: &[u8]) -> Result<Transducer, FormatError> {
    let mut header = Reader::new(bytes);
    header.expect_magic()?;
    let version = header.read_u16()?;
    if version != VERSION {
        return Err(FormatError::UnsupportedVersion { version });
    }
    let num_symbols = header.read_u16()? as usize;
    let num_transitions = header.read_u32()? as usize;
    let num_final_states = header.read_u32()? as usize;
    let is_weighted = header.read_u8()? != 0;

    let mut symbols_list = Vec::with_capacity(num_symbols);
    for _ in 0..num_symbols {
        symbols_list.push(Symbol::parse(&header.read_null_terminated_utf8()?));
    }

    let body_bytes = xz_decompress(header.remaining())?;
    let mut body = Reader::new(&body_bytes);

    let mut rules: Rules = Rules::new();
    for _ in 0..num_transitions {
        let from = body.read_u32()?;
        let to = body.read_u32()?;
        let in_idx = body.read_u16()? as usize;
        let out_idx = body.read_u16()? as usize;
        let weight = if is_weighted { body.read_f64()? } else { 0.0 };
        let input = symbol_at(&symbols_list, in_idx)?;
        let output = symbol_at(&symbols_list, out_idx)?;
        rules.entry(from).or_default().entry(input).or_default().push((to, output, weight));
    }

    let mut final_states = FinalStates::new();
    for _ in 0..num_final_states {
        let state = body.read_u32()?;
        let weight = if is_weighted { body.read_f64()? } else { 0.0 };
        final_states.insert(state, weight);
    }

    Ok(Transducer::from_rules(final_states, rules, symbols_list, false))
}

/// Serialize a transducer to its compressed KFST binary representation.
///
/// Deterministic given identical input: the symbol table is sorted by
/// `(length, text)` and the transition block is written in ascending
/// source-state order, preserving stored order within a state.
pub fn encode(t: &Transducer) -> Result<Vec<u8>, CapacityError> {
    if t.symbols().len() > MAX_SYMBOLS {
        return Err(CapacityError::TooManySymbols { count: t.symbols().len() });
    }

    let mut symbols_list: Vec<Symbol> = t.symbols().to_vec();
    symbols_list.sort_by_key(|s| {
        let text = s.text();
        (text.chars().count(), text)
    });
    let index_of: HashMap<&Symbol, u16> = symbols_list.iter().enumerate().map(|(i, s)| (s, i as u16)).collect();

    let num_transitions: u64 = t
        .states_in_stored_order()
        .flat_map(|(_, inner)| inner.values())
        .map(|arcs| arcs.len() as u64)
        .sum();
    if num_transitions > MAX_ENTRIES {
        return Err(CapacityError::TooManyTransitions { count: num_transitions });
    }

    let num_final_states = t.final_states_in_stored_order().count() as u64;
    if num_final_states > MAX_ENTRIES {
        return Err(CapacityError::TooManyFinalStates { count: num_final_states });
    }

    let is_weighted = t.final_states_in_stored_order().any(|(_, w)| w != 0.0)
        || t.states_in_stored_order()
            .flat_map(|(_, inner)| inner.values())
            .flat_map(|arcs| arcs.iter())
            .any(|(_, _, w)| *w != 0.0);

    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_be_bytes());
    out.extend_from_slice(&(symbols_list.len() as u16).to_be_bytes());
    out.extend_from_slice(&(num_transitions as u32).to_be_bytes());
    out.extend_from_slice(&(num_final_states as u32).to_be_bytes());
    out.push(is_weighted as u8);
    for s in &symbols_list {
        out.extend_from_slice(s.text().as_bytes());
        out.push(0);
    }

    let mut body = Vec::new();
    let mut states: Vec<(StateId, &IndexMap<Symbol, Vec<Rule>>)> = t.states_in_stored_order().collect();
    states.sort_by_key(|(state, _)| *state);
    for (from, inner) in states {
        for (input, arcs) in inner {
            let in_idx = index_of[input];
            for (to, output, weight) in arcs {
                let out_idx = index_of[output];
                body.extend_from_slice(&from.to_be_bytes());
                body.extend_from_slice(&to.to_be_bytes());
                body.extend_from_slice(&in_idx.to_be_bytes());
                body.extend_from_slice(&out_idx.to_be_bytes());
                if is_weighted {
                    body.extend_from_slice(&weight.to_be_bytes());
                }
            }
        }
    }
    for (state, weight) in t.final_states_in_stored_order() {
        body.extend_from_slice(&state.to_be_bytes());
        if is_weighted {
            body.extend_from_slice(&weight.to_be_bytes());
        }
    }

    out.extend_from_slice(&xz_compress(&body));
    Ok(out)
}

fn symbol_at(list: &[Symbol], index: usize) -> Result<Symbol, FormatError> {
    list.get(index)
        .cloned()
        .ok_or(FormatError::SymbolIndexOutOfRange { index: index as u32, count: list.len() })
}

fn xz_decompress(bytes: &[u8]) -> Result<Vec<u8>, FormatError> {
    let mut decoder = xz2::read::XzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

fn xz_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
    encoder.write_all(data).expect("writing to an in-memory buffer cannot fail");
    encoder.finish().expect("LZMA compression of an in-memory buffer cannot fail")
}

/// A cursor over an uncompressed byte slice, used for both the plaintext
/// header and the decompressed body.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.pos + n > self.data.len() {
            return Err(FormatError::TruncatedStream {
                expected: n,
                actual: self.data.len() - self.pos,
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn expect_magic(&mut self) -> Result<(), FormatError> {
        if self.take(4)? != MAGIC {
            return Err(FormatError::BadMagic);
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn read_u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_f64(&mut self) -> Result<f64, FormatError> {
        Ok(f64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_null_terminated_utf8(&mut self) -> Result<String, FormatError> {
        let rest = self.remaining();
        let nul = rest.iter().position(|&b| b == 0).ok_or(FormatError::TruncatedStream {
            expected: 1,
            actual: 0,
        })?;
        let s = std::str::from_utf8(&rest[..nul])?.to_string();
        self.pos += nul + 1;
        Ok(s)
    }
}
