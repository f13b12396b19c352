//! A weighted finite-state transducer (FST) runtime.
//!
//! Loads transducers from two interchange formats, segments input strings
//! into the transducer's symbol alphabet, and enumerates accepting paths
//! under HFST-compatible semantics of epsilons, identity/unknown symbols and
//! flag diacritics.
//!
//! # Architecture
//!
//! - [`symbol`] -- the four symbol variants and the symbol-string grammar
//! - [`flags`] -- persistent flag-diacritic state and the P/C/U/R/D/N algorithm
//! - [`transducer`] -- the immutable in-memory transducer value
//! - [`format::att`] -- line-oriented textual codec
//! - [`format::binary`] -- compressed KFST binary codec
//! - [`tokenizer`] -- greedy longest-match segmentation
//! - [`engine`] -- nondeterministic path enumeration and `lookup`

pub mod engine;
pub mod flags;
pub mod format;
pub mod symbol;
pub mod tokenizer;
pub mod transducer;

pub use engine::{AlignedLookupIter, LookupIter, PathState, RunFstIter};
pub use flags::FlagState;
pub use symbol::{FlagKind, RawSymbol, Symbol};
pub use transducer::{StateId, Transducer};

/// Maximum number of distinct symbols a binary-encoded transducer may carry.
///
/// The binary header stores this count in a `u16` field, so `65535` (not
/// `65536`) is the largest representable value.
pub const MAX_SYMBOLS: usize = u16::MAX as usize;

/// Maximum number of transitions or final states a binary-encoded transducer may carry.
pub const MAX_ENTRIES: u64 = 1 << 32;

/// Errors raised while decoding a transducer from bytes.
///
/// Fatal to the decode call: no partial transducer is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("malformed textual line {line_no}: expected 1, 2, 4 or 5 tab-separated fields, got {fields}")]
    BadLine { line_no: usize, fields: usize },
    #[error("invalid integer in textual line {line_no}: {source}")]
    BadInteger {
        line_no: usize,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("invalid weight in textual line {line_no}: {source}")]
    BadWeight {
        line_no: usize,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("invalid magic number in binary header")]
    BadMagic,
    #[error("unsupported binary format version {version}")]
    UnsupportedVersion { version: u16 },
    #[error("symbol index {index} out of range (table has {count} symbols)")]
    SymbolIndexOutOfRange { index: u32, count: usize },
    #[error("truncated binary stream: expected at least {expected} more bytes, got {actual}")]
    TruncatedStream { expected: usize, actual: usize },
    #[error("invalid UTF-8 in symbol table: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Covers both file I/O and LZMA stream failures -- the latter surface
    /// through `xz2`'s `Read`/`Write` adapters as plain `io::Error`s.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised by encoders when a transducer exceeds a format's capacity limits.
#[derive(Debug, thiserror::Error)]
pub enum CapacityError {
    #[error("too many symbols: {count} exceeds the {MAX_SYMBOLS} limit")]
    TooManySymbols { count: usize },
    #[error("too many transitions: {count} exceeds the {MAX_ENTRIES} limit")]
    TooManyTransitions { count: u64 },
    #[error("too many final states: {count} exceeds the {MAX_ENTRIES} limit")]
    TooManyFinalStates { count: u64 },
}

/// Raised by [`Transducer::lookup`] when the input cannot be segmented and
/// `allow_unknown` is false.
#[derive(Debug, thiserror::Error)]
#[error("input cannot be split into symbols of this transducer's alphabet")]
pub struct TokenizationError;
