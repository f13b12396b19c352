//! The transducer's alphabet: four symbol variants behind one value type.
//!
//! Symbols are value-compared and totally ordered. Ordering only matters for
//! deterministic encoder output; it is not semantically meaningful otherwise.

use std::fmt;

/// A single element of the transducer's alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    String(StringSymbol),
    Flag(FlagSymbol),
    Special(SpecialSymbol),
    Raw(RawSymbol),
}

impl Symbol {
    /// The canonical string form of the symbol.
    pub fn text(&self) -> String {
        match self {
            Symbol::String(s) => s.string.clone(),
            Symbol::Flag(f) => f.text(),
            Symbol::Special(s) => s.text().to_string(),
            Symbol::Raw(r) => r.text(),
        }
    }

    pub fn is_epsilon(&self) -> bool {
        match self {
            Symbol::String(_) => false,
            Symbol::Flag(_) => true,
            Symbol::Special(s) => matches!(s, SpecialSymbol::Epsilon),
            Symbol::Raw(r) => r.is_epsilon(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        match self {
            Symbol::String(s) => s.unknown,
            Symbol::Flag(_) => false,
            Symbol::Special(_) => false,
            Symbol::Raw(r) => r.is_unknown(),
        }
    }

    /// A convenience constructor for a plain string symbol (`unknown = false`).
    pub fn string(s: impl Into<String>) -> Self {
        Symbol::String(StringSymbol {
            string: s.into(),
            unknown: false,
        })
    }

    /// Parse a raw symbol string into its canonical `Symbol` form.
    ///
    /// This is a total function: anything that is not a recognized flag
    /// diacritic or special symbol becomes a plain `String` symbol.
    pub fn parse(s: &str) -> Symbol {
        if let Some(flag) = FlagSymbol::parse(s) {
            return Symbol::Flag(flag);
        }
        if let Some(special) = SpecialSymbol::parse(s) {
            return Symbol::Special(special);
        }
        Symbol::string(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// A symbol in the input alphabet: either a literal multi-character string or,
/// when `unknown` is set, a single scalar value standing in for "not in the
/// transducer's alphabet" (see [`crate::tokenizer`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringSymbol {
    pub string: String,
    pub unknown: bool,
}

/// The six flag diacritic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlagKind {
    /// Unify: set if neutral, pass if same value already set, fail otherwise.
    U,
    /// Require: fail unless the key is (or isn't, with a value, per the 2-arg form) set accordingly.
    R,
    /// Disallow: fail if the key is set per the given condition.
    D,
    /// Clear: remove the key's value, if any.
    C,
    /// Positive set: unconditionally set key to (true, value).
    P,
    /// Negative set: unconditionally set key to (false, value).
    N,
}

impl FlagKind {
    fn from_char(c: char) -> Option<FlagKind> {
        match c {
            'U' => Some(FlagKind::U),
            'R' => Some(FlagKind::R),
            'D' => Some(FlagKind::D),
            'C' => Some(FlagKind::C),
            'P' => Some(FlagKind::P),
            'N' => Some(FlagKind::N),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            FlagKind::U => 'U',
            FlagKind::R => 'R',
            FlagKind::D => 'D',
            FlagKind::C => 'C',
            FlagKind::P => 'P',
            FlagKind::N => 'N',
        }
    }
}

/// A flag diacritic symbol: `@K.key@` or `@K.key.value@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlagSymbol {
    pub kind: FlagKind,
    pub key: String,
    pub value: Option<String>,
}

impl FlagSymbol {
    pub fn text(&self) -> String {
        match &self.value {
            Some(v) => format!("@{}.{}.{}@", self.kind.as_char(), self.key, v),
            None => format!("@{}.{}@", self.kind.as_char(), self.key),
        }
    }

    /// Returns `true` if `s` matches the flag diacritic grammar: starts and
    /// ends with `@`, has a recognized one-letter kind at index 1 followed by
    /// `.`, and is longer than 4 characters.
    pub fn looks_like_flag(s: &str) -> bool {
        if s.chars().count() <= 4 {
            return false;
        }
        let bytes = s.as_bytes();
        bytes[0] == b'@'
            && bytes[bytes.len() - 1] == b'@'
            && FlagKind::from_char(bytes[1] as char).is_some()
            && bytes[2] == b'.'
    }

    /// Parse a flag diacritic symbol string, or `None` if it doesn't match
    /// the grammar in [`FlagSymbol::looks_like_flag`].
    pub fn parse(s: &str) -> Option<FlagSymbol> {
        if !Self::looks_like_flag(s) {
            return None;
        }
        let kind = FlagKind::from_char(s.as_bytes()[1] as char)?;
        // Rightmost '.' separates key from an optional value; the dot at
        // index 2 (right after the kind letter) is the fallback when there
        // is no second dot.
        let last_dot = s.rfind('.').unwrap();
        let (key, value) = if last_dot > 3 {
            (&s[3..last_dot], Some(s[last_dot + 1..s.len() - 1].to_string()))
        } else {
            (&s[3..s.len() - 1], None)
        };
        Some(FlagSymbol {
            kind,
            key: key.to_string(),
            value,
        })
    }
}

/// The three special symbols: epsilon, identity and unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecialSymbol {
    Epsilon,
    Identity,
    Unknown,
}

impl SpecialSymbol {
    pub fn text(self) -> &'static str {
        match self {
            SpecialSymbol::Epsilon => "@_EPSILON_SYMBOL_@",
            SpecialSymbol::Identity => "@_IDENTITY_SYMBOL_@",
            SpecialSymbol::Unknown => "@_UNKNOWN_SYMBOL_@",
        }
    }

    pub fn parse(s: &str) -> Option<SpecialSymbol> {
        match s {
            "@0@" | "@_EPSILON_SYMBOL_@" => Some(SpecialSymbol::Epsilon),
            "@_IDENTITY_SYMBOL_@" => Some(SpecialSymbol::Identity),
            "@_UNKNOWN_SYMBOL_@" => Some(SpecialSymbol::Unknown),
            _ => None,
        }
    }
}

/// A 15-byte caller-tagged symbol, for embedding cheap custom metadata
/// without going through a dynamic dispatch.
///
/// Byte 0's lowest bit marks the symbol as epsilon; the second-lowest bit
/// marks it as unknown. The remaining 14 bytes are caller-defined payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawSymbol(pub [u8; 15]);

impl RawSymbol {
    const EPSILON_BIT: u8 = 0b01;
    const UNKNOWN_BIT: u8 = 0b10;

    /// Build a raw symbol from a 14-byte payload and the epsilon/unknown flags.
    pub fn new(payload: [u8; 14], epsilon: bool, unknown: bool) -> Self {
        let mut bytes = [0u8; 15];
        let mut tag = 0u8;
        if epsilon {
            tag |= Self::EPSILON_BIT;
        }
        if unknown {
            tag |= Self::UNKNOWN_BIT;
        }
        bytes[0] = tag;
        bytes[1..].copy_from_slice(&payload);
        RawSymbol(bytes)
    }

    pub fn is_epsilon(&self) -> bool {
        self.0[0] & Self::EPSILON_BIT != 0
    }

    pub fn is_unknown(&self) -> bool {
        self.0[0] & Self::UNKNOWN_BIT != 0
    }

    pub fn payload(&self) -> &[u8; 14] {
        self.0[1..].try_into().unwrap()
    }

    pub fn text(&self) -> String {
        format!("RawSymbol({:?})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_string() {
        let s = Symbol::parse("abc");
        assert_eq!(s.text(), "abc");
        assert!(!s.is_epsilon());
        assert!(!s.is_unknown());
    }

    #[test]
    fn parses_epsilon_zero() {
        assert_eq!(Symbol::parse("@0@"), Symbol::Special(SpecialSymbol::Epsilon));
    }

    #[test]
    fn parses_epsilon_named() {
        assert_eq!(
            Symbol::parse("@_EPSILON_SYMBOL_@"),
            Symbol::Special(SpecialSymbol::Epsilon)
        );
    }

    #[test]
    fn parses_identity_and_unknown() {
        assert_eq!(
            Symbol::parse("@_IDENTITY_SYMBOL_@"),
            Symbol::Special(SpecialSymbol::Identity)
        );
        assert_eq!(
            Symbol::parse("@_UNKNOWN_SYMBOL_@"),
            Symbol::Special(SpecialSymbol::Unknown)
        );
    }

    #[test]
    fn special_symbols_are_epsilon_only_for_epsilon() {
        assert!(Symbol::parse("@0@").is_epsilon());
        assert!(!Symbol::parse("@_IDENTITY_SYMBOL_@").is_epsilon());
        assert!(!Symbol::parse("@_UNKNOWN_SYMBOL_@").is_epsilon());
    }

    #[test]
    fn parses_two_param_flag() {
        let s = Symbol::parse("@P.CASE.NOM@");
        match &s {
            Symbol::Flag(f) => {
                assert_eq!(f.kind, FlagKind::P);
                assert_eq!(f.key, "CASE");
                assert_eq!(f.value.as_deref(), Some("NOM"));
            }
            _ => panic!("expected flag symbol"),
        }
        assert!(s.is_epsilon());
        assert_eq!(s.text(), "@P.CASE.NOM@");
    }

    #[test]
    fn parses_one_param_flag() {
        let s = Symbol::parse("@R.CASE@");
        match &s {
            Symbol::Flag(f) => {
                assert_eq!(f.kind, FlagKind::R);
                assert_eq!(f.key, "CASE");
                assert_eq!(f.value, None);
            }
            _ => panic!("expected flag symbol"),
        }
        assert_eq!(s.text(), "@R.CASE@");
    }

    #[test]
    fn rejects_too_short_as_flag() {
        // "@P@" has length 3, <= 4, so it must fall back to a plain string.
        let s = Symbol::parse("@P@");
        assert!(matches!(s, Symbol::String(_)));
    }

    #[test]
    fn rejects_unknown_flag_letter() {
        let s = Symbol::parse("@X.FOO@");
        assert!(matches!(s, Symbol::String(_)));
    }

    #[test]
    fn unknown_string_symbol_is_unknown() {
        let s = Symbol::String(StringSymbol {
            string: "x".to_string(),
            unknown: true,
        });
        assert!(s.is_unknown());
        assert!(!s.is_epsilon());
    }

    #[test]
    fn raw_symbol_flags() {
        let r = RawSymbol::new([0; 14], true, false);
        assert!(r.is_epsilon());
        assert!(!r.is_unknown());
        let r2 = RawSymbol::new([0; 14], false, true);
        assert!(!r2.is_epsilon());
        assert!(r2.is_unknown());
    }

    #[test]
    fn symbols_with_same_fields_are_equal() {
        assert_eq!(Symbol::string("a"), Symbol::string("a"));
        assert_ne!(Symbol::string("a"), Symbol::string("b"));
    }

    #[test]
    fn multibyte_flag_value_roundtrips() {
        let s = Symbol::parse("@P.CASE.GENETIIVI\u{00e4}@");
        match &s {
            Symbol::Flag(f) => assert_eq!(f.value.as_deref(), Some("GENETIIVI\u{00e4}")),
            _ => panic!("expected flag symbol"),
        }
    }
}
