//! Transducer interchange formats: the line-oriented AT&T-style textual
//! format and the compressed KFST binary format. Both round-trip through
//! [`crate::Transducer`].

pub mod att;
pub mod binary;
