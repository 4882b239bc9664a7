//! Randomness for the reference engine: a seedable ChaCha8 [source::Source]
//! and the secret and error [distributions::Distribution]s sampled from it.

pub mod distributions;
pub mod source;
