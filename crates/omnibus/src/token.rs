//! Link-key token generation for omission entries.
//!
//! `meta.omitted.links` needs one key per omitted item, but link keys must
//! be strings and the spec favors link relation types as keys. `item` is the
//! right relation type, yet several omissions can coexist, so each key gets
//! a short random suffix. The token is deliberately meaningless: it must not
//! read as an identifier for the error.

use uuid::Uuid;

/// Length of the generated token suffix.
const TOKEN_LEN: usize = 7;

/// Source of unique link-key tokens.
///
/// Injected wherever omission links are rasterized, so tests can substitute
/// a deterministic sequence.
pub trait LinkKeyGenerator {
    /// Produce the next 7-character token.
    fn next_key(&mut self) -> String;
}

/// Production token source backed by UUIDv4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeys;

impl LinkKeyGenerator for UuidKeys {
    fn next_key(&mut self) -> String {
        Uuid::new_v4().simple().to_string()[..TOKEN_LEN].to_string()
    }
}

/// Deterministic token source for tests and reproducible output.
///
/// Yields `0000000`, `0000001`, ... zero-padded to the token width.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialKeys(u64);

impl SequentialKeys {
    /// Create a sequence starting at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinkKeyGenerator for SequentialKeys {
    fn next_key(&mut self) -> String {
        let key = format!("{:07}", self.0);
        self.0 += 1;
        key
    }
}
