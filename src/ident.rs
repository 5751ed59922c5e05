//! Identifier generation for instances and bindings
//!
//! Identifiers only need to be unique among the views mounted in one
//! document (dozens to a few hundred bindings). They are not
//! cryptographically secure and must not be used as secrets.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;

/// The set of characters an identifier is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Lower,
    Upper,
    Digits,
    LowerUpper,
    LowerDigits,
    UpperDigits,
    #[default]
    LowerUpperDigits,
}

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";

impl CharacterClass {
    pub fn alphabet(self) -> Vec<u8> {
        let parts: &[&str] = match self {
            CharacterClass::Lower => &[LOWER],
            CharacterClass::Upper => &[UPPER],
            CharacterClass::Digits => &[DIGITS],
            CharacterClass::LowerUpper => &[LOWER, UPPER],
            CharacterClass::LowerDigits => &[LOWER, DIGITS],
            CharacterClass::UpperDigits => &[UPPER, DIGITS],
            CharacterClass::LowerUpperDigits => &[LOWER, UPPER, DIGITS],
        };
        parts.iter().flat_map(|p| p.bytes()).collect()
    }

    /// Whether every character of this class is unaffected by lowercasing
    pub fn is_lowercase_safe(self) -> bool {
        matches!(
            self,
            CharacterClass::Lower | CharacterClass::Digits | CharacterClass::LowerDigits
        )
    }
}

/// Source of identifiers, injectable so tests can use deterministic ids
pub trait IdGenerator {
    /// Return `prefix + <length characters of class> + suffix`
    fn generate(&mut self, length: usize, prefix: &str, suffix: &str, class: CharacterClass)
        -> String;
}

/// A generator shared by a view and the views nested inside it
pub type SharedIdGenerator = Rc<RefCell<dyn IdGenerator>>;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Default generator: a per-process random seed mixed with a global counter
#[derive(Debug, Clone)]
pub struct RandomIdGenerator {
    seed: u64,
}

impl RandomIdGenerator {
    /// Seed from the operating system, falling back to the clock
    pub fn new() -> Self {
        let mut bytes = [0u8; 8];
        let seed = match getrandom::fill(&mut bytes) {
            Ok(()) => u64::from_le_bytes(bytes),
            Err(err) => {
                tracing::warn!(error = %err, "OS randomness unavailable, seeding from clock");
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0x9e37_79b9_7f4a_7c15)
            }
        };
        Self { seed }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

impl IdGenerator for RandomIdGenerator {
    fn generate(
        &mut self,
        length: usize,
        prefix: &str,
        suffix: &str,
        class: CharacterClass,
    ) -> String {
        let alphabet = class.alphabet();
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut state = self.seed ^ n.wrapping_mul(0xd6e8_feb8_6659_fd93);

        let mut out = String::with_capacity(prefix.len() + length + suffix.len());
        out.push_str(prefix);
        for _ in 0..length {
            let idx = (splitmix64(&mut state) % alphabet.len() as u64) as usize;
            out.push(alphabet[idx] as char);
        }
        out.push_str(suffix);
        out
    }
}

/// Deterministic generator: encodes an incrementing counter in the class
/// alphabet, left-padded with the alphabet's first character
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(
        &mut self,
        length: usize,
        prefix: &str,
        suffix: &str,
        class: CharacterClass,
    ) -> String {
        let alphabet = class.alphabet();
        let base = alphabet.len() as u64;
        let mut n = self.next;
        self.next += 1;

        let mut digits = vec![alphabet[0]; length];
        for slot in digits.iter_mut().rev() {
            *slot = alphabet[(n % base) as usize];
            n /= base;
        }

        let mut out = String::with_capacity(prefix.len() + length + suffix.len());
        out.push_str(prefix);
        out.extend(digits.into_iter().map(char::from));
        out.push_str(suffix);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_prefix_suffix_and_length() {
        let mut ids = RandomIdGenerator::new();
        let id = ids.generate(16, "pre-", "-post", CharacterClass::Lower);
        assert!(id.starts_with("pre-"));
        assert!(id.ends_with("-post"));
        assert_eq!(id.len(), 4 + 16 + 5);
    }

    #[test]
    fn test_character_class_respected() {
        let mut ids = RandomIdGenerator::with_seed(7);
        for _ in 0..50 {
            let id = ids.generate(16, "", "", CharacterClass::Lower);
            assert!(id.bytes().all(|b| b.is_ascii_lowercase()));
            let id = ids.generate(8, "", "", CharacterClass::Digits);
            assert!(id.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_random_ids_distinct() {
        let mut ids = RandomIdGenerator::with_seed(1);
        let generated: HashSet<String> = (0..500)
            .map(|_| ids.generate(16, "", "", CharacterClass::LowerUpperDigits))
            .collect();
        assert_eq!(generated.len(), 500);
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIdGenerator::new();
        assert_eq!(ids.generate(4, "", "", CharacterClass::Lower), "aaaa");
        assert_eq!(ids.generate(4, "", "", CharacterClass::Lower), "aaab");
        assert_eq!(ids.generate(4, "x", "", CharacterClass::Digits), "x0002");
        assert_eq!(ids.generate(0, "p", "s", CharacterClass::Lower), "ps");
    }

    #[test]
    fn test_lowercase_safety() {
        assert!(CharacterClass::Lower.is_lowercase_safe());
        assert!(CharacterClass::LowerDigits.is_lowercase_safe());
        assert!(!CharacterClass::LowerUpper.is_lowercase_safe());
    }
}
