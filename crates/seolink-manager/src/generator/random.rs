use crate::generator::IdGenerator;
use jiff::Timestamp;
use rand::Rng;
use seolink_core::RedirectId;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_LEN: usize = 9;

/// Random base36 segment followed by the creation time in base36
/// milliseconds, e.g. `k3j9x0q2alrx5v1m8`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

fn base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> RedirectId {
        let mut rng = rand::thread_rng();
        let mut id: String = (0..RANDOM_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        let millis = u64::try_from(Timestamp::now().as_millisecond()).unwrap_or_default();
        id.push_str(&base36(millis));
        RedirectId::new_unchecked(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_encodes() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
        assert_eq!(base36(1_705_276_800_000), "lre5s000");
    }

    #[test]
    fn ids_are_lowercase_alphanumeric_and_parse() {
        let generator = RandomIdGenerator::new();
        let id = generator.generate();

        assert!(id.as_str().len() > RANDOM_LEN);
        assert!(id
            .as_str()
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
        assert!(RedirectId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn ids_differ() {
        let generator = RandomIdGenerator::new();
        let ids: std::collections::HashSet<_> = (0..100).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 100);
    }
}
