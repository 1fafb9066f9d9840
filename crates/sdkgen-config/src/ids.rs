use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Source of identifiers: lockfile ids, tracked-file breadcrumbs and random
/// filename suffixes. Swappable so tests can pin values.
pub trait IdGenerator: Send + Sync {
    /// A fresh RFC 4122 v4 UUID in canonical hyphenated form.
    fn uuid(&self) -> String;
    /// A random lowercase alphanumeric string of `len` characters.
    fn random_string(&self, len: usize) -> String;
}

/// Default generator backed by the operating system's random source.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn uuid(&self) -> String {
        let mut bytes = [0u8; 16];
        fill_random(&mut bytes);
        format_uuid_v4(bytes)
    }

    fn random_string(&self, len: usize) -> String {
        let mut bytes = vec![0u8; len];
        fill_random(&mut bytes);
        bytes
            .into_iter()
            .map(|b| ALPHANUMERIC[b as usize % ALPHANUMERIC.len()] as char)
            .collect()
    }
}

/// Deterministic generator yielding `00000000-0000-4000-8000-000000000001`, `...2`, …
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: Mutex<u64>,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u64 {
        let mut counter = self.counter.lock();
        *counter += 1;
        *counter
    }
}

impl IdGenerator for SequentialIds {
    fn uuid(&self) -> String {
        format!("00000000-0000-4000-8000-{:012x}", self.next())
    }

    fn random_string(&self, len: usize) -> String {
        let value = format!("{:0width$}", self.next(), width = len);
        value[value.len() - len..].to_string()
    }
}

fn fill_random(bytes: &mut [u8]) {
    if getrandom::getrandom(bytes).is_err() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        for (idx, b) in bytes.iter_mut().enumerate() {
            *b = ((now >> ((idx % 16) * 8)) & 0xFF) as u8;
        }
    }
}

fn format_uuid_v4(mut bytes: [u8; 16]) -> String {
    // Set version (4) and variant (RFC 4122).
    bytes[6] = (bytes[6] & 0x0F) | 0x40;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;

    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_uuid_has_v4_shape() {
        let id = RandomIds.uuid();
        let parts: Vec<_> = id.split('-').collect();
        assert_eq!(parts.iter().map(|p| p.len()).collect::<Vec<_>>(), [8, 4, 4, 4, 12]);
        assert!(parts[2].starts_with('4'));
        assert!(matches!(parts[3].chars().next(), Some('8' | '9' | 'a' | 'b')));
        assert_ne!(RandomIds.uuid(), id);
    }

    #[test]
    fn random_string_is_alphanumeric() {
        let value = RandomIds.random_string(12);
        assert_eq!(value.len(), 12);
        assert!(value.bytes().all(|b| ALPHANUMERIC.contains(&b)));
    }

    #[test]
    fn sequential_ids_are_deterministic() {
        let ids = SequentialIds::new();
        assert_eq!(ids.uuid(), "00000000-0000-4000-8000-000000000001");
        assert_eq!(ids.random_string(4), "0002");
        assert_eq!(ids.uuid(), "00000000-0000-4000-8000-000000000003");
    }
}
