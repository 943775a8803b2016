//! Random staging-folder suffixes.

use uuid::Uuid;

use crate::ports::IdGenerator;

/// Hex-encoded v4 UUIDs: 32 characters, safe in any file name.
pub struct LiveIdGenerator;

impl IdGenerator for LiveIdGenerator {
    fn generate_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_hex_names() {
        let first = LiveIdGenerator.generate_id();
        let second = LiveIdGenerator.generate_id();

        assert_ne!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first.bytes().all(|b| b.is_ascii_hexdigit()));
    }
}
