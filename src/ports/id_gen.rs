//! ID generator port for producing unique staging folder names.

/// Generates unique identifiers.
///
/// Staging folders are named from these IDs, so a predictable sequence
/// can be substituted in tests.
pub trait IdGenerator: Send + Sync {
    /// Generates a new unique identifier string.
    fn generate_id(&self) -> String;
}
