/// Opaque identifiers are UUIDv4 strings, stored as plain `String` columns
/// rather than native UUID types, keeping the schema transport-agnostic.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
