use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Persisted data violates an invariant the capacity engine relies on.
    #[error("Integrity violation: {0}")]
    Integrity(String),
}
