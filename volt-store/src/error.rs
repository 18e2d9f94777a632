/// Errors produced by the resource stores.
#[derive(Debug)]
pub enum StoreError {
    /// No resource with the requested id or name.
    NotFound(String),
    /// The resource is declared in the file store and cannot be written.
    Immutable(String),
    /// An id or name collision within the database store.
    Conflict(String),
    /// A database driver error.
    Database(Box<dyn std::error::Error + Send + Sync>),
    /// Anything else: corrupt declarations, serialization failures.
    Internal(String),
}

impl StoreError {
    /// Construct a `Database` variant from any driver error type.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Database(Box::new(err))
    }

    /// Whether the error is the caller's fault (4xx) rather than ours.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::Immutable(_) | StoreError::Conflict(_)
        )
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(msg) => write!(f, "Not found: {msg}"),
            StoreError::Immutable(msg) => write!(f, "Resource is immutable: {msg}"),
            StoreError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            StoreError::Database(err) => write!(f, "Database error: {err}"),
            StoreError::Internal(msg) => write!(f, "Store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
