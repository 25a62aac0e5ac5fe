use mongodb::bson;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the auth store and its collaborators.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("error creating database client")]
    Connection(#[source] BoxError),

    #[error("error ensuring collection '{collection}'")]
    Schema {
        collection: String,
        #[source]
        source: BoxError,
    },

    #[error("user not found")]
    NotFound,

    /// Shared by the unknown-username and wrong-password branches of login.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("error parsing uuid for user")]
    Parse(#[from] uuid::Error),

    #[error("error decoding user record")]
    Decode(#[from] bson::de::Error),

    #[error("error encoding user record")]
    Encode(#[from] bson::ser::Error),

    #[error("{context}")]
    Query {
        context: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl AuthError {
    pub(crate) fn schema(collection: &str, source: impl Into<BoxError>) -> Self {
        Self::Schema {
            collection: collection.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn query(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Query {
            context,
            source: source.into(),
        }
    }

    /// True for the failures a caller would surface as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

pub type Result<T, E = AuthError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn schema_error_keeps_cause_chain() {
        let err = AuthError::schema("users", "index options conflict");
        assert_eq!(err.to_string(), "error ensuring collection 'users'");
        let cause = err.source().expect("schema error has a source");
        assert_eq!(cause.to_string(), "index options conflict");
    }

    #[test]
    fn not_found_is_recognised() {
        assert!(AuthError::NotFound.is_not_found());
        assert!(!AuthError::InvalidCredentials.is_not_found());
    }
}
