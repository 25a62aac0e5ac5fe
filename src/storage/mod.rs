use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};

use crate::error::Result;

mod memory;
mod mongo;

pub use memory::MemoryCollection;
pub use mongo::MongoCollection;

/// One single-field index on the user collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub field: &'static str,
    pub unique: bool,
    pub descending: bool,
    /// Documents missing the field are left out of the index.
    pub sparse: bool,
}

/// Indexes every user collection must carry.
pub fn user_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec {
            name: "username_index",
            field: "username",
            unique: true,
            descending: false,
            sparse: false,
        },
        IndexSpec {
            name: "version_index",
            field: "version",
            unique: true,
            descending: true,
            sparse: true,
        },
        IndexSpec {
            name: "uuid_index",
            field: "uuid",
            unique: true,
            descending: false,
            sparse: true,
        },
    ]
}

/// Document collection the auth store runs against.
#[async_trait]
pub trait UserCollection: Send + Sync {
    fn name(&self) -> &str;

    /// Makes sure the collection and `indexes` exist. Safe to repeat; an
    /// existing index with the same name but different options is an error.
    async fn ensure(&self, indexes: &[IndexSpec]) -> Result<()>;

    /// Query-by-example: every field in `filter` must match.
    async fn find(&self, filter: Document) -> Result<Vec<Document>>;

    async fn insert(&self, doc: Document) -> Result<ObjectId>;
}
