use async_trait::async_trait;
use mongodb::{
    bson::{oid::ObjectId, Bson, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::{debug, info};

use super::{IndexSpec, UserCollection};
use crate::error::{AuthError, Result};

const DUPLICATE_KEY: i32 = 11000;
const NAMESPACE_EXISTS: i32 = 48;

/// [`UserCollection`] backed by a MongoDB collection.
#[derive(Clone)]
pub struct MongoCollection {
    db: Database,
    collection: Collection<Document>,
}

impl MongoCollection {
    pub fn new(db: Database, name: &str) -> Self {
        let collection = db.collection::<Document>(name);
        Self { db, collection }
    }

    async fn ensure_collection(&self) -> Result<()> {
        let name = self.collection.name();
        let existing = self
            .db
            .list_collection_names()
            .await
            .map_err(|e| AuthError::schema(name, e))?;
        if existing.iter().any(|n| n == name) {
            debug!(collection = %name, "collection exists");
            return Ok(());
        }

        match self.db.create_collection(name).await {
            Ok(()) => {
                info!(collection = %name, "collection created");
                Ok(())
            }
            // lost a race with another bootstrap
            Err(e) if command_code(&e) == Some(NAMESPACE_EXISTS) => Ok(()),
            Err(e) => Err(AuthError::schema(name, e)),
        }
    }
}

fn index_model(spec: &IndexSpec) -> IndexModel {
    let mut options = IndexOptions::default();
    options.name = Some(spec.name.to_string());
    options.unique = Some(spec.unique);
    if spec.sparse {
        options.sparse = Some(true);
    }

    let mut keys = Document::new();
    keys.insert(spec.field, if spec.descending { -1 } else { 1 });

    let mut model = IndexModel::default();
    model.keys = keys;
    model.options = Some(options);
    model
}

fn command_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(c) => Some(c.code),
        _ => None,
    }
}

fn write_error(err: &MongoError) -> Option<(i32, &str)> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(w)) => Some((w.code, w.message.as_str())),
        _ => None,
    }
}

#[async_trait]
impl UserCollection for MongoCollection {
    fn name(&self) -> &str {
        self.collection.name()
    }

    async fn ensure(&self, indexes: &[IndexSpec]) -> Result<()> {
        self.ensure_collection().await?;

        let models: Vec<IndexModel> = indexes.iter().map(index_model).collect();
        // createIndexes is a no-op for identical specs and fails on conflicting ones
        self.collection
            .create_indexes(models)
            .await
            .map_err(|e| AuthError::schema(self.collection.name(), e))?;
        debug!(collection = %self.collection.name(), count = indexes.len(), "indexes ensured");
        Ok(())
    }

    async fn find(&self, filter: Document) -> Result<Vec<Document>> {
        let mut cursor = self
            .collection
            .find(filter)
            .await
            .map_err(|e| AuthError::query("error querying users", e))?;

        let mut docs = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| AuthError::query("error reading user cursor", e))?
        {
            let doc = cursor
                .deserialize_current()
                .map_err(|e| AuthError::query("error reading user cursor", e))?;
            docs.push(doc);
        }
        Ok(docs)
    }

    async fn insert(&self, doc: Document) -> Result<ObjectId> {
        let result = self.collection.insert_one(doc).await.map_err(|e| {
            if let Some((DUPLICATE_KEY, message)) = write_error(&e) {
                return AuthError::Duplicate(message.to_string());
            }
            AuthError::query("error inserting user", e)
        })?;
        match result.inserted_id {
            Bson::ObjectId(id) => Ok(id),
            other => Err(AuthError::query(
                "error inserting user",
                format!("unexpected _id type: {other}"),
            )),
        }
    }
}
