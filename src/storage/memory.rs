use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;

use super::{IndexSpec, UserCollection};
use crate::error::{AuthError, Result};

/// In-process [`UserCollection`] for tests and local tooling. Emulates the
/// parts of MongoDB the store relies on: unique and sparse indexes,
/// `_id` assignment and equality filters.
pub struct MemoryCollection {
    name: String,
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    docs: Vec<Document>,
    indexes: Vec<IndexSpec>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(State::default()),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.docs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Value a document contributes to an index; `None` when a sparse index skips it.
fn index_key(doc: &Document, spec: &IndexSpec) -> Option<Bson> {
    match doc.get(spec.field) {
        Some(v) => Some(v.clone()),
        None if spec.sparse => None,
        None => Some(Bson::Null),
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(k, v)| doc.get(k) == Some(v))
}

#[async_trait]
impl UserCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ensure(&self, indexes: &[IndexSpec]) -> Result<()> {
        let mut state = self.state.write().await;
        for spec in indexes {
            if let Some(existing) = state.indexes.iter().find(|i| i.name == spec.name) {
                if existing != spec {
                    return Err(AuthError::schema(
                        &self.name,
                        format!("index '{}' already exists with different options", spec.name),
                    ));
                }
                continue;
            }

            if spec.unique {
                let mut seen: Vec<Bson> = Vec::new();
                for key in state.docs.iter().filter_map(|d| index_key(d, spec)) {
                    if seen.contains(&key) {
                        return Err(AuthError::schema(
                            &self.name,
                            format!("cannot build unique index '{}': duplicate {key}", spec.name),
                        ));
                    }
                    seen.push(key);
                }
            }
            state.indexes.push(spec.clone());
        }
        Ok(())
    }

    async fn find(&self, filter: Document) -> Result<Vec<Document>> {
        let state = self.state.read().await;
        Ok(state
            .docs
            .iter()
            .filter(|d| matches(d, &filter))
            .cloned()
            .collect())
    }

    async fn insert(&self, mut doc: Document) -> Result<ObjectId> {
        let mut state = self.state.write().await;

        let id = match doc.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => {
                return Err(AuthError::query(
                    "error inserting user",
                    format!("unsupported _id type: {other}"),
                ))
            }
            None => {
                let id = ObjectId::new();
                doc.insert("_id", id);
                id
            }
        };
        if state.docs.iter().any(|d| d.get_object_id("_id").ok() == Some(id)) {
            return Err(AuthError::Duplicate(format!("_id_ dup key: {id}")));
        }

        for spec in state.indexes.iter().filter(|i| i.unique) {
            let Some(key) = index_key(&doc, spec) else {
                continue;
            };
            if state.docs.iter().any(|d| index_key(d, spec).as_ref() == Some(&key)) {
                return Err(AuthError::Duplicate(format!(
                    "{} dup key: {{ {}: {key} }}",
                    spec.name, spec.field
                )));
            }
        }

        state.docs.push(doc);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::user_indexes;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let coll = MemoryCollection::new("users");
        coll.ensure(&user_indexes()).await.expect("first ensure");
        coll.ensure(&user_indexes()).await.expect("second ensure");
        assert_eq!(coll.state.read().await.indexes.len(), 3);
    }

    #[tokio::test]
    async fn ensure_rejects_conflicting_index_options() {
        let coll = MemoryCollection::new("users");
        coll.ensure(&user_indexes()).await.unwrap();

        let mut changed = user_indexes();
        changed[0].unique = false;
        let err = coll.ensure(&changed).await.unwrap_err();
        assert!(matches!(err, AuthError::Schema { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates() {
        let coll = MemoryCollection::new("users");
        coll.ensure(&user_indexes()).await.unwrap();

        coll.insert(doc! { "username": "alice", "version": 1_i64 }).await.unwrap();
        let err = coll
            .insert(doc! { "username": "alice", "version": 2_i64 })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Duplicate(ref m) if m.contains("username_index")));
        assert_eq!(coll.len().await, 1);
    }

    #[tokio::test]
    async fn sparse_index_ignores_missing_field() {
        let coll = MemoryCollection::new("users");
        coll.ensure(&user_indexes()).await.unwrap();

        coll.insert(doc! { "username": "a", "version": 1_i64 }).await.unwrap();
        coll.insert(doc! { "username": "b", "version": 2_i64 }).await.unwrap();
        assert_eq!(coll.len().await, 2);
    }

    #[tokio::test]
    async fn non_sparse_index_treats_missing_as_null() {
        let coll = MemoryCollection::new("users");
        assert!(coll.is_empty().await);
        coll.ensure(&user_indexes()).await.unwrap();

        coll.insert(doc! { "role": "guest", "version": 1_i64 }).await.unwrap();
        let err = coll
            .insert(doc! { "role": "guest", "version": 2_i64 })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Duplicate(ref m) if m.contains("username_index")));
        assert!(!coll.is_empty().await);
    }

    #[tokio::test]
    async fn version_index_skips_users_without_version() {
        let coll = MemoryCollection::new("users");
        coll.ensure(&user_indexes()).await.unwrap();

        coll.insert(doc! { "username": "a" }).await.unwrap();
        coll.insert(doc! { "username": "b" }).await.unwrap();
        assert_eq!(coll.len().await, 2);
    }

    #[tokio::test]
    async fn find_matches_every_filter_field() {
        let coll = MemoryCollection::new("users");
        coll.insert(doc! { "username": "a", "role": "admin" }).await.unwrap();
        coll.insert(doc! { "username": "b", "role": "admin" }).await.unwrap();

        assert_eq!(coll.find(doc! { "role": "admin" }).await.unwrap().len(), 2);
        let hits = coll
            .find(doc! { "role": "admin", "username": "b" })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].get_object_id("_id").is_ok());
        assert_eq!(coll.find(doc! {}).await.unwrap().len(), 2);
    }
}
