use mongodb::bson::{self, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// User record as the rest of the crate sees it.
///
/// Zero values mean "not set": `None` id, nil uuid, empty strings, version 0.
/// A `User` with only some fields set doubles as a query-by-example template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: Option<ObjectId>,   // assigned by storage on insert
    pub uuid: Uuid,             // caller-assigned external reference
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,       // login handle, unique
    pub password: String,       // argon2 hash, never exposed in JSON
    pub role: String,
    pub version: i64,           // caller-allocated, unique
}

/// Sparse storage form of [`User`]. Zero-valued fields are left out of the
/// document entirely and decode back to their zero value.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct StoredUser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub version: i64,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

impl From<&User> for StoredUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            uuid: (!u.uuid.is_nil()).then(|| u.uuid.to_string()),
            email: u.email.clone(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            username: u.username.clone(),
            password: u.password.clone(),
            role: u.role.clone(),
            version: u.version,
        }
    }
}

impl TryFrom<StoredUser> for User {
    type Error = crate::error::AuthError;

    fn try_from(s: StoredUser) -> Result<Self> {
        let uuid = match s.uuid {
            Some(raw) => Uuid::parse_str(&raw)?,
            None => Uuid::nil(),
        };
        Ok(Self {
            id: s.id,
            uuid,
            email: s.email,
            first_name: s.first_name,
            last_name: s.last_name,
            username: s.username,
            password: s.password,
            role: s.role,
            version: s.version,
        })
    }
}

impl User {
    /// Storage encoding of this user.
    pub fn to_document(&self) -> Result<Document> {
        Ok(bson::to_document(&StoredUser::from(self))?)
    }

    /// Query-by-example filter: only the fields set on `self` constrain the match.
    pub fn to_filter(&self) -> Result<Document> {
        self.to_document()
    }

    /// Decodes a stored document. Absent fields become zero values; a field
    /// of the wrong type is a decode error and a malformed uuid a parse error.
    pub fn from_document(doc: Document) -> Result<Self> {
        let stored: StoredUser = bson::from_document(doc)?;
        User::try_from(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use mongodb::bson::doc;

    fn full_user() -> User {
        User {
            id: Some(ObjectId::new()),
            uuid: Uuid::new_v4(),
            email: "alice@example.com".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            username: "alice".into(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            role: "admin".into(),
            version: 7,
        }
    }

    #[test]
    fn document_roundtrip_preserves_every_field() {
        let user = full_user();
        let doc = user.to_document().expect("encode");
        assert_eq!(doc.get_str("uuid").unwrap(), user.uuid.to_string());
        assert_eq!(doc.get_i64("version").unwrap(), 7);
        let decoded = User::from_document(doc).expect("decode");
        assert_eq!(decoded, user);
    }

    #[test]
    fn zero_fields_are_omitted_and_decode_as_zero() {
        let user = User {
            username: "bob".into(),
            ..Default::default()
        };
        let doc = user.to_document().expect("encode");
        assert_eq!(doc, doc! { "username": "bob" });

        let decoded = User::from_document(doc).expect("decode");
        assert_eq!(decoded, user);
        assert!(decoded.uuid.is_nil());
        assert!(decoded.id.is_none());
    }

    #[test]
    fn filter_only_carries_populated_fields() {
        let uid = Uuid::new_v4();
        let template = User {
            uuid: uid,
            ..Default::default()
        };
        assert_eq!(
            template.to_filter().unwrap(),
            doc! { "uuid": uid.to_string() }
        );
        assert!(User::default().to_filter().unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_wrong_field_type() {
        let err = User::from_document(doc! { "username": 42 }).unwrap_err();
        assert!(matches!(err, AuthError::Decode(_)), "got {err:?}");

        let err = User::from_document(doc! { "_id": "not-an-object-id" }).unwrap_err();
        assert!(matches!(err, AuthError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn decode_rejects_malformed_uuid() {
        let err = User::from_document(doc! { "uuid": "not-a-uuid" }).unwrap_err();
        assert!(matches!(err, AuthError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn decode_tolerates_empty_document_and_unknown_fields() {
        let decoded = User::from_document(doc! { "created_by": "migration" }).expect("decode");
        assert_eq!(decoded, User::default());
    }
}
