use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        repo_types::User,
    },
    config::AuthDbConfig,
    db,
    error::{AuthError, Result},
    storage::{user_indexes, MongoCollection, UserCollection},
};

lazy_static! {
    // Verified against when the username is unknown so both login failures cost the same.
    static ref DUMMY_HASH: Option<String> = hash_password("authstore-dummy-password").ok();
}

/// Read side of the auth store as seen by transport layers, which can swap
/// in their own implementation.
#[async_trait]
pub trait AuthDb: Send + Sync {
    fn collection(&self) -> &Arc<dyn UserCollection>;
    async fn user_by_uuid(&self, uuid: Uuid) -> Result<User>;
    async fn login(&self, credentials: &User) -> Result<User>;
}

/// Handle to a bootstrapped user collection. Cheap to clone and share.
#[derive(Clone)]
pub struct AuthStore {
    collection: Arc<dyn UserCollection>,
}

impl AuthStore {
    /// Connects to MongoDB and makes sure the user collection and its
    /// indexes exist.
    #[instrument(skip(config), fields(database = %config.database, collection = %config.collection))]
    pub async fn ensure(config: &AuthDbConfig) -> Result<Self> {
        let client = db::connect(config).await?;
        let collection = MongoCollection::new(client.database(&config.database), &config.collection);
        Self::bootstrap(Arc::new(collection)).await
    }

    /// Applies the collection/index contract to any collection implementation.
    pub async fn bootstrap(collection: Arc<dyn UserCollection>) -> Result<Self> {
        collection.ensure(&user_indexes()).await?;
        lazy_static::initialize(&DUMMY_HASH);
        info!(collection = %collection.name(), "auth store ready");
        Ok(Self { collection })
    }

    pub fn collection(&self) -> &Arc<dyn UserCollection> {
        &self.collection
    }

    /// Returns the first stored user matching the non-zero fields of `template`.
    async fn find_one(&self, template: &User) -> Result<Option<User>> {
        let docs = self.collection.find(template.to_filter()?).await?;
        docs.into_iter().next().map(User::from_document).transpose()
    }

    #[instrument(skip(self))]
    pub async fn user_by_uuid(&self, uuid: Uuid) -> Result<User> {
        if uuid.is_nil() {
            return Err(AuthError::NotFound);
        }
        let template = User {
            uuid,
            ..Default::default()
        };
        self.find_one(&template).await?.ok_or(AuthError::NotFound)
    }

    /// Checks a username and plaintext password against the stored hash.
    ///
    /// Unknown usernames and wrong passwords yield the same
    /// [`AuthError::InvalidCredentials`].
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &User) -> Result<User> {
        if credentials.username.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        let template = User {
            username: credentials.username.clone(),
            ..Default::default()
        };

        let Some(user) = self.find_one(&template).await? else {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&credentials.password, hash);
            }
            return Err(AuthError::InvalidCredentials);
        };

        match verify_password(&credentials.password, &user.password) {
            Ok(true) => {
                debug!(uuid = %user.uuid, "login verified");
                Ok(user)
            }
            Ok(false) | Err(_) => Err(AuthError::InvalidCredentials),
        }
    }

    /// Inserts `user` and returns it with the storage id filled in. The
    /// password must already be hashed.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(&self, user: &User) -> Result<User> {
        let id = self.collection.insert(user.to_document()?).await?;
        debug!(%id, "user created");
        Ok(User {
            id: Some(id),
            ..user.clone()
        })
    }
}

#[async_trait]
impl AuthDb for AuthStore {
    fn collection(&self) -> &Arc<dyn UserCollection> {
        AuthStore::collection(self)
    }

    async fn user_by_uuid(&self, uuid: Uuid) -> Result<User> {
        AuthStore::user_by_uuid(self, uuid).await
    }

    async fn login(&self, credentials: &User) -> Result<User> {
        AuthStore::login(self, credentials).await
    }
}
