use crate::db::models::User;
use crate::db::sqlite::UserStore;
use crate::error::{Outcome, UserError};
use crate::service::validation::validate_create_user;
use crate::types::user::CreateUser;
use tracing::{debug, error, info, warn};

/// Caller-facing user workflows on top of a [`UserStore`].
#[derive(Clone)]
pub struct UserOps {
    storage: UserStore,
}

impl UserOps {
    pub fn new(storage: UserStore) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &UserStore {
        &self.storage
    }

    /// Validate, insert atomically, then read the user back by its new id.
    ///
    /// A read-back miss right after a committed insert is reported as
    /// [`UserError::Consistency`], distinct from validation or constraint errors.
    pub async fn create_user(&self, input: &CreateUser) -> Result<User, UserError> {
        let candidate = validate_create_user(input).inspect_err(|e| {
            warn!(email = ?input.email, violations = e.violations().len(), "create user rejected")
        })?;

        let inserted = self.storage.insert_user(&candidate).await?;

        match self.storage.get_user_by_id(inserted.id).await? {
            Some(user) => {
                info!(id = user.id, email = %user.email, "user created");
                Ok(user)
            }
            None => {
                error!(id = inserted.id, "created user missing on read-back");
                Err(UserError::Consistency { id: inserted.id })
            }
        }
    }

    /// Same as [`Self::create_user`], folded into a tagged [`Outcome`].
    pub async fn create_user_outcome(&self, input: &CreateUser) -> Outcome<User> {
        self.create_user(input).await.into()
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<User, UserError> {
        self.storage
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| UserError::not_found(format!("id {id}")))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, UserError> {
        self.storage
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| UserError::not_found(format!("email {email}")))
    }

    /// Never fails for lack of matches; an empty vec is a normal answer.
    pub async fn get_users_with_name_like(
        &self,
        first_name_pattern: &str,
        last_name_pattern: &str,
    ) -> Result<Vec<User>, UserError> {
        self.storage
            .get_users_with_name_like(first_name_pattern, last_name_pattern)
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.storage.list_users().await
    }

    /// Delete every user, then every address.
    pub async fn reset(&self) -> Result<(), UserError> {
        let users = self.storage.delete_all_users().await?;
        let addresses = self.storage.delete_all_addresses().await?;
        debug!(users, addresses, "user store reset");
        Ok(())
    }
}
