use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod error;
pub mod list_criteria;
pub mod pagination;
pub mod responses;
pub mod stream;
pub mod upload;

mod auth;
mod metrics;
pub mod router;

pub use auth::{
    catalog_roles::CatalogRoles,
    oauth::OAuthConfig,
    roles::Roles,
    token::{AuthState, AuthStateCreationErr, RefreshJwksErr, StaticToken, validate_token},
    user::AuthedUser,
};
pub use metrics::{MetricsSetupErr, setup_recorder};

#[derive(Debug, Default)]
pub struct ArwLock<T>(Arc<RwLock<T>>);

impl<T> ArwLock<T> {
    pub fn new(data: T) -> Self {
        Self(Arc::new(RwLock::new(data)))
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().await
    }
}

// derived Clone would require T: Clone
impl<T> Clone for ArwLock<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}
