//! Bot account identity

use async_trait::async_trait;

use crate::error::Result;

/// Resolves the account name clients should address signing requests to
#[async_trait]
pub trait AccountIdentity: Send + Sync {
    async fn username(&self) -> Result<String>;
}

/// A fixed, configured account name
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

#[async_trait]
impl AccountIdentity for StaticIdentity {
    async fn username(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
