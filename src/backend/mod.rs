pub mod documents;
pub mod graphql;
pub mod subscription;

pub use graphql::{BackendError, GraphQL, GraphQLError};
pub use subscription::{SubscriptionClient, SubscriptionError, SubscriptionHandle};

#[cfg(test)]
use mockall::automock;

use crate::{
    config::{BackendConfig, verbose},
    models::Task,
};
use async_trait::async_trait;
use eyre::{Context, Result};
use std::sync::Arc;

/// Backend is the request/response side of the task API. Mutations return
/// as soon as the backend accepts them; the resulting state change arrives
/// through the subscriptions.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Backend {
    fn name(&self) -> &str;
    async fn list_tasks(&self) -> Result<Vec<Task>>;
    async fn create_task(&self, title: String) -> Result<Task>;
    async fn update_task(&self, id: String, title: String) -> Result<Task>;
    async fn delete_task(&self, id: String) -> Result<()>;
}

pub type ArcBackend = Arc<dyn Backend + Send + Sync>;

pub fn new_backend(config: &BackendConfig) -> Result<ArcBackend> {
    if config.endpoint.is_empty() {
        eyre::bail!("No backend endpoint configured");
    }

    url::Url::parse(&config.endpoint)
        .wrap_err(format!("parsing endpoint {}", config.endpoint))?;

    let graphql: GraphQL = config.into();
    verbose!("  [+] Using backend {} at {}", graphql.name(), graphql.endpoint());
    log::debug!("Backend endpoint: {}", graphql.endpoint());
    Ok(graphql.into())
}

pub fn new_subscription_client(config: &BackendConfig) -> Result<SubscriptionClient> {
    let endpoint = config
        .realtime_endpoint()
        .wrap_err("resolving realtime endpoint")?;

    let mut client = SubscriptionClient::new(&endpoint).with_ack_timeout(config.ack_timeout());
    if let Some(api_key) = config.api_key.as_deref() {
        client = client.with_api_key(api_key);
    }
    if let Some(token) = config.auth_token.as_deref() {
        client = client.with_auth_token(token);
    }
    verbose!("  [+] Realtime endpoint {}", endpoint);
    Ok(client)
}
