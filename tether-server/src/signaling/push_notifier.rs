use async_trait::async_trait;
use tether_core::ClientId;

/// Trait the push transport implements so rooms can reach clients directly.
#[async_trait]
pub trait PushNotifier: Send + Sync {
    /// Makes `client_id` addressable. Returns the handle the client presents
    /// when it opens its channel.
    async fn register(&self, client_id: &ClientId) -> String;

    /// Delivers `message` now. Returns `false` if the client has no open
    /// channel.
    async fn send(&self, client_id: &ClientId, message: String) -> bool;
}
