//! Data provider seam for encoding
//!
//! The encoder never holds the whole object graph. It asks a provider for the
//! pathNames of a level, then for the objects in fixed-size batches. Methods
//! take `&mut self`, so only one request can be outstanding per session.

use tokio::sync::{mpsc, oneshot};

use crate::{
    error::{Result, SavError},
    types::{Entity, ObjectRecord, ObjectReference},
};

/// Source of the objects an encode session writes.
///
/// `level` is `None` for the persistent level. `request_objects` must answer
/// in the order of `path_names`.
#[allow(async_fn_in_trait)]
pub trait SaveDataProvider {
    async fn request_object_keys(&mut self, level: Option<&str>) -> Result<Vec<String>>;

    async fn request_objects(&mut self, path_names: &[String])
    -> Result<Vec<(ObjectRecord, Entity)>>;

    async fn request_collectables(&mut self, level: Option<&str>) -> Result<Vec<ObjectReference>>;
}

type Reply<T> = oneshot::Sender<std::result::Result<T, String>>;

/// One request sent over a [`ChannelProvider`]
#[derive(Debug)]
pub enum ProviderRequest {
    ObjectKeys {
        level: Option<String>,
        reply: Reply<Vec<String>>,
    },
    Objects {
        path_names: Vec<String>,
        reply: Reply<Vec<(ObjectRecord, Entity)>>,
    },
    Collectables {
        level: Option<String>,
        reply: Reply<Vec<ObjectReference>>,
    },
}

impl ProviderRequest {
    /// Answer this request from `provider`.
    ///
    /// Errors are sent back as text; a requester that has gone away is ignored.
    pub async fn respond<P: SaveDataProvider>(self, provider: &mut P) {
        match self {
            ProviderRequest::ObjectKeys { level, reply } => {
                let result = provider.request_object_keys(level.as_deref()).await;
                let _ = reply.send(result.map_err(|e| e.to_string()));
            }
            ProviderRequest::Objects { path_names, reply } => {
                let result = provider.request_objects(&path_names).await;
                let _ = reply.send(result.map_err(|e| e.to_string()));
            }
            ProviderRequest::Collectables { level, reply } => {
                let result = provider.request_collectables(level.as_deref()).await;
                let _ = reply.send(result.map_err(|e| e.to_string()));
            }
        }
    }
}

/// Provider living on another task, reached through a bounded channel.
///
/// The channel holds a single request; each request carries its own oneshot
/// reply.
#[derive(Debug, Clone)]
pub struct ChannelProvider {
    requests: mpsc::Sender<ProviderRequest>,
}

impl ChannelProvider {
    /// Create the provider and the receiving end the serving task drains
    pub fn channel() -> (Self, mpsc::Receiver<ProviderRequest>) {
        let (requests, rx) = mpsc::channel(1);
        (Self { requests }, rx)
    }

    async fn call<T>(
        &mut self,
        request: ProviderRequest,
        rx: oneshot::Receiver<std::result::Result<T, String>>,
    ) -> Result<T> {
        self.requests
            .send(request)
            .await
            .map_err(|_| SavError::Provider("provider channel closed".into()))?;
        rx.await
            .map_err(|_| SavError::Provider("provider dropped the request".into()))?
            .map_err(SavError::Provider)
    }
}

impl SaveDataProvider for ChannelProvider {
    async fn request_object_keys(&mut self, level: Option<&str>) -> Result<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        let request = ProviderRequest::ObjectKeys {
            level: level.map(str::to_owned),
            reply,
        };
        self.call(request, rx).await
    }

    async fn request_objects(
        &mut self,
        path_names: &[String],
    ) -> Result<Vec<(ObjectRecord, Entity)>> {
        let (reply, rx) = oneshot::channel();
        let request = ProviderRequest::Objects {
            path_names: path_names.to_vec(),
            reply,
        };
        self.call(request, rx).await
    }

    async fn request_collectables(&mut self, level: Option<&str>) -> Result<Vec<ObjectReference>> {
        let (reply, rx) = oneshot::channel();
        let request = ProviderRequest::Collectables {
            level: level.map(str::to_owned),
            reply,
        };
        self.call(request, rx).await
    }
}
