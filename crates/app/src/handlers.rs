//! Request handlers — the strategy objects the hub dispatches to.
//!
//! A handler receives the originating client and the parsed envelope and is
//! solely responsible for sending its own response(s). New requests are
//! added by registering another [`RequestHandler`] under its name.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use blox_domain::error::BloxError;
use blox_domain::message::{DeviceListResponse, RequestEnvelope};

use crate::hub::ClientHandle;
use crate::registry::Registry;

/// Name of the request answered by [`DeviceListHandler`].
pub const DEVICE_LIST: &str = "devicelist";

/// A boxed, sendable future borrowed for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything a handler may look at while serving one request.
pub struct RequestContext<'a> {
    /// The client that sent the request; responses go here only.
    pub client: &'a ClientHandle,
    pub registry: &'a Registry,
    pub envelope: RequestEnvelope,
}

/// Serves one kind of request.
///
/// An error ends the client's connection; it never reaches other clients.
pub trait RequestHandler: Send + Sync {
    fn handle<'a>(&'a self, ctx: RequestContext<'a>) -> BoxFuture<'a, Result<(), BloxError>>;
}

/// Answers `devicelist` with a snapshot of the whole registry.
#[derive(Debug, Default)]
pub struct DeviceListHandler;

impl RequestHandler for DeviceListHandler {
    fn handle<'a>(&'a self, ctx: RequestContext<'a>) -> BoxFuture<'a, Result<(), BloxError>> {
        Box::pin(async move {
            let response = DeviceListResponse {
                msg_id: ctx.envelope.msg_id,
                devices: ctx.registry.list_all(),
            };
            ctx.client.send_json(&response)
        })
    }
}

/// Request name → handler.
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Box<dyn RequestHandler>>,
}

impl HandlerTable {
    /// An empty table; every request is unknown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with the built-in handlers bound.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register(DEVICE_LIST, Box::new(DeviceListHandler));
        table
    }

    /// Bind `handler` to `request`, replacing any previous binding.
    pub fn register(&mut self, request: impl Into<String>, handler: Box<dyn RequestHandler>) {
        self.handlers.insert(request.into(), handler);
    }

    #[must_use]
    pub fn get(&self, request: &str) -> Option<&dyn RequestHandler> {
        self.handlers.get(request).map(AsRef::as_ref)
    }

    /// Registered request names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("requests", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blox_domain::device::Device;
    use tokio::sync::mpsc;

    struct EchoHandler;

    impl RequestHandler for EchoHandler {
        fn handle<'a>(&'a self, ctx: RequestContext<'a>) -> BoxFuture<'a, Result<(), BloxError>> {
            Box::pin(async move { ctx.client.send_json(&ctx.envelope) })
        }
    }

    fn registry() -> Registry {
        Registry::builder()
            .device(
                Device::builder()
                    .name("porch")
                    .display_name("Porch")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn should_bind_devicelist_by_default() {
        let table = HandlerTable::with_defaults();
        assert!(table.get(DEVICE_LIST).is_some());
        assert_eq!(table.names(), [DEVICE_LIST]);
    }

    #[test]
    fn should_start_empty() {
        let table = HandlerTable::new();
        assert!(table.get(DEVICE_LIST).is_none());
        assert!(table.names().is_empty());
    }

    #[test]
    fn should_list_registered_names_sorted() {
        let mut table = HandlerTable::with_defaults();
        table.register("echo", Box::new(EchoHandler));
        assert_eq!(table.names(), ["devicelist", "echo"]);
    }

    #[tokio::test]
    async fn should_answer_devicelist_on_originating_client() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = ClientHandle::new(tx);
        let registry = registry();
        let envelope = RequestEnvelope::parse(r#"{"msgID":9,"request":"devicelist"}"#).unwrap();

        DeviceListHandler
            .handle(RequestContext {
                client: &client,
                registry: &registry,
                envelope,
            })
            .await
            .unwrap();

        let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(
            frame,
            serde_json::json!({
                "msgID": 9,
                "devices": {"porch": {"name": "porch", "displayName": "Porch"}}
            })
        );
    }

    #[tokio::test]
    async fn should_fail_when_client_channel_is_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let client = ClientHandle::new(tx);
        let registry = registry();
        let envelope = RequestEnvelope::parse(r#"{"msgID":1,"request":"devicelist"}"#).unwrap();

        let result = DeviceListHandler
            .handle(RequestContext {
                client: &client,
                registry: &registry,
                envelope,
            })
            .await;

        assert!(matches!(result, Err(BloxError::Channel(_))));
    }

    #[tokio::test]
    async fn should_dispatch_through_registered_custom_handler() {
        let mut table = HandlerTable::new();
        table.register("echo", Box::new(EchoHandler));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let client = ClientHandle::new(tx);
        let registry = registry();
        let envelope =
            RequestEnvelope::parse(r#"{"msgID":2,"request":"echo","text":"hi"}"#).unwrap();

        table
            .get("echo")
            .unwrap()
            .handle(RequestContext {
                client: &client,
                registry: &registry,
                envelope,
            })
            .await
            .unwrap();

        let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["text"], "hi");
        assert_eq!(frame["msgID"], 2);
    }
}
