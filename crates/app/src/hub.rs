//! Hub — owns the connected-client set and dispatches client requests.
//!
//! The hub is transport-agnostic: an adapter hands it a stream of inbound
//! text frames and the sending half of the client's outbound queue, and a
//! writer task on the adapter side drains that queue into the socket.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::{Stream, StreamExt};

use blox_domain::error::{BloxError, ChannelError, ProtocolViolation};
use blox_domain::event::Event;
use blox_domain::id::ClientId;
use blox_domain::message::{Notification, RequestEnvelope};

use crate::handlers::{HandlerTable, RequestContext};
use crate::registry::Registry;

/// One live client: its id and the queue feeding its socket.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ClientId,
    sender: mpsc::UnboundedSender<String>,
}

impl ClientHandle {
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: ClientId::new(),
            sender,
        }
    }

    #[must_use]
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Queue a text frame for this client.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] once the client's writer is gone.
    pub fn send_text(&self, text: String) -> Result<(), BloxError> {
        self.sender
            .send(text)
            .map_err(|_| ChannelError::Closed.into())
    }

    /// Serialize `value` and queue it for this client.
    ///
    /// # Errors
    ///
    /// Returns [`BloxError::Serialization`] or [`ChannelError::Closed`].
    pub fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), BloxError> {
        self.send_text(serde_json::to_string(value)?)
    }
}

/// Connected clients, keyed by id.
///
/// Critical sections never await, so a blocking lock is enough and lets a
/// connection deregister itself from `Drop`.
#[derive(Debug, Default)]
pub struct ClientSet {
    inner: RwLock<HashMap<ClientId, ClientHandle>>,
}

impl ClientSet {
    pub fn insert(&self, client: ClientHandle) {
        self.write().insert(client.id(), client);
    }

    pub fn remove(&self, id: ClientId) -> Option<ClientHandle> {
        self.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of every handle, so callers can send without holding the lock.
    pub fn handles(&self) -> Vec<ClientHandle> {
        self.read().values().cloned().collect()
    }

    /// Insert `client` for as long as the returned guard lives.
    fn register(&self, client: ClientHandle) -> Registration<'_> {
        let id = client.id();
        self.insert(client);
        Registration { clients: self, id }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ClientId, ClientHandle>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ClientId, ClientHandle>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes a client from its [`ClientSet`] when dropped, including when the
/// connection future panics or is cancelled.
struct Registration<'a> {
    clients: &'a ClientSet,
    id: ClientId,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.clients.remove(self.id);
    }
}

/// Mediates client connections and routes their requests to handlers.
#[derive(Debug)]
pub struct Hub {
    registry: Arc<Registry>,
    handlers: HandlerTable,
    clients: ClientSet,
}

impl Hub {
    #[must_use]
    pub fn new(registry: Arc<Registry>, handlers: HandlerTable) -> Self {
        Self {
            registry,
            handlers,
            clients: ClientSet::default(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    #[must_use]
    pub fn clients(&self) -> &ClientSet {
        &self.clients
    }

    /// Run one client connection to completion.
    ///
    /// The client is part of the connected set for exactly the lifetime of
    /// this call, even if a handler panics or the future is dropped. The
    /// loop ends when `inbound` ends or yields an error, or
    /// when a request is rejected or its handler fails; no error frame is
    /// ever sent.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the connection. A clean end of
    /// `inbound` is `Ok(())`.
    pub async fn serve_connection<S>(
        &self,
        mut inbound: S,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Result<(), BloxError>
    where
        S: Stream<Item = Result<String, BloxError>> + Unpin + Send,
    {
        let client = ClientHandle::new(outbound);
        let client_id = client.id();
        let registration = self.clients.register(client.clone());
        tracing::info!(%client_id, "client connected");

        let result = self.receive_loop(&client, &mut inbound).await;

        drop(registration);
        match &result {
            Ok(()) => tracing::info!(%client_id, "client disconnected"),
            Err(err) => tracing::warn!(%client_id, error = %err, "client dropped"),
        }
        result
    }

    async fn receive_loop<S>(&self, client: &ClientHandle, inbound: &mut S) -> Result<(), BloxError>
    where
        S: Stream<Item = Result<String, BloxError>> + Unpin + Send,
    {
        while let Some(frame) = inbound.next().await {
            self.dispatch(client, &frame?).await?;
        }
        Ok(())
    }

    /// Parse one frame and run the handler bound to its `request`.
    ///
    /// # Errors
    ///
    /// Returns [`BloxError::Protocol`] for a malformed frame, a non-positive
    /// `msgID` or an unknown request, otherwise whatever the handler returns.
    #[tracing::instrument(skip(self, client, text), fields(client_id = %client.id()))]
    pub async fn dispatch(&self, client: &ClientHandle, text: &str) -> Result<(), BloxError> {
        let envelope = RequestEnvelope::parse(text)?;
        tracing::debug!(msg_id = envelope.msg_id, request = %envelope.request, "request received");
        let handler = self
            .handlers
            .get(&envelope.request)
            .ok_or_else(|| ProtocolViolation::UnknownRequest(envelope.request.clone()))?;
        handler
            .handle(RequestContext {
                client,
                registry: &self.registry,
                envelope,
            })
            .await
    }

    /// Send `frame` to every connected client. Returns how many accepted it.
    ///
    /// Clients whose queue is closed are skipped; their own connection loop
    /// removes them.
    ///
    /// # Errors
    ///
    /// Returns [`BloxError::Serialization`] when `frame` cannot be encoded.
    pub fn broadcast<T: Serialize + ?Sized>(&self, frame: &T) -> Result<usize, BloxError> {
        let text = serde_json::to_string(frame)?;
        let mut delivered = 0;
        for client in self.clients.handles() {
            match client.send_text(text.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => tracing::debug!(client_id = %client.id(), error = %err, "skipping client"),
            }
        }
        Ok(delivered)
    }

    /// Relay timer events from the bus to every client until the bus closes.
    pub async fn forward_events(&self, mut events: broadcast::Receiver<Event>) {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event forwarder lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let snapshot = match self.registry.get(&event.device) {
                Ok(device) => device.snapshot(),
                Err(err) => {
                    tracing::warn!(device = %event.device, error = %err, "event for unknown device");
                    continue;
                }
            };
            match self.broadcast(&Notification::new(event.kind, snapshot)) {
                Ok(delivered) => {
                    tracing::debug!(kind = %event.kind, device = %event.device, delivered, "event forwarded");
                }
                Err(err) => tracing::warn!(error = %err, "failed to forward event"),
            }
        }
        tracing::debug!("event forwarder stopped");
    }
}
