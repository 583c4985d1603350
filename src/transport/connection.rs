//! Command correlation and event dispatch.
//!
//! This module owns the two tasks at the center of the runtime:
//!
//! - **Writer task** — sole owner of the transport's write half. Drains an
//!   unbounded queue of pre-serialized frames, so all commands hit the wire
//!   in enqueue order no matter how many callers send concurrently.
//! - **Dispatcher task** — sole owner of the read half. Routes each decoded
//!   envelope to exactly one pending-command slot (by id) or to every
//!   mailbox subscribed to its method name.
//!
//! Callers talk to both through the cloneable [`Connection`] handle.
//!
//! # Routing
//!
//! | Envelope | Destination |
//! |----------|-------------|
//! | `id` matching a pending command | that command's one-shot slot, exactly once |
//! | `method` with subscribers | a clone to every subscribed mailbox |
//! | neither | dropped with a warning, never fatal |
//!
//! # Shutdown
//!
//! When the read side closes (process exit, remote close) every pending
//! command resolves with [`Error::ConnectionClosed`] and every mailbox is
//! dropped so event streams terminate. Enqueue attempts after the writer
//! stops fail with the same error.

// ============================================================================
// Imports
// ============================================================================

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, SessionId, SubscriptionId};
use crate::launcher::output::{Direction, WireLog};
use crate::protocol::Envelope;

use super::{TransportRx, TransportTx};

// ============================================================================
// Types
// ============================================================================

/// Map of command ids to response slots.
type PendingMap = FxHashMap<CommandId, oneshot::Sender<Result<Envelope>>>;

/// Map of method names to subscriber mailboxes, in subscription order.
type SubscriberMap = FxHashMap<String, Vec<(SubscriptionId, mpsc::UnboundedSender<Envelope>)>>;

// ============================================================================
// Registry
// ============================================================================

/// Shared correlation state.
///
/// Registration happens on caller tasks; removal/delivery on the
/// dispatcher task (and on caller cancellation). Both sides go through
/// these mutexes; neither lock is ever held across an await point.
struct Registry {
    /// Pending commands awaiting a response.
    pending: Mutex<PendingMap>,
    /// Event subscribers by exact method name.
    subscribers: Mutex<SubscriberMap>,
}

impl Registry {
    fn new() -> Self {
        Self {
            pending: Mutex::new(PendingMap::default()),
            subscribers: Mutex::new(SubscriberMap::default()),
        }
    }

    /// Resolves every pending command with `ConnectionClosed` and drops
    /// all mailboxes, ending their event streams.
    fn close(&self) {
        let pending: Vec<_> = {
            let mut map = self.pending.lock();
            map.drain().collect()
        };
        let count = pending.len();
        for (_, slot) in pending {
            let _ = slot.send(Err(Error::ConnectionClosed));
        }
        if count > 0 {
            debug!(count, "Failed pending commands on close");
        }

        self.subscribers.lock().clear();
    }

    /// Removes one subscriber mailbox; empty method entries are dropped.
    fn remove_subscriber(&self, method: &str, id: SubscriptionId) {
        let mut subscribers = self.subscribers.lock();
        if let Some(mailboxes) = subscribers.get_mut(method) {
            mailboxes.retain(|(sub_id, _)| *sub_id != id);
            if mailboxes.is_empty() {
                subscribers.remove(method);
            }
        }
    }
}

// ============================================================================
// PendingGuard
// ============================================================================

/// Releases a pending-command slot when the caller leaves `execute`.
///
/// On the success path the dispatcher has already removed the slot, so the
/// drop is a no-op; on cancellation it is what prevents the registry from
/// leaking one entry per abandoned call.
struct PendingGuard {
    registry: Arc<Registry>,
    id: CommandId,
}

impl PendingGuard {
    fn register(
        registry: &Arc<Registry>,
        id: CommandId,
        slot: oneshot::Sender<Result<Envelope>>,
    ) -> Self {
        registry.pending.lock().insert(id, slot);
        Self {
            registry: Arc::clone(registry),
            id,
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.registry.pending.lock().remove(&self.id);
    }
}

// ============================================================================
// OutboundCommand
// ============================================================================

/// Work items for the writer task.
enum OutboundCommand {
    /// Write one pre-serialized frame.
    Frame {
        /// Pending-command id to fail if the write itself fails.
        id: Option<CommandId>,
        /// Serialized envelope.
        json: String,
    },
    /// Close the transport and stop.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to a live transport: enqueue commands, subscribe to events.
///
/// Cloneable; all clones share the writer queue, the registries, and the
/// command-id counter.
#[derive(Clone)]
pub struct Connection {
    /// Queue into the writer task.
    write_tx: mpsc::UnboundedSender<OutboundCommand>,
    /// Shared correlation state.
    registry: Arc<Registry>,
    /// Next command id; allocated with fetch-add on the caller's task.
    next_id: Arc<AtomicU64>,
    /// Next subscription id.
    next_subscription: Arc<AtomicU64>,
}

impl Connection {
    /// Spawns the writer and dispatcher tasks over a transport pair.
    pub fn spawn<T, R>(transport_tx: T, transport_rx: R, wire_log: WireLog) -> Self
    where
        T: TransportTx + 'static,
        R: TransportRx + 'static,
    {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Registry::new());

        tokio::spawn(Self::run_writer(
            transport_tx,
            write_rx,
            Arc::clone(&registry),
            wire_log.clone(),
        ));
        tokio::spawn(Self::run_dispatcher(
            transport_rx,
            Arc::clone(&registry),
            wire_log,
        ));

        Self {
            write_tx,
            registry,
            next_id: Arc::new(AtomicU64::new(CommandId::FIRST)),
            next_subscription: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Invokes a method and waits for its correlated response.
    ///
    /// The id is allocated atomically here, on the calling task, before
    /// the envelope is enqueued; concurrent callers always get distinct,
    /// monotonically increasing ids.
    ///
    /// # Arguments
    ///
    /// * `method` - Method name in `Domain.method` format
    /// * `params` - Already-built parameters, if any
    /// * `session_id` - Session tag for addressing an attached target
    /// * `scope` - Cancelling this token abandons the call and releases
    ///   its pending slot without touching sibling callers
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the browser answered with an error envelope
    /// - [`Error::ConnectionClosed`] if the transport closed first
    /// - [`Error::Cancelled`] if `scope` was cancelled first
    pub async fn execute(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<SessionId>,
        scope: &CancellationToken,
    ) -> Result<Value> {
        let id = CommandId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let envelope = Envelope::request(id, method, params, session_id);
        let json = serde_json::to_string(&envelope)?;

        let (slot_tx, slot_rx) = oneshot::channel();
        let _guard = PendingGuard::register(&self.registry, id, slot_tx);

        self.write_tx
            .send(OutboundCommand::Frame { id: Some(id), json })
            .map_err(|_| Error::ConnectionClosed)?;
        trace!(%id, method, "Command enqueued");

        tokio::select! {
            _ = scope.cancelled() => Err(Error::Cancelled),
            response = slot_rx => match response {
                Ok(Ok(envelope)) => envelope.into_result(),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(Error::ConnectionClosed),
            },
        }
    }

    /// Subscribes to all events with the given method name.
    ///
    /// Every subscriber gets an independent copy of each matching envelope
    /// in dispatch order. Dropping the returned stream removes its mailbox
    /// from the registry.
    pub fn subscribe(&self, method: impl Into<String>) -> EventStream {
        let method = method.into();
        let id = SubscriptionId::new(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();

        self.registry
            .subscribers
            .lock()
            .entry(method.clone())
            .or_default()
            .push((id, tx));
        debug!(method = %method, subscription = %id, "Event subscription registered");

        EventStream {
            mailbox: rx,
            guard: SubscriptionGuard {
                registry: Arc::clone(&self.registry),
                method,
                id,
            },
        }
    }

    /// Asks the writer task to close the transport and stop.
    ///
    /// Idempotent; safe to call from any clone.
    pub fn shutdown(&self) {
        let _ = self.write_tx.send(OutboundCommand::Shutdown);
    }

    /// Returns `true` once the writer task has stopped accepting frames.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.write_tx.is_closed()
    }

    /// Returns the number of commands awaiting a response.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.registry.pending.lock().len()
    }
}

// ============================================================================
// Connection - Writer Task
// ============================================================================

impl Connection {
    /// Drains the outbound queue into the transport, in order.
    async fn run_writer<T>(
        mut transport: T,
        mut queue: mpsc::UnboundedReceiver<OutboundCommand>,
        registry: Arc<Registry>,
        wire_log: WireLog,
    ) where
        T: TransportTx,
    {
        while let Some(command) = queue.recv().await {
            match command {
                OutboundCommand::Frame { id, json } => {
                    wire_log.record(Direction::Send, &json);

                    if let Err(e) = transport.send(json).await {
                        error!(error = %e, "Transport write failed");
                        if let Some(id) = id
                            && let Some(slot) = registry.pending.lock().remove(&id)
                        {
                            let _ = slot.send(Err(e));
                        }
                        break;
                    }
                }

                OutboundCommand::Shutdown => {
                    debug!("Shutdown command received");
                    break;
                }
            }
        }

        queue.close();
        let _ = transport.close().await;
        registry.close();
        debug!("Writer task terminated");
    }
}

// ============================================================================
// Connection - Dispatcher Task
// ============================================================================

impl Connection {
    /// Routes inbound envelopes until the read side closes.
    async fn run_dispatcher<R>(mut transport: R, registry: Arc<Registry>, wire_log: WireLog)
    where
        R: TransportRx,
    {
        while let Some(next) = transport.receive().await {
            match next {
                Ok(raw) => {
                    wire_log.record(Direction::Recv, &raw);
                    Self::route(&raw, &registry);
                }
                Err(e) => {
                    error!(error = %e, "Transport read failed");
                    break;
                }
            }
        }

        registry.close();
        debug!("Dispatcher task terminated");
    }

    /// Routes one raw frame to a pending slot or subscriber mailboxes.
    fn route(raw: &str, registry: &Registry) {
        let envelope: Envelope = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Discarding unparseable frame");
                return;
            }
        };

        // Response: id with a matching pending command.
        if let Some(id) = envelope.id {
            let slot = registry.pending.lock().remove(&id);
            if let Some(slot) = slot {
                // Abandoned slot (caller cancelled) makes this a no-op.
                let _ = slot.send(Ok(envelope));
                return;
            }
            if envelope.method.is_none() {
                warn!(%id, "Response for unknown command");
                return;
            }
            // id plus method but no pending entry: treat as an event.
        }

        if envelope.method.is_some() {
            Self::fan_out(envelope, registry);
            return;
        }

        warn!("Unroutable envelope discarded");
    }

    /// Delivers an event envelope to every subscribed mailbox.
    fn fan_out(envelope: Envelope, registry: &Registry) {
        let method = envelope
            .method
            .clone()
            .unwrap_or_default();

        let mut subscribers = registry.subscribers.lock();
        let Some(mailboxes) = subscribers.get_mut(&method) else {
            trace!(method = %method, "Event with no subscribers");
            return;
        };

        // Unbounded sends never block dispatch; dead mailboxes (stream
        // dropped mid-send) are pruned in passing.
        mailboxes.retain(|(id, mailbox)| match mailbox.send(envelope.clone()) {
            Ok(()) => true,
            Err(_) => {
                trace!(subscription = %id, "Pruned dead mailbox");
                false
            }
        });

        if mailboxes.is_empty() {
            subscribers.remove(&method);
        }
    }
}

// ============================================================================
// SubscriptionGuard
// ============================================================================

/// Removes a mailbox from the registry when its stream is dropped.
struct SubscriptionGuard {
    registry: Arc<Registry>,
    method: String,
    id: SubscriptionId,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.registry.remove_subscriber(&self.method, self.id);
        trace!(method = %self.method, subscription = %self.id, "Event subscription removed");
    }
}

// ============================================================================
// EventStream
// ============================================================================

/// Ordered, unbounded stream of event envelopes for one subscription.
///
/// Yields every matching envelope dispatched after the subscription was
/// registered, in dispatch order. Ends when the transport closes. Dropping
/// the stream unsubscribes.
pub struct EventStream {
    /// Mailbox fed by the dispatcher task.
    mailbox: mpsc::UnboundedReceiver<Envelope>,
    /// Unsubscribes on drop.
    guard: SubscriptionGuard,
}

impl EventStream {
    /// Receives the next event, or `None` once the transport has closed.
    pub async fn next(&mut self) -> Option<Envelope> {
        self.mailbox.recv().await
    }

    /// Returns the subscribed method name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.guard.method
    }
}

impl Stream for EventStream {
    type Item = Envelope;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.mailbox.poll_recv(cx)
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("method", &self.guard.method)
            .field("subscription", &self.guard.id)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
