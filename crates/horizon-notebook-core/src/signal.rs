//! Signal/slot system for Horizon Notebook.
//!
//! Signals are the change-notification channel used by cell models and cell
//! widgets. A signal owns an ordered list of slots (callbacks); emitting the
//! signal invokes every slot synchronously, in connection order, on the
//! calling thread.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type for emitting notifications
//! - [`ConnectionId`] - Identifier returned when connecting a slot
//! - [`ConnectionContext`] - Groups connections so they can be removed together
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Emission Semantics
//!
//! Emission takes a snapshot of the connected slots, releases the internal
//! lock and then invokes the snapshot. Consequently:
//!
//! - A slot disconnected during an emission is still invoked for that
//!   emission if it was connected when the emission started.
//! - A slot connected during an emission is first invoked by the next one.
//! - Slots may freely connect, disconnect or emit other signals.
//!
//! # Example
//!
//! ```
//! use horizon_notebook_core::Signal;
//!
//! let text_changed = Signal::<String>::new();
//!
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! text_changed.emit("Hello, World!".to_string());
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// The ID remains valid until the connection is explicitly disconnected or
    /// the signal is dropped.
    pub struct ConnectionId;
}

/// Counter for generating unique connection contexts.
static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// An opaque tag attached to connections at connect time.
///
/// Every connection made with [`Signal::connect_with_context`] remembers its
/// context, and [`Signal::disconnect_context`] removes all of them at once.
/// Widgets use their own context when subscribing to a model so that the
/// subscriptions can be dropped without tracking individual IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionContext(u64);

impl ConnectionContext {
    /// Allocate a fresh, process-unique context.
    pub fn new() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value of this context.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for ConnectionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The type-erased slot stored for each connection.
type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Slot<Args>,
    context: Option<ConnectionContext>,
    /// Monotonic sequence number; slot keys are reused, so ordering uses this.
    sequence: u64,
}

/// Shared state of a signal. Guards keep a weak reference to it.
struct SignalInner<Args> {
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    blocked: AtomicBool,
    next_sequence: AtomicU64,
}

impl<Args> SignalInner<Args> {
    fn remove(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The payload passed (by reference) to connected slots. Use `()`
///   for signals without a payload and a struct for rich change records.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`. Slots always run on the emitting thread.
pub struct Signal<Args> {
    inner: Arc<SignalInner<Args>>,
}

impl<Args: Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                connections: Mutex::new(SlotMap::with_key()),
                blocked: AtomicBool::new(false),
                next_sequence: AtomicU64::new(0),
            }),
        }
    }

    fn insert(&self, slot: Slot<Args>, context: Option<ConnectionContext>) -> ConnectionId {
        let sequence = self.inner.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.inner.connections.lock().insert(Connection {
            slot,
            context,
            sequence,
        })
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_notebook_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.insert(Arc::new(slot), None)
    }

    /// Connect a slot tagged with a context.
    ///
    /// All connections sharing a context can later be removed with
    /// [`disconnect_context`](Self::disconnect_context).
    pub fn connect_with_context<F>(&self, context: ConnectionContext, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.insert(Arc::new(slot), Some(context))
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.inner.remove(id)
    }

    /// Disconnect every slot connected with `context`.
    ///
    /// Returns the number of connections removed.
    pub fn disconnect_context(&self, context: ConnectionContext) -> usize {
        let mut connections = self.inner.connections.lock();
        let before = connections.len();
        connections.retain(|_, conn| conn.context != Some(context));
        before - connections.len()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.inner.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.inner.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.inner.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.inner.blocked.load(Ordering::SeqCst)
    }

    /// Copy out the current slots in connection order.
    fn snapshot(&self) -> Vec<Slot<Args>> {
        let connections = self.inner.connections.lock();
        let mut ordered: Vec<(u64, Slot<Args>)> = connections
            .values()
            .map(|conn| (conn.sequence, conn.slot.clone()))
            .collect();
        ordered.sort_unstable_by_key(|(sequence, _)| *sequence);
        ordered.into_iter().map(|(_, slot)| slot).collect()
    }

    /// Emit the signal, invoking all connected slots in connection order.
    ///
    /// If the signal is blocked, this does nothing.
    #[tracing::instrument(skip_all, target = "horizon_notebook_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "horizon_notebook_core::signal", "signal blocked, skipping emit");
            return;
        }

        let slots = self.snapshot();
        tracing::trace!(target: "horizon_notebook_core::signal", connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }

    /// Connect a slot with automatic disconnection when the guard is dropped.
    ///
    /// The guard only holds a weak reference to the signal, so it may safely
    /// outlive it; dropping a guard whose signal is gone does nothing.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        self.guard(id)
    }

    /// Wrap an existing connection in a [`ConnectionGuard`].
    pub fn guard(&self, id: ConnectionId) -> ConnectionGuard {
        let inner: Arc<dyn SignalEmitter> = self.inner.clone();
        ConnectionGuard {
            signal: Arc::downgrade(&inner),
            id,
        }
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.inner.connections.lock().len())
            .field("blocked", &self.inner.blocked.load(Ordering::SeqCst))
            .finish()
    }
}

/// Type-erased disconnect, so that [`ConnectionGuard`] is not generic over
/// the payload type.
pub(crate) trait SignalEmitter: Send + Sync {
    fn disconnect(&self, id: ConnectionId) -> bool;
}

impl<Args: Send + 'static> SignalEmitter for SignalInner<Args> {
    fn disconnect(&self, id: ConnectionId) -> bool {
        self.remove(id)
    }
}

/// A connection guard that automatically disconnects when dropped.
///
/// Created via [`Signal::connect_scoped`] or [`Signal::guard`].
///
/// # Example
///
/// ```
/// use horizon_notebook_core::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let signal = Signal::<i32>::new();
/// let counter = Arc::new(AtomicI32::new(0));
/// {
///     let counter_clone = counter.clone();
///     let _guard = signal.connect_scoped(move |&n| {
///         counter_clone.fetch_add(n, Ordering::SeqCst);
///     });
///     signal.emit(42);
/// }
/// signal.emit(43);
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
pub struct ConnectionGuard {
    signal: Weak<dyn SignalEmitter>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// The guarded connection.
    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }

    /// Whether the signal this guard belongs to still exists.
    pub fn is_live(&self) -> bool {
        self.signal.strong_count() > 0
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.disconnect(self.id);
        }
    }
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);
static_assertions::assert_impl_all!(ConnectionGuard: Send, Sync);
