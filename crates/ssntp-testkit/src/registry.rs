//! Keyed one-shot result registry.
//!
//! A registry is one namespace: a map from a frame-type key to a single-use
//! slot. A test registers a key, then waits on the returned receiver with a
//! bounded deadline. The agent delivers whenever its work for that key
//! completes; if nobody is waiting the result is dropped.
//!
//! Slot removal happens in exactly two places: the producer removes the slot
//! when it delivers, and the consumer removes it when its deadline passes.
//! Both go through the same map lock and both treat a missing key as benign.
//! Each slot carries a generation so a consumer that timed out can never
//! remove a slot that a later registration put under the same key.
//!
//! The map lock is only held for map operations, never across an `.await`.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{ChannelError, ChannelResult};

/// Identifier a namespace is keyed by
pub trait RegistryKey: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> RegistryKey for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

/// What happened to a delivered result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the registered waiter
    Delivered,
    /// No slot existed for the key; result discarded
    NoWaiter,
    /// A slot existed but its receiver was already dropped; result discarded
    WaiterGone,
}

impl Delivery {
    pub fn is_delivered(self) -> bool {
        self == Self::Delivered
    }
}

struct Slot<R> {
    generation: u64,
    sender: oneshot::Sender<R>,
}

struct Inner<K, R> {
    namespace: &'static str,
    slots: Mutex<HashMap<K, Slot<R>>>,
    next_generation: AtomicU64,
}

/// Receiving half of a registered slot
///
/// Consumed by [`ResultRegistry::await_and_consume`], so a slot can only be
/// waited on once.
#[derive(Debug)]
pub struct ResultReceiver<K, R> {
    key: K,
    generation: u64,
    receiver: oneshot::Receiver<R>,
}

impl<K: Copy, R> ResultReceiver<K, R> {
    /// Key this receiver was registered for
    pub fn key(&self) -> K {
        self.key
    }
}

/// One namespace of keyed one-shot result channels
///
/// Cloning shares the same underlying map.
pub struct ResultRegistry<K, R> {
    inner: Arc<Inner<K, R>>,
}

impl<K, R> Clone for ResultRegistry<K, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: RegistryKey, R: Send + 'static> Debug for ResultRegistry<K, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultRegistry")
            .field("namespace", &self.inner.namespace)
            .field("pending", &self.pending_keys())
            .finish()
    }
}

impl<K, R> ResultRegistry<K, R>
where
    K: RegistryKey,
    R: Send + 'static,
{
    /// Create an empty namespace
    pub fn new(namespace: &'static str) -> Self {
        Self {
            inner: Arc::new(Inner {
                namespace,
                slots: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.inner.namespace
    }

    /// Create a slot for `key` and return its receiving half
    ///
    /// Fails with [`ChannelError::AlreadyRegistered`] while another waiter
    /// holds a live slot for the same key. A slot whose receiver has been
    /// dropped is stale and gets replaced.
    pub fn register(&self, key: K) -> ChannelResult<ResultReceiver<K, R>> {
        let namespace = self.inner.namespace;
        let mut slots = self.inner.slots.lock();

        if let Some(existing) = slots.get(&key) {
            if !existing.sender.is_closed() {
                tracing::warn!(namespace, ?key, "result channel already registered");
                return Err(ChannelError::already_registered(namespace, key));
            }
            tracing::debug!(namespace, ?key, "replacing stale result channel");
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        slots.insert(key, Slot { generation, sender });
        tracing::debug!(namespace, ?key, generation, "registered result channel");

        Ok(ResultReceiver {
            key,
            generation,
            receiver,
        })
    }

    /// Wait up to `timeout` for the result registered under `key`
    ///
    /// The wait always receives on `receiver`; `key` only names the slot. On
    /// timeout the receiver's own slot is removed from the namespace so the
    /// key can be registered again.
    pub async fn await_and_consume(
        &self,
        receiver: ResultReceiver<K, R>,
        key: K,
        timeout: Duration,
    ) -> ChannelResult<R> {
        if receiver.key != key {
            tracing::warn!(
                namespace = self.inner.namespace,
                registered = ?receiver.key,
                requested = ?key,
                "waiting on receiver registered for a different key"
            );
        }

        let deadline = Instant::now().checked_add(timeout);
        self.wait(receiver, deadline, timeout).await
    }

    /// Wait until `deadline` for the receiver's result
    pub async fn await_until(
        &self,
        receiver: ResultReceiver<K, R>,
        deadline: Instant,
    ) -> ChannelResult<R> {
        let budget = deadline.saturating_duration_since(Instant::now());
        self.wait(receiver, Some(deadline), budget).await
    }

    async fn wait(
        &self,
        receiver: ResultReceiver<K, R>,
        deadline: Option<Instant>,
        budget: Duration,
    ) -> ChannelResult<R> {
        let namespace = self.inner.namespace;
        let ResultReceiver {
            key,
            generation,
            receiver,
        } = receiver;

        let received = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, receiver).await {
                Ok(received) => received,
                Err(_) => {
                    self.remove_if_current(key, generation);
                    tracing::warn!(namespace, ?key, ?budget, "timed out waiting for result");
                    return Err(ChannelError::timeout(namespace, key, budget));
                }
            },
            None => receiver.await,
        };

        match received {
            Ok(result) => {
                tracing::debug!(namespace, ?key, "received result");
                Ok(result)
            }
            Err(_) => {
                tracing::debug!(namespace, ?key, "result channel closed before delivery");
                Err(ChannelError::closed(namespace, key))
            }
        }
    }

    /// Hand `result` to the waiter registered for `key` and remove its slot
    ///
    /// Never blocks and never fails: with no live waiter the result is
    /// discarded and the returned [`Delivery`] says why.
    pub fn deliver_and_remove(&self, key: K, result: R) -> Delivery {
        let namespace = self.inner.namespace;
        let slot = self.inner.slots.lock().remove(&key);

        let Some(slot) = slot else {
            tracing::trace!(namespace, ?key, "no waiter for result, discarding");
            return Delivery::NoWaiter;
        };

        match slot.sender.send(result) {
            Ok(()) => {
                tracing::debug!(namespace, ?key, generation = slot.generation, "delivered result");
                Delivery::Delivered
            }
            Err(_) => {
                tracing::trace!(namespace, ?key, "waiter dropped its receiver, discarding");
                Delivery::WaiterGone
            }
        }
    }

    /// Whether a slot is currently registered for `key`
    pub fn is_registered(&self, key: K) -> bool {
        self.inner.slots.lock().contains_key(&key)
    }

    /// Number of registered slots
    pub fn pending(&self) -> usize {
        self.inner.slots.lock().len()
    }

    pub fn pending_keys(&self) -> Vec<K> {
        self.inner.slots.lock().keys().copied().collect()
    }

    /// Drop every registered slot
    ///
    /// Waiters wake immediately with [`ChannelError::Closed`]. Returns the
    /// number of slots removed.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.inner.slots.lock().drain().collect();
        if !drained.is_empty() {
            tracing::debug!(
                namespace = self.inner.namespace,
                closed = drained.len(),
                "closed pending result channels"
            );
        }
        drained.len()
    }

    fn remove_if_current(&self, key: K, generation: u64) {
        let mut slots = self.inner.slots.lock();
        if slots.get(&key).is_some_and(|slot| slot.generation == generation) {
            slots.remove(&key);
            tracing::debug!(namespace = self.inner.namespace, ?key, "removed result channel");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn registry() -> ResultRegistry<u8, String> {
        ResultRegistry::new("test")
    }

    #[tokio::test]
    async fn delivered_result_reaches_waiter() {
        let registry = registry();
        let receiver = registry.register(1).unwrap();

        let producer = registry.clone();
        tokio::spawn(async move { producer.deliver_and_remove(1, "foo".to_string()) });

        let result = registry
            .await_and_consume(receiver, 1, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result, "foo");
        assert!(!registry.is_registered(1));
    }

    #[tokio::test]
    async fn delivery_before_wait_is_kept() {
        let registry = registry();
        let receiver = registry.register(1).unwrap();

        assert_eq!(registry.deliver_and_remove(1, "early".to_string()), Delivery::Delivered);
        assert_eq!(registry.pending(), 0);

        let result = registry
            .await_and_consume(receiver, 1, Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(result, "early");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_removes_slot_and_frees_key() {
        let registry = registry();
        let receiver = registry.register(7).unwrap();

        let start = Instant::now();
        let err = registry
            .await_and_consume(receiver, 7, Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(!registry.is_registered(7));
        assert!(registry.register(7).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn await_until_honours_deadline() {
        let registry = registry();
        let receiver = registry.register(3).unwrap();
        let deadline = Instant::now() + Duration::from_millis(250);

        let err = registry.await_until(receiver, deadline).await.unwrap_err();
        assert_eq!(
            err,
            ChannelError::timeout("test", 3u8, Duration::from_millis(250))
        );
        assert_eq!(registry.pending(), 0);
    }

    #[test]
    fn deliver_without_waiter_is_discarded() {
        let registry = registry();
        assert_eq!(registry.deliver_and_remove(9, "lost".to_string()), Delivery::NoWaiter);
        assert_eq!(registry.pending(), 0);
    }

    #[test]
    fn second_delivery_is_discarded() {
        let registry = registry();
        let _receiver = registry.register(2).unwrap();
        assert!(registry.deliver_and_remove(2, "first".to_string()).is_delivered());
        assert_eq!(registry.deliver_and_remove(2, "second".to_string()), Delivery::NoWaiter);
    }

    #[test]
    fn double_register_is_rejected() {
        let registry = registry();
        let _receiver = registry.register(4).unwrap();

        let err = registry.register(4).unwrap_err();
        assert_eq!(err, ChannelError::already_registered("test", 4u8));
        assert_eq!(registry.pending(), 1);
    }

    #[test]
    fn dropped_receiver_leaves_replaceable_slot() {
        let registry = registry();
        drop(registry.register(5).unwrap());

        assert!(registry.register(5).is_ok());
        assert_eq!(registry.pending(), 1);
    }

    #[test]
    fn delivery_to_dropped_receiver_reports_waiter_gone() {
        let registry = registry();
        drop(registry.register(6).unwrap());

        assert_eq!(registry.deliver_and_remove(6, "late".to_string()), Delivery::WaiterGone);
        assert!(!registry.is_registered(6));
    }

    #[tokio::test]
    async fn wait_receives_on_receiver_even_with_other_key() {
        let registry = registry();
        let receiver = registry.register(1).unwrap();
        assert!(registry.deliver_and_remove(1, "foo".to_string()).is_delivered());

        let result = registry
            .await_and_consume(receiver, 2, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(result, "foo");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_with_other_key_removes_receivers_slot() {
        let registry = registry();
        let receiver = registry.register(1).unwrap();
        let _other = registry.register(2).unwrap();

        let err = registry
            .await_and_consume(receiver, 2, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, ChannelError::timeout("test", 1u8, Duration::from_secs(1)));
        assert!(!registry.is_registered(1));
        assert!(registry.is_registered(2));
    }

    #[tokio::test]
    async fn close_all_wakes_waiters() {
        let registry = registry();
        let receiver = registry.register(1).unwrap();

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .await_and_consume(receiver, 1, Duration::from_secs(60))
                    .await
            })
        };
        tokio::task::yield_now().await;

        assert_eq!(registry.close_all(), 1);
        let err = waiter.await.unwrap().unwrap_err();
        assert_eq!(err, ChannelError::closed("test", 1u8));
    }

    #[tokio::test]
    async fn unbounded_timeout_still_receives() {
        let registry = registry();
        let receiver = registry.register(1).unwrap();
        registry.deliver_and_remove(1, "ok".to_string());

        let result = registry
            .await_and_consume(receiver, 1, Duration::MAX)
            .await
            .unwrap();
        assert_eq!(result, "ok");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Register(u8),
        Deliver(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..6).prop_map(Op::Register),
            (0u8..6).prop_map(Op::Deliver),
        ]
    }

    proptest! {
        #[test]
        fn at_most_one_live_slot_per_key(ops in proptest::collection::vec(op(), 0..64)) {
            let registry = registry();
            let mut live = HashSet::new();
            let mut receivers = Vec::new();

            for op in ops {
                match op {
                    Op::Register(key) => {
                        let registered = registry.register(key);
                        prop_assert_eq!(registered.is_ok(), live.insert(key));
                        receivers.extend(registered.ok());
                    }
                    Op::Deliver(key) => {
                        let delivery = registry.deliver_and_remove(key, key.to_string());
                        prop_assert_eq!(delivery.is_delivered(), live.remove(&key));
                    }
                }
                prop_assert_eq!(registry.pending(), live.len());
            }
        }

        #[test]
        fn deliveries_never_cross_registries(
            waiting in proptest::collection::hash_set(0u8..6, 0..4),
            delivered in proptest::collection::vec(0u8..6, 0..16),
        ) {
            let errors = ResultRegistry::<u8, String>::new("error");
            let events = registry();
            let receivers: Vec<_> = waiting
                .iter()
                .map(|&key| events.register(key).unwrap())
                .collect();

            for key in delivered {
                prop_assert_eq!(errors.deliver_and_remove(key, key.to_string()), Delivery::NoWaiter);
            }

            prop_assert_eq!(events.pending(), waiting.len());
            for key in &waiting {
                prop_assert!(events.is_registered(*key));
            }
            drop(receivers);
        }
    }
}
