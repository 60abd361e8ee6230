//! Change notification bus.
//!
//! `ChangeBus` delivers store events to subscribed listeners synchronously,
//! in commit order. The bus holds only weak references: a listener is
//! dropped from delivery as soon as its owner drops it, and dead entries are
//! swept by `cleanup`.
//!
//! A listener that is already borrowed when an event arrives misses it. The
//! bus remembers the miss and, at the next successful borrow, calls
//! `on_missed_events` in place of the pending event so the listener can
//! resynchronise from the committed state.

use cardtree_core::{CardStore, StoreEvent};
use hashbrown::{HashMap, HashSet};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Receives events after the store has committed them.
pub trait ChangeListener {
    /// Called once per committed change. `store` already reflects it.
    fn on_store_event(&mut self, event: &StoreEvent, store: &dyn CardStore);

    /// Called instead of `on_store_event` after one or more events were
    /// dropped because the listener was busy. `store` reflects every
    /// committed change, including the ones that were missed.
    fn on_missed_events(&mut self, store: &dyn CardStore) {
        let _ = store;
    }
}

/// Routes store events to listeners.
pub struct ChangeBus {
    /// Subscription id -> listener, in subscription order.
    listeners: Vec<(SubscriptionId, Weak<RefCell<dyn ChangeListener>>)>,
    /// Events delivered per subscription, for diagnostics.
    delivered: HashMap<SubscriptionId, u64>,
    /// Subscriptions that dropped an event and still owe a resync.
    missed: HashSet<SubscriptionId>,
    /// Next subscription id to assign
    next_id: SubscriptionId,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            delivered: HashMap::new(),
            missed: HashSet::new(),
            next_id: 1,
        }
    }

    /// Subscribes a listener and returns its id.
    ///
    /// Only a weak reference is kept; the caller owns the listener.
    pub fn subscribe<L>(&mut self, listener: &Rc<RefCell<L>>) -> SubscriptionId
    where
        L: ChangeListener + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        let listener: Rc<RefCell<dyn ChangeListener>> = listener.clone();
        self.listeners.push((id, Rc::downgrade(&listener)));
        self.delivered.insert(id, 0);
        id
    }

    /// Unsubscribes by id.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.delivered.remove(&id);
        self.missed.remove(&id);
        self.listeners.len() != before
    }

    /// Delivers an event to every live listener, in subscription order.
    pub fn publish(&mut self, event: &StoreEvent, store: &dyn CardStore) {
        for (id, weak) in &self.listeners {
            let Some(listener) = weak.upgrade() else {
                continue;
            };
            let owes_resync = self.missed.contains(id);
            let delivered = match listener.try_borrow_mut() {
                Ok(mut listener) => {
                    if owes_resync {
                        listener.on_missed_events(store);
                    } else {
                        listener.on_store_event(event, store);
                    }
                    true
                }
                Err(_) => false,
            };
            if delivered {
                self.missed.remove(id);
                *self.delivered.entry(*id).or_insert(0) += 1;
            } else {
                // A listener mutating the store from inside its own
                // callback would land here.
                tracing::warn!(subscription = id, ?event, "listener busy, resync pending");
                self.missed.insert(*id);
            }
        }
    }

    /// Resynchronises every listener that missed events and is free now.
    ///
    /// Returns the number of listeners that were resynchronised.
    pub fn resync(&mut self, store: &dyn CardStore) -> usize {
        let mut done = 0;
        for (id, weak) in &self.listeners {
            if !self.missed.contains(id) {
                continue;
            }
            let Some(listener) = weak.upgrade() else {
                continue;
            };
            let resynced = match listener.try_borrow_mut() {
                Ok(mut listener) => {
                    listener.on_missed_events(store);
                    true
                }
                Err(_) => false,
            };
            if resynced {
                self.missed.remove(id);
                done += 1;
            }
        }
        done
    }

    /// Returns true if the subscription dropped an event and has not been
    /// resynchronised yet.
    pub fn has_missed(&self, id: SubscriptionId) -> bool {
        self.missed.contains(&id)
    }

    /// Number of subscriptions, live or not.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true if there are no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Number of listeners still alive.
    pub fn live_count(&self) -> usize {
        self.listeners
            .iter()
            .filter(|(_, w)| w.strong_count() > 0)
            .count()
    }

    /// Events delivered to a subscription so far.
    pub fn delivered(&self, id: SubscriptionId) -> u64 {
        self.delivered.get(&id).copied().unwrap_or(0)
    }

    /// Drops subscriptions whose listener is gone.
    pub fn cleanup(&mut self) {
        let delivered = &mut self.delivered;
        let missed = &mut self.missed;
        self.listeners.retain(|(id, w)| {
            let alive = w.strong_count() > 0;
            if !alive {
                delivered.remove(id);
                missed.remove(id);
            }
            alive
        });
    }

    /// Removes every subscription.
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.delivered.clear();
        self.missed.clear();
    }
}
