// SDB - SQL Script Debugger
// Copyright (C) 2026 The SDB Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Event-subscriber registry.
//!
//! Subscriptions are keyed by event name and invoked in registration order.
//! A handler returning an error is logged and isolated: later handlers for
//! the same event still run. The registry is bounded to the client's
//! lifetime and cleared when the connection closes.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use sdb_common::types::EventFrame;
use tracing::error;

/// Handler invoked for each matching event
pub type EventHandler = Arc<dyn Fn(&EventFrame) -> eyre::Result<()> + Send + Sync>;

/// Token returned by [`EventRegistry::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    handlers: HashMap<String, Vec<(SubscriptionId, EventHandler)>>,
}

/// Registry of event subscribers, keyed by event name
#[derive(Default)]
pub struct EventRegistry {
    inner: Mutex<RegistryInner>,
}

impl EventRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to an event name; handlers fire in
    /// registration order
    pub fn subscribe<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&EventFrame) -> eyre::Result<()> + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.handlers.entry(event.to_string()).or_default().push((id, Arc::new(handler)));
        id
    }

    /// Remove one subscription; returns whether it was present
    pub fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        if let Some(handlers) = inner.handlers.get_mut(event) {
            let before = handlers.len();
            handlers.retain(|(handler_id, _)| *handler_id != id);
            return handlers.len() != before;
        }
        false
    }

    /// Deliver an event to every subscriber of its name.
    ///
    /// Handlers run outside the registry lock, so a handler may subscribe
    /// or unsubscribe without deadlocking.
    pub fn dispatch(&self, event: &EventFrame) {
        let handlers: Vec<EventHandler> = {
            let inner = self.inner.lock();
            match inner.handlers.get(&event.event) {
                Some(handlers) => handlers.iter().map(|(_, h)| h.clone()).collect(),
                None => return,
            }
        };
        for handler in handlers {
            if let Err(e) = handler(event) {
                error!(event = %event.event, "event handler failed: {e}");
            }
        }
    }

    /// Number of subscriptions for an event name
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.inner.lock().handlers.get(event).map_or(0, Vec::len)
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.inner.lock().handlers.clear();
    }
}
