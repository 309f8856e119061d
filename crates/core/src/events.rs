//! Synchronous change notifications emitted by the item service.

use std::fmt;

use crate::models::ItemRecord;

/// Notification emitted after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// A record was added. Carries the incoming record, not the merged stack.
    ItemAdded(ItemRecord),
    /// Units were removed. Carries the stack as it stood after the decrement.
    ItemRemoved(ItemRecord),
    /// The inventory changed in any way.
    InventoryChanged,
    /// The currency balance changed. Carries the new balance.
    CurrencyChanged(i64),
    /// A purchase completed. Carries the stamped record.
    ItemPurchased(ItemRecord),
}

impl ServiceEvent {
    /// Discriminant used for subscriptions.
    pub fn kind(&self) -> EventKind {
        match self {
            ServiceEvent::ItemAdded(_) => EventKind::ItemAdded,
            ServiceEvent::ItemRemoved(_) => EventKind::ItemRemoved,
            ServiceEvent::InventoryChanged => EventKind::InventoryChanged,
            ServiceEvent::CurrencyChanged(_) => EventKind::CurrencyChanged,
            ServiceEvent::ItemPurchased(_) => EventKind::ItemPurchased,
        }
    }
}

/// Notification names listeners can subscribe to.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemAdded,
    ItemRemoved,
    InventoryChanged,
    CurrencyChanged,
    ItemPurchased,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::ItemAdded => "ItemAdded",
            EventKind::ItemRemoved => "ItemRemoved",
            EventKind::InventoryChanged => "InventoryChanged",
            EventKind::CurrencyChanged => "CurrencyChanged",
            EventKind::ItemPurchased => "ItemPurchased",
        };
        f.write_str(name)
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ServiceEvent)>;

struct Subscription {
    id: SubscriptionId,
    kind: Option<EventKind>,
    listener: Listener,
}

/// Registry of listener callbacks, invoked in subscription order.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one kind of event.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&ServiceEvent) + 'static,
    ) -> SubscriptionId {
        self.register(Some(kind), Box::new(listener))
    }

    /// Register a listener for every event.
    pub fn subscribe_all(
        &mut self,
        listener: impl FnMut(&ServiceEvent) + 'static,
    ) -> SubscriptionId {
        self.register(None, Box::new(listener))
    }

    fn register(&mut self, kind: Option<EventKind>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, kind, listener });
        id
    }

    /// Remove a listener. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        self.subscriptions.len() != before
    }

    /// Number of listeners that would receive an event of `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.subscriptions
            .iter()
            .filter(|subscription| subscription.kind.map_or(true, |k| k == kind))
            .count()
    }

    /// Deliver `event` to every matching listener before returning.
    pub fn emit(&mut self, event: &ServiceEvent) {
        let kind = event.kind();
        for subscription in &mut self.subscriptions {
            if subscription.kind.map_or(true, |k| k == kind) {
                (subscription.listener)(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemType;
    use std::{cell::RefCell, rc::Rc};

    #[test]
    fn delivers_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = log.clone();
        bus.subscribe(EventKind::CurrencyChanged, move |event| {
            first.borrow_mut().push(format!("first {event:?}"));
        });
        let second = log.clone();
        bus.subscribe_all(move |event| {
            second.borrow_mut().push(format!("second {}", event.kind()));
        });

        bus.emit(&ServiceEvent::CurrencyChanged(5));
        bus.emit(&ServiceEvent::InventoryChanged);

        assert_eq!(
            *log.borrow(),
            vec![
                "first CurrencyChanged(5)".to_string(),
                "second CurrencyChanged".to_string(),
                "second InventoryChanged".to_string(),
            ]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hits = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();

        let counter = hits.clone();
        let id = bus.subscribe(EventKind::ItemAdded, move |_| *counter.borrow_mut() += 1);
        let record = crate::models::ItemRecord::new("a", "A", "", 1, ItemType::Material);

        bus.emit(&ServiceEvent::ItemAdded(record.clone()));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&ServiceEvent::ItemAdded(record));

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(bus.listener_count(EventKind::ItemAdded), 0);
    }

    #[test]
    fn listener_count_includes_wildcards() {
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::ItemRemoved, |_| {});
        bus.subscribe_all(|_| {});
        assert_eq!(bus.listener_count(EventKind::ItemRemoved), 2);
        assert_eq!(bus.listener_count(EventKind::ItemPurchased), 1);
    }
}
