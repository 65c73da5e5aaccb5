//! Event bus for cache events
//!
//! Lets embedders observe what the cache decides on its own:
//! - warnings (capacity failures, destructive resets)
//! - evictions

use arc_swap::ArcSwap;
use log::warn;
use std::{
	panic::{AssertUnwindSafe, catch_unwind},
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
};

/// Events emitted by an [`OfflineDatabase`](crate::OfflineDatabase).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	/// Warning message, also written to the log
	Warning { message: String },

	/// Least recently used entries were removed to make room for a write
	Eviction { entries: u64, bytes: u64 },
}

/// Handle of a subscription, used to [`unsubscribe`](EventBus::unsubscribe) again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Listeners shared by every clone of an [`EventBus`].
///
/// Listeners run synchronously on the thread that caused the event, once the transaction concerned is
/// finished. Subscribing while an event is delivered takes effect with the next event.
#[derive(Clone)]
pub struct EventBus {
	listeners: Arc<ArcSwap<Vec<(ListenerId, Listener)>>>,
	next_id: Arc<AtomicU64>,
}

impl EventBus {
	pub fn new() -> Self {
		Self {
			listeners: Arc::new(ArcSwap::from_pointee(Vec::new())),
			next_id: Arc::new(AtomicU64::new(0)),
		}
	}

	pub fn subscribe<F>(&self, listener: F) -> ListenerId
	where
		F: Fn(&Event) + Send + Sync + 'static,
	{
		let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
		let listener: Listener = Arc::new(listener);
		self.listeners.rcu(|current| {
			let mut listeners = Vec::clone(current);
			listeners.push((id, listener.clone()));
			listeners
		});
		id
	}

	/// Removes a listener. Returns `false` if it was not subscribed (anymore).
	pub fn unsubscribe(&self, id: ListenerId) -> bool {
		let previous = self.listeners.rcu(|current| {
			current
				.iter()
				.filter(|(listener_id, _)| *listener_id != id)
				.cloned()
				.collect::<Vec<_>>()
		});
		previous.iter().any(|(listener_id, _)| *listener_id == id)
	}

	/// Delivers `event` to every listener. A listener that panics is skipped.
	pub fn emit(&self, event: &Event) {
		for (id, listener) in self.listeners.load().iter() {
			if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
				warn!("event listener {id:?} panicked on {event:?}");
			}
		}
	}

	pub fn warn(&self, message: String) {
		self.emit(&Event::Warning { message });
	}

	pub fn eviction(&self, entries: u64, bytes: u64) {
		self.emit(&Event::Eviction { entries, bytes });
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for EventBus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBus")
			.field("listeners", &self.listeners.load().len())
			.finish()
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use std::sync::Mutex;

	/// Collects every event emitted on `bus`.
	pub fn record(bus: &EventBus) -> Arc<Mutex<Vec<Event>>> {
		let events = Arc::new(Mutex::new(Vec::new()));
		let sink = events.clone();
		bus.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
		events
	}

	/// Messages of all warnings in `events`.
	pub fn warnings(events: &Mutex<Vec<Event>>) -> Vec<String> {
		events
			.lock()
			.unwrap()
			.iter()
			.filter_map(|event| match event {
				Event::Warning { message } => Some(message.clone()),
				Event::Eviction { .. } => None,
			})
			.collect()
	}

	#[test]
	fn default_has_no_listeners() {
		assert_eq!(EventBus::default().listeners.load().len(), 0);
	}

	#[test]
	fn subscribe_and_emit() {
		let bus = EventBus::new();
		let events = record(&bus);
		bus.warn("first".to_string());
		bus.eviction(2, 2048);
		assert_eq!(
			*events.lock().unwrap(),
			vec![
				Event::Warning {
					message: "first".to_string()
				},
				Event::Eviction {
					entries: 2,
					bytes: 2048
				},
			]
		);
	}

	#[test]
	fn listener_ids_are_sequential() {
		let bus = EventBus::new();
		assert_eq!(bus.subscribe(|_| {}), ListenerId(0));
		assert_eq!(bus.subscribe(|_| {}), ListenerId(1));
	}

	#[test]
	fn unsubscribe_stops_delivery() {
		let bus = EventBus::new();
		let kept = record(&bus);
		let dropped = Arc::new(Mutex::new(0));
		let counter = dropped.clone();
		let id = bus.subscribe(move |_| *counter.lock().unwrap() += 1);

		bus.eviction(1, 10);
		assert!(bus.unsubscribe(id));
		bus.eviction(1, 10);

		assert_eq!(*dropped.lock().unwrap(), 1);
		assert_eq!(kept.lock().unwrap().len(), 2);
		assert!(!bus.unsubscribe(id));
	}

	#[test]
	fn ids_are_not_reused_after_unsubscribe() {
		let bus = EventBus::new();
		let first = bus.subscribe(|_| {});
		bus.unsubscribe(first);
		assert_ne!(bus.subscribe(|_| {}), first);
	}

	#[test]
	fn clones_share_listeners() {
		let bus = EventBus::new();
		let events = record(&bus);
		bus.clone().warn("via clone".to_string());
		assert_eq!(warnings(&events), vec!["via clone"]);
	}

	#[test]
	fn panicking_listener_does_not_block_others() {
		let bus = EventBus::new();
		bus.subscribe(|_| panic!("listener failure"));
		let events = record(&bus);
		bus.warn("still delivered".to_string());
		assert_eq!(warnings(&events).len(), 1);
	}

	#[test]
	fn debug_shows_listener_count() {
		let bus = EventBus::new();
		bus.subscribe(|_| {});
		assert_eq!(format!("{bus:?}"), "EventBus { listeners: 1 }");
	}
}
