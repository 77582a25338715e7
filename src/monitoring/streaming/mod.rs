/*!
 * Event Streaming
 * Fan-out of monitor events to independent subscriber mailboxes
 *
 * Every subscriber owns a bounded lock-free mailbox and sees every event its
 * filter accepts. A full mailbox evicts its oldest event, so the newest one
 * (a session's closing report included) is always delivered. Events published
 * while nobody is subscribed wait in a backlog of the same capacity and are
 * handed to the next subscriber.
 */

use super::events::{EventFilter, MonitorEvent};
use super::sink::EventSink;
use crate::core::limits::EVENT_RING_SIZE;
use crossbeam_queue::ArrayQueue;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Stream statistics
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub events_produced: u64,
    pub events_consumed: u64,
    /// Oldest events evicted from full mailboxes or the backlog
    pub events_dropped: u64,
    pub active_subscribers: usize,
}

struct Mailbox {
    queue: ArrayQueue<MonitorEvent>,
    filter: EventFilter,
}

impl Mailbox {
    /// Returns true when an older event had to make room
    #[inline]
    fn deliver(&self, event: MonitorEvent) -> bool {
        self.queue.force_push(event).is_some()
    }
}

struct Shared {
    capacity: usize,
    backlog: ArrayQueue<MonitorEvent>,
    mailboxes: RwLock<Vec<Arc<Mailbox>>>,
    produced: AtomicU64,
    consumed: AtomicU64,
    dropped: AtomicU64,
}

/// Cloneable publishing side; clones share subscribers and counters
#[derive(Clone)]
pub struct EventStream {
    shared: Arc<Shared>,
}

impl EventStream {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_RING_SIZE)
    }

    /// Stream whose mailboxes and backlog each hold `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                capacity,
                backlog: ArrayQueue::new(capacity),
                mailboxes: RwLock::new(Vec::new()),
                produced: AtomicU64::new(0),
                consumed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Deliver to every matching subscriber, or to the backlog if there are none
    ///
    /// Returns false when an older event was evicted to make room.
    pub fn push(&self, event: MonitorEvent) -> bool {
        let evicted = {
            let mailboxes = self.shared.mailboxes.read();
            if mailboxes.is_empty() {
                u64::from(self.shared.backlog.force_push(event).is_some())
            } else {
                let mut evicted = 0;
                for mailbox in mailboxes.iter().filter(|m| event.matches(&m.filter)) {
                    if mailbox.deliver(event.clone()) {
                        evicted += 1;
                    }
                }
                evicted
            }
        };

        self.shared.produced.fetch_add(1, Ordering::Relaxed);
        if evicted > 0 {
            self.shared.dropped.fetch_add(evicted, Ordering::Relaxed);
        }
        evicted == 0
    }

    /// Subscribe to every event
    pub fn subscribe(&self) -> Subscriber {
        self.subscribe_filtered(EventFilter::new())
    }

    /// Subscribe to the events `filter` accepts
    ///
    /// Matching backlog events move into the new mailbox; the rest stay for
    /// later subscribers.
    pub fn subscribe_filtered(&self, filter: EventFilter) -> Subscriber {
        let mailbox = Arc::new(Mailbox {
            queue: ArrayQueue::new(self.shared.capacity),
            filter,
        });

        let mut mailboxes = self.shared.mailboxes.write();
        let mut kept = Vec::new();
        while let Some(event) = self.shared.backlog.pop() {
            if event.matches(&mailbox.filter) {
                mailbox.deliver(event);
            } else {
                kept.push(event);
            }
        }
        for event in kept {
            self.shared.backlog.force_push(event);
        }
        mailboxes.push(Arc::clone(&mailbox));
        drop(mailboxes);

        Subscriber {
            stream: self.clone(),
            mailbox,
            received: 0,
        }
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            events_produced: self.shared.produced.load(Ordering::Relaxed),
            events_consumed: self.shared.consumed.load(Ordering::Relaxed),
            events_dropped: self.shared.dropped.load(Ordering::Relaxed),
            active_subscribers: self.shared.mailboxes.read().len(),
        }
    }

    /// Events waiting for a first subscriber
    #[inline]
    pub fn backlog_len(&self) -> usize {
        self.shared.backlog.len()
    }

    fn unsubscribe(&self, mailbox: &Arc<Mailbox>) {
        self.shared
            .mailboxes
            .write()
            .retain(|m| !Arc::ptr_eq(m, mailbox));
    }
}

impl EventSink for EventStream {
    fn publish(&self, event: MonitorEvent) {
        self.push(event);
    }
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of one subscription
pub struct Subscriber {
    stream: EventStream,
    mailbox: Arc<Mailbox>,
    received: u64,
}

impl Subscriber {
    /// Oldest undelivered event
    #[inline]
    pub fn next(&mut self) -> Option<MonitorEvent> {
        let event = self.mailbox.queue.pop()?;
        self.received += 1;
        self.stream.shared.consumed.fetch_add(1, Ordering::Relaxed);
        Some(event)
    }

    /// Take everything currently queued, oldest first
    pub fn drain(&mut self) -> Vec<MonitorEvent> {
        let mut events = Vec::with_capacity(self.mailbox.queue.len());
        while let Some(event) = self.next() {
            events.push(event);
        }
        events
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.mailbox.queue.len()
    }

    #[inline]
    pub fn received(&self) -> u64 {
        self.received
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.stream.unsubscribe(&self.mailbox);
    }
}
