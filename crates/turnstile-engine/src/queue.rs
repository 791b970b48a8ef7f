//! Generational FIFO work queues and the queue set the engine drains.
//!
//! [`EventQueue`] is double-buffered. A drain pass takes the *current
//! generation* (everything enqueued before the pass began) out of the
//! queue in one move; anything enqueued or requeued while the pass runs
//! lands in the next generation and is not visited until the following
//! drain. An unconditional requeue therefore cannot spin a pass forever.
//!
//! [`QueueSet`] holds one queue per [`Event`] variant and routes pushed
//! events by variant.

use std::collections::vec_deque;
use std::collections::VecDeque;

use turnstile_core::event::{
    BroadcastEvent, BuffEvent, ClientText, Event, InputEvent, Message, OutboundPayload,
    QuestEvent, RoomActionEvent, SystemEvent,
};
use turnstile_core::id::{ActorId, RoomId};

// ── EventQueue ──────────────────────────────────────────────────

/// An unbounded FIFO queue drained one generation at a time.
#[derive(Debug)]
pub struct EventQueue<T> {
    pending: VecDeque<T>,
    generation: u64,
    requeued: u64,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    /// An empty queue at generation zero.
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            generation: 0,
            requeued: 0,
        }
    }

    /// Append a new item.
    pub fn enqueue(&mut self, item: T) {
        self.pending.push_back(item);
    }

    /// Push an item back for the next drain pass.
    ///
    /// Behaves like [`enqueue`](Self::enqueue) but is counted separately so
    /// throttling and delay pressure show up in metrics.
    pub fn requeue(&mut self, item: T) {
        self.requeued += 1;
        self.pending.push_back(item);
    }

    /// Take everything currently queued as one generation.
    ///
    /// The queue is left empty; items added while the returned generation
    /// is being iterated belong to the next generation.
    pub fn take_generation(&mut self) -> Generation<T> {
        self.generation += 1;
        Generation {
            number: self.generation,
            items: std::mem::take(&mut self.pending).into_iter(),
        }
    }

    /// Items waiting for the next drain.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Items waiting for the next drain, in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.pending.iter()
    }

    /// Number of generations taken so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cumulative number of requeues.
    pub fn requeued_total(&self) -> u64 {
        self.requeued
    }

    /// Discard everything waiting.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// One drained generation of an [`EventQueue`], yielded in enqueue order.
#[derive(Debug)]
pub struct Generation<T> {
    number: u64,
    items: vec_deque::IntoIter<T>,
}

impl<T> Generation<T> {
    /// Sequence number of this generation, starting at 1.
    pub fn number(&self) -> u64 {
        self.number
    }
}

impl<T> Iterator for Generation<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<T> ExactSizeIterator for Generation<T> {}

// ── QueueSet ────────────────────────────────────────────────────

/// One queue per event variant.
///
/// The set is owned by the world core and only touched while the
/// exclusivity token is held.
#[derive(Debug, Default)]
pub struct QueueSet {
    /// Command input, drained each turn.
    pub input: EventQueue<InputEvent>,
    /// Delayed area effects, drained each turn.
    pub room_action: EventQueue<RoomActionEvent>,
    /// Buff grants and removals, drained each turn.
    pub buff: EventQueue<BuffEvent>,
    /// Quest token grants, drained each turn.
    pub quest: EventQueue<QuestEvent>,
    /// Operator commands, drained each message tick.
    pub system: EventQueue<SystemEvent>,
    /// Text to all connections, drained each message tick.
    pub broadcast: EventQueue<BroadcastEvent>,
    /// Structured client payloads, drained each message tick.
    pub outbound: EventQueue<OutboundPayload>,
    /// Web client text, drained each message tick.
    pub client_text: EventQueue<ClientText>,
    /// Actor/room text, drained each message tick.
    pub message: EventQueue<Message>,
}

impl QueueSet {
    /// Empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route an event to its queue.
    pub fn push(&mut self, event: impl Into<Event>) {
        match event.into() {
            Event::Input(e) => self.input.enqueue(e),
            Event::RoomAction(e) => self.room_action.enqueue(e),
            Event::Buff(e) => self.buff.enqueue(e),
            Event::Quest(e) => self.quest.enqueue(e),
            Event::System(e) => self.system.enqueue(e),
            Event::Broadcast(e) => self.broadcast.enqueue(e),
            Event::OutboundPayload(e) => self.outbound.enqueue(e),
            Event::ClientText(e) => self.client_text.enqueue(e),
            Event::Message(e) => self.message.enqueue(e),
        }
    }

    /// Queue text for one actor.
    pub fn send_text(&mut self, actor: ActorId, text: impl Into<String>) {
        self.message.enqueue(Message::to_actor(actor, text));
    }

    /// Queue text for a room, skipping `exclude`.
    pub fn room_text(&mut self, room: RoomId, text: impl Into<String>, exclude: &[ActorId]) {
        let mut msg = Message::to_room(room, text);
        msg.exclude.extend_from_slice(exclude);
        self.message.enqueue(msg);
    }

    /// Queue text for every connection.
    pub fn broadcast(&mut self, text: impl Into<String>, skip_line_refresh: bool) {
        self.broadcast.enqueue(BroadcastEvent {
            text: text.into(),
            skip_line_refresh,
        });
    }

    /// Total items waiting across every queue.
    pub fn total_len(&self) -> usize {
        self.input.len()
            + self.room_action.len()
            + self.buff.len()
            + self.quest.len()
            + self.system.len()
            + self.broadcast.len()
            + self.outbound.len()
            + self.client_text.len()
            + self.message.len()
    }

    /// Discard everything in every queue.
    pub fn clear(&mut self) {
        self.input.clear();
        self.room_action.clear();
        self.buff.clear();
        self.quest.clear();
        self.system.clear();
        self.broadcast.clear();
        self.outbound.clear();
        self.client_text.clear();
        self.message.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_core::event::{BuffChange, Target};
    use turnstile_core::id::{BuffId, MobId};

    // ── Generations ─────────────────────────────────────────────

    #[test]
    fn generation_preserves_fifo_order() {
        let mut q = EventQueue::new();
        for i in 0..5 {
            q.enqueue(i);
        }
        let drained: Vec<_> = q.take_generation().collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
        assert!(q.is_empty());
    }

    #[test]
    fn requeue_during_pass_waits_for_next_generation() {
        let mut q = EventQueue::new();
        q.enqueue(1);
        q.enqueue(2);
        let mut seen = Vec::new();
        for item in q.take_generation() {
            seen.push(item);
            q.requeue(item * 10);
        }
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(q.len(), 2);
        assert_eq!(q.take_generation().collect::<Vec<_>>(), vec![10, 20]);
        assert_eq!(q.requeued_total(), 2);
    }

    #[test]
    fn unconditional_requeue_terminates() {
        let mut q = EventQueue::new();
        q.enqueue("throttled");
        let mut visits = 0;
        for item in q.take_generation() {
            visits += 1;
            q.requeue(item);
        }
        assert_eq!(visits, 1);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn generation_numbers_increase() {
        let mut q: EventQueue<u8> = EventQueue::new();
        assert_eq!(q.take_generation().number(), 1);
        assert_eq!(q.take_generation().number(), 2);
        assert_eq!(q.generation(), 2);
    }

    #[test]
    fn generation_reports_exact_size() {
        let mut q = EventQueue::new();
        q.enqueue('a');
        q.enqueue('b');
        assert_eq!(q.take_generation().len(), 2);
    }

    // ── QueueSet ────────────────────────────────────────────────

    #[test]
    fn push_routes_by_variant() {
        let mut qs = QueueSet::new();
        qs.push(InputEvent::mob(MobId(1), "look", 0));
        qs.push(BuffEvent {
            target: Target::Mob(MobId(1)),
            change: BuffChange::Apply(BuffId(2)),
        });
        qs.push(SystemEvent {
            command: "reload".into(),
        });
        qs.send_text(ActorId(1), "hi");
        qs.room_text(RoomId(1), "hello room", &[ActorId(1)]);
        qs.broadcast("all", false);

        assert_eq!(qs.input.len(), 1);
        assert_eq!(qs.buff.len(), 1);
        assert_eq!(qs.system.len(), 1);
        assert_eq!(qs.message.len(), 2);
        assert_eq!(qs.broadcast.len(), 1);
        assert_eq!(qs.total_len(), 6);

        qs.clear();
        assert_eq!(qs.total_len(), 0);
    }

    #[test]
    fn room_text_carries_exclusions() {
        let mut qs = QueueSet::new();
        qs.room_text(RoomId(3), "boom", &[ActorId(1), ActorId(2)]);
        let msg = qs.message.take_generation().next().unwrap();
        assert_eq!(msg.room, Some(RoomId(3)));
        assert_eq!(msg.exclude.as_slice(), &[ActorId(1), ActorId(2)]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_item_drains_exactly_once_in_order(
                items in prop::collection::vec(any::<u32>(), 0..64),
                split in 0usize..64,
            ) {
                let split = split.min(items.len());
                let mut q = EventQueue::new();
                for &i in &items[..split] {
                    q.enqueue(i);
                }
                let mut out: Vec<u32> = q.take_generation().collect();
                for &i in &items[split..] {
                    q.enqueue(i);
                }
                out.extend(q.take_generation());
                prop_assert_eq!(out, items);
                prop_assert!(q.is_empty());
            }

            #[test]
            fn drain_visits_only_the_snapshot(
                initial in 1usize..32,
                requeue_every in 1usize..4,
            ) {
                let mut q = EventQueue::new();
                for i in 0..initial {
                    q.enqueue(i);
                }
                let mut visits = 0usize;
                for item in q.take_generation() {
                    visits += 1;
                    if item % requeue_every == 0 {
                        q.requeue(item);
                    }
                }
                prop_assert_eq!(visits, initial);
                prop_assert_eq!(q.len(), (0..initial).filter(|i| i % requeue_every == 0).count());
            }
        }
    }
}
