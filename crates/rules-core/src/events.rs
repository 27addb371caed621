//! Cancelable, replaceable causal events.
//!
//! Steps that need player input or that other effects may cancel or
//! substitute are modeled as queued events, never as blocking calls inside
//! the effect engine. An event can forward to a replacement, forming a
//! chain; resolution walks the chain (bounded) and runs the handler of the
//! final event. Contingent generators let a resolving event enqueue
//! follow-up events in order.

use std::fmt;

use serde_json::Value;

use crate::state::GameState;

/// Property bag attached to an event.
pub type EventProperties = serde_json::Map<String, Value>;

/// Handler run when an event resolves.
pub type EventHandler = Box<dyn FnMut(&GameEvent, &mut GameState) + Send + Sync>;

/// Condition rechecked at resolution time; failing it cancels the event.
pub type EventCondition = Box<dyn Fn(&GameEvent, &GameState) -> bool + Send + Sync>;

/// Generator of contingent events queued after the event resolves.
pub type ContingentGenerator =
    Box<dyn Fn(&GameEvent) -> Vec<(GameEvent, Option<EventHandler>)> + Send + Sync>;

/// Identifier of a queued event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// One causal event.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameEvent {
    pub name: String,
    /// Position in the game-wide sequence, assigned at creation.
    pub order: u64,
    pub cancelled: bool,
    pub resolved: bool,
    pub properties: EventProperties,
    /// Forwarding chain: set when another effect substituted this event.
    replacement: Option<Box<GameEvent>>,
}

impl GameEvent {
    pub fn new(name: impl Into<String>, properties: EventProperties) -> Self {
        Self {
            name: name.into(),
            order: 0,
            cancelled: false,
            resolved: false,
            properties,
            replacement: None,
        }
    }

    /// Substitutes this event with another; resolution follows the chain.
    pub fn replace_with(&mut self, replacement: GameEvent) {
        match &mut self.replacement {
            Some(next) => next.replace_with(replacement),
            None => self.replacement = Some(Box::new(replacement)),
        }
    }

    pub fn replacement(&self) -> Option<&GameEvent> {
        self.replacement.as_deref()
    }

    /// The event at the end of the forwarding chain, walking at most
    /// `max_depth` links. Exceeding the bound logs and stops at the last
    /// reachable event.
    pub fn final_event(&self, max_depth: u32) -> &GameEvent {
        let mut current = self;
        for _ in 0..max_depth {
            match current.replacement.as_deref() {
                Some(next) => current = next,
                None => return current,
            }
        }
        if current.replacement.is_some() {
            tracing::warn!(
                event = %self.name,
                max_depth,
                "event replacement chain exceeds depth bound, stopping early"
            );
        }
        current
    }
}

struct QueuedEvent {
    id: EventId,
    event: GameEvent,
    handler: Option<EventHandler>,
    condition: Option<EventCondition>,
    contingent: Option<ContingentGenerator>,
}

/// Ordered queue of pending events for one game.
#[derive(Default)]
pub struct EventQueue {
    queue: Vec<QueuedEvent>,
    next_id: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and enqueues an event. The event's order comes from the
    /// game-wide sequence so events interleave deterministically with
    /// modifier creation.
    pub fn create(
        &mut self,
        state: &mut GameState,
        name: impl Into<String>,
        properties: EventProperties,
        handler: Option<EventHandler>,
    ) -> EventId {
        let mut event = GameEvent::new(name, properties);
        event.order = state.next_sequence();

        let id = EventId(self.next_id);
        self.next_id += 1;
        self.queue.push(QueuedEvent {
            id,
            event,
            handler,
            condition: None,
            contingent: None,
        });
        id
    }

    /// Attaches a resolution-time condition to a pending event.
    pub fn set_condition(&mut self, id: EventId, condition: EventCondition) {
        if let Some(entry) = self.entry_mut(id) {
            entry.condition = Some(condition);
        }
    }

    /// Attaches a contingent-event generator to a pending event.
    pub fn set_contingent(&mut self, id: EventId, generator: ContingentGenerator) {
        if let Some(entry) = self.entry_mut(id) {
            entry.contingent = Some(generator);
        }
    }

    /// Cancels a pending event. Idempotent.
    pub fn cancel(&mut self, id: EventId) {
        if let Some(entry) = self.entry_mut(id) {
            entry.event.cancelled = true;
        }
    }

    /// Substitutes a pending event, extending its forwarding chain.
    pub fn replace(&mut self, id: EventId, replacement: GameEvent) {
        if let Some(entry) = self.entry_mut(id) {
            entry.event.replace_with(replacement);
        }
    }

    pub fn event(&self, id: EventId) -> Option<&GameEvent> {
        self.queue.iter().find(|e| e.id == id).map(|e| &e.event)
    }

    /// Number of events neither resolved nor cancelled.
    pub fn pending(&self) -> usize {
        self.queue
            .iter()
            .filter(|e| !e.event.resolved && !e.event.cancelled)
            .count()
    }

    /// Resolves every pending event in order, including contingent events
    /// generated along the way. Returns how many events ran.
    ///
    /// For each event: the condition is rechecked (failing cancels), the
    /// replacement chain is walked within the configured depth bound, and
    /// the handler runs against the final event of the chain.
    pub fn resolve_pending(&mut self, state: &mut GameState) -> usize {
        let max_depth = state.config.max_replacement_depth;
        let mut ran = 0;
        let mut idx = 0;

        // Contingents append during the walk; the index loop picks them up.
        while idx < self.queue.len() {
            let entry = &mut self.queue[idx];
            idx += 1;

            if entry.event.resolved || entry.event.cancelled {
                continue;
            }

            if let Some(condition) = &entry.condition {
                if !condition(&entry.event, state) {
                    entry.event.cancelled = true;
                    continue;
                }
            }

            if let Some(handler) = &mut entry.handler {
                let resolved_view = entry.event.final_event(max_depth).clone();
                handler(&resolved_view, state);
            }
            entry.event.resolved = true;
            ran += 1;

            let contingent = self.queue[idx - 1]
                .contingent
                .as_ref()
                .map(|generate| generate(&self.queue[idx - 1].event))
                .unwrap_or_default();
            for (event, handler) in contingent {
                let name = event.name.clone();
                let id = self.create(state, name, event.properties.clone(), handler);
                if let Some(entry) = self.entry_mut(id) {
                    entry.event.cancelled = event.cancelled;
                }
            }
        }
        ran
    }

    /// Drops resolved and cancelled events, typically at a phase boundary.
    ///
    /// Event ids stay unique afterwards; a pruned id stops resolving.
    /// Returns how many were dropped.
    pub fn prune_settled(&mut self) -> usize {
        let before = self.queue.len();
        self.queue
            .retain(|e| !e.event.resolved && !e.event.cancelled);
        before - self.queue.len()
    }

    fn entry_mut(&mut self, id: EventId) -> Option<&mut QueuedEvent> {
        self.queue.iter_mut().find(|e| e.id == id)
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("len", &self.queue.len())
            .field("pending", &self.pending())
            .finish()
    }
}
