//! Capacity-bounded conversation memory.
//!
//! `ConversationMemory` keeps entries in arrival order. When a capacity is
//! set, every insertion path (single or bulk) ends with the same state: the
//! most recent `capacity` entries, oldest evicted first.

use std::collections::VecDeque;

use serde_json::Value;

use crate::error::{MemoryError, MemoryResult};
use crate::message::Message;

/// Capacity used by [`ConversationMemory::default`].
pub const DEFAULT_MAX_MESSAGES: usize = 100;

/// Ordered, optionally bounded log of conversation entries.
///
/// # Example
///
/// ```rust
/// use runloop_core::{ConversationMemory, Message};
///
/// let mut memory = ConversationMemory::with_capacity(2);
/// memory.add(Message::user("one"));
/// memory.add_all(vec![Message::user("two"), Message::user("three")]);
///
/// let contents: Vec<_> = memory.iter().filter_map(Message::content).collect();
/// assert_eq!(contents, ["two", "three"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMemory {
    messages: VecDeque<Message>,
    capacity: Option<usize>,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_MESSAGES)
    }
}

impl ConversationMemory {
    /// Create an empty memory with an optional capacity bound.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            messages: VecDeque::new(),
            capacity,
        }
    }

    /// Create an empty memory bounded to `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Some(capacity))
    }

    /// Create an empty memory without a capacity bound.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// The capacity bound, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Whether this memory can hold a conversation at all.
    ///
    /// A zero capacity would silently drop every entry, so owners replace
    /// such a memory with a default one at construction.
    pub fn conforms(&self) -> bool {
        self.capacity != Some(0)
    }

    /// Append one entry, then evict the oldest entries beyond capacity.
    pub fn add(&mut self, message: Message) {
        self.messages.push_back(message);
        self.enforce_capacity();
    }

    /// Append entries in order, then evict the oldest entries beyond capacity.
    pub fn add_all<I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = Message>,
    {
        self.messages.extend(messages);
        self.enforce_capacity();
    }

    /// Replace the whole conversation, keeping the capacity invariant.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages.into();
        self.enforce_capacity();
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// The last `n` entries in arrival order.
    ///
    /// Asking for more entries than are stored returns everything.
    pub fn recent(&self, n: usize) -> MemoryResult<Vec<Message>> {
        if n == 0 {
            return Err(MemoryError::InvalidCount { requested: n });
        }
        let skip = self.messages.len().saturating_sub(n);
        Ok(self.messages.iter().skip(skip).cloned().collect())
    }

    /// Serialized form of every entry, in order.
    pub fn to_transport_list(&self) -> Vec<Value> {
        self.messages.iter().map(Message::to_transport).collect()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator {
        self.messages.iter()
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn enforce_capacity(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };
        let overflow = self.messages.len().saturating_sub(capacity);
        if overflow > 0 {
            self.messages.drain(..overflow);
            tracing::trace!(evicted = overflow, capacity, "evicted oldest messages");
        }
    }
}

impl<'a> IntoIterator for &'a ConversationMemory {
    type Item = &'a Message;
    type IntoIter = std::collections::vec_deque::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
