//! Property-Based Tests for Conversation Memory
//!
//! The capacity invariant must hold for any capacity and any insertion
//! sequence, whether entries arrive one at a time or in one bulk call.

use proptest::prelude::*;
use runloop::{ConversationMemory, Message};
use runloop::runloop_core::{Role, StallDetector};

// Strategy for generating conversation entries of any role
fn message_strategy() -> impl Strategy<Value = Message> {
    (
        prop::sample::select(Role::all().to_vec()),
        prop::option::of("[a-z ]{0,12}"),
    )
        .prop_map(|(role, content)| Message::for_role(role, content))
}

proptest! {
    /// Property: single and bulk insertion converge to the last `capacity` entries
    #[test]
    fn prop_capacity_keeps_most_recent(
        capacity in 1usize..20,
        messages in prop::collection::vec(message_strategy(), 0..60)
    ) {
        let mut one_by_one = ConversationMemory::with_capacity(capacity);
        for message in messages.clone() {
            one_by_one.add(message);
        }

        let mut bulk = ConversationMemory::with_capacity(capacity);
        bulk.add_all(messages.clone());

        let skip = messages.len().saturating_sub(capacity);
        let expected: Vec<Message> = messages[skip..].to_vec();

        prop_assert_eq!(one_by_one.to_vec(), expected.clone());
        prop_assert_eq!(bulk.to_vec(), expected);
    }

    /// Property: `recent(n)` is a suffix of the stored entries, capped at the stored count
    #[test]
    fn prop_recent_is_suffix(
        messages in prop::collection::vec(message_strategy(), 0..40),
        n in 1usize..60
    ) {
        let mut memory = ConversationMemory::unbounded();
        memory.add_all(messages.clone());

        let recent = memory.recent(n).unwrap();
        let skip = messages.len().saturating_sub(n);

        prop_assert_eq!(recent, messages[skip..].to_vec());
    }

    /// Property: non-assistant entries never change the stall verdict
    #[test]
    fn prop_stall_ignores_other_roles(
        repeats in 0usize..5,
        noise in prop::collection::vec("[a-z]{1,8}", 0..5),
        threshold in 1usize..4
    ) {
        let mut clean = ConversationMemory::unbounded();
        let mut noisy = ConversationMemory::unbounded();
        for i in 0..=repeats {
            clean.add(Message::assistant("same"));
            noisy.add(Message::assistant("same"));
            if let Some(text) = noise.get(i) {
                noisy.add(Message::user(text.as_str()));
                noisy.add(Message::user("same"));
            }
        }

        let detector = StallDetector::new(threshold);
        // A lone entry cannot stall, even with noise around it.
        let expected = repeats >= threshold;
        prop_assert_eq!(detector.is_stuck(&clean), expected);
        prop_assert_eq!(detector.is_stuck(&noisy), expected);
    }
}

#[test]
fn test_recent_rejects_zero() {
    let memory = ConversationMemory::default();
    assert!(memory.recent(0).is_err());
}
