//! Detection of a loop that keeps producing the same assistant output.

use crate::memory::ConversationMemory;
use crate::message::{Message, Role};

/// Duplicate count at which a conversation is considered stalled.
pub const DEFAULT_DUPLICATE_THRESHOLD: usize = 2;

/// Guidance prepended to the next-step prompt once a stall is detected.
pub const STALL_NOTICE: &str = "Observed duplicate responses. Consider new strategies and avoid repeating ineffective paths already attempted.";

/// Pure predicate over conversation memory.
///
/// Only the assistant subsequence matters: entries of other roles neither
/// count as duplicates nor break a run of duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallDetector {
    threshold: usize,
}

impl Default for StallDetector {
    fn default() -> Self {
        Self::new(DEFAULT_DUPLICATE_THRESHOLD)
    }
}

impl StallDetector {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether the latest assistant output repeats at least `threshold`
    /// earlier assistant outputs.
    pub fn is_stuck(&self, memory: &ConversationMemory) -> bool {
        if memory.len() < 2 {
            return false;
        }

        let mut assistant_turns = memory
            .iter()
            .rev()
            .filter(|message| message.role() == Role::Assistant);

        let Some(latest) = assistant_turns
            .next()
            .and_then(Message::content)
            .filter(|content| !content.is_empty())
        else {
            return false;
        };

        let duplicates = assistant_turns
            .filter(|message| message.content() == Some(latest))
            .count();

        duplicates >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn memory_of(entries: &[(Role, Option<&str>)]) -> ConversationMemory {
        let mut memory = ConversationMemory::unbounded();
        memory.add_all(
            entries
                .iter()
                .map(|(role, content)| Message::for_role(*role, content.map(str::to_string))),
        );
        memory
    }

    const A: Role = Role::Assistant;
    const U: Role = Role::User;

    #[rstest]
    #[case::empty(&[])]
    #[case::singleton(&[(A, Some("only"))])]
    #[case::unique(&[(A, Some("Unique result 1")), (A, Some("Unique result 2"))])]
    #[case::interleaved_user(&[
        (A, Some("First Message")),
        (A, Some("Duplicate result")),
        (U, Some("Duplicate result")),
        (A, Some("Duplicate result")),
    ])]
    #[case::last_assistant_without_content(&[
        (A, Some("First Message")),
        (A, Some("Duplicate result")),
        (U, Some("Duplicate result")),
        (A, None),
    ])]
    #[case::last_assistant_empty(&[(A, Some("")), (A, Some("")), (A, Some(""))])]
    fn not_stuck(#[case] entries: &[(Role, Option<&str>)]) {
        assert!(!StallDetector::default().is_stuck(&memory_of(entries)));
    }

    #[test]
    fn three_identical_assistant_entries_are_stuck() {
        let memory = memory_of(&[
            (A, Some("Duplicate result")),
            (A, Some("Duplicate result")),
            (A, Some("Duplicate result")),
        ]);
        assert!(StallDetector::default().is_stuck(&memory));
    }

    #[test]
    fn threshold_one_needs_a_single_repeat() {
        let memory = memory_of(&[(A, Some("Stuck result")), (A, Some("Stuck result"))]);
        assert!(StallDetector::new(1).is_stuck(&memory));
        assert!(!StallDetector::default().is_stuck(&memory));
    }

    #[test]
    fn trailing_non_assistant_entries_are_skipped() {
        let memory = memory_of(&[
            (A, Some("same")),
            (U, Some("other")),
            (A, Some("same")),
            (A, Some("same")),
            (U, Some("tail")),
        ]);
        assert!(StallDetector::default().is_stuck(&memory));
    }

    #[test]
    fn interleaved_entries_do_not_reset_the_count() {
        let memory = memory_of(&[
            (A, Some("same")),
            (U, Some("noise")),
            (Role::Tool, Some("noise")),
            (A, Some("same")),
            (Role::System, Some("same")),
            (A, Some("same")),
        ]);
        assert!(StallDetector::default().is_stuck(&memory));
    }
}
