use std::collections::VecDeque;

use crate::ingress::IncomingMessage;
use crate::role::AgentRole;

/// A revealed (or revealing) chunk of one agent's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub text: String,
    pub completed: bool,
}

/// Everything revealed for one role during the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAccumulator {
    pub role: AgentRole,
    pub entries: Vec<ChatEntry>,
}

impl RoleAccumulator {
    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.text.as_str()).collect()
    }

    fn in_progress_mut(&mut self) -> Option<&mut ChatEntry> {
        self.entries.iter_mut().find(|e| !e.completed)
    }
}

/// The single in-flight reveal. `revealed` is a byte offset on a char boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    pub role: AgentRole,
    pub text: String,
    pub revealed: usize,
}

impl Animation {
    pub fn is_complete(&self) -> bool {
        self.revealed >= self.text.len()
    }

    fn next_boundary(&self, batch_chars: usize) -> usize {
        self.text[self.revealed..]
            .char_indices()
            .nth(batch_chars)
            .map_or(self.text.len(), |(offset, _)| self.revealed + offset)
    }
}

/// Result of one reveal tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub role: AgentRole,
    pub completed: bool,
}

/// FIFO reveal scheduler. The queue head stays queued while it animates and
/// is popped only once fully revealed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevealScheduler {
    queue: VecDeque<IncomingMessage>,
    animation: Option<Animation>,
    accumulators: Vec<RoleAccumulator>,
    last_revealed: Option<AgentRole>,
}

impl RevealScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, message: IncomingMessage) {
        self.queue.push_back(message);
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Queued entries, including the one currently animating.
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &IncomingMessage> {
        self.queue.iter()
    }

    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.animation.is_none()
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn accumulators(&self) -> &[RoleAccumulator] {
        &self.accumulators
    }

    pub fn accumulator(&self, role: &AgentRole) -> Option<&RoleAccumulator> {
        self.accumulators.iter().find(|acc| &acc.role == role)
    }

    /// Role that received the most recent batch.
    pub fn last_revealed(&self) -> Option<&AgentRole> {
        self.last_revealed.as_ref()
    }

    /// Idle -> Animating. Returns true if a new animation was started.
    pub fn begin_next(&mut self) -> bool {
        if self.animation.is_some() {
            return false;
        }
        let Some(head) = self.queue.front() else {
            return false;
        };
        self.animation = Some(Animation {
            role: head.role.clone(),
            text: head.text.clone(),
            revealed: 0,
        });
        true
    }

    /// Reveal the next `batch_chars` characters of the active entry.
    /// Returns `None` when idle.
    pub fn reveal_batch(&mut self, batch_chars: usize) -> Option<Reveal> {
        let animation = self.animation.as_mut()?;
        let end = animation.next_boundary(batch_chars.max(1));
        let chunk = &animation.text[animation.revealed..end];
        animation.revealed = end;
        let completed = animation.is_complete();
        let role = animation.role.clone();

        let accumulator = match self.accumulators.iter().position(|acc| acc.role == role) {
            Some(index) => &mut self.accumulators[index],
            None => {
                self.accumulators.push(RoleAccumulator {
                    role: role.clone(),
                    entries: Vec::new(),
                });
                let last = self.accumulators.len() - 1;
                &mut self.accumulators[last]
            }
        };
        match accumulator.in_progress_mut() {
            Some(entry) => entry.text.push_str(chunk),
            None => accumulator.entries.push(ChatEntry {
                text: chunk.to_string(),
                completed: false,
            }),
        }

        if completed {
            if let Some(entry) = accumulator.in_progress_mut() {
                entry.completed = true;
            }
            self.animation = None;
            self.queue.pop_front();
        }

        self.last_revealed = Some(role.clone());
        Some(Reveal { role, completed })
    }

    /// Drop everything from the current run.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.animation = None;
        self.accumulators.clear();
        self.last_revealed = None;
    }
}
