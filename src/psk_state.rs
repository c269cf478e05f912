//! Replay protection for PSK conversations.
//!
//! Each peer has its own [`PSKState`]. The send counter is assigned
//! monotonically and is independent of receive tracking; received counters
//! are validated against a sliding window around the highest counter seen
//! from the peer, and every accepted counter is remembered within that
//! window so a replay is rejected.

use std::collections::HashSet;

use crate::error::{AlgoChatError, Result};
use crate::psk_types::PSK_COUNTER_WINDOW;

/// Counter state for a PSK conversation with a single peer.
///
/// Updates must be serialized per peer; `validate_counter` alone may run
/// concurrently with other reads.
#[derive(Debug, Clone, Default)]
pub struct PSKState {
    /// Next counter to assign to an outgoing message.
    pub send_counter: u32,
    /// Highest counter received from the peer.
    pub peer_last_counter: u32,
    /// Accepted counters within the window, for replay detection.
    pub seen_counters: HashSet<u32>,
}

impl PSKState {
    /// Fresh state with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a received counter without mutating state.
    ///
    /// Accepts iff the counter has not been seen and lies within
    /// `peer_last_counter ± PSK_COUNTER_WINDOW`. Reordering inside the
    /// window is fine; forward jumps are bounded by the window too.
    pub fn validate_counter(&self, counter: u32) -> Result<()> {
        if self.seen_counters.contains(&counter) {
            return Err(AlgoChatError::PskInvalidCounter {
                counter,
                reason: "counter already seen".to_string(),
            });
        }

        let low = self.peer_last_counter.saturating_sub(PSK_COUNTER_WINDOW);
        let high = self.peer_last_counter.saturating_add(PSK_COUNTER_WINDOW);
        if counter < low || counter > high {
            return Err(AlgoChatError::PskInvalidCounter {
                counter,
                reason: format!(
                    "outside window [{}, {}] (last: {})",
                    low, high, self.peer_last_counter
                ),
            });
        }

        Ok(())
    }

    /// Record an accepted counter after the message decrypted successfully.
    ///
    /// Bumps the high-water mark and prunes remembered counters that fell
    /// out of the window.
    pub fn record_receive(&mut self, counter: u32) {
        self.seen_counters.insert(counter);

        if counter > self.peer_last_counter {
            self.peer_last_counter = counter;
        }

        let cutoff = self.peer_last_counter.saturating_sub(PSK_COUNTER_WINDOW);
        self.seen_counters.retain(|&c| c >= cutoff);
    }

    /// Return the counter for the next outgoing message and advance.
    pub fn advance_send_counter(&mut self) -> u32 {
        let counter = self.send_counter;
        self.send_counter = self.send_counter.wrapping_add(1);
        counter
    }
}
