//! Nullable execution handler.

use polis_governance::{ExecutionHandler, Proposal};
use polis_types::BlockHeight;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Shared record of (proposal_id, block) for every handler call.
pub type HandlerLog = Arc<Mutex<Vec<(u64, BlockHeight)>>>;

/// Returns pre-programmed answers in order, then `default` once they run out.
pub struct ScriptedHandler {
    answers: VecDeque<bool>,
    default: bool,
    log: HandlerLog,
}

impl ScriptedHandler {
    pub fn new(answers: impl IntoIterator<Item = bool>, default: bool) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            default,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always succeeds.
    pub fn succeeding() -> Self {
        Self::new([], true)
    }

    pub fn log(&self) -> HandlerLog {
        Arc::clone(&self.log)
    }
}

impl ExecutionHandler for ScriptedHandler {
    fn execute(&mut self, proposal: &Proposal, block: BlockHeight) -> bool {
        if let Ok(mut log) = self.log.lock() {
            log.push((proposal.id, block));
        }
        self.answers.pop_front().unwrap_or(self.default)
    }
}
