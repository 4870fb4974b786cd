//! [crates/clarion-agent/src/queue.rs]
//! A bounded FIFO of envelopes the agent could not deliver yet. Kept
//! in memory only: an agent restart loses unsent envelopes, which is
//! acceptable because the next observation window will resketch the
//! same endpoints.

use std::collections::VecDeque;

use clarion_transport::SketchEnvelope;

use crate::errors::AgentError;

pub struct SpoolQueue {
    capacity: usize,
    pending: VecDeque<SketchEnvelope>,
}

impl SpoolQueue {
    pub fn new(capacity: usize) -> Self {
        SpoolQueue { capacity, pending: VecDeque::with_capacity(capacity.min(1024)) }
    }

    pub fn push(&mut self, envelope: SketchEnvelope) -> Result<(), AgentError> {
        if self.pending.len() >= self.capacity {
            return Err(AgentError::SpoolFull { capacity: self.capacity });
        }
        self.pending.push_back(envelope);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<SketchEnvelope> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clarion_model::endpoint::EndpointKey;
    use clarion_sketch::{EndpointSketch, SketchShape};
    use uuid::Uuid;

    fn envelope() -> SketchEnvelope {
        SketchEnvelope {
            agent_id: Uuid::new_v4(),
            endpoint_key: EndpointKey::minted(),
            sequence: 1,
            window_start: Utc::now(),
            window_end: Utc::now(),
            sketch: EndpointSketch::new(SketchShape::new(8, 64, 3), Utc::now()),
        }
    }

    #[test]
    fn drains_in_fifo_order() {
        let mut queue = SpoolQueue::new(4);
        let a = envelope();
        let b = envelope();
        let a_key = a.endpoint_key.clone();
        let b_key = b.endpoint_key.clone();

        queue.push(a).unwrap();
        queue.push(b).unwrap();

        assert_eq!(queue.pop().unwrap().endpoint_key, a_key);
        assert_eq!(queue.pop().unwrap().endpoint_key, b_key);
        assert!(queue.is_empty());
    }

    #[test]
    fn rejects_push_past_capacity() {
        let mut queue = SpoolQueue::new(1);
        queue.push(envelope()).unwrap();
        assert!(matches!(queue.push(envelope()), Err(AgentError::SpoolFull { capacity: 1 })));
    }
}
