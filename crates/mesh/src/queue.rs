//! Deferred work queue
//!
//! Radio callbacks must return quickly, so anything slow (driving the
//! motors, writing to every child) is queued here by the event dispatcher
//! and run later by [`MeshNode::run_deferred`](crate::MeshNode::run_deferred).

use std::collections::VecDeque;

use crate::error::{MeshError, MeshResult};
use crate::packet::{AckNotification, CommandPacket};

/// Maximum number of queued jobs
pub const DEFERRED_QUEUE_DEPTH: usize = 16;

/// Work produced by event handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Command addressed to this node
    Execute(CommandPacket),
    /// Command for someone else; flood it to the children
    Forward(CommandPacket),
    /// Ack from a child; pass it toward the root
    RelayAck(AckNotification),
}

impl Job {
    /// Kind tag for logging and dispatch reports
    pub fn kind(&self) -> JobKind {
        match self {
            Job::Execute(_) => JobKind::Execute,
            Job::Forward(_) => JobKind::Forward,
            Job::RelayAck(_) => JobKind::RelayAck,
        }
    }
}

/// Job discriminant, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Run a self-addressed command
    Execute,
    /// Flood a command to the children
    Forward,
    /// Pass a child's ack upward
    RelayAck,
}

/// Bounded FIFO of [`Job`]s
#[derive(Debug)]
pub struct DeferredQueue {
    jobs: VecDeque<Job>,
    depth: usize,
}

impl Default for DeferredQueue {
    fn default() -> Self {
        Self::new(DEFERRED_QUEUE_DEPTH)
    }
}

impl DeferredQueue {
    /// Empty queue holding at most `depth` jobs
    pub fn new(depth: usize) -> Self {
        Self {
            jobs: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Enqueue a job; a full queue rejects it and keeps what it has.
    pub fn push(&mut self, job: Job) -> MeshResult<()> {
        if self.jobs.len() >= self.depth {
            return Err(MeshError::QueueFull { depth: self.depth });
        }
        self.jobs.push_back(job);
        Ok(())
    }

    /// Oldest job, if any
    pub fn pop(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    /// Jobs waiting
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
