//! Dead letters: deliveries that exhausted the queue's retry budget

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::Result;

/// A delivery the queue will not retry again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub tenant_id: String,
    pub event_id: Uuid,
    pub event_type: String,
    /// Attempts made, counting this one
    pub attempts: u32,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

/// Where dead letters go
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn record(&self, letter: DeadLetter) -> Result<()>;
}

/// Records dead letters as error-level log events only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDeadLetterSink;

#[async_trait]
impl DeadLetterSink for LogDeadLetterSink {
    async fn record(&self, letter: DeadLetter) -> Result<()> {
        error!(
            tenant_id = %letter.tenant_id,
            event_id = %letter.event_id,
            event_type = %letter.event_type,
            attempts = letter.attempts,
            reason = %letter.reason,
            "webhook dead-lettered"
        );
        Ok(())
    }
}

/// Keeps dead letters in memory
#[derive(Debug, Default)]
pub struct InMemoryDeadLetterSink {
    letters: Mutex<Vec<DeadLetter>>,
}

impl InMemoryDeadLetterSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded letters, oldest first
    pub fn letters(&self) -> Vec<DeadLetter> {
        self.letters.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.letters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.lock().is_empty()
    }
}

#[async_trait]
impl DeadLetterSink for InMemoryDeadLetterSink {
    async fn record(&self, letter: DeadLetter) -> Result<()> {
        LogDeadLetterSink.record(letter.clone()).await?;
        self.letters.lock().push(letter);
        Ok(())
    }
}
