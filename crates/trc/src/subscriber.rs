/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::{Arc, atomic::Ordering};

use ahash::AHashSet;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{
    Event, EventDetails, EventType, Level,
    channel::ChannelError,
    collector::{COLLECTOR_UPDATES, Collector, TRACING_LEVEL, Update},
};

const MAX_BATCH_SIZE: usize = 32768;

pub type EventBatch = Vec<Arc<Event<EventDetails>>>;

#[derive(Debug)]
pub(crate) struct Subscriber {
    pub level: Level,
    pub disabled: AHashSet<EventType>,
    pub tx: mpsc::Sender<EventBatch>,
    pub lossy: bool,
    pub batch: EventBatch,
}

#[derive(Debug, Clone)]
pub struct SubscriberBuilder {
    pub level: Level,
    pub disabled: AHashSet<EventType>,
    pub lossy: bool,
}

impl Subscriber {
    #[inline(always)]
    pub fn push_event(&mut self, event: &Arc<Event<EventDetails>>) {
        if event.inner.level >= self.level && !self.disabled.contains(&event.inner.typ) {
            self.batch.push(event.clone());
        }
    }

    pub fn send_batch(&mut self) -> Result<(), ChannelError> {
        if self.batch.is_empty() {
            return Ok(());
        }

        match self.tx.try_send(std::mem::take(&mut self.batch)) {
            Ok(_) => Ok(()),
            Err(TrySendError::Full(mut events)) => {
                if self.lossy && events.len() > MAX_BATCH_SIZE {
                    events.retain(|e| e.inner.level == Level::Error);
                    events.truncate(MAX_BATCH_SIZE);
                }
                self.batch = events;
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(ChannelError),
        }
    }
}

impl SubscriberBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_disabled(mut self, disabled: impl IntoIterator<Item = EventType>) -> Self {
        self.disabled.extend(disabled);
        self
    }

    pub fn with_lossy(mut self, lossy: bool) -> Self {
        self.lossy = lossy;
        self
    }

    /// Registers the subscriber with the collector and lowers the global
    /// level if the subscriber asks for more verbose events.
    pub fn register(self) -> mpsc::Receiver<EventBatch> {
        let (tx, rx) = mpsc::channel(8192);

        if self.level != Level::Disable {
            TRACING_LEVEL.fetch_min(self.level as usize, Ordering::Relaxed);
        }
        COLLECTOR_UPDATES
            .lock()
            .push(Update::RegisterSubscriber(Subscriber {
                level: self.level,
                disabled: self.disabled,
                tx,
                lossy: self.lossy,
                batch: Vec::new(),
            }));
        Collector::wake();

        rx
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self {
            level: Level::Info,
            disabled: AHashSet::new(),
            lossy: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::*;

    #[tokio::test]
    async fn subscriber_receives_events() {
        let mut rx = subscriber::SubscriberBuilder::new()
            .with_level(Level::Trace)
            .with_disabled([EventType::Pop3(Pop3Event::RawInput)])
            .register();

        std::thread::spawn(|| {
            LockEvent::Acquired.into_err().ctx(Key::Id, 7u64).send();
            Pop3Event::RawInput.into_err().send();
            trc::event!(Lock(LockEvent::Released), Id = 7u64);
        })
        .join()
        .unwrap();

        let mut received = Vec::new();
        while received.len() < 2 {
            let batch = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            received.extend(
                batch
                    .into_iter()
                    .filter(|e| matches!(e.inner.typ, EventType::Lock(_) | EventType::Pop3(_))),
            );
        }

        assert_eq!(received[0].inner.typ, EventType::Lock(LockEvent::Acquired));
        assert_eq!(received[0].value_as_uint(Key::Id), Some(7));
        assert_eq!(received[1].inner.typ, EventType::Lock(LockEvent::Released));
    }
}
