/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{
    cell::RefCell,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::SystemTime,
};

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::{
    Event, EventDetails, EventType,
    collector::{COLLECTOR_UPDATES, CollectorThread, Update, spawn_collector},
};

pub(crate) static CHANNEL_FLAGS: AtomicU64 = AtomicU64::new(0);
pub(crate) const CHANNEL_SIZE: usize = 10240;

thread_local! {
    static EVENT_TX: RefCell<Option<Sender>> = const { RefCell::new(None) };
}

pub struct Sender {
    tx: Producer<Event<EventDetails>>,
    collector: Arc<CollectorThread>,
    overflow: Vec<Event<EventDetails>>,
}

pub struct Receiver {
    rx: Consumer<Event<EventDetails>>,
}

#[derive(Debug)]
pub struct ChannelError;

impl Sender {
    fn register() -> Option<Self> {
        let collector = spawn_collector()?.clone();
        let (tx, rx) = RingBuffer::new(CHANNEL_SIZE);
        COLLECTOR_UPDATES
            .lock()
            .push(Update::RegisterReceiver(Receiver { rx }));

        Some(Sender {
            tx,
            collector,
            overflow: Vec::with_capacity(0),
        })
    }

    pub fn send(&mut self, event: Event<EventDetails>) -> Result<(), ChannelError> {
        while let Some(event) = self.overflow.pop() {
            if let Err(PushError::Full(event)) = self.tx.push(event) {
                self.overflow.push(event);
                break;
            }
        }

        if let Err(PushError::Full(event)) = self.tx.push(event) {
            if self.overflow.len() <= CHANNEL_SIZE * 2 {
                self.overflow.push(event);
            } else {
                return Err(ChannelError);
            }
        }

        Ok(())
    }
}

impl Receiver {
    pub fn try_recv(&mut self) -> Result<Option<Event<EventDetails>>, ChannelError> {
        match self.rx.pop() {
            Ok(event) => Ok(Some(event)),
            Err(_) if !self.rx.is_abandoned() => Ok(None),
            Err(_) => Err(ChannelError),
        }
    }
}

impl Event<EventType> {
    pub fn send(self) {
        let level = self.inner.effective_level();
        let event = Event {
            inner: EventDetails {
                typ: self.inner,
                timestamp: now(),
                level,
            },
            keys: self.keys,
        };

        let _ = EVENT_TX.try_with(|tx| {
            let Ok(mut tx) = tx.try_borrow_mut() else {
                return;
            };
            if tx.is_none() {
                *tx = Sender::register();
            }
            if let Some(tx) = tx.as_mut()
                && tx.send(event).is_ok()
            {
                CHANNEL_FLAGS.fetch_add(1, Ordering::Relaxed);
                tx.collector.thread().unpark();
            }
        });
    }
}

#[inline(always)]
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
