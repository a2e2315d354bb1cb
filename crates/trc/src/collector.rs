/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{Builder, JoinHandle, park},
};

use ahash::AHashMap;
use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::{
    EventType, Level,
    channel::{CHANNEL_FLAGS, Receiver},
    subscriber::Subscriber,
};

pub(crate) static TRACING_LEVEL: AtomicUsize = AtomicUsize::new(Level::Info as usize);
pub(crate) static COLLECTOR_UPDATES: Mutex<Vec<Update>> = Mutex::new(Vec::new());

pub(crate) type CollectorThread = JoinHandle<()>;

pub(crate) enum Update {
    RegisterReceiver(Receiver),
    RegisterSubscriber(Subscriber),
    Shutdown,
}

#[derive(Default)]
pub struct Collector {
    receivers: Vec<Receiver>,
    subscribers: Vec<Subscriber>,
}

impl Collector {
    fn collect(&mut self) -> bool {
        if CHANNEL_FLAGS.swap(0, Ordering::Relaxed) == 0 {
            park();
        }

        let mut do_continue = true;
        for update in std::mem::take(&mut *COLLECTOR_UPDATES.lock()) {
            match update {
                Update::RegisterReceiver(receiver) => self.receivers.push(receiver),
                Update::RegisterSubscriber(subscriber) => self.subscribers.push(subscriber),
                Update::Shutdown => do_continue = false,
            }
        }

        let Collector {
            receivers,
            subscribers,
        } = self;
        receivers.retain_mut(|rx| {
            loop {
                match rx.try_recv() {
                    Ok(Some(event)) => {
                        let event = Arc::new(event);
                        for subscriber in subscribers.iter_mut() {
                            subscriber.push_event(&event);
                        }
                    }
                    Ok(None) => return true,
                    // Sending thread has exited.
                    Err(_) => return false,
                }
            }
        });

        if do_continue {
            subscribers.retain_mut(|subscriber| subscriber.send_batch().is_ok());
        } else {
            for mut subscriber in subscribers.drain(..) {
                let _ = subscriber.send_batch();
            }
        }

        do_continue
    }

    pub fn set_level(level: Level) {
        TRACING_LEVEL.store(level as usize, Ordering::Relaxed);
    }

    pub fn level() -> Level {
        Level::from_usize(TRACING_LEVEL.load(Ordering::Relaxed))
    }

    pub fn update_custom_levels(levels: AHashMap<EventType, Level>) {
        custom_levels().store(Arc::new(levels));
    }

    pub fn shutdown() {
        COLLECTOR_UPDATES.lock().push(Update::Shutdown);
        Self::wake();
    }

    pub(crate) fn wake() {
        if let Some(collector) = spawn_collector() {
            CHANNEL_FLAGS.fetch_add(1, Ordering::Relaxed);
            collector.thread().unpark();
        }
    }
}

/// Starts the collector thread on first use. Events are dropped if the thread cannot be spawned.
pub(crate) fn spawn_collector() -> Option<&'static Arc<CollectorThread>> {
    static COLLECTOR: OnceLock<Option<Arc<CollectorThread>>> = OnceLock::new();
    COLLECTOR
        .get_or_init(|| {
            Builder::new()
                .name("trc-collector".to_string())
                .spawn(move || {
                    let mut collector = Collector::default();

                    while collector.collect() {}
                })
                .ok()
                .map(Arc::new)
        })
        .as_ref()
}

fn custom_levels() -> &'static ArcSwap<AHashMap<EventType, Level>> {
    static CUSTOM_LEVELS: OnceLock<ArcSwap<AHashMap<EventType, Level>>> = OnceLock::new();
    CUSTOM_LEVELS.get_or_init(|| ArcSwap::from_pointee(Default::default()))
}

impl EventType {
    #[inline(always)]
    pub fn effective_level(&self) -> Level {
        custom_levels()
            .load()
            .get(self)
            .copied()
            .unwrap_or_else(|| self.level())
    }
}

impl Level {
    #[inline(always)]
    pub fn is_enabled(&self) -> bool {
        *self != Level::Disable && *self as usize >= TRACING_LEVEL.load(Ordering::Relaxed)
    }
}
