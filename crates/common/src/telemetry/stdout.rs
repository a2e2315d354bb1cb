/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt::Write;

use chrono::{DateTime, Utc};
use trc::{
    Event, EventDetails, Level, serializers::json::JsonEventSerializer,
    subscriber::SubscriberBuilder,
};

use crate::config::telemetry::ConsoleFormat;

pub fn spawn_console_tracer(builder: SubscriberBuilder, format: ConsoleFormat) {
    let mut rx = builder.register();
    tokio::spawn(async move {
        while let Some(events) = rx.recv().await {
            for event in events {
                let line = match format {
                    ConsoleFormat::Text { ansi } => format_event(&event, ansi),
                    ConsoleFormat::Json => match format_json(&event) {
                        Ok(line) => line,
                        Err(err) => {
                            eprintln!("Failed to serialize event: {err}");
                            continue;
                        }
                    },
                };
                eprintln!("{line}");
            }
        }
    });
}

/// One JSON object per line, with the event description.
pub fn format_json(event: &Event<EventDetails>) -> serde_json::Result<String> {
    serde_json::to_string(&JsonEventSerializer::new(event).with_description())
}

pub fn format_event(event: &Event<EventDetails>, ansi: bool) -> String {
    let mut line = String::with_capacity(128);
    let timestamp = DateTime::<Utc>::from_timestamp(event.inner.timestamp as i64, 0)
        .unwrap_or_default()
        .format("%Y-%m-%dT%H:%M:%SZ");
    let level = event.inner.level.as_str();

    let _ = if ansi {
        let color = match event.inner.level {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[34m",
            Level::Trace | Level::Disable => "\x1b[37m",
        };
        write!(line, "{timestamp} {color}{level:<5}\x1b[0m {event}")
    } else {
        write!(line, "{timestamp} {level:<5} {event}")
    };

    line
}
