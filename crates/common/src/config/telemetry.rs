/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use ahash::AHashMap;
use trc::{EventType, Level};
use utils::config::Config;

#[derive(Debug, Clone)]
pub struct Tracers {
    pub stdout: Option<StdoutTracer>,
    pub levels: AHashMap<EventType, Level>,
}

#[derive(Debug, Clone)]
pub struct StdoutTracer {
    pub level: Level,
    pub format: ConsoleFormat,
    pub disabled: Vec<EventType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFormat {
    Text { ansi: bool },
    Json,
}

impl Tracers {
    pub fn parse(config: &mut Config) -> Self {
        let level = config
            .property_or_default("tracer.stdout.level", "info")
            .unwrap_or(Level::Info);
        let stdout = (level != Level::Disable).then(|| StdoutTracer {
            level,
            format: parse_format(config),
            disabled: parse_events(config, "tracer.stdout.disabled-events"),
        });

        // Custom levels, e.g. tracer.level."lock.already-locked" = "info"
        let mut levels = AHashMap::new();
        for (key, level) in config.properties::<Level>("tracer.level") {
            let name = key.strip_prefix("tracer.level.").unwrap_or(&key);
            if let Some(event) = EventType::try_parse(name) {
                levels.insert(event, level);
            } else {
                config.new_parse_error(key.as_str(), format!("Unknown event type {name:?}"));
            }
        }

        Tracers { stdout, levels }
    }
}

fn parse_format(config: &mut Config) -> ConsoleFormat {
    let format = config
        .property_or_default::<String>("tracer.stdout.format", "text")
        .unwrap_or_default();
    match format.as_str() {
        "json" => ConsoleFormat::Json,
        "text" => ConsoleFormat::Text {
            ansi: config
                .property_or_default("tracer.stdout.ansi", "false")
                .unwrap_or(false),
        },
        other => {
            config.new_parse_error(
                "tracer.stdout.format",
                format!("Invalid console format {other:?}"),
            );
            ConsoleFormat::Text { ansi: false }
        }
    }
}

fn parse_events(config: &mut Config, key: &str) -> Vec<EventType> {
    let mut events = Vec::new();
    for (key, name) in config.properties::<String>(key) {
        if let Some(event) = EventType::try_parse(&name) {
            events.push(event);
        } else {
            config.new_parse_error(key, format!("Unknown event type {name:?}"));
        }
    }
    events
}

impl Default for Tracers {
    fn default() -> Self {
        Tracers::parse(&mut Config::default())
    }
}
