/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod stdout;

use trc::{Level, collector::Collector, subscriber::SubscriberBuilder};

use crate::config::telemetry::Tracers;

impl Tracers {
    /// Applies the configured levels to the collector and starts the
    /// console tracer. Must be called from within a Tokio runtime.
    pub fn enable(&self) {
        Collector::set_level(
            self.stdout
                .as_ref()
                .map(|stdout| stdout.level)
                .unwrap_or(Level::Disable),
        );
        Collector::update_custom_levels(self.levels.clone());

        if let Some(stdout) = &self.stdout {
            stdout::spawn_console_tracer(
                SubscriberBuilder::new()
                    .with_level(stdout.level)
                    .with_disabled(stdout.disabled.iter().copied())
                    .with_lossy(true),
                stdout.format,
            );
        }
    }
}
