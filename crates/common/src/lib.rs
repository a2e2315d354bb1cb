/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Arc;

use config::{dav::DavConfig, pop3::Pop3Config, telemetry::Tracers};
use utils::config::Config;

pub mod config;
pub mod listener;
pub mod manager;
pub mod telemetry;

pub static VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Default)]
pub struct Core {
    pub dav: DavConfig,
    pub pop3: Pop3Config,
    pub tracers: Tracers,
}

pub type SharedCore = Arc<Core>;

impl Core {
    pub fn parse(config: &mut Config) -> Self {
        Core {
            dav: DavConfig::parse(config),
            pop3: Pop3Config::parse(config),
            tracers: Tracers::parse(config),
        }
    }
}
