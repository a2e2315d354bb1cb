/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod description;
pub mod level;

use crate::*;

impl EventType {
    #[inline(always)]
    pub fn is_span_start(&self) -> bool {
        matches!(self, EventType::Network(NetworkEvent::ConnectionStart))
    }

    #[inline(always)]
    pub fn is_span_end(&self) -> bool {
        matches!(self, EventType::Network(NetworkEvent::ConnectionEnd))
    }

    pub fn description(&self) -> &'static str {
        match self {
            EventType::Server(event) => event.description(),
            EventType::Network(event) => event.description(),
            EventType::Config(event) => event.description(),
            EventType::Auth(event) => event.description(),
            EventType::WebDav(event) => event.description(),
            EventType::Lock(event) => event.description(),
            EventType::Pop3(event) => event.description(),
            EventType::Store(event) => event.description(),
            EventType::Resource(event) => event.description(),
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            EventType::Server(event) => event.explain(),
            EventType::Network(event) => event.explain(),
            EventType::Config(event) => event.explain(),
            EventType::Auth(event) => event.explain(),
            EventType::WebDav(event) => event.explain(),
            EventType::Lock(event) => event.explain(),
            EventType::Pop3(event) => event.explain(),
            EventType::Store(event) => event.explain(),
            EventType::Resource(event) => event.explain(),
        }
    }
}
