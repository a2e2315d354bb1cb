/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Duration;

use utils::config::Config;

#[derive(Debug, Clone)]
pub struct Pop3Config {
    pub greeting: String,
    pub hostname: String,
    pub timeout_unauth: Duration,
    pub timeout_auth: Duration,
    pub max_auth_failures: u32,
    pub max_request_size: usize,
    pub enable_apop: bool,
}

impl Pop3Config {
    pub fn parse(config: &mut Config) -> Self {
        Pop3Config {
            greeting: config
                .property_or_default("pop3.greeting", "Stalwart POP3 at your service.")
                .unwrap_or_else(|| "Stalwart POP3 at your service.".to_string()),
            hostname: config
                .property_or_default("pop3.hostname", "localhost")
                .unwrap_or_else(|| "localhost".to_string()),
            timeout_unauth: config
                .property_or_default("pop3.timeout.unauthenticated", "2m")
                .unwrap_or(Duration::from_secs(2 * 60)),
            timeout_auth: config
                .property_or_default("pop3.timeout.authenticated", "10m")
                .unwrap_or(Duration::from_secs(10 * 60)),
            max_auth_failures: config
                .property_or_default("pop3.auth.max-failures", "3")
                .unwrap_or(3),
            max_request_size: config
                .property_or_default("pop3.request.max-size", "8192")
                .unwrap_or(8192),
            enable_apop: config
                .property_or_default("pop3.apop.enable", "true")
                .unwrap_or(true),
        }
    }
}

impl Default for Pop3Config {
    fn default() -> Self {
        Pop3Config::parse(&mut Config::default())
    }
}
