/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Duration;

use utils::config::{Config, utils::ParseValue};

#[derive(Debug, Clone)]
pub struct DavConfig {
    pub max_request_size: usize,
    pub default_lock_timeout: Duration,
    pub max_lock_timeout: Duration,
    pub max_depth: DepthLimit,
    pub dead_property_namespaces: Vec<String>,
    pub dead_property_size: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthLimit {
    Zero,
    One,
    Infinity,
}

impl DavConfig {
    pub fn parse(config: &mut Config) -> Self {
        let default_lock_timeout = config
            .property_or_default("dav.lock.default-timeout", "60s")
            .unwrap_or(Duration::from_secs(60));
        let max_lock_timeout = config
            .property_or_default("dav.lock.max-timeout", "1h")
            .unwrap_or(Duration::from_secs(3600));
        if default_lock_timeout > max_lock_timeout {
            config.new_build_warning(
                "dav.lock.default-timeout",
                "Default lock timeout exceeds the maximum and will be capped",
            );
        }

        DavConfig {
            max_request_size: config
                .property("dav.limits.size.request")
                .unwrap_or(1024 * 1024),
            default_lock_timeout: default_lock_timeout.min(max_lock_timeout),
            max_lock_timeout,
            max_depth: config
                .property_or_default("dav.propfind.max-depth", "infinity")
                .unwrap_or(DepthLimit::Infinity),
            dead_property_namespaces: config
                .properties::<String>("dav.properties.dead.namespaces")
                .into_iter()
                .map(|(_, ns)| ns)
                .collect(),
            dead_property_size: config
                .property_or_default::<Option<usize>>("dav.limits.size.dead-property", "1024")
                .unwrap_or(Some(1024)),
        }
    }
}

impl ParseValue for DepthLimit {
    fn parse_value(value: &str) -> utils::config::Result<Self> {
        hashify::tiny_map_ignore_case!(value.trim().as_bytes(),
            "0" => DepthLimit::Zero,
            "1" => DepthLimit::One,
            "infinity" => DepthLimit::Infinity,
        )
        .ok_or_else(|| format!("Invalid depth limit {value:?}."))
    }
}

impl Default for DavConfig {
    fn default() -> Self {
        DavConfig::parse(&mut Config::default())
    }
}
