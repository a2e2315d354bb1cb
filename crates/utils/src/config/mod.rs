/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod parser;
pub mod utils;

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    #[serde(skip)]
    pub keys: BTreeMap<String, String>,
    pub warnings: AHashMap<String, ConfigWarning>,
    pub errors: AHashMap<String, ConfigError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ConfigWarning {
    Missing,
    AppliedDefault { default: String },
    Unread { value: String },
    Build { error: String },
    Parse { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ConfigError {
    Parse { error: String },
    Build { error: String },
    Macro { error: String },
}

pub type Result<T> = std::result::Result<T, String>;

impl Config {
    pub async fn resolve_macros(&mut self, classes: &[&str]) {
        for macro_class in classes {
            self.resolve_macro_type(macro_class).await;
        }
    }

    pub async fn resolve_all_macros(&mut self) {
        self.resolve_macros(&["env", "file"]).await;
    }

    async fn resolve_macro_type(&mut self, class: &str) {
        let macro_start = format!("%{{{class}:");
        let mut replacements = Vec::new();

        'outer: for (key, value) in &self.keys {
            if !value.contains(&macro_start) || !value.contains("}%") {
                continue;
            }

            let mut result = String::with_capacity(value.len());
            let mut snippet: &str = value.as_str();

            while let Some((prefix, macro_name)) = snippet.split_once(&macro_start) {
                result.push_str(prefix);
                let Some((location, rest)) = macro_name.split_once("}%") else {
                    result.push_str(&macro_start);
                    snippet = macro_name;
                    continue;
                };

                let expanded = match class {
                    "env" => std::env::var(location).map_err(|_| {
                        format!("Failed to obtain environment variable {location:?}")
                    }),
                    "file" => {
                        let file_name = location.strip_prefix("//").unwrap_or(location);
                        tokio::fs::read_to_string(file_name)
                            .await
                            .map_err(|err| format!("Failed to read file {file_name:?}: {err}"))
                    }
                    _ => Err(format!("Unknown macro class {class:?}")),
                };

                match expanded {
                    Ok(expanded) => result.push_str(expanded.trim_end_matches(['\r', '\n'])),
                    Err(error) => {
                        self.errors
                            .insert(key.clone(), ConfigError::Macro { error });
                        continue 'outer;
                    }
                }
                snippet = rest;
            }
            result.push_str(snippet);

            replacements.push((key.clone(), result));
        }

        self.keys.extend(replacements);
    }

    pub fn update(&mut self, settings: Vec<(String, String)>) {
        self.keys.extend(settings);
    }

    pub fn log_errors(&self) {
        for (key, err) in &self.errors {
            let (cause, message) = match err {
                ConfigError::Parse { error } => (
                    trc::ConfigEvent::ParseError,
                    format!("Failed to parse setting {key:?}: {error}"),
                ),
                ConfigError::Build { error } => (
                    trc::ConfigEvent::BuildError,
                    format!("Build error for key {key:?}: {error}"),
                ),
                ConfigError::Macro { error } => (
                    trc::ConfigEvent::MacroError,
                    format!("Macro expansion error for setting {key:?}: {error}"),
                ),
            };
            trc::event!(Config(cause), Details = message);
        }
    }

    pub fn log_warnings(&self) {
        for (key, warn) in &self.warnings {
            let (cause, message) = match warn {
                ConfigWarning::AppliedDefault { default } => (
                    trc::ConfigEvent::DefaultApplied,
                    format!("Missing setting {key:?}, applied default {default:?}"),
                ),
                ConfigWarning::Missing => (
                    trc::ConfigEvent::MissingSetting,
                    format!("Missing setting {key:?}"),
                ),
                ConfigWarning::Unread { value } => (
                    trc::ConfigEvent::UnusedSetting,
                    format!("Unused setting {key:?} with value {value:?}"),
                ),
                ConfigWarning::Parse { error } => (
                    trc::ConfigEvent::ParseWarning,
                    format!("Failed to parse {key:?}: {error}"),
                ),
                ConfigWarning::Build { error } => (
                    trc::ConfigEvent::BuildWarning,
                    format!("Warning for {key:?}: {error}"),
                ),
            };
            trc::event!(Config(cause), Details = message);
        }
    }
}
