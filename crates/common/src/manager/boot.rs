/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{path::PathBuf, sync::Arc};

use utils::{UnwrapFailure, config::Config, failed};

use crate::{Core, SharedCore, VERSION, config::server::Servers};

pub struct BootManager {
    pub config: Config,
    pub core: SharedCore,
    pub servers: Servers,
}

const HELP: &str = r#"Stalwart WebDAV and POP3 Server

Usage: stalwart [OPTIONS]

Options:
  -c, --config <PATH>              Start server with the specified configuration file
  -h, --help                       Print help
  -V, --version                    Print version
"#;

impl BootManager {
    pub async fn init() -> Self {
        let mut config_path = std::env::var("CONFIG_PATH").ok();

        if config_path.is_none() {
            let mut args = std::env::args().skip(1);

            while let Some(arg) = args.next().and_then(|arg| {
                arg.strip_prefix("--")
                    .or_else(|| arg.strip_prefix('-'))
                    .map(|arg| arg.to_string())
            }) {
                let (key, value) = if let Some((key, value)) = arg.split_once('=') {
                    (key.to_string(), Some(value.trim().to_string()))
                } else {
                    (arg, args.next())
                };

                match (key.as_str(), value) {
                    ("help" | "h", _) => {
                        eprintln!("{HELP}");
                        std::process::exit(0);
                    }
                    ("version" | "V", _) => {
                        println!("{VERSION}");
                        std::process::exit(0);
                    }
                    ("config" | "c", Some(value)) => {
                        config_path = Some(value);
                    }
                    (_, None) => {
                        failed(&format!("Unrecognized command '{key}', try '--help'."));
                    }
                    (_, Some(_)) => failed(&format!(
                        "Missing value for argument '{key}', try '--help'."
                    )),
                }
            }
        }

        let Some(config_path) = config_path.map(PathBuf::from) else {
            eprintln!("{HELP}");
            std::process::exit(0);
        };

        // Read main configuration file
        let mut config = Config::default();
        match std::fs::read_to_string(&config_path) {
            Ok(value) => {
                config.parse(&value).failed("Invalid configuration file");
            }
            Err(err) => {
                config.new_build_error("*", format!("Could not read configuration file: {err}"));
            }
        }

        Self::load(config).await
    }

    /// Resolves macros and builds the core from an already parsed configuration.
    pub async fn load(mut config: Config) -> Self {
        config.resolve_all_macros().await;

        let servers = Servers::parse(&mut config);
        let core = Core::parse(&mut config);

        // Enable tracing
        core.tracers.enable();

        trc::event!(Server(trc::ServerEvent::Startup), Value = VERSION);

        BootManager {
            config,
            core: Arc::new(core),
            servers,
        }
    }
}
