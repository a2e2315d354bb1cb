/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{fmt::Display, net::SocketAddr};

use utils::config::{Config, utils::ParseValue};

#[derive(Debug, Default)]
pub struct Servers {
    pub servers: Vec<Server>,
}

#[derive(Debug, Default)]
pub struct Server {
    pub id: String,
    pub protocol: ServerProtocol,
    pub listeners: Vec<Listener>,
}

#[derive(Debug, Clone)]
pub struct Listener {
    pub addr: SocketAddr,
    pub backlog: u32,
    pub nodelay: bool,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub enum ServerProtocol {
    #[default]
    Pop3,
}

impl Servers {
    pub fn parse(config: &mut Config) -> Self {
        let mut servers = Servers::default();

        for id in config
            .sub_keys("server.listener", ".protocol")
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
        {
            servers.parse_server(config, id);
        }

        servers
    }

    fn parse_server(&mut self, config: &mut Config, id: String) {
        let Some(protocol) =
            config.property_require::<ServerProtocol>(("server.listener", id.as_str(), "protocol"))
        else {
            return;
        };

        let nodelay = config
            .property_or_default(("server.listener", id.as_str(), "socket.nodelay"), "true")
            .unwrap_or(true);
        let backlog = config
            .property_or_default(("server.listener", id.as_str(), "socket.backlog"), "1024")
            .unwrap_or(1024);

        let listeners = config
            .properties::<SocketAddr>(("server.listener", id.as_str(), "bind"))
            .into_iter()
            .map(|(_, addr)| Listener {
                addr,
                backlog,
                nodelay,
            })
            .collect::<Vec<_>>();

        if listeners.is_empty() {
            config.new_build_error(
                ("server.listener", id.as_str()),
                "No 'bind' directive found for listener",
            );
            return;
        }

        self.servers.push(Server {
            id,
            protocol,
            listeners,
        });
    }
}

impl ServerProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerProtocol::Pop3 => "pop3",
        }
    }
}

impl ParseValue for ServerProtocol {
    fn parse_value(value: &str) -> utils::config::Result<Self> {
        if value.trim().eq_ignore_ascii_case("pop3") {
            Ok(ServerProtocol::Pop3)
        } else {
            Err(format!("Invalid server protocol type {value:?}."))
        }
    }
}

impl Display for ServerProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
