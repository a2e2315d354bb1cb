/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod request;
pub mod response;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    // Authorization state
    User { name: String },
    Pass { string: String },
    Apop { name: String, digest: String },
    Quit,

    // Transaction state
    Stat,
    List { msg: Option<u32> },
    Retr { msg: u32 },
    Dele { msg: u32 },
    #[default]
    Noop,
    Rset,
    Top { msg: u32, n: u32 },
    Uidl { msg: Option<u32> },

    // Extensions
    Capa,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::User { .. } => "USER",
            Command::Pass { .. } => "PASS",
            Command::Apop { .. } => "APOP",
            Command::Quit => "QUIT",
            Command::Stat => "STAT",
            Command::List { .. } => "LIST",
            Command::Retr { .. } => "RETR",
            Command::Dele { .. } => "DELE",
            Command::Noop => "NOOP",
            Command::Rset => "RSET",
            Command::Top { .. } => "TOP",
            Command::Uidl { .. } => "UIDL",
            Command::Capa => "CAPA",
        }
    }
}
