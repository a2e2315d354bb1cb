/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{net::IpAddr, sync::Arc};

use common::{
    SharedCore,
    listener::{ServerInstance, SessionStream},
};
use mailbox::Mailbox;
use protocol::request::Parser;
use store::MailStore;

pub mod client;
pub mod mailbox;
pub mod op;
pub mod protocol;
pub mod session;
pub mod store;

#[derive(Clone)]
pub struct Pop3SessionManager {
    pub core: SharedCore,
    pub store: Arc<dyn MailStore>,
}

impl Pop3SessionManager {
    pub fn new(core: SharedCore, store: Arc<dyn MailStore>) -> Self {
        Self { core, store }
    }
}

pub struct Session<T: SessionStream> {
    pub core: SharedCore,
    pub store: Arc<dyn MailStore>,
    pub instance: Arc<ServerInstance>,
    pub receiver: Parser,
    pub state: State,
    pub stream: T,
    pub remote_addr: IpAddr,
    pub session_id: u64,
    pub challenge: Option<String>,
}

pub enum State {
    Authorization {
        auth_failures: u32,
        username: Option<String>,
    },
    Transaction {
        mailbox: Mailbox,
    },
    Update,
}

impl State {
    pub fn mailbox(&self) -> trc::Result<&Mailbox> {
        match self {
            State::Transaction { mailbox } => Ok(mailbox),
            _ => Err(not_authenticated()),
        }
    }

    pub fn mailbox_mut(&mut self) -> trc::Result<&mut Mailbox> {
        match self {
            State::Transaction { mailbox } => Ok(mailbox),
            _ => Err(not_authenticated()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, State::Transaction { .. })
    }
}

impl Default for State {
    fn default() -> Self {
        State::Authorization {
            auth_failures: 0,
            username: None,
        }
    }
}

pub(crate) fn not_authenticated() -> trc::Error {
    trc::Pop3Event::Error.into_err().details("Not authenticated.")
}
