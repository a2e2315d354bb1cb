/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use common::listener::SessionStream;
use trc::AddContext;

use crate::{Session, store::MailboxInfo};

#[derive(Debug, Default)]
pub struct Mailbox {
    pub messages: Vec<Message>,
    pub account_id: u32,
    pub uid_validity: u32,
}

#[derive(Debug)]
pub struct Message {
    pub id: u32,
    pub size: u32,
    pub deleted: bool,
}

impl Mailbox {
    pub fn new(account_id: u32, info: MailboxInfo) -> Self {
        Mailbox {
            messages: info
                .messages
                .into_iter()
                .map(|message| Message {
                    id: message.id,
                    size: message.size,
                    deleted: false,
                })
                .collect(),
            account_id,
            uid_validity: info.uid_validity,
        }
    }

    /// Looks up a message by its 1-based session ordinal.
    pub fn get(&self, msg: u32) -> Option<&Message> {
        msg.checked_sub(1)
            .and_then(|idx| self.messages.get(idx as usize))
    }

    pub fn get_mut(&mut self, msg: u32) -> Option<&mut Message> {
        msg.checked_sub(1)
            .and_then(|idx| self.messages.get_mut(idx as usize))
    }

    /// Message count and total size, excluding messages marked as deleted.
    pub fn stat(&self) -> (u32, u64) {
        self.messages
            .iter()
            .filter(|message| !message.deleted)
            .fold((0, 0), |(total, size), message| {
                (total + 1, size + message.size as u64)
            })
    }

    pub fn unique_id(&self, message: &Message) -> String {
        format!("{}{}", self.uid_validity, message.id)
    }
}

impl<T: SessionStream> Session<T> {
    pub fn fetch_mailbox(&self, account_id: u32) -> trc::Result<Mailbox> {
        self.store
            .mailbox(account_id)
            .caused_by(trc::location!())
            .map(|info| Mailbox::new(account_id, info))
    }
}
