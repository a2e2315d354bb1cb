/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::collections::BTreeMap;

use ahash::AHashMap;
use parking_lot::RwLock;
use utils::config::Config;

/// Credentials presented during the authorization state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Plain {
        username: String,
        secret: String,
    },
    Apop {
        username: String,
        challenge: String,
        digest: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    pub id: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxInfo {
    pub uid_validity: u32,
    pub messages: Vec<MessageInfo>,
}

/// Backing storage for POP3 maildrops.
///
/// Implementations are shared between sessions and are responsible for
/// their own consistency; sessions only ever read a snapshot of the
/// message list and delete messages when a session enters the update
/// state.
pub trait MailStore: Sync + Send {
    /// Validates the credentials and returns the account id.
    fn authenticate(&self, credentials: &Credentials) -> trc::Result<u32>;

    /// Lists the messages in the account's maildrop, ordered by arrival.
    fn mailbox(&self, account_id: u32) -> trc::Result<MailboxInfo>;

    fn fetch(&self, account_id: u32, message_id: u32) -> trc::Result<Option<Vec<u8>>>;

    /// Deletes the messages and returns the ids that could not be removed.
    fn delete(&self, account_id: u32, message_ids: &[u32]) -> trc::Result<Vec<u32>>;
}

impl Credentials {
    pub fn username(&self) -> &str {
        match self {
            Credentials::Plain { username, .. } | Credentials::Apop { username, .. } => username,
        }
    }
}

pub fn apop_digest(challenge: &str, secret: &str) -> String {
    format!("{:x}", md5::compute(format!("{challenge}{secret}")))
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    names: AHashMap<String, u32>,
    accounts: Vec<MemoryAccount>,
}

#[derive(Debug)]
struct MemoryAccount {
    secret: String,
    uid_validity: u32,
    next_id: u32,
    messages: BTreeMap<u32, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account, replacing the secret if the name already exists.
    pub fn add_account(&self, name: impl AsRef<str>, secret: impl Into<String>) -> u32 {
        let mut inner = self.inner.write();
        let name = name.as_ref().to_lowercase();
        if let Some(account_id) = inner.names.get(&name).copied() {
            inner.accounts[account_id as usize].secret = secret.into();
            return account_id;
        }

        let account_id = inner.accounts.len() as u32;
        inner.accounts.push(MemoryAccount {
            secret: secret.into(),
            uid_validity: account_id + 1,
            next_id: 1,
            messages: BTreeMap::new(),
        });
        inner.names.insert(name, account_id);
        account_id
    }

    /// Builds a store from `store.account.<name>.secret` and the optional
    /// `store.account.<name>.messages` list of raw messages.
    pub fn parse(config: &mut Config) -> Self {
        let store = MemoryStore::new();

        for name in config
            .sub_keys("store.account", ".secret")
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
        {
            let Some(secret) =
                config.property_require::<String>(("store.account", name.as_str(), "secret"))
            else {
                continue;
            };
            let account_id = store.add_account(&name, secret);

            for (_, message) in
                config.properties::<String>(("store.account", name.as_str(), "messages"))
            {
                let _ = store.append(account_id, message);
            }
        }

        store
    }

    pub fn append(&self, account_id: u32, message: impl Into<Vec<u8>>) -> trc::Result<u32> {
        let mut inner = self.inner.write();
        let account = inner
            .accounts
            .get_mut(account_id as usize)
            .ok_or_else(|| account_not_found(account_id))?;
        let message_id = account.next_id;
        account.next_id += 1;
        account.messages.insert(message_id, message.into());
        Ok(message_id)
    }

    pub fn message_ids(&self, account_id: u32) -> Vec<u32> {
        self.inner
            .read()
            .accounts
            .get(account_id as usize)
            .map(|account| account.messages.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl MailStore for MemoryStore {
    fn authenticate(&self, credentials: &Credentials) -> trc::Result<u32> {
        let inner = self.inner.read();
        let username = credentials.username();
        let account = inner
            .names
            .get(&username.to_lowercase())
            .and_then(|account_id| Some((*account_id, inner.accounts.get(*account_id as usize)?)));

        let is_valid = match (credentials, &account) {
            (Credentials::Plain { secret, .. }, Some((_, account))) => account.secret == *secret,
            (
                Credentials::Apop {
                    challenge, digest, ..
                },
                Some((_, account)),
            ) => apop_digest(challenge, &account.secret).eq_ignore_ascii_case(digest),
            (_, None) => false,
        };

        match account {
            Some((account_id, _)) if is_valid => Ok(account_id),
            _ => Err(trc::AuthEvent::Failed
                .into_err()
                .details("Authentication failed.")
                .ctx(trc::Key::Name, username.to_string())),
        }
    }

    fn mailbox(&self, account_id: u32) -> trc::Result<MailboxInfo> {
        let inner = self.inner.read();
        let account = inner
            .accounts
            .get(account_id as usize)
            .ok_or_else(|| account_not_found(account_id))?;

        Ok(MailboxInfo {
            uid_validity: account.uid_validity,
            messages: account
                .messages
                .iter()
                .map(|(id, contents)| MessageInfo {
                    id: *id,
                    size: contents.len() as u32,
                })
                .collect(),
        })
    }

    fn fetch(&self, account_id: u32, message_id: u32) -> trc::Result<Option<Vec<u8>>> {
        Ok(self
            .inner
            .read()
            .accounts
            .get(account_id as usize)
            .and_then(|account| account.messages.get(&message_id).cloned()))
    }

    fn delete(&self, account_id: u32, message_ids: &[u32]) -> trc::Result<Vec<u32>> {
        let mut inner = self.inner.write();
        let account = inner
            .accounts
            .get_mut(account_id as usize)
            .ok_or_else(|| account_not_found(account_id))?;

        Ok(message_ids
            .iter()
            .filter(|id| account.messages.remove(*id).is_none())
            .copied()
            .collect())
    }
}

fn account_not_found(account_id: u32) -> trc::Error {
    trc::StoreEvent::NotFound
        .into_err()
        .details("Account not found.")
        .ctx(trc::Key::AccountId, account_id)
        .caused_by(trc::location!())
}
