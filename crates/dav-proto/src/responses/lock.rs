/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    Timeout,
    schema::property::{ActiveLock, LockEntry, LockScope, LockType},
};

use super::XmlWriter;

impl XmlWriter {
    pub fn active_lock(&mut self, lock: &ActiveLock) -> &mut Self {
        self.start_dav("activelock")
            .lock_scope(lock.lock_scope)
            .lock_type(lock.lock_type)
            .dav_text("depth", lock.depth.as_str());

        if let Some(owner) = &lock.owner {
            self.dav_text("owner", owner);
        }

        self.timeout(lock.timeout);

        if let Some(lock_token) = &lock.lock_token {
            self.start_dav("locktoken")
                .href(lock_token)
                .end_dav("locktoken");
        }

        self.start_dav("lockroot")
            .href(&lock.lock_root)
            .end_dav("lockroot")
            .end_dav("activelock")
    }

    pub fn lock_entry(&mut self, entry: &LockEntry) -> &mut Self {
        self.start_dav("lockentry")
            .lock_scope(entry.lock_scope)
            .lock_type(entry.lock_type)
            .end_dav("lockentry")
    }

    pub fn lock_scope(&mut self, scope: LockScope) -> &mut Self {
        self.start_dav("lockscope")
            .empty_dav(match scope {
                LockScope::Exclusive => "exclusive",
                LockScope::Shared => "shared",
            })
            .end_dav("lockscope")
    }

    pub fn lock_type(&mut self, typ: LockType) -> &mut Self {
        self.start_dav("locktype")
            .empty_dav(match typ {
                LockType::Write => "write",
                LockType::Other => "other",
            })
            .end_dav("locktype")
    }

    pub fn timeout(&mut self, timeout: Timeout) -> &mut Self {
        match timeout {
            Timeout::Infinite => self.dav_text("timeout", "Infinite"),
            Timeout::Second(s) => self.dav_text("timeout", format!("Second-{s}")),
            Timeout::None => self,
        }
    }
}

impl ActiveLock {
    /// Body of a successful LOCK response.
    pub fn to_lock_discovery(&self) -> String {
        let mut xml = XmlWriter::new();
        xml.start_dav("lockdiscovery")
            .active_lock(self)
            .end_dav("lockdiscovery");
        xml.finish("prop")
    }
}

impl Timeout {
    pub fn as_seconds(&self) -> Option<u64> {
        match self {
            Timeout::Second(s) => Some(*s),
            Timeout::Infinite | Timeout::None => None,
        }
    }
}
