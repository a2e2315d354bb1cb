/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod parser;
pub mod requests;
pub mod responses;
pub mod schema;

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct RequestHeaders<'x> {
    pub uri: &'x str,
    pub depth: Depth,
    pub timeout: Timeout,
    pub content_type: Option<&'x str>,
    pub lock_token: Option<&'x str>,
    pub if_: Vec<If<'x>>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct If<'x> {
    pub resource: Option<&'x str>,
    pub list: Vec<Condition<'x>>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Condition<'x> {
    StateToken { is_not: bool, token: &'x str },
    ETag { is_not: bool, tag: &'x str },
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum Timeout {
    Infinite,
    Second(u64),
    #[default]
    None,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub enum Depth {
    Zero,
    One,
    Infinity,
    #[default]
    None,
}

impl RequestHeaders<'_> {
    /// Returns every lock token submitted through the `If` header,
    /// plus the `Lock-Token` header when present.
    pub fn submitted_tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.if_
            .iter()
            .flat_map(|if_| if_.list.iter())
            .filter_map(|cond| match cond {
                Condition::StateToken {
                    is_not: false,
                    token,
                } => Some(*token),
                _ => None,
            })
            .chain(self.lock_token)
    }

    pub fn has_if_tokens(&self) -> bool {
        self.if_
            .iter()
            .any(|if_| if_.list.iter().any(|cond| matches!(cond, Condition::StateToken { .. })))
    }
}

impl Depth {
    pub fn or_infinity(self) -> Depth {
        match self {
            Depth::None => Depth::Infinity,
            depth => depth,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Zero => "0",
            Depth::One => "1",
            Depth::Infinity | Depth::None => "infinity",
        }
    }
}

/*

Implemented:

RFC4918 - HTTP Extensions for Web Distributed Authoring and Versioning (WebDAV)
          (PROPFIND, PROPPATCH, LOCK, UNLOCK, OPTIONS)
RFC3744 - Web Distributed Authoring and Versioning (WebDAV) Access Control Protocol
          (current-user-privilege-set, privilege aggregation)
RFC6352 - CardDAV (supported-address-data)

Out of scope:

RFC5689 - Extended MKCOL for Web Distributed Authoring and Versioning (WebDAV)
RFC6578 - Collection Synchronization for Web Distributed Authoring and Versioning (WebDAV)
RFC4791 - Calendaring Extensions to WebDAV (CalDAV) queries

*/
