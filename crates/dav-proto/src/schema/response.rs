/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use hyper::StatusCode;

use super::{
    PropertyName,
    property::{DavValue, ValueType},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiStatus {
    pub response: Vec<Response>,
    pub response_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub href: String,
    pub typ: ResponseType,
    pub error: Option<Condition>,
    pub response_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseType {
    PropStat(Vec<PropStat>),
    Status(StatusCode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropStat {
    pub prop: Vec<Prop>,
    pub status: StatusCode,
    pub response_description: Option<String>,
}

/// A property inside a propstat. Entries without a declared type are
/// rendered as empty elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop {
    pub name: PropertyName,
    pub typ: Option<ValueType>,
    pub value: DavValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    LockTokenSubmitted(Vec<String>),
    NoConflictingLock(Vec<String>),
    LockTokenMatchesRequestUri,
    CannotModifyProtectedProperty,
}

impl Prop {
    pub fn new(name: PropertyName, typ: ValueType, value: DavValue) -> Self {
        Prop {
            name,
            typ: Some(typ),
            value,
        }
    }

    pub fn empty(name: PropertyName) -> Self {
        Prop {
            name,
            typ: None,
            value: DavValue::Null,
        }
    }
}
