/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod property;
pub mod request;
pub mod response;

use std::fmt::Display;

use compact_str::CompactString;

pub const NS_DAV: &str = "DAV:";
pub const NS_CARDDAV: &str = "urn:ietf:params:xml:ns:carddav";

/// Qualified property name: a namespace URI plus a local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyName {
    pub ns: CompactString,
    pub name: CompactString,
}

impl PropertyName {
    pub fn new(ns: impl Into<CompactString>, name: impl Into<CompactString>) -> Self {
        PropertyName {
            ns: ns.into(),
            name: name.into(),
        }
    }

    pub fn dav(name: impl Into<CompactString>) -> Self {
        PropertyName {
            ns: CompactString::const_new(NS_DAV),
            name: name.into(),
        }
    }

    pub fn carddav(name: impl Into<CompactString>) -> Self {
        PropertyName::new(NS_CARDDAV, name)
    }

    pub fn is_dav(&self) -> bool {
        self.ns == NS_DAV
    }

    pub fn is(&self, ns: &str, name: &str) -> bool {
        self.ns == ns && self.name == name
    }

    pub fn is_dav_element(&self, name: &str) -> bool {
        self.is(NS_DAV, name)
    }
}

// Clark notation
impl Display for PropertyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ns.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{{{}}}{}", self.ns, self.name)
        }
    }
}

impl From<PropertyName> for trc::Value {
    fn from(value: PropertyName) -> Self {
        trc::Value::String(value.to_string().into())
    }
}

impl From<&PropertyName> for trc::Value {
    fn from(value: &PropertyName) -> Self {
        trc::Value::String(value.to_string().into())
    }
}
