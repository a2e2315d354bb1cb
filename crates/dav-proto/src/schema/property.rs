/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{Depth, Timeout};

use super::PropertyName;

/// Declared type of a property, as advertised by the source that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Timestamp,
    Date,
    ResourceType,
    Boolean,
    CData,
    Uuid,
    HrefList,
    Href,
    SupportedReportSet,
    AddressDataTypes,
    PrivilegeSet,
    Integer,
    Text,
    LockDiscovery,
    SupportedLock,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DavValue {
    /// Seconds since the epoch, rendered as an RFC 1123 date.
    Timestamp(i64),
    /// Seconds since the epoch, rendered as an RFC 3339 date.
    Date(i64),
    ResourceType(Vec<PropertyName>),
    Boolean(bool),
    CData(String),
    Uuid(String),
    HrefList(Vec<String>),
    Href(String),
    SupportedReportSet(Vec<PropertyName>),
    AddressDataTypes(Vec<AddressDataType>),
    PrivilegeSet(Vec<Privilege>),
    Integer(i64),
    Text(String),
    LockDiscovery(Vec<ActiveLock>),
    SupportedLock(Vec<LockEntry>),
    #[default]
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDataType {
    pub content_type: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Privilege {
    Read,
    Write,
    WriteProperties,
    WriteContent,
    Unlock,
    ReadAcl,
    ReadCurrentUserPrivilegeSet,
    WriteAcl,
    Bind,
    Unbind,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockScope {
    #[default]
    Exclusive,
    Shared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockType {
    #[default]
    Write,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLock {
    pub lock_scope: LockScope,
    pub lock_type: LockType,
    pub depth: Depth,
    pub owner: Option<String>,
    pub timeout: Timeout,
    pub lock_token: Option<String>,
    pub lock_root: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEntry {
    pub lock_scope: LockScope,
    pub lock_type: LockType,
}

impl DavValue {
    /// Runtime type of the value, `None` for `Null`.
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            DavValue::Timestamp(_) => ValueType::Timestamp,
            DavValue::Date(_) => ValueType::Date,
            DavValue::ResourceType(_) => ValueType::ResourceType,
            DavValue::Boolean(_) => ValueType::Boolean,
            DavValue::CData(_) => ValueType::CData,
            DavValue::Uuid(_) => ValueType::Uuid,
            DavValue::HrefList(_) => ValueType::HrefList,
            DavValue::Href(_) => ValueType::Href,
            DavValue::SupportedReportSet(_) => ValueType::SupportedReportSet,
            DavValue::AddressDataTypes(_) => ValueType::AddressDataTypes,
            DavValue::PrivilegeSet(_) => ValueType::PrivilegeSet,
            DavValue::Integer(_) => ValueType::Integer,
            DavValue::Text(_) => ValueType::Text,
            DavValue::LockDiscovery(_) => ValueType::LockDiscovery,
            DavValue::SupportedLock(_) => ValueType::SupportedLock,
            DavValue::Null => return None,
        })
    }

    pub fn is_type(&self, typ: ValueType) -> bool {
        self.value_type().is_none_or(|value_type| value_type == typ)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DavValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DavValue::CData(s) | DavValue::Uuid(s) | DavValue::Href(s) | DavValue::Text(s) => {
                Some(s)
            }
            _ => None,
        }
    }
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Timestamp => "timestamp",
            ValueType::Date => "date",
            ValueType::ResourceType => "resource-type",
            ValueType::Boolean => "boolean",
            ValueType::CData => "cdata",
            ValueType::Uuid => "uuid",
            ValueType::HrefList => "href-list",
            ValueType::Href => "href",
            ValueType::SupportedReportSet => "supported-report-set",
            ValueType::AddressDataTypes => "address-data-types",
            ValueType::PrivilegeSet => "privilege-set",
            ValueType::Integer => "integer",
            ValueType::Text => "text",
            ValueType::LockDiscovery => "lock-discovery",
            ValueType::SupportedLock => "supported-lock",
        }
    }
}

impl Privilege {
    pub fn all() -> [Privilege; 11] {
        [
            Privilege::Read,
            Privilege::Write,
            Privilege::WriteProperties,
            Privilege::WriteContent,
            Privilege::Unlock,
            Privilege::ReadAcl,
            Privilege::ReadCurrentUserPrivilegeSet,
            Privilege::WriteAcl,
            Privilege::Bind,
            Privilege::Unbind,
            Privilege::All,
        ]
    }

    /// Whether holding `self` also grants `other` through aggregation.
    pub fn implies(&self, other: Privilege) -> bool {
        match self {
            Privilege::All => true,
            Privilege::Write => matches!(
                other,
                Privilege::Write
                    | Privilege::WriteProperties
                    | Privilege::WriteContent
                    | Privilege::Bind
                    | Privilege::Unbind
            ),
            privilege => *privilege == other,
        }
    }

    pub fn is_granted(&self, granted: &[Privilege]) -> bool {
        granted.iter().any(|privilege| privilege.implies(*self))
    }

    /// Expands a granted set into every privilege it aggregates.
    pub fn expand(granted: &[Privilege]) -> Vec<Privilege> {
        Privilege::all()
            .into_iter()
            .filter(|privilege| privilege.is_granted(granted))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Privilege::Read => "read",
            Privilege::Write => "write",
            Privilege::WriteProperties => "write-properties",
            Privilege::WriteContent => "write-content",
            Privilege::Unlock => "unlock",
            Privilege::ReadAcl => "read-acl",
            Privilege::ReadCurrentUserPrivilegeSet => "read-current-user-privilege-set",
            Privilege::WriteAcl => "write-acl",
            Privilege::Bind => "bind",
            Privilege::Unbind => "unbind",
            Privilege::All => "all",
        }
    }

    pub fn try_parse(value: &str) -> Option<Privilege> {
        hashify::tiny_map!(value.as_bytes(),
            "read" => Privilege::Read,
            "write" => Privilege::Write,
            "write-properties" => Privilege::WriteProperties,
            "write-content" => Privilege::WriteContent,
            "unlock" => Privilege::Unlock,
            "read-acl" => Privilege::ReadAcl,
            "read-current-user-privilege-set" => Privilege::ReadCurrentUserPrivilegeSet,
            "write-acl" => Privilege::WriteAcl,
            "bind" => Privilege::Bind,
            "unbind" => Privilege::Unbind,
            "all" => Privilege::All,
        )
    }
}

impl ActiveLock {
    pub fn new(href: impl Into<String>, lock_scope: LockScope) -> Self {
        Self {
            lock_scope,
            lock_type: LockType::Write,
            depth: Depth::Infinity,
            owner: None,
            timeout: Timeout::Infinite,
            lock_token: None,
            lock_root: href.into(),
        }
    }

    pub fn with_depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Timeout::Second(timeout);
        self
    }

    pub fn with_owner_opt(mut self, owner: Option<String>) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_lock_token(mut self, token: impl Into<String>) -> Self {
        self.lock_token = Some(token.into());
        self
    }
}

impl LockEntry {
    pub fn supported() -> Vec<LockEntry> {
        vec![LockEntry {
            lock_scope: LockScope::Exclusive,
            lock_type: LockType::Write,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privilege_aggregation() {
        for (granted, required, expected) in [
            (vec![Privilege::All], Privilege::WriteAcl, true),
            (vec![Privilege::Write], Privilege::WriteProperties, true),
            (vec![Privilege::Write], Privilege::Bind, true),
            (vec![Privilege::Write], Privilege::Read, false),
            (vec![Privilege::WriteProperties], Privilege::Write, false),
            (vec![Privilege::Read, Privilege::Unlock], Privilege::Unlock, true),
            (vec![], Privilege::Read, false),
        ] {
            assert_eq!(
                required.is_granted(&granted),
                expected,
                "{granted:?} -> {required:?}"
            );
        }

        assert_eq!(
            Privilege::expand(&[Privilege::Read, Privilege::Write]),
            vec![
                Privilege::Read,
                Privilege::Write,
                Privilege::WriteProperties,
                Privilege::WriteContent,
                Privilege::Bind,
                Privilege::Unbind
            ]
        );
    }

    #[test]
    fn null_matches_every_type() {
        assert!(DavValue::Null.is_type(ValueType::Timestamp));
        assert!(DavValue::Null.is_type(ValueType::LockDiscovery));
        assert!(DavValue::Boolean(true).is_type(ValueType::Boolean));
        assert!(!DavValue::Text("x".into()).is_type(ValueType::Boolean));
    }
}
