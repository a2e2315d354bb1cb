/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::sync::Arc;

use dav_proto::schema::{
    NS_DAV, PropertyName,
    property::{DavValue, LockEntry, Privilege, ValueType},
};
use hyper::StatusCode;

use crate::{DavResource, RequestContext, auth::AccessMode, lock::LockManager};

use super::{PropertyError, PropertyMetaData, PropertySource};

/// Protocol properties every resource exposes.
pub struct LivePropertySource {
    locks: Arc<LockManager>,
}

const LIVE_PROPERTIES: [(&str, ValueType); 5] = [
    ("resourcetype", ValueType::ResourceType),
    ("displayname", ValueType::Text),
    ("lockdiscovery", ValueType::LockDiscovery),
    ("supportedlock", ValueType::SupportedLock),
    ("current-user-privilege-set", ValueType::PrivilegeSet),
];

impl LivePropertySource {
    pub fn new(locks: Arc<LockManager>) -> Self {
        LivePropertySource { locks }
    }

    fn value_type(name: &PropertyName) -> Option<ValueType> {
        if name.ns == NS_DAV {
            LIVE_PROPERTIES
                .iter()
                .find(|(live, _)| name.name == *live)
                .map(|(_, typ)| *typ)
        } else {
            None
        }
    }
}

impl PropertySource for LivePropertySource {
    fn metadata(
        &self,
        _: &RequestContext<'_>,
        name: &PropertyName,
        _: &dyn DavResource,
    ) -> PropertyMetaData {
        LivePropertySource::value_type(name)
            .map(PropertyMetaData::read_only)
            .unwrap_or(PropertyMetaData::UNKNOWN)
    }

    fn get(
        &self,
        ctx: &RequestContext<'_>,
        name: &PropertyName,
        resource: &dyn DavResource,
    ) -> Result<DavValue, PropertyError> {
        match LivePropertySource::value_type(name) {
            Some(ValueType::ResourceType) => Ok(DavValue::ResourceType(
                if resource.is_collection() {
                    vec![PropertyName::dav("collection")]
                } else {
                    vec![]
                },
            )),
            Some(ValueType::Text) => Ok(DavValue::Text(resource.name().to_string())),
            Some(ValueType::LockDiscovery) => Ok(DavValue::LockDiscovery(
                self.locks
                    .current_token(resource)
                    .map(|token| vec![token.to_active_lock()])
                    .unwrap_or_default(),
            )),
            Some(ValueType::SupportedLock) => Ok(DavValue::SupportedLock(LockEntry::supported())),
            Some(ValueType::PrivilegeSet) => Ok(DavValue::PrivilegeSet(Privilege::expand(
                &resource.privileges(ctx.principal),
            ))),
            _ => Err(PropertyError::NotFound),
        }
    }

    fn set(
        &self,
        _: &RequestContext<'_>,
        name: &PropertyName,
        _: DavValue,
        _: &dyn DavResource,
    ) -> Result<(), PropertyError> {
        if LivePropertySource::value_type(name).is_some() {
            Err(PropertyError::invalid(
                StatusCode::FORBIDDEN,
                "Property is protected",
            ))
        } else {
            Err(PropertyError::NotFound)
        }
    }

    fn all_property_names(
        &self,
        _: &RequestContext<'_>,
        _: &dyn DavResource,
    ) -> Vec<PropertyName> {
        LIVE_PROPERTIES
            .iter()
            .map(|(name, _)| PropertyName::dav(*name))
            .collect()
    }

    fn required_privilege(
        &self,
        _: &RequestContext<'_>,
        name: &PropertyName,
        _: &dyn DavResource,
        mode: AccessMode,
    ) -> Option<Privilege> {
        if mode == AccessMode::Read && name.is_dav_element("current-user-privilege-set") {
            Some(Privilege::ReadCurrentUserPrivilegeSet)
        } else {
            None
        }
    }
}
