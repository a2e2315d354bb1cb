/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::collections::BTreeMap;

use ahash::AHashMap;
use common::config::dav::DavConfig;
use dav_proto::schema::{
    NS_DAV, PropertyName,
    property::{DavValue, Privilege, ValueType},
};
use hyper::StatusCode;
use parking_lot::RwLock;

use crate::{DavResource, RequestContext, auth::AccessMode};

use super::{PropertyError, PropertyMetaData, PropertySource};

/// Client-defined properties, kept per resource id.
pub struct DeadPropertySource {
    namespaces: Vec<String>,
    max_size: Option<usize>,
    properties: RwLock<AHashMap<String, BTreeMap<PropertyName, String>>>,
}

impl DeadPropertySource {
    pub fn new(config: &DavConfig) -> Self {
        DeadPropertySource {
            namespaces: config.dead_property_namespaces.clone(),
            max_size: config.dead_property_size,
            properties: RwLock::new(AHashMap::new()),
        }
    }

    /// With no configured namespaces every non-`DAV:` property is accepted.
    fn owns(&self, name: &PropertyName) -> bool {
        if self.namespaces.is_empty() {
            name.ns != NS_DAV
        } else {
            self.namespaces.iter().any(|ns| name.ns == ns.as_str())
        }
    }
}

impl PropertySource for DeadPropertySource {
    fn metadata(
        &self,
        _: &RequestContext<'_>,
        name: &PropertyName,
        _: &dyn DavResource,
    ) -> PropertyMetaData {
        if self.owns(name) {
            PropertyMetaData::writable(ValueType::Text)
        } else {
            PropertyMetaData::UNKNOWN
        }
    }

    fn get(
        &self,
        _: &RequestContext<'_>,
        name: &PropertyName,
        resource: &dyn DavResource,
    ) -> Result<DavValue, PropertyError> {
        self.properties
            .read()
            .get(resource.unique_id())
            .and_then(|props| props.get(name))
            .map(|value| DavValue::Text(value.clone()))
            .ok_or(PropertyError::NotFound)
    }

    fn set(
        &self,
        _: &RequestContext<'_>,
        name: &PropertyName,
        value: DavValue,
        resource: &dyn DavResource,
    ) -> Result<(), PropertyError> {
        if !self.owns(name) {
            return Err(PropertyError::NotFound);
        }

        let mut properties = self.properties.write();
        match value {
            DavValue::Null => {
                if let Some(props) = properties.get_mut(resource.unique_id()) {
                    props.remove(name);
                    if props.is_empty() {
                        properties.remove(resource.unique_id());
                    }
                }
                Ok(())
            }
            DavValue::Text(text) => {
                if self.max_size.is_some_and(|max_size| text.len() > max_size) {
                    return Err(PropertyError::invalid(
                        StatusCode::INSUFFICIENT_STORAGE,
                        "Property value is too large",
                    ));
                }
                properties
                    .entry(resource.unique_id().to_string())
                    .or_default()
                    .insert(name.clone(), text);
                Ok(())
            }
            value => Err(PropertyError::Internal(
                trc::WebDavEvent::TypeMismatch
                    .into_err()
                    .ctx(trc::Key::Property, name)
                    .details(value.value_type().map(|t| t.as_str()).unwrap_or("null")),
            )),
        }
    }

    fn all_property_names(
        &self,
        _: &RequestContext<'_>,
        resource: &dyn DavResource,
    ) -> Vec<PropertyName> {
        self.properties
            .read()
            .get(resource.unique_id())
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn required_privilege(
        &self,
        _: &RequestContext<'_>,
        _: &PropertyName,
        _: &dyn DavResource,
        mode: AccessMode,
    ) -> Option<Privilege> {
        match mode {
            AccessMode::Read => None,
            AccessMode::Write => Some(Privilege::WriteProperties),
        }
    }
}
