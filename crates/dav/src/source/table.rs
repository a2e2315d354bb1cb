/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use ahash::AHashMap;
use dav_proto::schema::{
    PropertyName,
    property::{DavValue, Privilege, ValueType},
};

use crate::{DavResource, RequestContext, auth::AccessMode};

use super::{PropertyError, PropertyMetaData, PropertySource};

type Getter<R> = Box<dyn Fn(&R, &RequestContext<'_>) -> DavValue + Send + Sync>;
type Setter<R> = Box<dyn Fn(&R, DavValue) -> Result<(), PropertyError> + Send + Sync>;

/// Statically built property mapping for resources of type `R`.
pub struct PropertyTable<R: DavResource> {
    entries: Vec<PropertyEntry<R>>,
    index: AHashMap<PropertyName, usize>,
}

pub struct PropertyEntry<R> {
    pub name: PropertyName,
    pub value_type: ValueType,
    pub read_privilege: Privilege,
    pub write_privilege: Privilege,
    getter: Getter<R>,
    setter: Option<Setter<R>>,
}

impl<R: DavResource> PropertyTable<R> {
    pub fn new() -> Self {
        PropertyTable {
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Adds a read-only property. Later calls to `with_setter` and
    /// `with_privileges` apply to the last added property.
    pub fn with_property(
        mut self,
        name: PropertyName,
        value_type: ValueType,
        getter: impl Fn(&R, &RequestContext<'_>) -> DavValue + Send + Sync + 'static,
    ) -> Self {
        let entry = PropertyEntry {
            name: name.clone(),
            value_type,
            read_privilege: Privilege::Read,
            write_privilege: Privilege::Write,
            getter: Box::new(getter),
            setter: None,
        };
        match self.index.get(&name) {
            Some(&idx) => self.entries[idx] = entry,
            None => {
                self.index.insert(name, self.entries.len());
                self.entries.push(entry);
            }
        }
        self
    }

    pub fn with_setter(
        mut self,
        setter: impl Fn(&R, DavValue) -> Result<(), PropertyError> + Send + Sync + 'static,
    ) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.setter = Some(Box::new(setter));
        }
        self
    }

    pub fn with_privileges(mut self, read: Privilege, write: Privilege) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.read_privilege = read;
            entry.write_privilege = write;
        }
        self
    }

    fn entry<'x>(
        &'x self,
        name: &PropertyName,
        resource: &'x dyn DavResource,
    ) -> Option<(&'x PropertyEntry<R>, &'x R)> {
        let resource = resource.as_any().downcast_ref::<R>()?;
        self.index
            .get(name)
            .map(|&idx| (&self.entries[idx], resource))
    }
}

impl<R: DavResource> Default for PropertyTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: DavResource> PropertySource for PropertyTable<R> {
    fn metadata(
        &self,
        _: &RequestContext<'_>,
        name: &PropertyName,
        resource: &dyn DavResource,
    ) -> PropertyMetaData {
        match self.entry(name, resource) {
            Some((entry, _)) if entry.setter.is_some() => {
                PropertyMetaData::writable(entry.value_type)
            }
            Some((entry, _)) => PropertyMetaData::read_only(entry.value_type),
            None => PropertyMetaData::UNKNOWN,
        }
    }

    fn get(
        &self,
        ctx: &RequestContext<'_>,
        name: &PropertyName,
        resource: &dyn DavResource,
    ) -> Result<DavValue, PropertyError> {
        self.entry(name, resource)
            .map(|(entry, resource)| (entry.getter)(resource, ctx))
            .ok_or(PropertyError::NotFound)
    }

    fn set(
        &self,
        _: &RequestContext<'_>,
        name: &PropertyName,
        value: DavValue,
        resource: &dyn DavResource,
    ) -> Result<(), PropertyError> {
        match self.entry(name, resource) {
            Some((entry, resource)) => match &entry.setter {
                Some(setter) => setter(resource, value),
                None => Err(PropertyError::invalid(
                    hyper::StatusCode::FORBIDDEN,
                    "Property is read-only",
                )),
            },
            None => Err(PropertyError::NotFound),
        }
    }

    fn all_property_names(
        &self,
        _: &RequestContext<'_>,
        resource: &dyn DavResource,
    ) -> Vec<PropertyName> {
        if resource.as_any().is::<R>() {
            self.entries.iter().map(|entry| entry.name.clone()).collect()
        } else {
            vec![]
        }
    }

    fn required_privilege(
        &self,
        _: &RequestContext<'_>,
        name: &PropertyName,
        resource: &dyn DavResource,
        mode: AccessMode,
    ) -> Option<Privilege> {
        self.entry(name, resource).map(|(entry, _)| match mode {
            AccessMode::Read => entry.read_privilege,
            AccessMode::Write => entry.write_privilege,
        })
    }
}
