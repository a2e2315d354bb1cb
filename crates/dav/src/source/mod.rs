/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod dead;
pub mod live;
pub mod table;

use ahash::AHashSet;
use dav_proto::schema::{
    PropertyName,
    property::{DavValue, Privilege, ValueType},
};
use hyper::StatusCode;

use crate::{DavResource, RequestContext, auth::AccessMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
    /// The source does not own the property.
    Unknown,
    ReadOnly,
    Writable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyMetaData {
    pub access: Accessibility,
    pub value_type: ValueType,
}

#[derive(Debug)]
pub enum PropertyError {
    NotAuthorized,
    NotFound,
    Invalid {
        status: StatusCode,
        description: String,
    },
    Internal(trc::Error),
}

/// Read, write and enumeration access to the properties of a resource.
pub trait PropertySource: Send + Sync {
    fn metadata(
        &self,
        ctx: &RequestContext<'_>,
        name: &PropertyName,
        resource: &dyn DavResource,
    ) -> PropertyMetaData;

    fn get(
        &self,
        ctx: &RequestContext<'_>,
        name: &PropertyName,
        resource: &dyn DavResource,
    ) -> Result<DavValue, PropertyError>;

    fn set(
        &self,
        ctx: &RequestContext<'_>,
        name: &PropertyName,
        value: DavValue,
        resource: &dyn DavResource,
    ) -> Result<(), PropertyError>;

    fn clear(
        &self,
        ctx: &RequestContext<'_>,
        name: &PropertyName,
        resource: &dyn DavResource,
    ) -> Result<(), PropertyError> {
        self.set(ctx, name, DavValue::Null, resource)
    }

    fn all_property_names(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
    ) -> Vec<PropertyName>;

    /// Privilege required to access the property, `None` for the default
    /// of the access mode.
    fn required_privilege(
        &self,
        _ctx: &RequestContext<'_>,
        _name: &PropertyName,
        _resource: &dyn DavResource,
        _mode: AccessMode,
    ) -> Option<Privilege> {
        None
    }
}

/// Ranked list of property sources. The first source claiming a property
/// is authoritative for it.
#[derive(Default)]
pub struct PropertySources {
    sources: Vec<Box<dyn PropertySource>>,
}

impl PropertyMetaData {
    pub const UNKNOWN: PropertyMetaData = PropertyMetaData {
        access: Accessibility::Unknown,
        value_type: ValueType::Text,
    };

    pub fn read_only(value_type: ValueType) -> Self {
        PropertyMetaData {
            access: Accessibility::ReadOnly,
            value_type,
        }
    }

    pub fn writable(value_type: ValueType) -> Self {
        PropertyMetaData {
            access: Accessibility::Writable,
            value_type,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.access == Accessibility::Unknown
    }

    pub fn is_writable(&self) -> bool {
        self.access == Accessibility::Writable
    }
}

impl PropertySources {
    pub fn new() -> Self {
        PropertySources::default()
    }

    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn push(&mut self, source: impl PropertySource + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn insert(&mut self, idx: usize, source: impl PropertySource + 'static) {
        self.sources
            .insert(idx.min(self.sources.len()), Box::new(source));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns the owning source of a property along with its metadata.
    pub fn resolve(
        &self,
        ctx: &RequestContext<'_>,
        name: &PropertyName,
        resource: &dyn DavResource,
    ) -> Option<(&dyn PropertySource, PropertyMetaData)> {
        self.sources.iter().find_map(|source| {
            let metadata = source.metadata(ctx, name, resource);
            if !metadata.is_unknown() {
                Some((source.as_ref(), metadata))
            } else {
                None
            }
        })
    }

    /// Union of the property names of every source, in source order.
    pub fn all_property_names(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
    ) -> Vec<PropertyName> {
        let mut seen = AHashSet::new();
        let mut names = Vec::new();

        for source in &self.sources {
            for name in source.all_property_names(ctx, resource) {
                if seen.insert(name.clone()) {
                    names.push(name);
                } else {
                    trc::event!(
                        Resource(trc::ResourceEvent::Error),
                        Details = "Property claimed by more than one source",
                        Property = &name,
                        Id = resource.unique_id().to_string(),
                    );
                }
            }
        }

        names
    }

    /// Fails if two sources enumerate the same property for a resource.
    pub fn verify_ownership(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
    ) -> trc::Result<()> {
        let mut seen = AHashSet::new();
        for source in &self.sources {
            for name in source.all_property_names(ctx, resource) {
                if !seen.insert(name.clone()) {
                    return Err(trc::ResourceEvent::Error
                        .into_err()
                        .details("Property claimed by more than one source")
                        .ctx(trc::Key::Property, &name)
                        .ctx(trc::Key::Id, resource.unique_id().to_string()));
                }
            }
        }

        Ok(())
    }
}

impl From<trc::Error> for PropertyError {
    fn from(err: trc::Error) -> Self {
        PropertyError::Internal(err)
    }
}

impl PropertyError {
    pub fn invalid(status: StatusCode, description: impl Into<String>) -> Self {
        PropertyError::Invalid {
            status,
            description: description.into(),
        }
    }
}
