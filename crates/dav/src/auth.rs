/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_proto::schema::{PropertyName, property::Privilege};
use hyper::StatusCode;

use crate::{DavResource, RequestContext, source::PropertySources};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// A denied property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub field: PropertyName,
    pub status: StatusCode,
    pub description: String,
    pub resource: String,
}

/// Decides per property whether the current principal may access it. An
/// empty result means every field is allowed.
pub trait PropertyAuthoriser: Send + Sync {
    fn check(
        &self,
        ctx: &RequestContext<'_>,
        mode: AccessMode,
        fields: &[PropertyName],
        resource: &dyn DavResource,
        sources: &PropertySources,
    ) -> Vec<CheckResult>;
}

/// Denies every field when the resource refuses the request method,
/// otherwise defers to the wrapped authoriser.
#[derive(Default)]
pub struct DefaultPropertyAuthoriser {
    inner: Option<Box<dyn PropertyAuthoriser>>,
}

/// Compares the privilege each field requires with the privileges the
/// resource grants to the principal.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrivilegePropertyAuthoriser;

impl DefaultPropertyAuthoriser {
    pub fn new() -> Self {
        DefaultPropertyAuthoriser::default()
    }

    pub fn wrapping(inner: impl PropertyAuthoriser + 'static) -> Self {
        DefaultPropertyAuthoriser {
            inner: Some(Box::new(inner)),
        }
    }
}

impl PropertyAuthoriser for DefaultPropertyAuthoriser {
    fn check(
        &self,
        ctx: &RequestContext<'_>,
        mode: AccessMode,
        fields: &[PropertyName],
        resource: &dyn DavResource,
        sources: &PropertySources,
    ) -> Vec<CheckResult> {
        if !resource.authorise(ctx.principal, ctx.method) {
            fields
                .iter()
                .map(|field| CheckResult {
                    field: field.clone(),
                    status: StatusCode::UNAUTHORIZED,
                    description: format!("Not authorised for {}", ctx.method),
                    resource: resource.unique_id().to_string(),
                })
                .collect()
        } else if let Some(inner) = &self.inner {
            inner.check(ctx, mode, fields, resource, sources)
        } else {
            vec![]
        }
    }
}

impl PropertyAuthoriser for PrivilegePropertyAuthoriser {
    fn check(
        &self,
        ctx: &RequestContext<'_>,
        mode: AccessMode,
        fields: &[PropertyName],
        resource: &dyn DavResource,
        sources: &PropertySources,
    ) -> Vec<CheckResult> {
        let granted = resource.privileges(ctx.principal);
        let mut results = Vec::new();

        for field in fields {
            // Unclaimed fields are reported as missing by the caller
            let Some((source, _)) = sources.resolve(ctx, field, resource) else {
                continue;
            };
            let required = source
                .required_privilege(ctx, field, resource, mode)
                .unwrap_or(match mode {
                    AccessMode::Read => Privilege::Read,
                    AccessMode::Write => Privilege::Write,
                });

            if !required.is_granted(&granted) {
                results.push(CheckResult {
                    field: field.clone(),
                    status: StatusCode::UNAUTHORIZED,
                    description: format!("Missing privilege {}", required.as_str()),
                    resource: resource.unique_id().to_string(),
                });
            }
        }

        results
    }
}

impl CheckResult {
    pub fn find<'x>(results: &'x [CheckResult], field: &PropertyName) -> Option<&'x CheckResult> {
        results.iter().find(|result| &result.field == field)
    }
}
