/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use ahash::AHashSet;
use common::config::dav::DepthLimit;
use dav_proto::{
    Depth,
    schema::{
        PropertyName,
        request::PropFind,
        response::{MultiStatus, Prop, PropStat, Response},
    },
};
use hyper::StatusCode;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{
    DavResource, DavServer, RequestContext,
    auth::{AccessMode, CheckResult},
    source::PropertyError,
};

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub trait PropFindRequestHandler {
    fn handle_propfind_request(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        request: &PropFind,
    ) -> trc::Result<MultiStatus>;
}

/// Groups properties by status, keeping the order in which each status
/// first appeared.
#[derive(Debug, Default)]
pub(crate) struct PropStatBuilder {
    propstats: Vec<PropStat>,
}

impl PropFindRequestHandler for DavServer {
    fn handle_propfind_request(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        request: &PropFind,
    ) -> trc::Result<MultiStatus> {
        let depth = match (ctx.headers.depth.or_infinity(), ctx.config.max_depth) {
            (Depth::Zero, _) | (_, DepthLimit::Zero) => 0,
            (Depth::One, _) | (_, DepthLimit::One) => 1,
            _ => usize::MAX,
        };

        let mut response = MultiStatus::default();
        self.propfind_tree(
            ctx,
            resource,
            ctx.href().to_string(),
            request,
            depth,
            &mut response,
        )?;

        Ok(response)
    }
}

impl DavServer {
    fn propfind_tree(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        href: String,
        request: &PropFind,
        depth: usize,
        response: &mut MultiStatus,
    ) -> trc::Result<()> {
        let is_collection = resource.is_collection();
        response.add_response(self.propfind_resource(ctx, resource, href.clone(), request)?);

        if depth > 0 && is_collection {
            for child in resource.children() {
                let child_href = child_href(&href, child.as_ref());
                self.propfind_tree(ctx, child.as_ref(), child_href, request, depth - 1, response)?;
            }
        }

        Ok(())
    }

    /// Builds the response entry of a single resource. Per field failures
    /// become propstat entries, only internal errors abort.
    pub fn propfind_resource(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        href: String,
        request: &PropFind,
    ) -> trc::Result<Response> {
        let fields = match request {
            PropFind::Prop(fields) => dedup(fields.iter().cloned()),
            PropFind::AllProp(include) => dedup(
                self.sources
                    .all_property_names(ctx, resource)
                    .into_iter()
                    .chain(include.iter().cloned()),
            ),
            PropFind::PropName => {
                return Ok(Response::new_propstat(
                    href,
                    vec![PropStat::new_list(
                        StatusCode::OK,
                        self.sources
                            .all_property_names(ctx, resource)
                            .into_iter()
                            .map(Prop::empty)
                            .collect(),
                    )],
                ));
            }
        };

        let denied =
            self.authoriser
                .check(ctx, AccessMode::Read, &fields, resource, &self.sources);
        let mut propstats = PropStatBuilder::default();

        for field in fields {
            if let Some(result) = CheckResult::find(&denied, &field) {
                propstats.insert_error(result.status, field, &result.description);
                continue;
            }

            let Some((source, metadata)) = self.sources.resolve(ctx, &field, resource) else {
                propstats.insert(StatusCode::NOT_FOUND, Prop::empty(field));
                continue;
            };

            match source.get(ctx, &field, resource) {
                Ok(value) => {
                    propstats.insert(
                        StatusCode::OK,
                        Prop::new(field, metadata.value_type, value),
                    );
                }
                Err(PropertyError::NotFound) => {
                    propstats.insert(StatusCode::NOT_FOUND, Prop::empty(field));
                }
                Err(PropertyError::NotAuthorized) => {
                    propstats.insert(StatusCode::UNAUTHORIZED, Prop::empty(field));
                }
                Err(PropertyError::Invalid {
                    status,
                    description,
                }) => {
                    propstats.insert_error(status, field, &description);
                }
                Err(PropertyError::Internal(err)) => {
                    return Err(err
                        .ctx(trc::Key::Href, href)
                        .caused_by(trc::location!()));
                }
            }
        }

        Ok(Response::new_propstat(href, propstats.build()))
    }
}

impl PropStatBuilder {
    pub fn insert(&mut self, status: StatusCode, prop: Prop) {
        match self.propstats.iter_mut().find(|p| p.status == status) {
            Some(propstat) => propstat.prop.push(prop),
            None => self.propstats.push(PropStat::new(status).with_prop(prop)),
        }
    }

    pub fn insert_error(&mut self, status: StatusCode, name: PropertyName, description: &str) {
        self.insert(status, Prop::empty(name));
        if let Some(propstat) = self
            .propstats
            .iter_mut()
            .find(|p| p.status == status && p.response_description.is_none())
        {
            propstat.response_description = Some(description.to_string());
        }
    }

    pub fn build(self) -> Vec<PropStat> {
        self.propstats
    }
}

pub(crate) fn child_href(parent: &str, child: &dyn DavResource) -> String {
    let mut href = String::with_capacity(parent.len() + child.name().len() + 2);
    href.push_str(parent);
    if !href.ends_with('/') {
        href.push('/');
    }
    href.extend(utf8_percent_encode(child.name(), PATH_SEGMENT));
    if child.is_collection() {
        href.push('/');
    }
    href
}

fn dedup(fields: impl Iterator<Item = PropertyName>) -> Vec<PropertyName> {
    let mut seen = AHashSet::new();
    fields.filter(|field| seen.insert(field.clone())).collect()
}
