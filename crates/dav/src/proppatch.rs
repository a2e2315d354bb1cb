/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use dav_proto::schema::{
    PropertyName,
    property::DavValue,
    request::{Instruction, PropertyUpdate},
    response::{MultiStatus, Prop, Response},
};
use hyper::StatusCode;

use crate::{
    DavResource, DavServer, RequestContext,
    auth::{AccessMode, CheckResult},
    propfind::PropStatBuilder,
    source::{PropertyError, PropertySource},
};

pub trait PropPatchRequestHandler {
    fn handle_proppatch_request(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        request: &PropertyUpdate,
    ) -> trc::Result<MultiStatus>;
}

struct PlannedUpdate<'x> {
    name: &'x PropertyName,
    source: &'x dyn PropertySource,
    value: Option<DavValue>,
}

struct Failure {
    status: StatusCode,
    description: String,
}

impl PropPatchRequestHandler for DavServer {
    fn handle_proppatch_request(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        request: &PropertyUpdate,
    ) -> trc::Result<MultiStatus> {
        let href = ctx.href().to_string();
        let names = request
            .instructions
            .iter()
            .map(|instruction| instruction.name().clone())
            .collect::<Vec<_>>();

        // Validate every instruction before changing anything
        let mut planned = Vec::with_capacity(request.instructions.len());
        let mut failures: Vec<Option<Failure>> = Vec::with_capacity(request.instructions.len());
        for instruction in &request.instructions {
            match self.plan_update(ctx, resource, instruction) {
                Ok(update) => {
                    planned.push(Some(update));
                    failures.push(None);
                }
                Err(failure) => {
                    planned.push(None);
                    failures.push(Some(failure));
                }
            }
        }

        let denied = self
            .authoriser
            .check(ctx, AccessMode::Write, &names, resource, &self.sources);
        for (name, failure) in names.iter().zip(failures.iter_mut()) {
            if failure.is_none()
                && let Some(result) = CheckResult::find(&denied, name)
            {
                *failure = Some(Failure {
                    status: result.status,
                    description: result.description.clone(),
                });
            }
        }

        if failures.iter().any(Option::is_some) {
            return Ok(failed_response(href, names, failures));
        }

        let planned = planned.into_iter().flatten().collect::<Vec<_>>();
        if let Err((failed_idx, err)) = self.apply_updates(ctx, resource, &planned) {
            let failure = match err {
                PropertyError::NotAuthorized => Failure {
                    status: StatusCode::UNAUTHORIZED,
                    description: "Not authorised".into(),
                },
                PropertyError::NotFound => Failure {
                    status: StatusCode::NOT_FOUND,
                    description: "Property not found".into(),
                },
                PropertyError::Invalid {
                    status,
                    description,
                } => Failure {
                    status,
                    description,
                },
                PropertyError::Internal(err) => {
                    return Err(err.ctx(trc::Key::Href, href).caused_by(trc::location!()));
                }
            };
            let mut failures = names.iter().map(|_| None).collect::<Vec<_>>();
            failures[failed_idx] = Some(failure);
            return Ok(failed_response(href, names, failures));
        }

        let mut propstats = PropStatBuilder::default();
        for name in names {
            propstats.insert(StatusCode::OK, Prop::empty(name));
        }

        Ok(MultiStatus::new(vec![Response::new_propstat(
            href,
            propstats.build(),
        )]))
    }
}

impl DavServer {
    fn plan_update<'x>(
        &'x self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        instruction: &'x Instruction,
    ) -> Result<PlannedUpdate<'x>, Failure> {
        let name = instruction.name();
        let Some((source, metadata)) = self.sources.resolve(ctx, name, resource) else {
            return Err(Failure {
                status: StatusCode::NOT_FOUND,
                description: "Property not found".into(),
            });
        };

        if !metadata.is_writable() {
            return Err(Failure {
                status: StatusCode::FORBIDDEN,
                description: "Property is protected".into(),
            });
        }

        let value = match instruction {
            Instruction::Set(property) => Some(
                self.writers
                    .parse(
                        name,
                        metadata.value_type,
                        property.value.as_deref().unwrap_or_default(),
                    )
                    .map_err(|err| Failure {
                        status: StatusCode::CONFLICT,
                        description: err
                            .value_as_str(trc::Key::Details)
                            .unwrap_or("Invalid property value")
                            .to_string(),
                    })?,
            ),
            Instruction::Remove(_) => None,
        };

        Ok(PlannedUpdate {
            name,
            source,
            value,
        })
    }

    /// Applies the updates in order. When one fails the updates already
    /// applied are reverted.
    fn apply_updates(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        planned: &[PlannedUpdate<'_>],
    ) -> Result<(), (usize, PropertyError)> {
        let mut previous = Vec::with_capacity(planned.len());

        for (idx, update) in planned.iter().enumerate() {
            previous.push(update.source.get(ctx, update.name, resource).ok());

            let result = match &update.value {
                Some(value) => update
                    .source
                    .set(ctx, update.name, value.clone(), resource),
                None => update.source.clear(ctx, update.name, resource),
            };

            if let Err(err) = result {
                previous.truncate(idx);
                for (update, previous) in planned[..idx].iter().zip(previous).rev() {
                    let restored = match previous {
                        Some(value) => update.source.set(ctx, update.name, value, resource),
                        None => update.source.clear(ctx, update.name, resource),
                    };
                    if restored.is_err() {
                        trc::event!(
                            WebDav(trc::WebDavEvent::Error),
                            Details = "Failed to revert property update",
                            Property = update.name,
                            Href = ctx.href().to_string(),
                        );
                    }
                }
                return Err((idx, err));
            }
        }

        Ok(())
    }
}

fn failed_response(
    href: String,
    names: Vec<PropertyName>,
    failures: Vec<Option<Failure>>,
) -> MultiStatus {
    let mut propstats = PropStatBuilder::default();
    for (name, failure) in names.into_iter().zip(failures) {
        match failure {
            Some(failure) => propstats.insert_error(failure.status, name, &failure.description),
            None => propstats.insert(StatusCode::FAILED_DEPENDENCY, Prop::empty(name)),
        }
    }

    MultiStatus::new(vec![Response::new_propstat(href, propstats.build())])
}

#[cfg(test)]
mod tests {
    use common::config::dav::DavConfig;
    use dav_proto::schema::{
        PropertyName,
        property::DavValue,
        request::{Instruction, PropertyUpdate, PropertyValue},
        response::Prop,
    };
    use hyper::StatusCode;

    use crate::{
        DavMethod,
        propfind::tests::{Document, NS_EXAMPLE, request, server},
        source::PropertySource,
    };

    use super::PropPatchRequestHandler;

    fn set(name: PropertyName, value: &str) -> Instruction {
        Instruction::Set(PropertyValue {
            name,
            value: Some(value.to_string()),
        })
    }

    #[test]
    fn apply_all_updates() {
        let server = server();
        let config = DavConfig::default();
        let ctx = request(&config, DavMethod::PROPPATCH, "/docs/report.txt", "editor");
        let doc = Document::new("1", "report.txt", "Quarterly report");
        let title = PropertyName::new(NS_EXAMPLE, "title");
        let color = PropertyName::new("urn:client", "color");

        let response = server
            .handle_proppatch_request(
                &ctx,
                &doc,
                &PropertyUpdate {
                    instructions: vec![set(title.clone(), "Annual report"), set(color.clone(), "blue")],
                },
            )
            .unwrap();
        assert_eq!(
            response.response[0].propstat(StatusCode::OK).unwrap().prop,
            vec![Prop::empty(title.clone()), Prop::empty(color.clone())]
        );
        assert_eq!(*doc.title.read(), "Annual report");

        let (dead, _) = server.sources.resolve(&ctx, &color, &doc).unwrap();
        assert_eq!(
            dead.get(&ctx, &color, &doc).unwrap(),
            DavValue::Text("blue".into())
        );

        // Removal runs in request order after the set
        server
            .handle_proppatch_request(
                &ctx,
                &doc,
                &PropertyUpdate {
                    instructions: vec![
                        set(color.clone(), "red"),
                        Instruction::Remove(color.clone()),
                    ],
                },
            )
            .unwrap();
        assert!(dead.get(&ctx, &color, &doc).is_err());
    }

    #[test]
    fn atomic_on_denied_field() {
        let server = server();
        let config = DavConfig::default();
        let ctx = request(&config, DavMethod::PROPPATCH, "/docs/report.txt", "editor");
        let doc = Document::new("1", "report.txt", "Quarterly report");
        let title = PropertyName::new(NS_EXAMPLE, "title");
        let salary = PropertyName::new(NS_EXAMPLE, "salary");

        // Editors may change the title but the salary is read-only
        let response = server
            .handle_proppatch_request(
                &ctx,
                &doc,
                &PropertyUpdate {
                    instructions: vec![set(title.clone(), "Leaked"), set(salary.clone(), "1")],
                },
            )
            .unwrap();
        let response = &response.response[0];
        assert_eq!(
            response.propstat(StatusCode::FAILED_DEPENDENCY).unwrap().prop,
            vec![Prop::empty(title.clone())]
        );
        assert_eq!(
            response.propstat(StatusCode::FORBIDDEN).unwrap().prop,
            vec![Prop::empty(salary)]
        );
        assert_eq!(*doc.title.read(), "Quarterly report");

        // Readers hold no write privilege at all
        let ctx = request(&config, DavMethod::PROPPATCH, "/docs/report.txt", "bob");
        let color = PropertyName::new("urn:client", "color");
        let response = server
            .handle_proppatch_request(
                &ctx,
                &doc,
                &PropertyUpdate {
                    instructions: vec![set(color.clone(), "blue"), set(title.clone(), "Leaked")],
                },
            )
            .unwrap();
        let response = &response.response[0];
        let denied = response.propstat(StatusCode::UNAUTHORIZED).unwrap();
        assert_eq!(denied.prop, vec![Prop::empty(color.clone()), Prop::empty(title)]);
        assert_eq!(
            denied.response_description.as_deref(),
            Some("Missing privilege write-properties")
        );
        assert_eq!(*doc.title.read(), "Quarterly report");
        let (dead, _) = server.sources.resolve(&ctx, &color, &doc).unwrap();
        assert!(dead.get(&ctx, &color, &doc).is_err());
    }

    #[test]
    fn reject_invalid_values() {
        let server = server();
        let config = DavConfig::default();
        let ctx = request(&config, DavMethod::PROPPATCH, "/docs/report.txt", "admin");
        let doc = Document::new("1", "report.txt", "Quarterly report");
        let title = PropertyName::new(NS_EXAMPLE, "title");

        for (instruction, status) in [
            (
                set(PropertyName::dav("getcontentlength"), "12"),
                StatusCode::FORBIDDEN,
            ),
            (
                set(PropertyName::dav("displayname"), "Renamed"),
                StatusCode::FORBIDDEN,
            ),
            (
                set(PropertyName::dav("getfoo"), "bar"),
                StatusCode::NOT_FOUND,
            ),
            (
                set(PropertyName::new("urn:client", "big"), &"x".repeat(2048)),
                StatusCode::INSUFFICIENT_STORAGE,
            ),
        ] {
            let name = instruction.name().clone();
            let response = server
                .handle_proppatch_request(
                    &ctx,
                    &doc,
                    &PropertyUpdate {
                        instructions: vec![set(title.clone(), "Changed"), instruction],
                    },
                )
                .unwrap();
            let response = &response.response[0];
            assert_eq!(
                response.propstat(status).map(|p| p.prop.clone()),
                Some(vec![Prop::empty(name.clone())]),
                "{name}"
            );
            assert_eq!(
                response
                    .propstat(StatusCode::FAILED_DEPENDENCY)
                    .map(|p| p.prop.clone()),
                Some(vec![Prop::empty(title.clone())]),
                "{name}"
            );
            assert_eq!(*doc.title.read(), "Quarterly report", "{name}");
        }
    }
}
