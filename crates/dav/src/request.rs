/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{sync::Arc, time::Instant};

use common::config::dav::DavConfig;
use dav_proto::{
    Depth, Timeout,
    parser::DavParser,
    schema::{
        property::LockScope,
        request::{LockInfo, PropFind, PropertyUpdate},
        response::Condition,
    },
};
use hyper::StatusCode;

use crate::{
    DavMethod, DavResource, DavResponse, RequestContext,
    auth::{DefaultPropertyAuthoriser, PrivilegePropertyAuthoriser, PropertyAuthoriser},
    lock::{LockFailure, LockManager, LockTimeout},
    propfind::PropFindRequestHandler,
    proppatch::PropPatchRequestHandler,
    source::{PropertySource, PropertySources, dead::DeadPropertySource, live::LivePropertySource},
    value::ValueWriters,
};

const ALLOWED_METHODS: &str = "OPTIONS, PROPFIND, PROPPATCH, LOCK, UNLOCK";
const DAV_COMPLIANCE: &str = "1, 2, access-control";

/// The WebDAV engine. Holds the property pipeline and the lock manager,
/// resource storage stays with the caller.
pub struct DavServer {
    pub(crate) sources: PropertySources,
    custom_sources: usize,
    pub(crate) authoriser: Box<dyn PropertyAuthoriser>,
    pub(crate) writers: ValueWriters,
    locks: Arc<LockManager>,
    config: DavConfig,
}

impl DavServer {
    pub fn new(config: DavConfig) -> Self {
        let locks = Arc::new(LockManager::new());
        DavServer {
            sources: PropertySources::new()
                .with_source(LivePropertySource::new(locks.clone()))
                .with_source(DeadPropertySource::new(&config)),
            custom_sources: 0,
            authoriser: Box::new(DefaultPropertyAuthoriser::wrapping(
                PrivilegePropertyAuthoriser,
            )),
            writers: ValueWriters::default(),
            locks,
            config,
        }
    }

    /// Registers a source ahead of the built-in live and dead property
    /// sources, after any source registered earlier.
    pub fn with_property_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.sources.insert(self.custom_sources, source);
        self.custom_sources += 1;
        self
    }

    pub fn with_authoriser(mut self, authoriser: impl PropertyAuthoriser + 'static) -> Self {
        self.authoriser = Box::new(authoriser);
        self
    }

    pub fn with_writers(mut self, writers: ValueWriters) -> Self {
        self.writers = writers;
        self
    }

    pub fn locks(&self) -> &Arc<LockManager> {
        &self.locks
    }

    pub fn config(&self) -> &DavConfig {
        &self.config
    }

    pub fn sources(&self) -> &PropertySources {
        &self.sources
    }

    pub fn handle(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        body: &[u8],
    ) -> DavResponse {
        let start_time = Instant::now();

        let response = if body.len() > ctx.config.max_request_size {
            trc::event!(
                WebDav(trc::WebDavEvent::RequestTooLarge),
                Href = ctx.href().to_string(),
                Size = body.len(),
                Limit = ctx.config.max_request_size,
            );
            Ok(DavResponse::new(StatusCode::PAYLOAD_TOO_LARGE))
        } else {
            match ctx.method {
                DavMethod::PROPFIND => self.handle_propfind(ctx, resource, body),
                DavMethod::PROPPATCH => self.handle_proppatch(ctx, resource, body),
                DavMethod::LOCK => self.handle_lock(ctx, resource, body),
                DavMethod::UNLOCK => self.handle_unlock(ctx, resource),
                DavMethod::OPTIONS => Ok(DavResponse::new(StatusCode::OK)
                    .with_header("DAV", DAV_COMPLIANCE)
                    .with_header("Allow", ALLOWED_METHODS)),
                _ => Ok(DavResponse::new(StatusCode::METHOD_NOT_ALLOWED)
                    .with_header("Allow", ALLOWED_METHODS)),
            }
        };

        match response {
            Ok(response) => {
                trc::event!(
                    WebDav(trc::WebDavEvent::from(ctx.method)),
                    Href = ctx.href().to_string(),
                    Status = response.status.as_u16(),
                    Elapsed = start_time.elapsed(),
                );

                response
            }
            Err(err) => {
                trc::error!(
                    err.ctx(trc::Key::Href, ctx.href().to_string())
                        .ctx(trc::Key::Name, ctx.method.as_str())
                );

                DavResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn handle_propfind(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        body: &[u8],
    ) -> trc::Result<DavResponse> {
        let request = match PropFind::parse_bytes(body) {
            Ok(request) => request,
            Err(err) => return Ok(bad_request(err.into())),
        };

        self.handle_propfind_request(ctx, resource, &request)?
            .render(&self.writers)
            .map(|body| DavResponse::new(StatusCode::MULTI_STATUS).with_xml_body(body))
    }

    fn handle_proppatch(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        body: &[u8],
    ) -> trc::Result<DavResponse> {
        if self
            .locks
            .check_write(resource, ctx.headers.submitted_tokens())
            .is_err()
        {
            return Ok(locked(Condition::LockTokenSubmitted(vec![
                ctx.href().to_string(),
            ])));
        }

        let request = match PropertyUpdate::parse_bytes(body) {
            Ok(request) if !request.is_empty() => request,
            Ok(_) => {
                return Ok(bad_request(
                    trc::ResourceEvent::BadParameters
                        .into_err()
                        .details("Empty property update"),
                ));
            }
            Err(err) => return Ok(bad_request(err.into())),
        };

        self.handle_proppatch_request(ctx, resource, &request)?
            .render(&self.writers)
            .map(|body| DavResponse::new(StatusCode::MULTI_STATUS).with_xml_body(body))
    }

    fn handle_lock(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
        body: &[u8],
    ) -> trc::Result<DavResponse> {
        if !resource.authorise(ctx.principal, ctx.method) {
            return Ok(DavResponse::new(StatusCode::UNAUTHORIZED));
        }

        let config = ctx.config;

        // A body-less LOCK refreshes the lock named in the If header
        if body.iter().all(u8::is_ascii_whitespace) {
            let Some(token) = ctx.headers.submitted_tokens().next() else {
                return Ok(bad_request(
                    trc::ResourceEvent::BadParameters
                        .into_err()
                        .details("Missing lock token"),
                ));
            };
            let timeout = (ctx.headers.timeout != Timeout::None).then(|| {
                LockTimeout::from_request(
                    ctx.headers.timeout,
                    config.default_lock_timeout,
                    config.max_lock_timeout,
                )
            });

            return Ok(match self.locks.refresh(token, timeout, resource) {
                Ok(token) => DavResponse::new(StatusCode::OK)
                    .with_xml_body(token.to_active_lock().to_lock_discovery()),
                Err(failure) => lock_failure(ctx, failure, None),
            });
        }

        if ctx.headers.depth == Depth::One {
            return Ok(bad_request(
                trc::ResourceEvent::BadParameters
                    .into_err()
                    .details("Depth 1 is not allowed for LOCK")
                    .ctx(trc::Key::Depth, ctx.headers.depth.as_str()),
            ));
        }

        let info = match LockInfo::parse_bytes(body) {
            Ok(info) => info,
            Err(err) => return Ok(bad_request(err.into())),
        };
        if info.lock_scope == LockScope::Shared {
            trc::error!(
                trc::ResourceEvent::BadParameters
                    .into_err()
                    .details("Shared locks are not supported")
                    .ctx(trc::Key::Href, ctx.href().to_string())
            );
            return Ok(DavResponse::new(StatusCode::UNPROCESSABLE_ENTITY));
        }
        let timeout = LockTimeout::from_request(
            ctx.headers.timeout,
            config.default_lock_timeout,
            config.max_lock_timeout,
        );

        Ok(match self.locks.lock(ctx, timeout, info, resource) {
            Ok(token) => DavResponse::new(StatusCode::OK)
                .with_header("Lock-Token", format!("<{}>", token.token_id))
                .with_xml_body(token.to_active_lock().to_lock_discovery()),
            Err(failure) => lock_failure(
                ctx,
                failure,
                self.locks.current_token(resource).map(|token| token.href),
            ),
        })
    }

    fn handle_unlock(
        &self,
        ctx: &RequestContext<'_>,
        resource: &dyn DavResource,
    ) -> trc::Result<DavResponse> {
        if !resource.authorise(ctx.principal, ctx.method) {
            return Ok(DavResponse::new(StatusCode::UNAUTHORIZED));
        }

        let Some(token) = ctx.headers.lock_token else {
            return Ok(bad_request(
                trc::ResourceEvent::BadParameters
                    .into_err()
                    .details("Missing Lock-Token header"),
            ));
        };

        Ok(match self.locks.unlock(token, resource) {
            Ok(()) => DavResponse::new(StatusCode::NO_CONTENT),
            Err(failure) => lock_failure(ctx, failure, None),
        })
    }
}

fn lock_failure(ctx: &RequestContext<'_>, failure: LockFailure, root: Option<String>) -> DavResponse {
    match failure {
        LockFailure::AlreadyLocked => locked(Condition::NoConflictingLock(vec![
            root.unwrap_or_else(|| ctx.href().to_string()),
        ])),
        LockFailure::PreconditionFailed => DavResponse::new(StatusCode::PRECONDITION_FAILED),
        LockFailure::NotAuthorized => DavResponse::new(StatusCode::FORBIDDEN)
            .with_xml_body(Condition::LockTokenMatchesRequestUri.to_document()),
    }
}

fn locked(condition: Condition) -> DavResponse {
    DavResponse::new(StatusCode::LOCKED).with_xml_body(condition.to_document())
}

fn bad_request(err: trc::Error) -> DavResponse {
    trc::error!(err);
    DavResponse::new(StatusCode::BAD_REQUEST)
}

#[cfg(test)]
mod tests {
    use common::config::dav::DavConfig;
    use dav_proto::{
        RequestHeaders,
        schema::{PropertyName, property::{DavValue, ValueType}},
    };
    use hyper::StatusCode;

    use crate::{
        DavMethod, DavResponse, DavServer, RequestContext,
        propfind::tests::{Document, document_table},
        source::table::PropertyTable,
    };

    const PROPPATCH: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:propertyupdate xmlns:D="DAV:" xmlns:Z="http://example.com/ns">
  <D:set><D:prop><Z:author>Jane Doe</Z:author></D:prop></D:set>
</D:propertyupdate>"#;

    const LOCKINFO: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:lockinfo xmlns:D="DAV:">
  <D:lockscope><D:exclusive/></D:lockscope>
  <D:locktype><D:write/></D:locktype>
  <D:owner><D:href>http://example.org/~jane/contact.html</D:href></D:owner>
</D:lockinfo>"#;

    const SHARED_LOCKINFO: &str = r#"<D:lockinfo xmlns:D="DAV:">
  <D:lockscope><D:shared/></D:lockscope>
  <D:locktype><D:write/></D:locktype>
</D:lockinfo>"#;

    fn send(
        server: &DavServer,
        doc: &Document,
        method: DavMethod,
        headers: &[(&str, &str)],
        body: &str,
    ) -> DavResponse {
        let config = server.config().clone();
        let mut request_headers = RequestHeaders::new("/docs/report.txt");
        for (key, value) in headers {
            assert!(request_headers.parse(key, value), "{key}: {value}");
        }
        let ctx = RequestContext::new(&config, method, request_headers).with_principal("admin");
        server.handle(&ctx, doc, body.as_bytes())
    }

    fn server() -> DavServer {
        DavServer::new(DavConfig::default()).with_property_source(document_table())
    }

    #[test]
    fn lock_protects_proppatch() {
        let server = server();
        let doc = Document::new("1", "report.txt", "Quarterly report");

        let response = send(&server, &doc, DavMethod::LOCK, &[("Timeout", "Second-600")], LOCKINFO);
        assert_eq!(response.status, StatusCode::OK);
        let token = response
            .header("Lock-Token")
            .unwrap()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .to_string();
        let body = response.body.unwrap();
        assert!(body.contains(&format!("<D:locktoken><D:href>{token}</D:href></D:locktoken>")), "{body}");
        assert!(body.contains("<D:timeout>Second-600</D:timeout>"), "{body}");
        assert!(body.contains("<D:lockroot><D:href>/docs/report.txt</D:href></D:lockroot>"), "{body}");

        // Second lock fails while the first one is active
        let response = send(&server, &doc, DavMethod::LOCK, &[], LOCKINFO);
        assert_eq!(response.status, StatusCode::LOCKED);
        assert!(response.body.unwrap().contains("<D:no-conflicting-lock>"));

        // Writes require the lock token
        let response = send(&server, &doc, DavMethod::PROPPATCH, &[], PROPPATCH);
        assert_eq!(response.status, StatusCode::LOCKED);
        assert!(response.body.unwrap().contains("<D:lock-token-submitted>"));

        let if_header = format!("(<{token}>)");
        let response = send(
            &server,
            &doc,
            DavMethod::PROPPATCH,
            &[("If", &if_header)],
            PROPPATCH,
        );
        assert_eq!(response.status, StatusCode::MULTI_STATUS);
        let body = response.body.unwrap();
        assert!(body.contains("<ns1:author/>"), "{body}");
        assert!(body.contains("HTTP/1.1 200 OK"), "{body}");

        // The lock shows up in lockdiscovery
        let response = send(
            &server,
            &doc,
            DavMethod::PROPFIND,
            &[("Depth", "0")],
            r#"<D:propfind xmlns:D="DAV:"><D:prop><D:lockdiscovery/><ns:author xmlns:ns="http://example.com/ns"/></D:prop></D:propfind>"#,
        );
        assert_eq!(response.status, StatusCode::MULTI_STATUS);
        let body = response.body.unwrap();
        assert!(body.contains(&token), "{body}");
        assert!(body.contains("<ns1:author>Jane Doe</ns1:author>"), "{body}");

        // Refresh with the If header and no body
        let response = send(
            &server,
            &doc,
            DavMethod::LOCK,
            &[("If", &if_header), ("Timeout", "Second-120")],
            "",
        );
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.header("Lock-Token").is_none());
        assert!(response.body.unwrap().contains("Second-120"));

        let response = send(&server, &doc, DavMethod::UNLOCK, &[("Lock-Token", "<urn:uuid:forged>")], "");
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert!(response.body.unwrap().contains("<D:lock-token-matches-request-uri/>"));

        let lock_token = format!("<{token}>");
        let response = send(&server, &doc, DavMethod::UNLOCK, &[("Lock-Token", &lock_token)], "");
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(server.locks().is_empty());

        // Refreshing a released lock fails
        let response = send(&server, &doc, DavMethod::LOCK, &[("If", &if_header)], "");
        assert_eq!(response.status, StatusCode::PRECONDITION_FAILED);
    }

    #[test]
    fn request_errors() {
        let server = server();
        let doc = Document::new("1", "report.txt", "Quarterly report");

        for (method, headers, body, status) in [
            (DavMethod::PROPFIND, vec![], "<D:propfind xmlns:D=\"DAV:\"><D:bogus/></D:propfind>", StatusCode::BAD_REQUEST),
            (DavMethod::PROPFIND, vec![], "<D:propfind xmlns:D=\"DAV:\"><D:prop>", StatusCode::BAD_REQUEST),
            (DavMethod::PROPPATCH, vec![], "<D:propertyupdate xmlns:D=\"DAV:\"/>", StatusCode::BAD_REQUEST),
            (DavMethod::LOCK, vec![], "", StatusCode::BAD_REQUEST),
            (DavMethod::LOCK, vec![("Depth", "1")], LOCKINFO, StatusCode::BAD_REQUEST),
            (DavMethod::LOCK, vec![], SHARED_LOCKINFO, StatusCode::UNPROCESSABLE_ENTITY),
            (DavMethod::UNLOCK, vec![], "", StatusCode::BAD_REQUEST),
            (DavMethod::UNLOCK, vec![("Lock-Token", "<urn:uuid:none>")], "", StatusCode::NO_CONTENT),
            (DavMethod::MKCOL, vec![], "", StatusCode::METHOD_NOT_ALLOWED),
            (DavMethod::PROPFIND, vec![], &*"x".repeat(1024 * 1024 + 1), StatusCode::PAYLOAD_TOO_LARGE),
        ] {
            let response = send(&server, &doc, method, &headers, body);
            assert_eq!(response.status, status, "{method} {headers:?}");
        }

        // Shared lock requests are refused without taking a lock
        assert!(server.locks().is_empty());

        let response = send(&server, &doc, DavMethod::OPTIONS, &[], "");
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("dav"), Some("1, 2, access-control"));
        assert!(response.header("Allow").unwrap().contains("PROPFIND"));
    }

    #[test]
    fn unauthorised_requests() {
        let server = server();
        let doc = Document::new("1", "report.txt", "Quarterly report");
        let config = server.config().clone();

        for (method, body) in [(DavMethod::LOCK, LOCKINFO), (DavMethod::UNLOCK, "")] {
            let mut headers = RequestHeaders::new("/docs/report.txt");
            headers.parse("Lock-Token", "<urn:uuid:any>");
            let ctx = RequestContext::new(&config, method, headers);
            assert_eq!(
                server.handle(&ctx, &doc, body.as_bytes()).status,
                StatusCode::UNAUTHORIZED
            );
        }

        // Property requests report the denial per field
        let ctx = RequestContext::new(&config, DavMethod::PROPFIND, RequestHeaders::new("/docs/report.txt"));
        let response = server.handle(&ctx, &doc, b"");
        assert_eq!(response.status, StatusCode::MULTI_STATUS);
        assert!(response.body.unwrap().contains("HTTP/1.1 401 Unauthorized"));
    }

    #[test]
    fn type_mismatch_is_internal_error() {
        let server = DavServer::new(DavConfig::default()).with_property_source(
            PropertyTable::new().with_property(
                PropertyName::dav("getlastmodified"),
                ValueType::Timestamp,
                |_: &Document, _: &RequestContext<'_>| DavValue::Text("yesterday".into()),
            ),
        );
        let doc = Document::new("1", "report.txt", "Quarterly report");

        let response = send(
            &server,
            &doc,
            DavMethod::PROPFIND,
            &[("Depth", "0")],
            r#"<D:propfind xmlns:D="DAV:"><D:prop><D:getlastmodified/></D:prop></D:propfind>"#,
        );
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
