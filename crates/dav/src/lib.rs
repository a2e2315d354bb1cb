/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod auth;
pub mod lock;
pub mod propfind;
pub mod proppatch;
pub mod request;
pub mod source;
pub mod value;

use std::any::Any;
use std::sync::Arc;

use common::config::dav::DavConfig;
use dav_proto::{RequestHeaders, schema::property::Privilege};
use hyper::{Method, StatusCode};

pub use request::DavServer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DavMethod {
    GET,
    PUT,
    POST,
    DELETE,
    HEAD,
    PROPFIND,
    PROPPATCH,
    REPORT,
    MKCOL,
    COPY,
    MOVE,
    LOCK,
    UNLOCK,
    OPTIONS,
    ACL,
}

/// A node of the resource tree the engine operates on. Storage is owned
/// by the implementor.
pub trait DavResource: Send + Sync + 'static {
    /// Stable identity used as the lock key.
    fn unique_id(&self) -> &str;

    fn name(&self) -> &str;

    fn is_collection(&self) -> bool {
        false
    }

    fn children(&self) -> Vec<Arc<dyn DavResource>> {
        vec![]
    }

    fn authorise(&self, principal: Option<&str>, method: DavMethod) -> bool;

    fn privileges(&self, principal: Option<&str>) -> Vec<Privilege>;

    fn as_any(&self) -> &dyn Any;
}

/// Request-scoped state threaded through the property pipeline and lock
/// handling.
#[derive(Debug, Clone)]
pub struct RequestContext<'x> {
    pub principal: Option<&'x str>,
    pub method: DavMethod,
    pub headers: RequestHeaders<'x>,
    pub config: &'x DavConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResponse {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl<'x> RequestContext<'x> {
    pub fn new(config: &'x DavConfig, method: DavMethod, headers: RequestHeaders<'x>) -> Self {
        RequestContext {
            principal: None,
            method,
            headers,
            config,
        }
    }

    pub fn with_principal(mut self, principal: &'x str) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn href(&self) -> &str {
        self.headers.uri
    }
}

impl DavResponse {
    pub fn new(status: StatusCode) -> Self {
        DavResponse {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_xml_body(mut self, body: String) -> Self {
        self.headers
            .push(("Content-Type", "application/xml; charset=utf-8".to_string()));
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl DavMethod {
    pub fn parse(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(DavMethod::GET),
            Method::PUT => Some(DavMethod::PUT),
            Method::DELETE => Some(DavMethod::DELETE),
            Method::OPTIONS => Some(DavMethod::OPTIONS),
            Method::POST => Some(DavMethod::POST),
            Method::HEAD => Some(DavMethod::HEAD),
            _ => {
                hashify::tiny_map!(method.as_str().as_bytes(),
                    "PROPFIND" => DavMethod::PROPFIND,
                    "PROPPATCH" => DavMethod::PROPPATCH,
                    "REPORT" => DavMethod::REPORT,
                    "MKCOL" => DavMethod::MKCOL,
                    "COPY" => DavMethod::COPY,
                    "MOVE" => DavMethod::MOVE,
                    "LOCK" => DavMethod::LOCK,
                    "UNLOCK" => DavMethod::UNLOCK,
                    "ACL" => DavMethod::ACL
                )
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DavMethod::GET => "GET",
            DavMethod::PUT => "PUT",
            DavMethod::POST => "POST",
            DavMethod::DELETE => "DELETE",
            DavMethod::HEAD => "HEAD",
            DavMethod::PROPFIND => "PROPFIND",
            DavMethod::PROPPATCH => "PROPPATCH",
            DavMethod::REPORT => "REPORT",
            DavMethod::MKCOL => "MKCOL",
            DavMethod::COPY => "COPY",
            DavMethod::MOVE => "MOVE",
            DavMethod::LOCK => "LOCK",
            DavMethod::UNLOCK => "UNLOCK",
            DavMethod::OPTIONS => "OPTIONS",
            DavMethod::ACL => "ACL",
        }
    }

    #[inline]
    pub fn has_body(self) -> bool {
        matches!(
            self,
            DavMethod::PUT
                | DavMethod::POST
                | DavMethod::PROPPATCH
                | DavMethod::PROPFIND
                | DavMethod::REPORT
                | DavMethod::LOCK
                | DavMethod::ACL
        )
    }
}

impl From<DavMethod> for trc::WebDavEvent {
    fn from(value: DavMethod) -> Self {
        match value {
            DavMethod::PROPFIND => trc::WebDavEvent::Propfind,
            DavMethod::PROPPATCH => trc::WebDavEvent::Proppatch,
            DavMethod::LOCK => trc::WebDavEvent::Lock,
            DavMethod::UNLOCK => trc::WebDavEvent::Unlock,
            DavMethod::OPTIONS => trc::WebDavEvent::Options,
            _ => trc::WebDavEvent::Error,
        }
    }
}

impl std::fmt::Display for DavMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
