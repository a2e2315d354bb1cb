/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{any::Any, sync::Arc};

use common::config::dav::DavConfig;
use dav::{
    DavMethod, DavResource, DavResponse, DavServer, RequestContext,
    source::{PropertyError, table::PropertyTable},
};
use dav_proto::{
    RequestHeaders,
    schema::{
        PropertyName,
        property::{DavValue, Privilege, ValueType},
    },
};
use hyper::{Method, StatusCode};
use parking_lot::RwLock;
use utils::config::Config;

pub mod lock;
pub mod prop;

pub const NS_FILES: &str = "urn:example:files";

#[test]
fn webdav_tests() {
    prop::test();
    lock::test();
}

/// A file or folder owned by a single principal.
pub struct Node {
    pub id: String,
    pub name: String,
    pub owner: &'static str,
    pub title: RwLock<String>,
    pub children: Vec<Arc<dyn DavResource>>,
}

impl Node {
    pub fn file(id: &str, name: &str, owner: &'static str) -> Self {
        Node {
            id: id.to_string(),
            name: name.to_string(),
            owner,
            title: RwLock::new(name.to_string()),
            children: vec![],
        }
    }

    pub fn folder(id: &str, name: &str, owner: &'static str, children: Vec<Node>) -> Self {
        Node {
            children: children
                .into_iter()
                .map(|child| Arc::new(child) as Arc<dyn DavResource>)
                .collect(),
            ..Node::file(id, name, owner)
        }
    }

    pub fn child(&self, name: &str) -> &Node {
        self.children
            .iter()
            .find(|child| child.name() == name)
            .and_then(|child| child.as_any().downcast_ref::<Node>())
            .unwrap_or_else(|| panic!("No child named {name:?}"))
    }
}

impl DavResource for Node {
    fn unique_id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_collection(&self) -> bool {
        !self.children.is_empty()
    }

    fn children(&self) -> Vec<Arc<dyn DavResource>> {
        self.children.clone()
    }

    fn authorise(&self, principal: Option<&str>, _: DavMethod) -> bool {
        principal.is_some()
    }

    fn privileges(&self, principal: Option<&str>) -> Vec<Privilege> {
        match principal {
            Some(principal) if principal == self.owner => vec![Privilege::All],
            Some("reader") => vec![Privilege::Read],
            _ => vec![],
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn node_table() -> PropertyTable<Node> {
    PropertyTable::new()
        .with_property(
            PropertyName::new(NS_FILES, "title"),
            ValueType::Text,
            |node: &Node, _: &RequestContext<'_>| DavValue::Text(node.title.read().clone()),
        )
        .with_setter(|node: &Node, value| match value {
            DavValue::Text(title) if !title.is_empty() => {
                *node.title.write() = title;
                Ok(())
            }
            _ => Err(PropertyError::invalid(
                StatusCode::CONFLICT,
                "Titles cannot be empty",
            )),
        })
        .with_privileges(Privilege::Read, Privilege::WriteProperties)
        .with_property(
            PropertyName::new(NS_FILES, "owner"),
            ValueType::Text,
            |node: &Node, _: &RequestContext<'_>| DavValue::Text(node.owner.to_string()),
        )
        .with_privileges(Privilege::ReadAcl, Privilege::WriteAcl)
}

/// Files owned by "jane" and shared read-only with "reader".
pub fn test_tree() -> Node {
    Node::folder(
        "1",
        "files",
        "jane",
        vec![
            Node::file("2", "notes.txt", "jane"),
            Node::folder(
                "3",
                "photos",
                "jane",
                vec![Node::file("4", "beach 2024.jpg", "jane")],
            ),
        ],
    )
}

pub fn dav_config(toml: &str) -> DavConfig {
    let mut config = Config::new(toml).unwrap();
    let dav = DavConfig::parse(&mut config);
    assert!(config.errors.is_empty(), "{:?}", config.errors);
    dav
}

pub struct DavTestClient<'x> {
    pub server: &'x DavServer,
    pub principal: Option<&'static str>,
}

impl<'x> DavTestClient<'x> {
    pub fn new(server: &'x DavServer, principal: &'static str) -> Self {
        DavTestClient {
            server,
            principal: Some(principal),
        }
    }

    pub fn anonymous(server: &'x DavServer) -> Self {
        DavTestClient {
            server,
            principal: None,
        }
    }

    pub fn request(
        &self,
        method: &str,
        href: &str,
        resource: &dyn DavResource,
        body: &str,
    ) -> DavResponse {
        self.request_with_headers(method, href, resource, &[], body)
    }

    pub fn request_with_headers(
        &self,
        method: &str,
        href: &str,
        resource: &dyn DavResource,
        headers: &[(&str, &str)],
        body: &str,
    ) -> DavResponse {
        let method = DavMethod::parse(&Method::from_bytes(method.as_bytes()).unwrap())
            .unwrap_or_else(|| panic!("Unsupported method {method}"));
        let mut request_headers = RequestHeaders::new(href);
        for (key, value) in headers {
            assert!(request_headers.parse(key, value), "{key}: {value}");
        }
        let config = self.server.config();
        let mut ctx = RequestContext::new(config, method, request_headers);
        if let Some(principal) = self.principal {
            ctx = ctx.with_principal(principal);
        }

        self.server.handle(&ctx, resource, body.as_bytes())
    }
}

pub trait AssertDavResponse: Sized {
    fn assert_status(self, status: StatusCode) -> Self;
    fn assert_contains(self, text: &str) -> Self;
    fn assert_not_contains(self, text: &str) -> Self;
    fn assert_count(self, text: &str, occurrences: usize) -> Self;
    fn lock_token(&self) -> String;
}

impl AssertDavResponse for DavResponse {
    fn assert_status(self, status: StatusCode) -> Self {
        assert_eq!(self.status, status, "{:?}", self.body);
        self
    }

    fn assert_contains(self, text: &str) -> Self {
        let body = self.body.as_deref().unwrap_or_default();
        assert!(body.contains(text), "Expected {text:?} in {body}");
        self
    }

    fn assert_not_contains(self, text: &str) -> Self {
        let body = self.body.as_deref().unwrap_or_default();
        assert!(!body.contains(text), "Unexpected {text:?} in {body}");
        self
    }

    fn assert_count(self, text: &str, occurrences: usize) -> Self {
        let body = self.body.as_deref().unwrap_or_default();
        assert_eq!(
            body.matches(text).count(),
            occurrences,
            "Expected {occurrences} occurrences of {text:?} in {body}"
        );
        self
    }

    fn lock_token(&self) -> String {
        self.header("Lock-Token")
            .expect("Missing Lock-Token header")
            .trim_start_matches('<')
            .trim_end_matches('>')
            .to_string()
    }
}
