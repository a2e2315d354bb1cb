/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use common::config::dav::DavConfig;
use dav::{
    DavMethod, DavResource, DavServer, RequestContext,
    source::{PropertyError, PropertyMetaData, PropertySource},
    value::{ValueWriter, ValueWriters},
};
use dav_proto::{
    RequestHeaders,
    responses::XmlWriter,
    schema::{
        PropertyName,
        property::{DavValue, ValueType},
    },
};
use hyper::StatusCode;

use crate::webdav::{AssertDavResponse, DavTestClient, NS_FILES, node_table, test_tree};

const PROPFIND_TITLE_OWNER: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:propfind xmlns:D="DAV:" xmlns:F="urn:example:files">
  <D:prop><F:title/><F:owner/></D:prop>
</D:propfind>"#;

const PROPFIND_TITLE: &str = r#"<D:propfind xmlns:D="DAV:" xmlns:F="urn:example:files">
  <D:prop><F:title/></D:prop>
</D:propfind>"#;

const PROPPATCH_TITLE_OWNER: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:propertyupdate xmlns:D="DAV:" xmlns:F="urn:example:files">
  <D:set><D:prop><F:title>Holiday pictures</F:title><F:owner>john</F:owner></D:prop></D:set>
</D:propertyupdate>"#;

const PROPPATCH_TITLE: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:propertyupdate xmlns:D="DAV:" xmlns:F="urn:example:files" xmlns:X="urn:client">
  <D:set><D:prop><F:title>Holiday pictures</F:title><X:color>blue</X:color></D:prop></D:set>
</D:propertyupdate>"#;

pub fn test() {
    println!("Running PROPFIND/PROPPATCH tests...");
    let server = DavServer::new(DavConfig::default()).with_property_source(node_table());
    let tree = test_tree();
    let photos = tree.child("photos");

    // Owners see every property of every member
    DavTestClient::new(&server, "jane")
        .request_with_headers(
            "PROPFIND",
            "/files",
            &tree,
            &[("Depth", "1")],
            PROPFIND_TITLE_OWNER,
        )
        .assert_status(StatusCode::MULTI_STATUS)
        .assert_count("<D:response>", 3)
        .assert_contains("<D:href>/files</D:href>")
        .assert_contains("<D:href>/files/notes.txt</D:href>")
        .assert_contains("<D:href>/files/photos/</D:href>")
        .assert_count("<ns1:owner>jane</ns1:owner>", 3)
        .assert_contains("<ns1:title>notes.txt</ns1:title>")
        .assert_not_contains("beach");

    // Readers are denied the owner without failing the request
    DavTestClient::new(&server, "reader")
        .request_with_headers(
            "PROPFIND",
            "/files/photos/",
            photos,
            &[("Depth", "0")],
            PROPFIND_TITLE_OWNER,
        )
        .assert_status(StatusCode::MULTI_STATUS)
        .assert_count("<D:response>", 1)
        .assert_contains("<ns1:title>photos</ns1:title>")
        .assert_contains("<ns1:owner/>")
        .assert_contains("HTTP/1.1 401 Unauthorized")
        .assert_contains("Missing privilege read-acl")
        .assert_not_contains("jane");

    // Anonymous requests are refused by the resource
    DavTestClient::anonymous(&server)
        .request("PROPFIND", "/files/photos/", photos, PROPFIND_TITLE)
        .assert_status(StatusCode::MULTI_STATUS)
        .assert_contains("HTTP/1.1 401 Unauthorized")
        .assert_contains("Not authorised for PROPFIND")
        .assert_not_contains("<ns1:title>photos</ns1:title>");

    // Updates are applied all or nothing
    DavTestClient::new(&server, "jane")
        .request("PROPPATCH", "/files/photos/", photos, PROPPATCH_TITLE_OWNER)
        .assert_status(StatusCode::MULTI_STATUS)
        .assert_contains("HTTP/1.1 403 Forbidden")
        .assert_contains("HTTP/1.1 424 Failed Dependency");
    assert_eq!(*photos.title.read(), "photos");

    DavTestClient::new(&server, "reader")
        .request("PROPPATCH", "/files/photos/", photos, PROPPATCH_TITLE)
        .assert_status(StatusCode::MULTI_STATUS)
        .assert_contains("HTTP/1.1 401 Unauthorized")
        .assert_contains("Missing privilege write-properties")
        .assert_not_contains("HTTP/1.1 200 OK");
    assert_eq!(*photos.title.read(), "photos");

    DavTestClient::new(&server, "jane")
        .request("PROPPATCH", "/files/photos/", photos, PROPPATCH_TITLE)
        .assert_status(StatusCode::MULTI_STATUS)
        .assert_contains("HTTP/1.1 200 OK")
        .assert_contains("<ns1:title/>")
        .assert_contains("<ns2:color/>");
    assert_eq!(*photos.title.read(), "Holiday pictures");

    // Live and dead properties are both returned afterwards
    DavTestClient::new(&server, "reader")
        .request(
            "PROPFIND",
            "/files/photos/",
            photos,
            r#"<D:propfind xmlns:D="DAV:"><D:prop>
                <F:title xmlns:F="urn:example:files"/>
                <X:color xmlns:X="urn:client"/>
                <D:displayname/>
            </D:prop></D:propfind>"#,
        )
        .assert_status(StatusCode::MULTI_STATUS)
        .assert_contains("<ns1:title>Holiday pictures</ns1:title>")
        .assert_contains("<ns2:color>blue</ns2:color>")
        .assert_contains("<D:displayname>photos</D:displayname>");

    test_writers();
    test_source_order();
}

/// Renders the title in upper case.
struct ShoutingWriter;

impl ValueWriter for ShoutingWriter {
    fn supports(&self, name: &PropertyName, _: ValueType) -> bool {
        name.ns == NS_FILES && name.name == "title"
    }

    fn write(
        &self,
        xml: &mut XmlWriter,
        name: &PropertyName,
        value: &DavValue,
    ) -> trc::Result<()> {
        xml.element_text(name, value.as_str().unwrap_or_default().to_uppercase());
        Ok(())
    }

    fn parse(&self, _: &PropertyName, _: ValueType, value: &str) -> trc::Result<DavValue> {
        Ok(DavValue::Text(value.to_string()))
    }
}

fn test_writers() {
    let tree = test_tree();

    // The first writer supporting a property is used
    let server = DavServer::new(DavConfig::default())
        .with_property_source(node_table())
        .with_writers(ValueWriters::default().with_writer_first(ShoutingWriter));
    DavTestClient::new(&server, "jane")
        .request("PROPFIND", "/files", &tree, PROPFIND_TITLE)
        .assert_contains("<ns1:title>FILES</ns1:title>");

    // Appended writers are shadowed by the generic fallback
    let server = DavServer::new(DavConfig::default())
        .with_property_source(node_table())
        .with_writers(ValueWriters::default().with_writer(ShoutingWriter));
    DavTestClient::new(&server, "jane")
        .request("PROPFIND", "/files", &tree, PROPFIND_TITLE)
        .assert_contains("<ns1:title>files</ns1:title>");
}

/// Claims the title of every resource.
struct ShadowSource;

impl PropertySource for ShadowSource {
    fn metadata(
        &self,
        _: &RequestContext<'_>,
        name: &PropertyName,
        _: &dyn DavResource,
    ) -> PropertyMetaData {
        if name.ns == NS_FILES && name.name == "title" {
            PropertyMetaData::read_only(ValueType::Text)
        } else {
            PropertyMetaData::UNKNOWN
        }
    }

    fn get(
        &self,
        _: &RequestContext<'_>,
        _: &PropertyName,
        _: &dyn DavResource,
    ) -> Result<DavValue, PropertyError> {
        Ok(DavValue::Text("shadow".into()))
    }

    fn set(
        &self,
        _: &RequestContext<'_>,
        _: &PropertyName,
        _: DavValue,
        _: &dyn DavResource,
    ) -> Result<(), PropertyError> {
        Err(PropertyError::NotAuthorized)
    }

    fn all_property_names(&self, _: &RequestContext<'_>, _: &dyn DavResource) -> Vec<PropertyName> {
        vec![PropertyName::new(NS_FILES, "title")]
    }
}

fn test_source_order() {
    let tree = test_tree();
    let server = DavServer::new(DavConfig::default())
        .with_property_source(node_table())
        .with_property_source(ShadowSource);

    DavTestClient::new(&server, "jane")
        .request("PROPFIND", "/files", &tree, PROPFIND_TITLE)
        .assert_contains("<ns1:title>files</ns1:title>")
        .assert_not_contains("shadow");

    let config = server.config().clone();
    let ctx = RequestContext::new(&config, DavMethod::PROPFIND, RequestHeaders::new("/files"))
        .with_principal("jane");
    assert!(server.sources().verify_ownership(&ctx, &tree).is_err());

    let server = DavServer::new(DavConfig::default()).with_property_source(node_table());
    assert!(server.sources().verify_ownership(&ctx, &tree).is_ok());
}
