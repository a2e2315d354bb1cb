/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Duration;

use dav::DavServer;
use hyper::StatusCode;

use crate::webdav::{AssertDavResponse, DavTestClient, dav_config, node_table, test_tree};

const LOCKINFO: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:lockinfo xmlns:D="DAV:">
  <D:lockscope><D:exclusive/></D:lockscope>
  <D:locktype><D:write/></D:locktype>
  <D:owner><D:href>mailto:jane@example.org</D:href></D:owner>
</D:lockinfo>"#;

const SHARED_LOCKINFO: &str = r#"<D:lockinfo xmlns:D="DAV:">
  <D:lockscope><D:shared/></D:lockscope>
  <D:locktype><D:write/></D:locktype>
</D:lockinfo>"#;

const PROPPATCH: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:propertyupdate xmlns:D="DAV:" xmlns:F="urn:example:files">
  <D:set><D:prop><F:title>Shopping list</F:title></D:prop></D:set>
</D:propertyupdate>"#;

pub fn test() {
    println!("Running LOCK/UNLOCK tests...");
    let server = DavServer::new(dav_config(
        r#"
[dav.lock]
default-timeout = "1s"
max-timeout = "5m"
"#,
    ))
    .with_property_source(node_table());
    let tree = test_tree();
    let notes = tree.child("notes.txt");
    let jane = DavTestClient::new(&server, "jane");
    let reader = DavTestClient::new(&server, "reader");

    // Requested timeouts are capped
    let response = jane
        .request_with_headers(
            "LOCK",
            "/files/notes.txt",
            notes,
            &[("Timeout", "Infinite, Second-4100000000")],
            LOCKINFO,
        )
        .assert_status(StatusCode::OK)
        .assert_contains("<D:timeout>Second-300</D:timeout>")
        .assert_contains("<D:lockroot><D:href>/files/notes.txt</D:href></D:lockroot>")
        .assert_contains("mailto:jane@example.org");
    let token = response.lock_token();
    let if_header = format!("(<{token}>)");
    assert_eq!(server.locks().len(), 1);

    // The lock is exclusive
    reader
        .request("LOCK", "/files/notes.txt", notes, LOCKINFO)
        .assert_status(StatusCode::LOCKED)
        .assert_contains("<D:no-conflicting-lock><D:href>/files/notes.txt</D:href>");

    // Locks are held per resource
    jane.request("LOCK", "/files", &tree, LOCKINFO)
        .assert_status(StatusCode::OK);

    // Writes need the token
    jane.request("PROPPATCH", "/files/notes.txt", notes, PROPPATCH)
        .assert_status(StatusCode::LOCKED)
        .assert_contains("<D:lock-token-submitted>");
    assert_eq!(*notes.title.read(), "notes.txt");
    jane.request_with_headers(
        "PROPPATCH",
        "/files/notes.txt",
        notes,
        &[("If", &if_header)],
        PROPPATCH,
    )
    .assert_status(StatusCode::MULTI_STATUS)
    .assert_contains("HTTP/1.1 200 OK");
    assert_eq!(*notes.title.read(), "Shopping list");

    // Active locks are discoverable
    reader
        .request(
            "PROPFIND",
            "/files/notes.txt",
            notes,
            r#"<D:propfind xmlns:D="DAV:"><D:prop><D:lockdiscovery/></D:prop></D:propfind>"#,
        )
        .assert_status(StatusCode::MULTI_STATUS)
        .assert_contains(&token);

    // Refreshing keeps the token
    jane.request_with_headers(
        "LOCK",
        "/files/notes.txt",
        notes,
        &[("If", &if_header), ("Timeout", "Second-60")],
        "",
    )
    .assert_status(StatusCode::OK)
    .assert_contains(&token)
    .assert_contains("<D:timeout>Second-60</D:timeout>");

    // Only the current token releases the lock
    reader
        .request_with_headers(
            "UNLOCK",
            "/files/notes.txt",
            notes,
            &[("Lock-Token", "<urn:uuid:00000000-0000-0000-0000-000000000000>")],
            "",
        )
        .assert_status(StatusCode::FORBIDDEN)
        .assert_contains("<D:lock-token-matches-request-uri/>");
    let lock_token = format!("<{token}>");
    jane.request_with_headers(
        "UNLOCK",
        "/files/notes.txt",
        notes,
        &[("Lock-Token", &lock_token)],
        "",
    )
    .assert_status(StatusCode::NO_CONTENT);
    jane.request_with_headers(
        "LOCK",
        "/files/notes.txt",
        notes,
        &[("If", &if_header)],
        "",
    )
    .assert_status(StatusCode::PRECONDITION_FAILED);

    // Only exclusive locks are granted
    jane.request("LOCK", "/files/photos/", tree.child("photos"), SHARED_LOCKINFO)
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert!(server.locks().current_token(tree.child("photos")).is_none());

    // Anonymous principals cannot lock
    DavTestClient::anonymous(&server)
        .request("LOCK", "/files/notes.txt", notes, LOCKINFO)
        .assert_status(StatusCode::UNAUTHORIZED);

    // Expired locks are dropped when looked up
    reader
        .request("LOCK", "/files/notes.txt", notes, LOCKINFO)
        .assert_status(StatusCode::OK)
        .assert_contains("<D:timeout>Second-1</D:timeout>");
    std::thread::sleep(Duration::from_millis(1100));
    jane.request("LOCK", "/files/notes.txt", notes, LOCKINFO)
        .assert_status(StatusCode::OK);
}
