/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use ::pop3::store::apop_digest;

use crate::pop3::{AssertResult, Pop3Connection, Pop3TestServer, ResponseType};

pub async fn test(server: &Pop3TestServer) {
    println!("Running POP3 authentication tests...");

    // A failed PASS discards the user name, retrying succeeds
    let (mut pop3, _) = Pop3Connection::connect_and_greet(server.addr).await;
    pop3.send("PASS secret").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Username was not provided.");
    pop3.send("USER john@example.org").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK john@example.org is a valid mailbox"]);
    pop3.send("PASS wrong").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Authentication failed.");
    pop3.send("PASS tanstaaf").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Username was not provided.");
    pop3.send("USER john@example.org").await;
    pop3.assert_read(ResponseType::Ok).await;
    pop3.send("PASS tanstaaf").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_contains("Authentication successful");
    pop3.send("USER jane@example.org").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Already authenticated.");
    pop3.send("STAT").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_contains("+OK 3 ");
    pop3.send("QUIT").await;
    pop3.assert_read(ResponseType::Ok).await;
    pop3.assert_disconnect().await;

    // APOP with the digest of the greeting challenge
    let (mut pop3, challenge) = Pop3Connection::connect_and_greet(server.addr).await;
    pop3.send(&format!(
        "APOP john@example.org {}",
        apop_digest(&challenge, "wrong")
    ))
    .await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Authentication failed.");
    pop3.send(&format!(
        "APOP john@example.org {}",
        apop_digest(&challenge, "tanstaaf")
    ))
    .await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_contains("Authentication successful");
    pop3.send("LIST").await;
    pop3.assert_read_multiline()
        .await
        .assert_equals(&["+OK 3 messages", "1 23", "2 24", "3 25", "."]);
    pop3.send("QUIT").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_contains("(no messages deleted)");
    pop3.assert_disconnect().await;

    // The challenge is bound to the session that issued it
    let (_, stale_challenge) = Pop3Connection::connect_and_greet(server.addr).await;
    let (mut pop3, challenge) = Pop3Connection::connect_and_greet(server.addr).await;
    assert_ne!(challenge, stale_challenge);
    pop3.send(&format!(
        "APOP john@example.org {}",
        apop_digest(&stale_challenge, "tanstaaf")
    ))
    .await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Authentication failed.");

    // Too many failures close the connection
    pop3.send("USER john@example.org").await;
    pop3.assert_read(ResponseType::Ok).await;
    pop3.send("PASS wrong").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Authentication failed.");
    pop3.send("USER john@example.org").await;
    pop3.assert_read(ResponseType::Ok).await;
    pop3.send("PASS wrong").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Too many authentication failures.");
    pop3.assert_disconnect().await;
}
