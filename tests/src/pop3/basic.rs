/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use ::pop3::store::{Credentials, MailStore};

use crate::pop3::{AssertResult, Pop3Connection, Pop3TestServer, ResponseType};

pub async fn test(server: &Pop3TestServer) {
    println!("Running POP3 basic tests...");

    // Capabilities are available before authentication
    let (mut pop3, _) = Pop3Connection::connect_and_greet(server.addr).await;
    pop3.send("CAPA").await;
    pop3.assert_read_multiline()
        .await
        .assert_contains("UIDL")
        .assert_contains("TOP")
        .assert_contains("PIPELINING");
    pop3.send("NOOP").await;
    pop3.assert_read(ResponseType::Ok).await;
    pop3.send("STAT").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Not authenticated.");
    pop3.send("FETCH 1").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Unknown command \"FETCH\".");
    pop3.send("QUIT").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK Stalwart POP3 bids you farewell."]);
    pop3.assert_disconnect().await;

    // Listing and retrieval
    let mut pop3 = Pop3Connection::login(server.addr, "jane@example.org", "secret").await;
    pop3.send("STAT").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK 2 60"]);
    pop3.send("LIST").await;
    pop3.assert_read_multiline()
        .await
        .assert_equals(&["+OK 2 messages", "1 25", "2 35", "."]);
    pop3.send("LIST 2").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK 2 35"]);
    pop3.send("LIST 3").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("No such message.");
    pop3.send("UIDL").await;
    let uids = pop3.assert_read_multiline().await;
    assert_eq!(uids.len(), 4, "{uids:?}");
    assert_ne!(uids[1][2..], uids[2][2..]);
    pop3.send("RETR 2").await;
    pop3.assert_read_multiline().await.assert_equals(&[
        "+OK 35 octets",
        "Subject: second",
        "",
        "..dot line",
        "bye",
        ".",
    ]);
    pop3.send("TOP 1 0").await;
    pop3.assert_read_multiline()
        .await
        .assert_equals(&["+OK 25 octets", "Subject: first", "", "."]);

    // Deletion marks are hidden until reset
    pop3.send("DELE 1").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK Message 1 deleted"]);
    pop3.send("DELE 1").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Message 1 already deleted.");
    pop3.send("RETR 1").await;
    pop3.assert_read(ResponseType::Err)
        .await
        .assert_contains("Message 1 already deleted.");
    pop3.send("LIST").await;
    pop3.assert_read_multiline()
        .await
        .assert_equals(&["+OK 1 messages", "2 35", "."]);
    pop3.send("STAT").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK 1 35"]);
    pop3.send("RSET").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK 1 messages undeleted"]);
    pop3.send("STAT").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK 2 60"]);

    // A second session holds its own snapshot of the maildrop
    let mut other = Pop3Connection::login(server.addr, "jane@example.org", "secret").await;
    other.send("UIDL 2").await;
    let uid_2 = other.assert_read(ResponseType::Ok).await.pop().unwrap();

    // Deletions are applied on QUIT only
    pop3.send("DELE 1").await;
    pop3.assert_read(ResponseType::Ok).await;
    pop3.send("QUIT").await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK Stalwart POP3 bids you farewell (1 messages deleted)."]);
    pop3.assert_disconnect().await;

    other.send("STAT").await;
    other
        .assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK 2 60"]);
    other.send("RETR 1").await;
    other
        .assert_read(ResponseType::Err)
        .await
        .assert_contains("Failed to fetch message.");
    other.send("QUIT").await;
    other
        .assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK Stalwart POP3 bids you farewell (no messages deleted)."]);
    other.assert_disconnect().await;

    // Remaining messages are renumbered and keep their unique id
    let mut pop3 = Pop3Connection::login(server.addr, "jane@example.org", "secret").await;
    pop3.send("LIST").await;
    pop3.assert_read_multiline()
        .await
        .assert_equals(&["+OK 1 messages", "1 35", "."]);
    pop3.send("UIDL 1").await;
    let uid_1 = pop3.assert_read(ResponseType::Ok).await.pop().unwrap();
    assert_eq!(
        uid_1.rsplit_once(' ').map(|(_, uid)| uid),
        uid_2.rsplit_once(' ').map(|(_, uid)| uid)
    );

    // Pipelined commands are answered in order
    pop3.send_raw("NOOP\r\nSTAT\r\nLIST 1\r\n").await;
    pop3.assert_read(ResponseType::Ok).await;
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK 1 35"]);
    pop3.assert_read(ResponseType::Ok)
        .await
        .assert_equals(&["+OK 1 35"]);
    pop3.send("QUIT").await;
    pop3.assert_read(ResponseType::Ok).await;
    pop3.assert_disconnect().await;

    let account_id = server
        .store
        .authenticate(&Credentials::Plain {
            username: "jane@example.org".into(),
            secret: "secret".into(),
        })
        .unwrap();
    assert_eq!(server.store.message_ids(account_id).len(), 1);
}
