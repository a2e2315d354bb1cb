/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{net::SocketAddr, sync::Arc, time::Duration};

use ::pop3::{Pop3SessionManager, store::MemoryStore};
use common::{config::server::ServerProtocol, manager::boot::BootManager};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, ReadHalf, WriteHalf},
    net::TcpStream,
    sync::watch,
};
use utils::config::Config;

pub mod auth;
pub mod basic;

const SERVER: &str = r#"
[server.listener."pop3"]
bind = "127.0.0.1:0"
protocol = "pop3"

[pop3]
hostname = "pop3.example.org"
auth.max-failures = 3
timeout.unauthenticated = "5s"

[store.account."jane@example.org"]
secret = "secret"
messages = ["Subject: first\r\n\r\nHello\r\n", "Subject: second\r\n\r\n.dot line\r\nbye\r\n"]

[store.account."john@example.org"]
secret = "tanstaaf"
messages = ["Subject: one\r\n\r\nfirst\r\n", "Subject: two\r\n\r\nsecond\r\n", "Subject: three\r\n\r\nthird\r\n"]

[tracer.stdout]
level = "disable"
"#;

pub struct Pop3TestServer {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    _shutdown_tx: watch::Sender<bool>,
}

#[tokio::test(flavor = "multi_thread")]
pub async fn pop3_tests() {
    let server = init_pop3_tests().await;

    basic::test(&server).await;
    auth::test(&server).await;
}

async fn init_pop3_tests() -> Pop3TestServer {
    let boot = BootManager::load(Config::new(SERVER).unwrap()).await;
    let mut config = boot.config;
    let store = Arc::new(MemoryStore::parse(&mut config));
    assert!(config.errors.is_empty(), "{:?}", config.errors);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut addr = None;
    for server in boot.servers.servers {
        if server.protocol == ServerProtocol::Pop3 {
            addr = server
                .spawn(
                    Pop3SessionManager::new(boot.core.clone(), store.clone()),
                    shutdown_rx.clone(),
                )
                .into_iter()
                .next();
        }
    }

    Pop3TestServer {
        addr: addr.expect("POP3 listener was not bound"),
        store,
        _shutdown_tx: shutdown_tx,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Ok,
    Err,
}

pub struct Pop3Connection {
    reader: Lines<BufReader<ReadHalf<TcpStream>>>,
    writer: WriteHalf<TcpStream>,
}

impl Pop3Connection {
    pub async fn connect(addr: SocketAddr) -> Self {
        let (reader, writer) = tokio::io::split(TcpStream::connect(addr).await.unwrap());
        Pop3Connection {
            reader: BufReader::new(reader).lines(),
            writer,
        }
    }

    /// Connects and consumes the greeting, returning the APOP challenge.
    pub async fn connect_and_greet(addr: SocketAddr) -> (Self, String) {
        let mut conn = Self::connect(addr).await;
        let greeting = conn.assert_read(ResponseType::Ok).await.pop().unwrap();
        let challenge = greeting
            .split_once('<')
            .map(|(_, challenge)| format!("<{challenge}"))
            .unwrap_or_else(|| panic!("No challenge in greeting {greeting:?}"));
        assert!(challenge.ends_with("@pop3.example.org>"), "{challenge}");
        (conn, challenge)
    }

    pub async fn login(addr: SocketAddr, user: &str, secret: &str) -> Self {
        let (mut conn, _) = Self::connect_and_greet(addr).await;
        conn.send(&format!("USER {user}")).await;
        conn.assert_read(ResponseType::Ok).await;
        conn.send(&format!("PASS {secret}")).await;
        conn.assert_read(ResponseType::Ok)
            .await
            .assert_contains("Authentication successful");
        conn
    }

    pub async fn assert_read(&mut self, rt: ResponseType) -> Vec<String> {
        let lines = self.read(false).await;
        self.assert_type(lines, rt)
    }

    pub async fn assert_read_multiline(&mut self) -> Vec<String> {
        let lines = self.read(true).await;
        self.assert_type(lines, ResponseType::Ok)
    }

    fn assert_type(&self, lines: Vec<String>, rt: ResponseType) -> Vec<String> {
        let prefix = match rt {
            ResponseType::Ok => "+OK",
            ResponseType::Err => "-ERR",
        };
        if lines[0].starts_with(prefix) {
            lines
        } else {
            panic!("Expected {:?} from server but got: {:?}", rt, lines);
        }
    }

    pub async fn assert_disconnect(&mut self) {
        match tokio::time::timeout(Duration::from_millis(1500), self.reader.next_line()).await {
            Ok(Ok(None)) => {}
            Ok(Ok(Some(line))) => {
                panic!("Expected connection to be closed, but got {:?}", line);
            }
            Ok(Err(err)) => {
                panic!("Connection broken: {:?}", err);
            }
            Err(_) => panic!("Timeout while waiting for server response."),
        }
    }

    pub async fn read(&mut self, is_multiline: bool) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            match tokio::time::timeout(Duration::from_millis(1500), self.reader.next_line()).await {
                Ok(Ok(Some(line))) => {
                    let is_done = (lines.is_empty() && (!is_multiline || line.starts_with("-ERR")))
                        || line == ".";
                    lines.push(line);
                    if is_done {
                        return lines;
                    }
                }
                Ok(Ok(None)) => {
                    panic!("Invalid response: {:?}.", lines);
                }
                Ok(Err(err)) => {
                    panic!("Connection broken: {} ({:?})", err, lines);
                }
                Err(_) => panic!("Timeout while waiting for server response: {:?}", lines),
            }
        }
    }

    pub async fn send(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).await.unwrap();
        self.writer.write_all(b"\r\n").await.unwrap();
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).await.unwrap();
    }
}

pub trait AssertResult: Sized {
    fn assert_contains(self, text: &str) -> Self;
    fn assert_not_contains(self, text: &str) -> Self;
    fn assert_equals(self, expected: &[&str]) -> Self;
}

impl AssertResult for Vec<String> {
    fn assert_contains(self, text: &str) -> Self {
        if self.iter().any(|line| line.contains(text)) {
            self
        } else {
            panic!("Expected response to contain {:?}, got {:?}", text, self);
        }
    }

    fn assert_not_contains(self, text: &str) -> Self {
        if !self.iter().any(|line| line.contains(text)) {
            self
        } else {
            panic!("Expected response not to contain {:?}, got {:?}", text, self);
        }
    }

    fn assert_equals(self, expected: &[&str]) -> Self {
        assert_eq!(self, expected);
        self
    }
}
