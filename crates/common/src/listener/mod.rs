/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{
    net::IpAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::watch,
};

use crate::config::server::ServerProtocol;

pub mod listen;
pub mod stream;

pub struct ServerInstance {
    pub id: String,
    pub protocol: ServerProtocol,
    pub shutdown_rx: watch::Receiver<bool>,
}

pub struct SessionData<T: SessionStream> {
    pub stream: T,
    pub local_ip: IpAddr,
    pub local_port: u16,
    pub remote_ip: IpAddr,
    pub remote_port: u16,
    pub protocol: ServerProtocol,
    pub session_id: u64,
    pub instance: Arc<ServerInstance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionResult {
    Continue,
    Close,
}

pub trait SessionStream:AsyncRead + AsyncWrite + Unpin + 'static + Sync + Send {
    fn is_tls(&self) -> bool;
}

pub trait SessionManager: Sync + Send + 'static + Clone {
    fn spawn<T: SessionStream>(&self, session: SessionData<T>) {
        let manager = self.clone();

        tokio::spawn(async move {
            let start_time = std::time::Instant::now();
            let session_id = session.session_id;

            trc::event!(
                Network(trc::NetworkEvent::ConnectionStart),
                SpanId = session_id,
                ListenerId = session.instance.id.clone(),
                RemoteIp = session.remote_ip,
                RemotePort = session.remote_port,
                Tls = session.stream.is_tls(),
            );

            manager.handle(session).await;

            trc::event!(
                Network(trc::NetworkEvent::ConnectionEnd),
                SpanId = session_id,
                Elapsed = start_time.elapsed(),
            );
        });
    }

    fn handle<T: SessionStream>(
        self,
        session: SessionData<T>,
    ) -> impl std::future::Future<Output = ()> + Send;

    fn shutdown(&self) -> impl std::future::Future<Output = ()> + Send;
}

impl ServerInstance {
    pub fn new(id: impl Into<String>, protocol: ServerProtocol) -> (Arc<Self>, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        (
            Arc::new(ServerInstance {
                id: id.into(),
                protocol,
                shutdown_rx,
            }),
            shutdown_tx,
        )
    }
}

pub fn next_session_id() -> u64 {
    static SESSION_ID: AtomicU64 = AtomicU64::new(1);
    SESSION_ID.fetch_add(1, Ordering::Relaxed)
}
