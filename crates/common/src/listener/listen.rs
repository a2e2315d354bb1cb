/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use tokio::{
    net::{TcpListener, TcpSocket},
    sync::watch,
};

use crate::config::server::{Listener, Server};

use super::{ServerInstance, SessionData, SessionManager, SessionStream, next_session_id};

impl Server {
    /// Binds every listener of this server and spawns its accept loop.
    /// Returns the addresses that were bound successfully.
    pub fn spawn(
        self,
        manager: impl SessionManager,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Vec<SocketAddr> {
        let instance = Arc::new(ServerInstance {
            id: self.id,
            protocol: self.protocol,
            shutdown_rx,
        });
        let mut bound = Vec::with_capacity(self.listeners.len());

        for listener_config in self.listeners {
            let nodelay = listener_config.nodelay;
            let (listener, local_addr) = match listener_config.listen() {
                Ok(listener) => listener,
                Err(err) => {
                    trc::event!(
                        Network(trc::NetworkEvent::BindError),
                        ListenerId = instance.id.clone(),
                        LocalIp = listener_config.addr.ip(),
                        LocalPort = listener_config.addr.port(),
                        Reason = err.to_string(),
                    );
                    continue;
                }
            };

            trc::event!(
                Network(trc::NetworkEvent::ListenStart),
                ListenerId = instance.id.clone(),
                LocalIp = local_addr.ip(),
                LocalPort = local_addr.port(),
            );
            bound.push(local_addr);

            let mut shutdown_rx = instance.shutdown_rx.clone();
            let manager = manager.clone();
            let instance = instance.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        stream = listener.accept() => {
                            match stream {
                                Ok((stream, remote_addr)) => {
                                    if nodelay {
                                        let _ = stream.set_nodelay(true);
                                    }
                                    let session = instance.build_session(stream, local_addr, remote_addr);
                                    manager.spawn(session);
                                }
                                Err(err) => {
                                    trc::event!(
                                        Network(trc::NetworkEvent::AcceptError),
                                        ListenerId = instance.id.clone(),
                                        LocalPort = local_addr.port(),
                                        Reason = err.to_string(),
                                    );
                                }
                            }
                        },
                        _ = shutdown_rx.changed() => {
                            trc::event!(
                                Network(trc::NetworkEvent::ListenStop),
                                ListenerId = instance.id.clone(),
                                LocalPort = local_addr.port(),
                            );
                            manager.shutdown().await;
                            break;
                        }
                    };
                }
            });
        }

        bound
    }
}

impl Listener {
    pub fn listen(&self) -> std::io::Result<(TcpListener, SocketAddr)> {
        let socket = if self.addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(self.addr)?;
        let listener = socket.listen(self.backlog)?;
        let local_addr = listener.local_addr()?;

        Ok((listener, local_addr))
    }
}

trait BuildSession {
    fn build_session<T: SessionStream>(
        &self,
        stream: T,
        local_addr: SocketAddr,
        remote_addr: SocketAddr,
    ) -> SessionData<T>;
}

impl BuildSession for Arc<ServerInstance> {
    fn build_session<T: SessionStream>(
        &self,
        stream: T,
        local_addr: SocketAddr,
        remote_addr: SocketAddr,
    ) -> SessionData<T> {
        // Convert mapped IPv6 addresses to IPv4
        let remote_ip = match remote_addr.ip() {
            IpAddr::V6(ip) => ip
                .to_ipv4_mapped()
                .map(IpAddr::V4)
                .unwrap_or(IpAddr::V6(ip)),
            remote_ip => remote_ip,
        };

        SessionData {
            stream,
            local_ip: local_addr.ip(),
            local_port: local_addr.port(),
            remote_ip,
            remote_port: remote_addr.port(),
            protocol: self.protocol,
            session_id: next_session_id(),
            instance: self.clone(),
        }
    }
}
