/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{sync::Arc, time::Duration};

use common::{config::server::ServerProtocol, manager::boot::BootManager};
use pop3::{Pop3SessionManager, store::MemoryStore};
use tokio::sync::watch;
use trc::collector::Collector;
use utils::wait_for_shutdown;

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load config and apply macros
    let init = BootManager::init().await;
    let mut config = init.config;
    let core = init.core;

    // Build mail store
    let store = Arc::new(MemoryStore::parse(&mut config));

    // Log configuration errors
    config.log_errors();
    config.log_warnings();

    // Spawn servers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    for server in init.servers.servers {
        match server.protocol {
            ServerProtocol::Pop3 => {
                server.spawn(
                    Pop3SessionManager::new(core.clone(), store.clone()),
                    shutdown_rx.clone(),
                );
            }
        }
    }

    // Wait for shutdown signal
    wait_for_shutdown().await;

    // Shutdown collector
    Collector::shutdown();

    // Stop services
    let _ = shutdown_tx.send(true);

    // Wait for services to finish
    tokio::time::sleep(Duration::from_secs(1)).await;

    Ok(())
}
