/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use tokio::{io::DuplexStream, net::TcpStream};

use super::SessionStream;

impl SessionStream for TcpStream {
    fn is_tls(&self) -> bool {
        false
    }
}

// In-memory transport used to drive sessions without a socket.
impl SessionStream for DuplexStream {
    fn is_tls(&self) -> bool {
        false
    }
}
