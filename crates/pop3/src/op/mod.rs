/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use common::listener::SessionStream;

use crate::{Session, protocol::response::Response};

pub mod authenticate;
pub mod delete;
pub mod fetch;
pub mod list;

impl<T: SessionStream> Session<T> {
    pub async fn handle_capa(&mut self) -> trc::Result<()> {
        trc::event!(
            Pop3(trc::Pop3Event::Capabilities),
            SpanId = self.session_id,
            Tls = self.stream.is_tls(),
            Elapsed = trc::Value::Duration(0)
        );

        self.write_bytes(Response::Capability::<u32>.serialize())
            .await
    }

    pub async fn handle_noop(&mut self) -> trc::Result<()> {
        trc::event!(
            Pop3(trc::Pop3Event::Noop),
            SpanId = self.session_id,
            Elapsed = trc::Value::Duration(0)
        );

        self.write_ok("NOOP").await
    }
}
