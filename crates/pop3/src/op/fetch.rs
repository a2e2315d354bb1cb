/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Instant;

use common::listener::SessionStream;
use trc::AddContext;

use crate::{Session, protocol::response::Response};

impl<T: SessionStream> Session<T> {
    pub async fn handle_fetch(&mut self, msg: u32, lines: Option<u32>) -> trc::Result<()> {
        let op_start = Instant::now();
        let mailbox = self.state.mailbox()?;
        let message = mailbox.get(msg).ok_or_else(|| {
            trc::Pop3Event::Error
                .into_err()
                .details("No such message.")
        })?;
        if message.deleted {
            return Err(trc::Pop3Event::Error
                .into_err()
                .details(format!("Message {msg} already deleted.")));
        }

        let bytes = self
            .store
            .fetch(mailbox.account_id, message.id)
            .caused_by(trc::location!())?
            .ok_or_else(|| {
                trc::Pop3Event::Error
                    .into_err()
                    .details("Failed to fetch message. Perhaps another session deleted it?")
                    .ctx(trc::Key::DocumentId, message.id)
                    .caused_by(trc::location!())
            })?;

        trc::event!(
            Pop3(trc::Pop3Event::Fetch),
            SpanId = self.session_id,
            DocumentId = message.id,
            Size = bytes.len(),
            Elapsed = op_start.elapsed()
        );

        self.write_bytes(Response::Message::<u32> { bytes, lines }.serialize())
            .await
    }
}
