/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Instant;

use common::listener::SessionStream;

use crate::{Session, mailbox::Message, protocol::response::Response};

impl<T: SessionStream> Session<T> {
    pub async fn handle_list(&mut self, msg: Option<u32>) -> trc::Result<()> {
        let op_start = Instant::now();
        let mailbox = self.state.mailbox()?;

        let response = if let Some(msg) = msg {
            let message = visible_message(mailbox.get(msg), msg)?;
            trc::event!(
                Pop3(trc::Pop3Event::List),
                SpanId = self.session_id,
                DocumentId = message.id,
                Size = message.size,
                Elapsed = op_start.elapsed()
            );
            Response::Ok(format!("{msg} {}", message.size).into())
        } else {
            let items = visible_messages(&mailbox.messages)
                .map(|(msg, message)| (msg, message.size))
                .collect::<Vec<_>>();
            trc::event!(
                Pop3(trc::Pop3Event::List),
                SpanId = self.session_id,
                Total = items.len(),
                Elapsed = op_start.elapsed()
            );
            Response::List(items)
        };

        self.write_bytes(response.serialize()).await
    }

    pub async fn handle_uidl(&mut self, msg: Option<u32>) -> trc::Result<()> {
        let op_start = Instant::now();
        let mailbox = self.state.mailbox()?;

        let response = if let Some(msg) = msg {
            let message = visible_message(mailbox.get(msg), msg)?;
            trc::event!(
                Pop3(trc::Pop3Event::Uidl),
                SpanId = self.session_id,
                DocumentId = message.id,
                Elapsed = op_start.elapsed()
            );
            Response::Ok(format!("{msg} {}", mailbox.unique_id(message)).into())
        } else {
            let items = visible_messages(&mailbox.messages)
                .map(|(msg, message)| (msg, mailbox.unique_id(message)))
                .collect::<Vec<_>>();
            trc::event!(
                Pop3(trc::Pop3Event::Uidl),
                SpanId = self.session_id,
                Total = items.len(),
                Elapsed = op_start.elapsed()
            );
            Response::List(items)
        };

        self.write_bytes(response.serialize()).await
    }

    pub async fn handle_stat(&mut self) -> trc::Result<()> {
        let op_start = Instant::now();
        let (total, size) = self.state.mailbox()?.stat();

        trc::event!(
            Pop3(trc::Pop3Event::Stat),
            SpanId = self.session_id,
            Total = total,
            Size = size,
            Elapsed = op_start.elapsed()
        );

        self.write_ok(format!("{total} {size}")).await
    }
}

fn visible_message(message: Option<&Message>, msg: u32) -> trc::Result<&Message> {
    match message {
        Some(message) if !message.deleted => Ok(message),
        Some(_) => Err(trc::Pop3Event::Error
            .into_err()
            .details(format!("Message {msg} already deleted."))),
        None => Err(trc::Pop3Event::Error
            .into_err()
            .details("No such message.")),
    }
}

fn visible_messages(messages: &[Message]) -> impl Iterator<Item = (u32, &Message)> {
    messages
        .iter()
        .enumerate()
        .filter(|(_, message)| !message.deleted)
        .map(|(idx, message)| (idx as u32 + 1, message))
}
