/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Instant;

use common::listener::SessionStream;
use trc::AddContext;

use crate::{Session, State, protocol::response::Response};

impl<T: SessionStream> Session<T> {
    pub async fn handle_dele(&mut self, msg: u32) -> trc::Result<()> {
        let op_start = Instant::now();
        let message = self.state.mailbox_mut()?.get_mut(msg).ok_or_else(|| {
            trc::Pop3Event::Error
                .into_err()
                .details("No such message.")
        })?;

        if message.deleted {
            return Err(trc::Pop3Event::Error
                .into_err()
                .details(format!("Message {msg} already deleted.")));
        }
        message.deleted = true;

        trc::event!(
            Pop3(trc::Pop3Event::Delete),
            SpanId = self.session_id,
            DocumentId = message.id,
            Elapsed = op_start.elapsed()
        );

        self.write_ok(format!("Message {msg} deleted")).await
    }

    pub async fn handle_rset(&mut self) -> trc::Result<()> {
        let op_start = Instant::now();
        let mut count = 0;
        for message in &mut self.state.mailbox_mut()?.messages {
            if message.deleted {
                count += 1;
                message.deleted = false;
            }
        }

        trc::event!(
            Pop3(trc::Pop3Event::Reset),
            SpanId = self.session_id,
            Total = count as u64,
            Elapsed = op_start.elapsed()
        );

        self.write_ok(format!("{count} messages undeleted")).await
    }

    /// Enters the update state. Messages marked for deletion are removed
    /// from the store only here, the session ends whatever the outcome.
    pub async fn handle_quit(&mut self) -> trc::Result<()> {
        let op_start = Instant::now();
        let mut deleted_docs = Vec::new();

        if let State::Transaction { mailbox } = std::mem::replace(&mut self.state, State::Update) {
            let deleted = mailbox
                .messages
                .iter()
                .filter(|message| message.deleted)
                .map(|message| message.id)
                .collect::<Vec<_>>();

            if !deleted.is_empty() {
                let not_deleted = match self
                    .store
                    .delete(mailbox.account_id, &deleted)
                    .caused_by(trc::location!())
                {
                    Ok(not_deleted) => not_deleted,
                    Err(err) => {
                        trc::error!(err.span_id(self.session_id));
                        deleted.clone()
                    }
                };
                deleted_docs.extend(
                    deleted
                        .iter()
                        .filter(|id| !not_deleted.contains(id))
                        .map(|id| trc::Value::from(*id)),
                );

                if not_deleted.is_empty() {
                    self.write_ok(format!(
                        "Stalwart POP3 bids you farewell ({} messages deleted).",
                        deleted.len()
                    ))
                    .await?;
                } else {
                    self.write_bytes(
                        Response::Err::<u32>("Some messages could not be deleted".into())
                            .serialize(),
                    )
                    .await?;
                }
            } else {
                self.write_ok("Stalwart POP3 bids you farewell (no messages deleted).")
                    .await?;
            }
        } else {
            self.write_ok("Stalwart POP3 bids you farewell.").await?;
        }

        trc::event!(
            Pop3(trc::Pop3Event::Quit),
            SpanId = self.session_id,
            DocumentId = deleted_docs,
            Elapsed = op_start.elapsed()
        );

        Ok(())
    }
}
