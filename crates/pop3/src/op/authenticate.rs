/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Instant;

use common::listener::SessionStream;

use crate::{Session, State, store::Credentials};

impl<T: SessionStream> Session<T> {
    pub async fn handle_user(&mut self, name: String) -> trc::Result<()> {
        trc::event!(
            Pop3(trc::Pop3Event::User),
            SpanId = self.session_id,
            Name = name.clone(),
            Elapsed = trc::Value::Duration(0)
        );

        if let State::Authorization { username, .. } = &mut self.state {
            let response = format!("{name} is a valid mailbox");
            *username = Some(name);
            self.write_ok(response).await
        } else {
            Err(already_authenticated())
        }
    }

    pub async fn handle_pass(&mut self, secret: String) -> trc::Result<()> {
        let username = match &mut self.state {
            State::Authorization { username, .. } => username.take(),
            _ => return Err(already_authenticated()),
        }
        .ok_or_else(|| {
            trc::Pop3Event::Error
                .into_err()
                .details("Username was not provided.")
        })?;

        self.handle_auth(Credentials::Plain { username, secret })
            .await
    }

    pub async fn handle_apop(&mut self, name: String, digest: String) -> trc::Result<()> {
        let challenge = self
            .challenge
            .clone()
            .ok_or_else(|| trc::Pop3Event::Error.into_err().details("APOP not supported."))?;

        self.handle_auth(Credentials::Apop {
            username: name,
            challenge,
            digest,
        })
        .await
    }

    pub async fn handle_auth(&mut self, credentials: Credentials) -> trc::Result<()> {
        let op_start = Instant::now();

        let account_id = self.store.authenticate(&credentials).map_err(|err| {
            if err.matches(trc::EventType::Auth(trc::AuthEvent::Failed)) {
                match &self.state {
                    State::Authorization { auth_failures, .. }
                        if auth_failures + 1 < self.core.pop3.max_auth_failures =>
                    {
                        // Partial state is discarded so the client can retry with another user
                        self.state = State::Authorization {
                            auth_failures: auth_failures + 1,
                            username: None,
                        };
                    }
                    _ => {
                        return trc::AuthEvent::TooManyAttempts
                            .into_err()
                            .details("Too many authentication failures.")
                            .caused_by(err);
                    }
                }
            }

            err
        })?;

        // Snapshot the maildrop
        let mailbox = self.fetch_mailbox(account_id)?;

        trc::event!(
            Auth(trc::AuthEvent::Success),
            SpanId = self.session_id,
            AccountId = account_id,
            Name = credentials.username().to_string(),
        );
        trc::event!(
            Pop3(trc::Pop3Event::Authenticate),
            SpanId = self.session_id,
            AccountId = account_id,
            Total = mailbox.messages.len(),
            Elapsed = op_start.elapsed()
        );

        self.state = State::Transaction { mailbox };
        self.write_ok("Authentication successful").await
    }
}

fn already_authenticated() -> trc::Error {
    trc::Pop3Event::Error
        .into_err()
        .details("Already authenticated.")
}
