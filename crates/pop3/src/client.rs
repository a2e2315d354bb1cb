/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use common::listener::{SessionResult, SessionStream};

use crate::{
    Session, State, not_authenticated,
    protocol::{Command, request::Error},
};

impl<T: SessionStream> Session<T> {
    pub async fn ingest(&mut self, bytes: &[u8]) -> SessionResult {
        trc::event!(
            Pop3(trc::Pop3Event::RawInput),
            SpanId = self.session_id,
            Size = bytes.len(),
            Contents = trc::Value::from_maybe_string(bytes),
        );

        let mut bytes = bytes.iter();
        let mut requests = Vec::with_capacity(2);

        loop {
            match self.receiver.parse(&mut bytes) {
                Ok(request) => {
                    requests.push(Ok(request));
                }
                Err(Error::NeedsMoreData) => {
                    break;
                }
                Err(Error::Parse(err)) => {
                    requests.push(Err(trc::Pop3Event::Error.into_err().details(err)));
                }
            }
        }

        for request in requests {
            let result = match request.and_then(|command| self.validate_request(command)) {
                Ok(command) => match command {
                    Command::User { name } => self
                        .handle_user(name)
                        .await
                        .map(|_| SessionResult::Continue),
                    Command::Pass { string } => self
                        .handle_pass(string)
                        .await
                        .map(|_| SessionResult::Continue),
                    Command::Apop { name, digest } => self
                        .handle_apop(name, digest)
                        .await
                        .map(|_| SessionResult::Continue),
                    Command::Quit => {
                        if let Err(err) = self.handle_quit().await {
                            self.write_err(err).await;
                        }
                        Ok(SessionResult::Close)
                    }
                    Command::Stat => self.handle_stat().await.map(|_| SessionResult::Continue),
                    Command::List { msg } => {
                        self.handle_list(msg).await.map(|_| SessionResult::Continue)
                    }
                    Command::Retr { msg } => self
                        .handle_fetch(msg, None)
                        .await
                        .map(|_| SessionResult::Continue),
                    Command::Dele { msg } => {
                        self.handle_dele(msg).await.map(|_| SessionResult::Continue)
                    }
                    Command::Top { msg, n } => self
                        .handle_fetch(msg, Some(n))
                        .await
                        .map(|_| SessionResult::Continue),
                    Command::Uidl { msg } => {
                        self.handle_uidl(msg).await.map(|_| SessionResult::Continue)
                    }
                    Command::Noop => self.handle_noop().await.map(|_| SessionResult::Continue),
                    Command::Rset => self.handle_rset().await.map(|_| SessionResult::Continue),
                    Command::Capa => self.handle_capa().await.map(|_| SessionResult::Continue),
                },
                Err(err) => Err(err),
            };

            match result {
                Ok(SessionResult::Continue) => (),
                Ok(SessionResult::Close) => return SessionResult::Close,
                Err(err) => {
                    if !self.write_err(err).await {
                        return SessionResult::Close;
                    }
                }
            }
        }

        SessionResult::Continue
    }

    fn validate_request(&self, command: Command) -> trc::Result<Command> {
        match &command {
            Command::Capa | Command::Quit | Command::Noop => Ok(command),
            Command::User { .. } | Command::Pass { .. } | Command::Apop { .. } => {
                if let State::Authorization { username, .. } = &self.state {
                    if !matches!(command, Command::Pass { .. }) || username.is_some() {
                        Ok(command)
                    } else {
                        Err(trc::Pop3Event::Error
                            .into_err()
                            .details("Username was not provided."))
                    }
                } else {
                    Err(trc::Pop3Event::Error
                        .into_err()
                        .details("Already authenticated."))
                }
            }
            Command::List { .. }
            | Command::Retr { .. }
            | Command::Dele { .. }
            | Command::Top { .. }
            | Command::Uidl { .. }
            | Command::Stat
            | Command::Rset => {
                if self.state.is_authenticated() {
                    Ok(command)
                } else {
                    Err(not_authenticated().ctx(trc::Key::Name, command.name()))
                }
            }
        }
    }
}
