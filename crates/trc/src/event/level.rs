/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::*;

impl EventType {
    pub fn level(&self) -> Level {
        match self {
            EventType::Server(event) => match event {
                ServerEvent::Startup | ServerEvent::Shutdown => Level::Info,
                ServerEvent::StartupError | ServerEvent::ThreadError => Level::Error,
            },
            EventType::Network(event) => match event {
                NetworkEvent::ReadError
                | NetworkEvent::WriteError
                | NetworkEvent::Timeout
                | NetworkEvent::Closed => Level::Debug,
                NetworkEvent::ConnectionStart | NetworkEvent::ConnectionEnd => Level::Info,
                NetworkEvent::ListenStart | NetworkEvent::ListenStop => Level::Info,
                NetworkEvent::AcceptError => Level::Warn,
                NetworkEvent::ListenError | NetworkEvent::BindError => Level::Error,
            },
            EventType::Config(event) => match event {
                ConfigEvent::ParseError | ConfigEvent::BuildError | ConfigEvent::MacroError => {
                    Level::Error
                }
                ConfigEvent::ParseWarning
                | ConfigEvent::BuildWarning
                | ConfigEvent::MissingSetting => Level::Warn,
                ConfigEvent::DefaultApplied | ConfigEvent::UnusedSetting => Level::Debug,
            },
            EventType::Auth(event) => match event {
                AuthEvent::Success | AuthEvent::Failed | AuthEvent::TooManyAttempts => Level::Info,
                AuthEvent::Error => Level::Error,
            },
            EventType::WebDav(event) => match event {
                WebDavEvent::Propfind
                | WebDavEvent::Proppatch
                | WebDavEvent::Options
                | WebDavEvent::Lock
                | WebDavEvent::Unlock => Level::Debug,
                WebDavEvent::PropertyNotFound => Level::Debug,
                WebDavEvent::RequestTooLarge => Level::Info,
                WebDavEvent::TypeMismatch | WebDavEvent::Error => Level::Error,
            },
            EventType::Lock(event) => match event {
                LockEvent::Acquired | LockEvent::Refreshed | LockEvent::Released => Level::Debug,
                LockEvent::AlreadyLocked
                | LockEvent::NotFound
                | LockEvent::Expired
                | LockEvent::TokenMismatch => Level::Info,
            },
            EventType::Pop3(event) => match event {
                Pop3Event::RawInput | Pop3Event::RawOutput => Level::Trace,
                _ => Level::Debug,
            },
            EventType::Store(event) => match event {
                StoreEvent::NotFound => Level::Debug,
                StoreEvent::DataCorruption | StoreEvent::UnexpectedError => Level::Error,
            },
            EventType::Resource(event) => match event {
                ResourceEvent::NotFound | ResourceEvent::BadParameters => Level::Debug,
                ResourceEvent::Error => Level::Error,
            },
        }
    }
}
