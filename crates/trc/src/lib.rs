/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

extern crate self as trc;

pub mod channel;
pub mod collector;
pub mod conv;
pub mod event;
pub mod imple;
pub mod macros;
pub mod serializers;
pub mod subscriber;

use std::net::{Ipv4Addr, Ipv6Addr};

use compact_str::CompactString;
use event_macro::{event_family, event_type, key_names};

pub use event_macro::event;

pub type Result<T> = std::result::Result<T, Error>;
pub type Error = Event<EventType>;

#[derive(Debug, Clone)]
pub struct Event<T> {
    pub inner: T,
    pub keys: Vec<(Key, Value)>,
}

#[derive(Debug, Clone)]
pub struct EventDetails {
    pub typ: EventType,
    pub timestamp: u64,
    pub level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Disable = 5,
}

#[derive(Debug, Default, Clone)]
pub enum Value {
    Static(&'static str),
    String(CompactString),
    UInt(u64),
    Int(i64),
    Float(f64),
    Timestamp(u64),
    Duration(u64),
    Bytes(Vec<u8>),
    Bool(bool),
    Ipv4(Ipv4Addr),
    Ipv6(Box<Ipv6Addr>),
    Event(Box<Error>),
    Array(Vec<Value>),
    #[default]
    None,
}

#[key_names]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    AccountId,
    CausedBy,
    Code,
    Contents,
    Depth,
    Details,
    DocumentId,
    Elapsed,
    Expires,
    Href,
    Id,
    Key,
    Limit,
    ListenerId,
    LocalIp,
    LocalPort,
    Name,
    Path,
    Property,
    Reason,
    RemoteIp,
    RemotePort,
    Result,
    Size,
    SpanId,
    Status,
    Timeout,
    Tls,
    Token,
    Total,
    Type,
    Value,
}

#[event_family]
pub enum EventType {
    Server(ServerEvent),
    Network(NetworkEvent),
    Config(ConfigEvent),
    Auth(AuthEvent),
    WebDav(WebDavEvent),
    Lock(LockEvent),
    Pop3(Pop3Event),
    Store(StoreEvent),
    Resource(ResourceEvent),
}

#[event_type]
pub enum ServerEvent {
    Startup,
    Shutdown,
    StartupError,
    ThreadError,
}

#[event_type]
pub enum NetworkEvent {
    ConnectionStart,
    ConnectionEnd,
    ListenStart,
    ListenStop,
    ListenError,
    BindError,
    AcceptError,
    ReadError,
    WriteError,
    Timeout,
    Closed,
}

#[event_type]
pub enum ConfigEvent {
    ParseError,
    BuildError,
    MacroError,
    ParseWarning,
    BuildWarning,
    MissingSetting,
    DefaultApplied,
    UnusedSetting,
}

#[event_type]
pub enum AuthEvent {
    Success,
    Failed,
    Error,
    TooManyAttempts,
}

#[event_type]
pub enum WebDavEvent {
    Propfind,
    Proppatch,
    Options,
    Lock,
    Unlock,
    PropertyNotFound,
    TypeMismatch,
    RequestTooLarge,
    Error,
}

#[event_type]
pub enum LockEvent {
    Acquired,
    Refreshed,
    Released,
    AlreadyLocked,
    NotFound,
    Expired,
    TokenMismatch,
}

#[event_type]
pub enum Pop3Event {
    Error,
    Capabilities,
    User,
    Authenticate,
    Noop,
    Quit,
    List,
    Fetch,
    Uidl,
    Delete,
    Reset,
    Stat,
    RawInput,
    RawOutput,
}

#[event_type]
pub enum StoreEvent {
    NotFound,
    DataCorruption,
    UnexpectedError,
}

#[event_type]
pub enum ResourceEvent {
    NotFound,
    BadParameters,
    Error,
}

pub trait AddContext<T> {
    fn caused_by(self, location: &'static str) -> Result<T>;

    fn add_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(Error) -> Error;
}
