/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::*;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::{borrow::Cow, fmt::Display, str::FromStr};

impl<T> Event<T> {
    pub fn with_keys(inner: T, keys: Vec<(Key, Value)>) -> Self {
        Self { inner, keys }
    }

    pub fn new(inner: T) -> Self {
        Self {
            inner,
            keys: Vec::with_capacity(4),
        }
    }

    pub fn value(&self, key: Key) -> Option<&Value> {
        self.keys
            .iter()
            .find_map(|(k, v)| if *k == key { Some(v) } else { None })
    }

    pub fn value_as_str(&self, key: Key) -> Option<&str> {
        self.value(key).and_then(|v| v.as_str())
    }

    pub fn value_as_uint(&self, key: Key) -> Option<u64> {
        self.value(key).and_then(|v| v.to_uint())
    }

    pub fn take_value(&mut self, key: Key) -> Option<Value> {
        self.keys.iter_mut().find_map(|(k, v)| {
            if *k == key {
                Some(std::mem::take(v))
            } else {
                None
            }
        })
    }
}

impl Event<EventType> {
    #[inline(always)]
    pub fn ctx(mut self, key: Key, value: impl Into<Value>) -> Self {
        self.keys.push((key, value.into()));
        self
    }

    #[inline(always)]
    pub fn ctx_opt(self, key: Key, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.ctx(key, value),
            None => self,
        }
    }

    #[inline(always)]
    pub fn matches(&self, inner: EventType) -> bool {
        self.inner == inner
    }

    #[inline(always)]
    pub fn span_id(self, session_id: u64) -> Self {
        self.ctx(Key::SpanId, session_id)
    }

    #[inline(always)]
    pub fn caused_by(self, error: impl Into<Value>) -> Self {
        self.ctx(Key::CausedBy, error)
    }

    #[inline(always)]
    pub fn details(self, error: impl Into<Value>) -> Self {
        self.ctx(Key::Details, error)
    }

    #[inline(always)]
    pub fn code(self, error: impl Into<Value>) -> Self {
        self.ctx(Key::Code, error)
    }

    #[inline(always)]
    pub fn id(self, error: impl Into<Value>) -> Self {
        self.ctx(Key::Id, error)
    }

    #[inline(always)]
    pub fn reason(self, error: impl Display) -> Self {
        self.ctx(Key::Reason, error.to_string())
    }

    #[inline(always)]
    pub fn wrap(self, cause: EventType) -> Self {
        Error::new(cause).caused_by(self)
    }

    #[inline(always)]
    pub fn must_disconnect(&self) -> bool {
        matches!(
            self.inner,
            EventType::Network(_) | EventType::Auth(AuthEvent::TooManyAttempts)
        )
    }

    #[inline(always)]
    pub fn should_write_err(&self) -> bool {
        !matches!(self.inner, EventType::Network(_))
    }
}

impl Event<EventDetails> {
    pub fn span_id(&self) -> Option<u64> {
        for (key, value) in &self.keys {
            match (key, value) {
                (Key::SpanId, Value::UInt(value)) => return Some(*value),
                (Key::SpanId, Value::Int(value)) => return Some(*value as u64),
                _ => {}
            }
        }

        None
    }
}

impl EventType {
    #[inline(always)]
    pub fn ctx(self, key: Key, value: impl Into<Value>) -> Error {
        self.into_err().ctx(key, value)
    }

    #[inline(always)]
    pub fn caused_by(self, error: impl Into<Value>) -> Error {
        self.into_err().caused_by(error)
    }

    #[inline(always)]
    pub fn reason(self, error: impl Display) -> Error {
        self.into_err().reason(error)
    }

    #[inline(always)]
    pub fn into_err(self) -> Error {
        Error::new(self)
    }

    pub fn message(&self) -> &'static str {
        match self {
            EventType::Store(cause) => cause.message(),
            EventType::Auth(cause) => cause.message(),
            EventType::Resource(cause) => cause.message(),
            EventType::Lock(cause) => cause.message(),
            EventType::WebDav(cause) => cause.message(),
            EventType::Pop3(_) => "POP3 error",
            EventType::Network(_) => "Network error",
            EventType::Config(_) => "Configuration error",
            EventType::Server(_) => "Internal server error",
        }
    }
}

macro_rules! impl_error_family {
    ($family:ident, $variant:ident) => {
        impl $family {
            #[inline(always)]
            pub fn ctx(self, key: Key, value: impl Into<Value>) -> Error {
                self.into_err().ctx(key, value)
            }

            #[inline(always)]
            pub fn caused_by(self, error: impl Into<Value>) -> Error {
                self.into_err().caused_by(error)
            }

            #[inline(always)]
            pub fn reason(self, error: impl Display) -> Error {
                self.into_err().reason(error)
            }

            #[inline(always)]
            pub fn into_err(self) -> Error {
                Error::new(EventType::$variant(self))
            }
        }

        impl From<$family> for EventType {
            #[inline(always)]
            fn from(event: $family) -> Self {
                EventType::$variant(event)
            }
        }
    };
}

impl_error_family!(ServerEvent, Server);
impl_error_family!(NetworkEvent, Network);
impl_error_family!(ConfigEvent, Config);
impl_error_family!(AuthEvent, Auth);
impl_error_family!(WebDavEvent, WebDav);
impl_error_family!(LockEvent, Lock);
impl_error_family!(Pop3Event, Pop3);
impl_error_family!(StoreEvent, Store);
impl_error_family!(ResourceEvent, Resource);

impl StoreEvent {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFound => "Not found",
            Self::DataCorruption => "Data corruption",
            Self::UnexpectedError => "Unexpected error",
        }
    }
}

impl AuthEvent {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Failed => "Authentication failed",
            Self::TooManyAttempts => "Too many authentication attempts",
            _ => "Authentication error",
        }
    }
}

impl ResourceEvent {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFound => "Not found",
            Self::BadParameters => "Bad parameters",
            Self::Error => "Resource error",
        }
    }
}

impl LockEvent {
    pub fn message(&self) -> &'static str {
        match self {
            Self::AlreadyLocked => "Resource is already locked",
            Self::NotFound => "Lock token not found",
            Self::Expired => "Lock has expired",
            Self::TokenMismatch => "Lock token does not match",
            _ => "Lock error",
        }
    }
}

impl WebDavEvent {
    pub fn message(&self) -> &'static str {
        match self {
            Self::PropertyNotFound => "Unknown property",
            Self::TypeMismatch => "Property value type mismatch",
            Self::RequestTooLarge => "Request too large",
            _ => "WebDAV error",
        }
    }
}

impl Value {
    pub fn from_maybe_string(value: &[u8]) -> Self {
        if let Ok(value) = std::str::from_utf8(value) {
            Self::String(value.into())
        } else {
            Self::Bytes(value.to_vec())
        }
    }

    pub fn to_uint(&self) -> Option<u64> {
        match self {
            Self::UInt(value) => Some(*value),
            Self::Int(value) => Some(*value as u64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            Self::Static(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<Cow<'static, str>> {
        match self {
            Self::String(value) => Some(Cow::Owned(value.into_string())),
            Self::Static(value) => Some(Cow::Borrowed(value)),
            _ => None,
        }
    }
}

impl<T> AddContext<T> for Result<T> {
    #[inline(always)]
    fn caused_by(self, location: &'static str) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(err.ctx(Key::CausedBy, location)),
        }
    }

    #[inline(always)]
    fn add_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(Error) -> Error,
    {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(f(err)),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Static(value) => value.fmt(f),
            Value::String(value) => value.fmt(f),
            Value::UInt(value) => value.fmt(f),
            Value::Int(value) => value.fmt(f),
            Value::Float(value) => value.fmt(f),
            Value::Timestamp(value) => value.fmt(f),
            Value::Duration(value) => write!(f, "{value}ms"),
            Value::Bytes(value) => STANDARD.encode(value).fmt(f),
            Value::Bool(value) => value.fmt(f),
            Value::Ipv4(value) => value.fmt(f),
            Value::Ipv6(value) => value.fmt(f),
            Value::Event(value) => {
                "(".fmt(f)?;
                value.fmt(f)?;
                ")".fmt(f)
            }
            Value::Array(value) => {
                f.write_str("[")?;
                for (i, value) in value.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    value.fmt(f)?;
                }
                f.write_str("]")
            }
            Value::None => "(null)".fmt(f),
        }
    }
}

fn fmt_keys(keys: &[(Key, Value)], f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (i, (key, value)) in keys.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{} = {}", key.name(), value)?;
    }
    Ok(())
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.inner.description(), self.inner.name())?;
        if !self.keys.is_empty() {
            f.write_str(": ")?;
            fmt_keys(&self.keys, f)?;
        }
        Ok(())
    }
}

impl Display for Event<EventDetails> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({})",
            self.inner.typ.description(),
            self.inner.typ.name()
        )?;
        if !self.keys.is_empty() {
            f.write_str(": ")?;
            fmt_keys(&self.keys, f)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Static(l0), Self::Static(r0)) => l0 == r0,
            (Self::String(l0), Self::String(r0)) => l0 == r0,
            (Self::String(l0), Self::Static(r0)) => l0 == r0,
            (Self::Static(l0), Self::String(r0)) => l0 == r0,
            (Self::UInt(l0), Self::UInt(r0)) => l0 == r0,
            (Self::Int(l0), Self::Int(r0)) => l0 == r0,
            (Self::Float(l0), Self::Float(r0)) => l0 == r0,
            (Self::Timestamp(l0), Self::Timestamp(r0)) => l0 == r0,
            (Self::Duration(l0), Self::Duration(r0)) => l0 == r0,
            (Self::Bytes(l0), Self::Bytes(r0)) => l0 == r0,
            (Self::Bool(l0), Self::Bool(r0)) => l0 == r0,
            (Self::Ipv4(l0), Self::Ipv4(r0)) => l0 == r0,
            (Self::Ipv6(l0), Self::Ipv6(r0)) => l0 == r0,
            (Self::Event(l0), Self::Event(r0)) => l0 == r0,
            (Self::Array(l0), Self::Array(r0)) => l0 == r0,
            (Self::None, Self::None) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
            && self.keys.len() == other.keys.len()
            && self
                .keys
                .iter()
                .all(|kv| other.keys.iter().any(|okv| kv == okv))
    }
}

impl Eq for Error {}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        hashify::tiny_map_ignore_case!(s.as_bytes(),
            "disable" => Self::Disable,
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
        )
        .ok_or_else(|| s.to_string())
    }
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "DISABLE",
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    pub fn from_usize(value: usize) -> Self {
        match value {
            0 => Self::Trace,
            1 => Self::Debug,
            2 => Self::Info,
            3 => Self::Warn,
            4 => Self::Error,
            _ => Self::Disable,
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn event_names() {
        for (event, name) in [
            (EventType::Lock(LockEvent::AlreadyLocked), "lock.already-locked"),
            (EventType::WebDav(WebDavEvent::TypeMismatch), "web-dav.type-mismatch"),
            (EventType::Pop3(Pop3Event::RawInput), "pop3.raw-input"),
            (
                EventType::Network(NetworkEvent::ConnectionStart),
                "network.connection-start",
            ),
        ] {
            assert_eq!(event.name(), name);
            assert_eq!(EventType::try_parse(name), Some(event));
        }
        assert_eq!(EventType::try_parse("lock.unknown"), None);
        assert!(EventType::variants().len() > 50);
    }

    #[test]
    fn error_display() {
        let err = LockEvent::AlreadyLocked
            .ctx(Key::Id, "calendar-1")
            .ctx(Key::Timeout, 60u64);
        assert_eq!(
            err.to_string(),
            "Resource is already locked (lock.already-locked): id = calendar-1, timeout = 60"
        );
        assert_eq!(err.inner.message(), "Resource is already locked");
        assert_eq!(err.value_as_str(Key::Id), Some("calendar-1"));
        assert_eq!(err.value_as_uint(Key::Timeout), Some(60));
    }

    #[test]
    fn parse_level() {
        for (text, level) in [
            ("trace", Level::Trace),
            ("DEBUG", Level::Debug),
            ("Info", Level::Info),
            ("warn", Level::Warn),
            ("error", Level::Error),
            ("disable", Level::Disable),
        ] {
            assert_eq!(text.parse::<Level>(), Ok(level));
            assert_eq!(Level::from_usize(level as usize), level);
        }
        assert!("verbose".parse::<Level>().is_err());
        assert!(Level::Error > Level::Warn);
    }
}
