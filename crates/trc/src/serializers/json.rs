/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{Error, Event, EventDetails, Key, Value};
use ahash::AHashSet;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};

pub struct JsonEventSerializer<T> {
    inner: T,
    with_description: bool,
    with_explanation: bool,
}

impl<T> JsonEventSerializer<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            with_description: false,
            with_explanation: false,
        }
    }

    pub fn with_description(mut self) -> Self {
        self.with_description = true;
        self
    }

    pub fn with_explanation(mut self) -> Self {
        self.with_explanation = true;
        self
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    fn wrap<U>(&self, inner: U) -> JsonEventSerializer<U> {
        JsonEventSerializer {
            inner,
            with_description: self.with_description,
            with_explanation: self.with_explanation,
        }
    }
}

impl<T: AsRef<Event<EventDetails>>> Serialize for JsonEventSerializer<Vec<T>> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.inner.len()))?;
        for event in &self.inner {
            seq.serialize_element(&self.wrap(event.as_ref()))?;
        }
        seq.end()
    }
}

impl Serialize for JsonEventSerializer<&Event<EventDetails>> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let event = self.inner;
        let mut map = serializer.serialize_map(None)?;
        if self.with_description {
            map.serialize_entry("text", event.inner.typ.description())?;
        }
        if self.with_explanation {
            map.serialize_entry("details", event.inner.typ.explain())?;
        }
        map.serialize_entry("createdAt", &event.inner.timestamp)?;
        map.serialize_entry("level", event.inner.level.as_str())?;
        map.serialize_entry("type", event.inner.typ.name())?;
        map.serialize_entry("data", &self.wrap(event.keys.as_slice()))?;
        map.end()
    }
}

impl Serialize for JsonEventSerializer<&[(Key, Value)]> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seen_keys = AHashSet::with_capacity(self.inner.len());
        let mut keys = serializer.serialize_map(Some(self.inner.len()))?;
        for (key, value) in self.inner {
            if !matches!(value, Value::None) && seen_keys.insert(*key) {
                keys.serialize_entry(key.name(), &self.wrap(value))?;
            }
        }
        keys.end()
    }
}

impl Serialize for JsonEventSerializer<&Error> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.inner.inner.name())?;
        if self.with_description {
            map.serialize_entry("text", self.inner.inner.description())?;
        }
        if self.with_explanation {
            map.serialize_entry("details", self.inner.inner.explain())?;
        }
        map.serialize_entry("data", &self.wrap(self.inner.keys.as_slice()))?;
        map.end()
    }
}

impl Serialize for JsonEventSerializer<&Value> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.inner {
            Value::Static(value) => value.serialize(serializer),
            Value::String(value) => value.as_str().serialize(serializer),
            Value::UInt(value) => value.serialize(serializer),
            Value::Int(value) => value.serialize(serializer),
            Value::Float(value) => value.serialize(serializer),
            Value::Timestamp(value) => value.serialize(serializer),
            Value::Duration(value) => value.serialize(serializer),
            Value::Bytes(value) => STANDARD.encode(value).serialize(serializer),
            Value::Bool(value) => value.serialize(serializer),
            Value::Ipv4(value) => value.serialize(serializer),
            Value::Ipv6(value) => value.serialize(serializer),
            Value::Event(value) => self.wrap(&**value).serialize(serializer),
            Value::Array(value) => {
                let mut seq = serializer.serialize_seq(Some(value.len()))?;
                for value in value {
                    seq.serialize_element(&self.wrap(value))?;
                }
                seq.end()
            }
            Value::None => serializer.serialize_unit(),
        }
    }
}
