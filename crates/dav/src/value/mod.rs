/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod writers;

use dav_proto::{
    responses::{PropertyRenderer, XmlWriter},
    schema::{
        PropertyName,
        property::{DavValue, ValueType},
    },
};
use writers::*;

pub trait ValueWriter: Send + Sync {
    fn supports(&self, name: &PropertyName, typ: ValueType) -> bool;

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue)
    -> trc::Result<()>;

    fn parse(&self, name: &PropertyName, typ: ValueType, value: &str) -> trc::Result<DavValue>;
}

/// Ordered writer registry, the first writer supporting a property wins.
pub struct ValueWriters {
    writers: Vec<Box<dyn ValueWriter>>,
}

impl Default for ValueWriters {
    fn default() -> Self {
        ValueWriters {
            writers: vec![
                Box::new(ModifiedDateWriter),
                Box::new(DateWriter),
                Box::new(ResourceTypeWriter),
                Box::new(BooleanWriter),
                Box::new(CDataWriter),
                Box::new(UuidWriter),
                Box::new(HrefListWriter),
                Box::new(WrappedHrefWriter),
                Box::new(SupportedReportSetWriter),
                Box::new(AddressDataTypeListWriter),
                Box::new(PrivilegeListWriter),
                Box::new(LockWriter),
                Box::new(ToStringWriter),
            ],
        }
    }
}

impl ValueWriters {
    pub fn empty() -> Self {
        ValueWriters {
            writers: Vec::new(),
        }
    }

    pub fn with_writer_first(mut self, writer: impl ValueWriter + 'static) -> Self {
        self.writers.insert(0, Box::new(writer));
        self
    }

    pub fn with_writer(mut self, writer: impl ValueWriter + 'static) -> Self {
        self.writers.push(Box::new(writer));
        self
    }

    pub fn push(&mut self, writer: impl ValueWriter + 'static) {
        self.writers.push(Box::new(writer));
    }

    pub fn writer(&self, name: &PropertyName, typ: ValueType) -> Option<&dyn ValueWriter> {
        self.writers
            .iter()
            .find(|writer| writer.supports(name, typ))
            .map(|writer| writer.as_ref())
    }

    pub fn write(
        &self,
        xml: &mut XmlWriter,
        name: &PropertyName,
        typ: ValueType,
        value: &DavValue,
    ) -> trc::Result<()> {
        if !value.is_type(typ) {
            return Err(type_mismatch(name, typ, value));
        }

        if value.is_null() {
            xml.empty(name);
            Ok(())
        } else if let Some(writer) = self.writer(name, typ) {
            writer.write(xml, name, value)
        } else {
            Err(no_writer(name, typ))
        }
    }

    pub fn parse(&self, name: &PropertyName, typ: ValueType, value: &str) -> trc::Result<DavValue> {
        if let Some(writer) = self.writer(name, typ) {
            writer.parse(name, typ, value)
        } else {
            Err(no_writer(name, typ))
        }
    }
}

impl PropertyRenderer for ValueWriters {
    fn render(
        &self,
        xml: &mut XmlWriter,
        name: &PropertyName,
        typ: ValueType,
        value: &DavValue,
    ) -> trc::Result<()> {
        self.write(xml, name, typ, value)
    }
}

pub(crate) fn type_mismatch(name: &PropertyName, typ: ValueType, value: &DavValue) -> trc::Error {
    trc::WebDavEvent::TypeMismatch
        .into_err()
        .ctx(trc::Key::Property, name)
        .ctx(trc::Key::Type, typ.as_str())
        .details(value.value_type().map(|t| t.as_str()).unwrap_or("null"))
}

fn no_writer(name: &PropertyName, typ: ValueType) -> trc::Error {
    trc::WebDavEvent::Error
        .into_err()
        .details("No value writer registered")
        .ctx(trc::Key::Property, name)
        .ctx(trc::Key::Type, typ.as_str())
}

#[cfg(test)]
mod tests {
    use dav_proto::{
        responses::XmlWriter,
        schema::{
            PropertyName,
            property::{DavValue, ValueType},
        },
    };

    use super::{ValueWriter, ValueWriters};

    struct ShoutingWriter;

    impl ValueWriter for ShoutingWriter {
        fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
            typ == ValueType::Text
        }

        fn write(
            &self,
            xml: &mut XmlWriter,
            name: &PropertyName,
            value: &DavValue,
        ) -> trc::Result<()> {
            xml.element_text(name, value.as_str().unwrap_or_default().to_uppercase());
            Ok(())
        }

        fn parse(&self, _: &PropertyName, _: ValueType, value: &str) -> trc::Result<DavValue> {
            Ok(DavValue::Text(value.to_uppercase()))
        }
    }

    fn render(writers: &ValueWriters, typ: ValueType, value: DavValue) -> String {
        let mut xml = XmlWriter::new();
        writers
            .write(&mut xml, &PropertyName::dav("displayname"), typ, &value)
            .unwrap();
        xml.as_str().to_string()
    }

    #[test]
    fn writer_order() {
        let value = DavValue::Text("Report".into());

        // Registered after the catch-all writer, never selected
        let writers = ValueWriters::default().with_writer(ShoutingWriter);
        assert_eq!(
            render(&writers, ValueType::Text, value.clone()),
            "<D:displayname>Report</D:displayname>"
        );
        assert_eq!(
            writers
                .parse(&PropertyName::dav("displayname"), ValueType::Text, "Report")
                .unwrap(),
            DavValue::Text("Report".into())
        );

        // Registered first, wins for the types it supports
        let writers = ValueWriters::default().with_writer_first(ShoutingWriter);
        assert_eq!(
            render(&writers, ValueType::Text, value),
            "<D:displayname>REPORT</D:displayname>"
        );
        assert_eq!(
            writers
                .parse(&PropertyName::dav("displayname"), ValueType::Text, "Report")
                .unwrap(),
            DavValue::Text("REPORT".into())
        );
        assert_eq!(
            render(&writers, ValueType::Integer, DavValue::Integer(42)),
            "<D:displayname>42</D:displayname>"
        );
    }

    #[test]
    fn type_mismatch() {
        let writers = ValueWriters::default();
        let mut xml = XmlWriter::new();
        let err = writers
            .write(
                &mut xml,
                &PropertyName::dav("getcontentlength"),
                ValueType::Integer,
                &DavValue::Text("12".into()),
            )
            .unwrap_err();
        assert!(err.matches(trc::EventType::WebDav(trc::WebDavEvent::TypeMismatch)));

        // Null is accepted for every declared type
        assert_eq!(
            render(&writers, ValueType::Timestamp, DavValue::Null),
            "<D:displayname/>"
        );
    }

    #[test]
    fn empty_registry() {
        let writers = ValueWriters::empty();
        let mut xml = XmlWriter::new();
        assert!(
            writers
                .write(
                    &mut xml,
                    &PropertyName::dav("displayname"),
                    ValueType::Text,
                    &DavValue::Text("x".into())
                )
                .is_err()
        );
    }
}
