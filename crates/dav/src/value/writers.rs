/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use chrono::{DateTime, SecondsFormat, Utc};
use dav_proto::{
    responses::XmlWriter,
    schema::{
        PropertyName,
        property::{DavValue, ValueType},
    },
};

use super::{ValueWriter, type_mismatch};

pub struct ModifiedDateWriter;
pub struct DateWriter;
pub struct ResourceTypeWriter;
pub struct BooleanWriter;
pub struct CDataWriter;
pub struct UuidWriter;
pub struct HrefListWriter;
pub struct WrappedHrefWriter;
pub struct SupportedReportSetWriter;
pub struct AddressDataTypeListWriter;
pub struct PrivilegeListWriter;
pub struct LockWriter;
/// Catch-all writer, must stay last.
pub struct ToStringWriter;

const RFC_1123: &str = "%a, %d %b %Y %H:%M:%S GMT";

fn timestamp_to_utc(timestamp: i64) -> trc::Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
        trc::ResourceEvent::BadParameters
            .into_err()
            .details("Timestamp out of range")
            .ctx(trc::Key::Value, timestamp)
    })
}

fn bad_value(name: &PropertyName, value: &str, reason: &'static str) -> trc::Error {
    trc::ResourceEvent::BadParameters
        .into_err()
        .details(reason)
        .ctx(trc::Key::Property, name)
        .ctx(trc::Key::Value, value.to_string())
}

fn read_only(name: &PropertyName) -> trc::Error {
    trc::ResourceEvent::BadParameters
        .into_err()
        .details("Value cannot be set by clients")
        .ctx(trc::Key::Property, name)
}

impl ValueWriter for ModifiedDateWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::Timestamp
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::Timestamp(timestamp) => {
                xml.element_text(
                    name,
                    timestamp_to_utc(*timestamp)?.format(RFC_1123).to_string(),
                );
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::Timestamp, value)),
        }
    }

    fn parse(&self, name: &PropertyName, _: ValueType, value: &str) -> trc::Result<DavValue> {
        DateTime::parse_from_rfc2822(value.trim())
            .map(|dt| DavValue::Timestamp(dt.timestamp()))
            .map_err(|_| bad_value(name, value, "Invalid RFC 1123 date"))
    }
}

impl ValueWriter for DateWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::Date
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::Date(timestamp) => {
                xml.element_text(
                    name,
                    timestamp_to_utc(*timestamp)?.to_rfc3339_opts(SecondsFormat::Secs, true),
                );
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::Date, value)),
        }
    }

    fn parse(&self, name: &PropertyName, _: ValueType, value: &str) -> trc::Result<DavValue> {
        DateTime::parse_from_rfc3339(value.trim())
            .map(|dt| DavValue::Date(dt.timestamp()))
            .map_err(|_| bad_value(name, value, "Invalid RFC 3339 date"))
    }
}

impl ValueWriter for ResourceTypeWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::ResourceType
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::ResourceType(types) if types.is_empty() => {
                xml.empty(name);
                Ok(())
            }
            DavValue::ResourceType(types) => {
                xml.start(name);
                for typ in types {
                    xml.empty(typ);
                }
                xml.end(name);
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::ResourceType, value)),
        }
    }

    fn parse(&self, name: &PropertyName, _: ValueType, _: &str) -> trc::Result<DavValue> {
        Err(read_only(name))
    }
}

impl ValueWriter for BooleanWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::Boolean
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::Boolean(value) => {
                xml.element_text(name, if *value { "true" } else { "false" });
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::Boolean, value)),
        }
    }

    fn parse(&self, name: &PropertyName, _: ValueType, value: &str) -> trc::Result<DavValue> {
        hashify::tiny_map_ignore_case!(value.trim().as_bytes(),
            "true" => true,
            "t" => true,
            "yes" => true,
            "1" => true,
            "false" => false,
            "f" => false,
            "no" => false,
            "0" => false,
        )
        .map(DavValue::Boolean)
        .ok_or_else(|| bad_value(name, value, "Invalid boolean"))
    }
}

impl ValueWriter for CDataWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::CData
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::CData(text) => {
                xml.start(name).cdata(text).end(name);
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::CData, value)),
        }
    }

    fn parse(&self, _: &PropertyName, _: ValueType, value: &str) -> trc::Result<DavValue> {
        Ok(DavValue::CData(value.to_string()))
    }
}

impl ValueWriter for UuidWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::Uuid
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::Uuid(uuid) => {
                xml.element_text(name, uuid);
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::Uuid, value)),
        }
    }

    fn parse(&self, name: &PropertyName, _: ValueType, value: &str) -> trc::Result<DavValue> {
        let value = value.trim();
        let is_uuid = value.len() == 36
            && value.char_indices().all(|(pos, ch)| match pos {
                8 | 13 | 18 | 23 => ch == '-',
                _ => ch.is_ascii_hexdigit(),
            });
        if is_uuid {
            Ok(DavValue::Uuid(value.to_ascii_lowercase()))
        } else {
            Err(bad_value(name, value, "Invalid UUID"))
        }
    }
}

impl ValueWriter for HrefListWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::HrefList
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::HrefList(hrefs) => {
                xml.start(name);
                for href in hrefs {
                    xml.href(href);
                }
                xml.end(name);
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::HrefList, value)),
        }
    }

    fn parse(&self, _: &PropertyName, _: ValueType, value: &str) -> trc::Result<DavValue> {
        Ok(DavValue::HrefList(
            value.split_whitespace().map(String::from).collect(),
        ))
    }
}

impl ValueWriter for WrappedHrefWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::Href
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::Href(href) => {
                xml.start(name).href(href).end(name);
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::Href, value)),
        }
    }

    fn parse(&self, name: &PropertyName, _: ValueType, value: &str) -> trc::Result<DavValue> {
        let value = value.trim();
        if !value.is_empty() {
            Ok(DavValue::Href(value.to_string()))
        } else {
            Err(bad_value(name, value, "Empty href"))
        }
    }
}

impl ValueWriter for SupportedReportSetWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::SupportedReportSet
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::SupportedReportSet(reports) => {
                xml.start(name);
                for report in reports {
                    xml.start_dav("supported-report")
                        .start_dav("report")
                        .empty(report)
                        .end_dav("report")
                        .end_dav("supported-report");
                }
                xml.end(name);
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::SupportedReportSet, value)),
        }
    }

    fn parse(&self, name: &PropertyName, _: ValueType, _: &str) -> trc::Result<DavValue> {
        Err(read_only(name))
    }
}

impl ValueWriter for AddressDataTypeListWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::AddressDataTypes
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::AddressDataTypes(types) => {
                let item = PropertyName::carddav("address-data-type");
                xml.start(name);
                for typ in types {
                    xml.empty_with_attrs(
                        &item,
                        &[
                            ("content-type", typ.content_type.as_str()),
                            ("version", typ.version.as_str()),
                        ],
                    );
                }
                xml.end(name);
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::AddressDataTypes, value)),
        }
    }

    fn parse(&self, name: &PropertyName, _: ValueType, _: &str) -> trc::Result<DavValue> {
        Err(read_only(name))
    }
}

impl ValueWriter for PrivilegeListWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        typ == ValueType::PrivilegeSet
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::PrivilegeSet(privileges) => {
                xml.start(name);
                for privilege in privileges {
                    xml.start_dav("privilege")
                        .empty_dav(privilege.as_str())
                        .end_dav("privilege");
                }
                xml.end(name);
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::PrivilegeSet, value)),
        }
    }

    fn parse(&self, name: &PropertyName, _: ValueType, _: &str) -> trc::Result<DavValue> {
        Err(read_only(name))
    }
}

impl ValueWriter for LockWriter {
    fn supports(&self, _: &PropertyName, typ: ValueType) -> bool {
        matches!(typ, ValueType::LockDiscovery | ValueType::SupportedLock)
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        match value {
            DavValue::LockDiscovery(locks) => {
                xml.start(name);
                for lock in locks {
                    xml.active_lock(lock);
                }
                xml.end(name);
                Ok(())
            }
            DavValue::SupportedLock(entries) => {
                xml.start(name);
                for entry in entries {
                    xml.lock_entry(entry);
                }
                xml.end(name);
                Ok(())
            }
            _ => Err(type_mismatch(name, ValueType::LockDiscovery, value)),
        }
    }

    fn parse(&self, name: &PropertyName, _: ValueType, _: &str) -> trc::Result<DavValue> {
        Err(read_only(name))
    }
}

impl ValueWriter for ToStringWriter {
    fn supports(&self, _: &PropertyName, _: ValueType) -> bool {
        true
    }

    fn write(&self, xml: &mut XmlWriter, name: &PropertyName, value: &DavValue) -> trc::Result<()> {
        let text = match value {
            DavValue::Text(text)
            | DavValue::CData(text)
            | DavValue::Uuid(text)
            | DavValue::Href(text) => text.clone(),
            DavValue::Integer(number) | DavValue::Timestamp(number) | DavValue::Date(number) => {
                number.to_string()
            }
            DavValue::Boolean(value) => value.to_string(),
            DavValue::HrefList(hrefs) => hrefs.join(" "),
            DavValue::ResourceType(names) | DavValue::SupportedReportSet(names) => names
                .iter()
                .map(|name| name.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            DavValue::PrivilegeSet(privileges) => privileges
                .iter()
                .map(|privilege| privilege.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            DavValue::AddressDataTypes(types) => types
                .iter()
                .map(|typ| format!("{};version={}", typ.content_type, typ.version))
                .collect::<Vec<_>>()
                .join(" "),
            DavValue::LockDiscovery(_) | DavValue::SupportedLock(_) => {
                return Err(type_mismatch(name, ValueType::Text, value));
            }
            DavValue::Null => String::new(),
        };
        xml.element_text(name, text);
        Ok(())
    }

    fn parse(&self, name: &PropertyName, typ: ValueType, value: &str) -> trc::Result<DavValue> {
        match typ {
            ValueType::Text => Ok(DavValue::Text(value.to_string())),
            ValueType::Integer => value
                .trim()
                .parse()
                .map(DavValue::Integer)
                .map_err(|_| bad_value(name, value, "Invalid integer")),
            _ => Err(bad_value(name, value, "Unsupported value type")),
        }
    }
}
