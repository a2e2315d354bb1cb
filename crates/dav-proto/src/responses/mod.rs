/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod error;
pub mod lock;
pub mod multistatus;

use std::fmt::Write;

use compact_str::CompactString;
use hyper::StatusCode;

use crate::schema::{
    NS_DAV, PropertyName,
    property::{DavValue, ValueType},
};

/// Serializes a property value into its XML element.
pub trait PropertyRenderer {
    fn render(
        &self,
        xml: &mut XmlWriter,
        name: &PropertyName,
        typ: ValueType,
        value: &DavValue,
    ) -> trc::Result<()>;
}

/// Incremental XML builder. `DAV:` is always bound to the `D` prefix,
/// any other namespace gets a generated `nsN` prefix that is declared on
/// the root element when the document is finished.
#[derive(Debug, Default)]
pub struct XmlWriter {
    buf: String,
    namespaces: Vec<CompactString>,
}

trait XmlEscape {
    fn write_escaped_to(&self, out: &mut impl Write) -> std::fmt::Result;
}

impl<T: AsRef<str>> XmlEscape for T {
    fn write_escaped_to(&self, out: &mut impl Write) -> std::fmt::Result {
        for c in self.as_ref().chars() {
            match c {
                '<' => out.write_str("&lt;")?,
                '>' => out.write_str("&gt;")?,
                '&' => out.write_str("&amp;")?,
                '"' => out.write_str("&quot;")?,
                '\'' => out.write_str("&apos;")?,
                _ => out.write_char(c)?,
            }
        }

        Ok(())
    }
}

impl XmlWriter {
    pub fn new() -> Self {
        XmlWriter::default()
    }

    fn write_name(&mut self, name: &PropertyName) {
        if name.ns == NS_DAV {
            self.buf.push_str("D:");
        } else if !name.ns.is_empty() {
            let idx = match self.namespaces.iter().position(|ns| ns == &name.ns) {
                Some(idx) => idx,
                None => {
                    self.namespaces.push(name.ns.clone());
                    self.namespaces.len() - 1
                }
            };
            let _ = write!(self.buf, "ns{}:", idx + 1);
        }
        self.buf.push_str(&name.name);
    }

    pub fn start(&mut self, name: &PropertyName) -> &mut Self {
        self.buf.push('<');
        self.write_name(name);
        self.buf.push('>');
        self
    }

    pub fn end(&mut self, name: &PropertyName) -> &mut Self {
        self.buf.push_str("</");
        self.write_name(name);
        self.buf.push('>');
        self
    }

    pub fn empty(&mut self, name: &PropertyName) -> &mut Self {
        self.buf.push('<');
        self.write_name(name);
        self.buf.push_str("/>");
        self
    }

    pub fn empty_with_attrs(&mut self, name: &PropertyName, attrs: &[(&str, &str)]) -> &mut Self {
        self.buf.push('<');
        self.write_name(name);
        for (key, value) in attrs {
            let _ = write!(self.buf, " {key}=\"");
            let _ = value.write_escaped_to(&mut self.buf);
            self.buf.push('"');
        }
        self.buf.push_str("/>");
        self
    }

    pub fn start_dav(&mut self, name: &str) -> &mut Self {
        let _ = write!(self.buf, "<D:{name}>");
        self
    }

    pub fn end_dav(&mut self, name: &str) -> &mut Self {
        let _ = write!(self.buf, "</D:{name}>");
        self
    }

    pub fn empty_dav(&mut self, name: &str) -> &mut Self {
        let _ = write!(self.buf, "<D:{name}/>");
        self
    }

    pub fn text(&mut self, text: impl AsRef<str>) -> &mut Self {
        let _ = text.write_escaped_to(&mut self.buf);
        self
    }

    pub fn cdata(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.buf.push_str("<![CDATA[");
        self.buf
            .push_str(&text.as_ref().replace("]]>", "]]]]><![CDATA[>"));
        self.buf.push_str("]]>");
        self
    }

    pub fn element_text(&mut self, name: &PropertyName, text: impl AsRef<str>) -> &mut Self {
        self.start(name).text(text).end(name)
    }

    pub fn dav_text(&mut self, name: &str, text: impl AsRef<str>) -> &mut Self {
        self.start_dav(name).text(text).end_dav(name)
    }

    pub fn href(&mut self, href: impl AsRef<str>) -> &mut Self {
        self.dav_text("href", href)
    }

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        let _ = write!(self.buf, "<D:status>HTTP/1.1 {status}</D:status>");
        self
    }

    pub fn response_description(&mut self, description: Option<&str>) -> &mut Self {
        if let Some(description) = description {
            self.dav_text("responsedescription", description);
        }
        self
    }

    /// Wraps the written content in a `DAV:` root element declaring every
    /// namespace used.
    pub fn finish(self, root: &str) -> String {
        let mut out = String::with_capacity(self.buf.len() + 128);
        let _ = write!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><D:{root} xmlns:D=\"DAV:\""
        );
        for (idx, ns) in self.namespaces.iter().enumerate() {
            let _ = write!(out, " xmlns:ns{}=\"", idx + 1);
            let _ = ns.write_escaped_to(&mut out);
            out.push('"');
        }
        out.push('>');
        out.push_str(&self.buf);
        let _ = write!(out, "</D:{root}>");
        out
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}
