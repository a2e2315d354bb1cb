/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use hyper::StatusCode;

use crate::schema::response::{MultiStatus, Prop, PropStat, Response, ResponseType};

use super::{PropertyRenderer, XmlWriter};

impl MultiStatus {
    pub fn new(response: Vec<Response>) -> Self {
        MultiStatus {
            response,
            response_description: None,
        }
    }

    pub fn add_response(&mut self, response: Response) {
        self.response.push(response);
    }

    pub fn with_response_description(mut self, response_description: impl Into<String>) -> Self {
        self.response_description = Some(response_description.into());
        self
    }

    pub fn render(&self, renderer: &impl PropertyRenderer) -> trc::Result<String> {
        let mut xml = XmlWriter::new();
        for response in &self.response {
            response.write_to(&mut xml, renderer)?;
        }
        xml.response_description(self.response_description.as_deref());
        Ok(xml.finish("multistatus"))
    }
}

impl Response {
    pub fn new_propstat(href: impl Into<String>, propstat: Vec<PropStat>) -> Self {
        Response {
            href: href.into(),
            typ: ResponseType::PropStat(propstat),
            error: None,
            response_description: None,
        }
    }

    pub fn new_status(href: impl Into<String>, status: StatusCode) -> Self {
        Response {
            href: href.into(),
            typ: ResponseType::Status(status),
            error: None,
            response_description: None,
        }
    }

    pub fn with_response_description(mut self, response_description: impl Into<String>) -> Self {
        self.response_description = Some(response_description.into());
        self
    }

    /// Propstat entry with the given status, if present.
    pub fn propstat(&self, status: StatusCode) -> Option<&PropStat> {
        match &self.typ {
            ResponseType::PropStat(list) => list.iter().find(|p| p.status == status),
            ResponseType::Status(_) => None,
        }
    }

    fn write_to(&self, xml: &mut XmlWriter, renderer: &impl PropertyRenderer) -> trc::Result<()> {
        xml.start_dav("response").href(&self.href);
        match &self.typ {
            ResponseType::PropStat(list) => {
                for propstat in list {
                    propstat.write_to(xml, renderer)?;
                }
            }
            ResponseType::Status(status) => {
                xml.status(*status);
            }
        }
        if let Some(error) = &self.error {
            error.write_to(xml);
        }
        xml.response_description(self.response_description.as_deref())
            .end_dav("response");
        Ok(())
    }
}

impl PropStat {
    pub fn new(status: StatusCode) -> Self {
        PropStat {
            prop: Vec::new(),
            status,
            response_description: None,
        }
    }

    pub fn new_list(status: StatusCode, prop: Vec<Prop>) -> Self {
        PropStat {
            prop,
            status,
            response_description: None,
        }
    }

    pub fn with_prop(mut self, prop: Prop) -> Self {
        self.prop.push(prop);
        self
    }

    pub fn with_response_description(mut self, response_description: impl Into<String>) -> Self {
        self.response_description = Some(response_description.into());
        self
    }

    fn write_to(&self, xml: &mut XmlWriter, renderer: &impl PropertyRenderer) -> trc::Result<()> {
        xml.start_dav("propstat").start_dav("prop");
        for prop in &self.prop {
            match prop.typ {
                Some(typ) => renderer.render(xml, &prop.name, typ, &prop.value)?,
                None => {
                    xml.empty(&prop.name);
                }
            }
        }
        xml.end_dav("prop")
            .status(self.status)
            .response_description(self.response_description.as_deref())
            .end_dav("propstat");
        Ok(())
    }
}
