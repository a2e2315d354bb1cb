/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::schema::response::Condition;

use super::XmlWriter;

impl Condition {
    pub fn write_to(&self, xml: &mut XmlWriter) {
        xml.start_dav("error");
        self.write_condition(xml);
        xml.end_dav("error");
    }

    /// Standalone `DAV:error` body for non-multistatus failures.
    pub fn to_document(&self) -> String {
        let mut xml = XmlWriter::new();
        self.write_condition(&mut xml);
        xml.finish("error")
    }

    fn write_condition(&self, xml: &mut XmlWriter) {
        let (name, hrefs) = match self {
            Condition::LockTokenSubmitted(hrefs) => ("lock-token-submitted", hrefs.as_slice()),
            Condition::NoConflictingLock(hrefs) => ("no-conflicting-lock", hrefs.as_slice()),
            Condition::LockTokenMatchesRequestUri => ("lock-token-matches-request-uri", &[][..]),
            Condition::CannotModifyProtectedProperty => {
                ("cannot-modify-protected-property", &[][..])
            }
        };

        if hrefs.is_empty() {
            xml.empty_dav(name);
        } else {
            xml.start_dav(name);
            for href in hrefs {
                xml.href(href);
            }
            xml.end_dav(name);
        }
    }
}
