/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    parser::{DavParser, Token, tokenizer::Tokenizer},
    schema::{
        PropertyName,
        property::{LockScope, LockType},
        request::LockInfo,
    },
};

impl DavParser for LockInfo {
    fn parse(stream: &mut Tokenizer<'_>) -> crate::parser::Result<Self> {
        stream.expect_element(&PropertyName::dav("lockinfo"))?;
        let mut lock = LockInfo::default();

        loop {
            match stream.token()? {
                Token::ElementStart(name) if name.is_dav_element("lockscope") => {
                    let scope = stream.unwrap_element()?;
                    lock.lock_scope = if scope.is_dav_element("shared") {
                        LockScope::Shared
                    } else if scope.is_dav_element("exclusive") {
                        LockScope::Exclusive
                    } else {
                        return Err(scope.into_unexpected());
                    };
                    stream.seek_element_end()?;
                    stream.expect_element_end()?;
                }
                Token::ElementStart(name) if name.is_dav_element("locktype") => {
                    let typ = stream.unwrap_element()?;
                    lock.lock_type = if typ.is_dav_element("write") {
                        LockType::Write
                    } else {
                        LockType::Other
                    };
                    stream.seek_element_end()?;
                    stream.expect_element_end()?;
                }
                Token::ElementStart(name) if name.is_dav_element("owner") => {
                    lock.owner = stream.collect_string_value()?;
                }
                Token::ElementStart(_) => {
                    stream.seek_element_end()?;
                }
                Token::ElementEnd | Token::Eof => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(lock)
    }
}
