/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    parser::{DavParser, Token, tokenizer::Tokenizer},
    schema::{PropertyName, request::PropFind},
};

impl DavParser for PropFind {
    fn parse(stream: &mut Tokenizer<'_>) -> crate::parser::Result<Self> {
        if stream.expect_element_or_eof(&PropertyName::dav("propfind"))? {
            match stream.token()? {
                Token::ElementStart(name) if name.is_dav_element("propname") => {
                    stream.seek_element_end()?;
                    Ok(PropFind::PropName)
                }
                Token::ElementStart(name) if name.is_dav_element("allprop") => {
                    stream.seek_element_end()?;
                    match stream.token()? {
                        Token::ElementStart(name) if name.is_dav_element("include") => {
                            stream.collect_properties(Vec::new()).map(PropFind::AllProp)
                        }
                        _ => Ok(PropFind::AllProp(vec![])),
                    }
                }
                Token::ElementStart(name) if name.is_dav_element("prop") => {
                    stream.collect_properties(Vec::new()).map(PropFind::Prop)
                }
                Token::ElementEnd => Ok(PropFind::AllProp(vec![])),
                token => Err(token.into_unexpected()),
            }
        } else {
            Ok(PropFind::AllProp(vec![]))
        }
    }
}
