/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{
    parser::{DavParser, Token, tokenizer::Tokenizer},
    schema::{
        PropertyName,
        request::{Instruction, PropertyUpdate, PropertyValue},
    },
};

impl DavParser for PropertyUpdate {
    fn parse(stream: &mut Tokenizer<'_>) -> crate::parser::Result<Self> {
        stream.expect_element(&PropertyName::dav("propertyupdate"))?;
        let mut update = PropertyUpdate {
            instructions: Vec::with_capacity(4),
        };

        loop {
            match stream.token()? {
                Token::ElementStart(name) if name.is_dav_element("set") => {
                    stream.expect_element(&PropertyName::dav("prop"))?;
                    stream.collect_property_values(&mut update.instructions)?;
                    stream.expect_element_end()?;
                }
                Token::ElementStart(name) if name.is_dav_element("remove") => {
                    stream.expect_element(&PropertyName::dav("prop"))?;
                    update.instructions.extend(
                        stream
                            .collect_properties(Vec::new())?
                            .into_iter()
                            .map(Instruction::Remove),
                    );
                    stream.expect_element_end()?;
                }
                Token::ElementStart(_) => {
                    // Ignore unknown elements
                    stream.seek_element_end()?;
                }
                Token::ElementEnd | Token::Eof => {
                    break;
                }
                token => return Err(token.into_unexpected()),
            }
        }

        Ok(update)
    }
}

impl Tokenizer<'_> {
    pub fn collect_property_values(
        &mut self,
        instructions: &mut Vec<Instruction>,
    ) -> crate::parser::Result<()> {
        loop {
            match self.token()? {
                Token::ElementStart(name) => {
                    let value = self.collect_string_value()?;
                    instructions.push(Instruction::Set(PropertyValue { name, value }));
                }
                Token::ElementEnd => break,
                Token::Text(_) => {}
                Token::Eof => return Err(Token::Eof.into_unexpected()),
            }
        }

        Ok(())
    }
}
