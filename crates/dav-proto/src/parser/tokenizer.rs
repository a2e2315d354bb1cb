/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use compact_str::CompactString;
use quick_xml::{
    NsReader,
    events::{BytesRef, Event},
    name::{NamespaceError, ResolveResult},
};

use crate::schema::PropertyName;

use super::{Error, Token, UnexpectedToken};

pub struct Tokenizer<'x> {
    xml: NsReader<&'x [u8]>,
    last_is_end: bool,
}

impl<'x> Tokenizer<'x> {
    pub fn new(input: &'x [u8]) -> Self {
        Self {
            xml: NsReader::from_reader(input),
            last_is_end: false,
        }
    }

    pub fn token(&mut self) -> super::Result<Token> {
        self.next_token(true)
    }

    fn next_token(&mut self, skip_whitespace: bool) -> super::Result<Token> {
        loop {
            if self.last_is_end {
                self.last_is_end = false;
                return Ok(Token::ElementEnd);
            }

            let (resolve_result, event) = self.xml.read_resolved_event()?;
            let tag = match event {
                Event::Start(tag) => tag,
                Event::Empty(tag) => {
                    self.last_is_end = true;
                    tag
                }
                Event::End(_) => {
                    return Ok(Token::ElementEnd);
                }
                Event::Text(text) => {
                    if skip_whitespace && text.iter().all(|ch| ch.is_ascii_whitespace()) {
                        continue;
                    }
                    return Ok(Token::Text(String::from_utf8_lossy(&text).into_owned()));
                }
                Event::GeneralRef(entity) => return Ok(Token::Text(resolve_entity(&entity))),
                Event::CData(bytes) => {
                    return Ok(Token::Text(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Event::Eof => return Ok(Token::Eof),
                _ => {
                    continue;
                }
            };

            let ns = match resolve_result {
                ResolveResult::Bound(ns) => CompactString::from_utf8_lossy(ns.as_ref()),
                ResolveResult::Unbound => CompactString::default(),
                ResolveResult::Unknown(p) => {
                    return Err(Error::Xml(Box::new(quick_xml::Error::Namespace(
                        NamespaceError::UnknownPrefix(p),
                    ))));
                }
            };

            return Ok(Token::ElementStart(PropertyName {
                ns,
                name: CompactString::from_utf8_lossy(tag.local_name().as_ref()),
            }));
        }
    }

    pub fn unwrap_element(&mut self) -> super::Result<PropertyName> {
        match self.token()? {
            Token::ElementStart(name) => Ok(name),
            found => Err(found.into_unexpected()),
        }
    }

    pub fn expect_element(&mut self, expected: &PropertyName) -> super::Result<()> {
        match self.token()? {
            Token::ElementStart(name) if &name == expected => Ok(()),
            found => Err(unexpected(Token::ElementStart(expected.clone()), found)),
        }
    }

    pub fn expect_element_or_eof(&mut self, expected: &PropertyName) -> super::Result<bool> {
        match self.token()? {
            Token::ElementStart(name) if &name == expected => Ok(true),
            Token::Eof => Ok(false),
            found => Err(unexpected(Token::ElementStart(expected.clone()), found)),
        }
    }

    pub fn expect_element_end(&mut self) -> super::Result<()> {
        match self.token()? {
            Token::ElementEnd => Ok(()),
            found => Err(unexpected(Token::ElementEnd, found)),
        }
    }

    pub fn seek_element_end(&mut self) -> super::Result<()> {
        let mut depth = 1;
        loop {
            match self.token()? {
                Token::ElementStart { .. } => depth += 1,
                Token::ElementEnd => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Token::Eof => return Err(Token::Eof.into_unexpected()),
                Token::Text(_) => {}
            }
        }
    }

    /// Concatenates every text fragment up to the end of the current
    /// element, descending into children.
    pub fn collect_string_value(&mut self) -> super::Result<Option<String>> {
        let mut depth = 1;
        let mut value = String::new();

        loop {
            match self.next_token(false)? {
                Token::ElementStart { .. } => depth += 1,
                Token::ElementEnd => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Token::Text(text) => {
                    value.push_str(&text);
                }
                Token::Eof => return Err(Token::Eof.into_unexpected()),
            }
        }

        let value = value.trim();
        Ok(if !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        })
    }

    /// Collects the names of the children of a `prop` element, consuming
    /// its end tag.
    pub fn collect_properties(
        &mut self,
        mut properties: Vec<PropertyName>,
    ) -> super::Result<Vec<PropertyName>> {
        loop {
            match self.token()? {
                Token::ElementStart(name) => {
                    self.seek_element_end()?;
                    if !properties.contains(&name) {
                        properties.push(name);
                    }
                }
                Token::ElementEnd => break,
                Token::Text(_) => {}
                Token::Eof => return Err(Token::Eof.into_unexpected()),
            }
        }

        Ok(properties)
    }
}

fn resolve_entity(entity: &BytesRef<'_>) -> String {
    match entity.as_ref() {
        b"lt" => "<".to_string(),
        b"gt" => ">".to_string(),
        b"amp" => "&".to_string(),
        b"apos" => "'".to_string(),
        b"quot" => "\"".to_string(),
        _ => match entity.resolve_char_ref() {
            Ok(Some(ch)) => ch.to_string(),
            _ => String::from_utf8_lossy(entity.as_ref()).into_owned(),
        },
    }
}

fn unexpected(expected: Token, found: Token) -> Error {
    Error::UnexpectedToken(Box::new(UnexpectedToken {
        expected: Some(expected),
        found,
    }))
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize() {
        let input = r#"<?xml version="1.0" encoding="utf-8" ?>
            <D:propfind xmlns:D="DAV:" xmlns:Z="http://ns.example.com/z/">
                <D:prop>
                    <D:getetag/>
                    <Z:Authors>Jane Doe</Z:Authors>
                    <plain/>
                </D:prop>
            </D:propfind>"#;

        let mut tokenizer = Tokenizer::new(input.as_bytes());
        let mut result = vec![];
        loop {
            match tokenizer.token().unwrap() {
                Token::Eof => break,
                token => result.push(token),
            }
        }

        assert_eq!(
            result,
            vec![
                Token::ElementStart(PropertyName::dav("propfind")),
                Token::ElementStart(PropertyName::dav("prop")),
                Token::ElementStart(PropertyName::dav("getetag")),
                Token::ElementEnd,
                Token::ElementStart(PropertyName::new("http://ns.example.com/z/", "Authors")),
                Token::Text("Jane Doe".into()),
                Token::ElementEnd,
                Token::ElementStart(PropertyName::new("", "plain")),
                Token::ElementEnd,
                Token::ElementEnd,
                Token::ElementEnd,
            ]
        );
    }

    #[test]
    fn collect_text_value() {
        let input = r#"<Z:Authors xmlns:Z="urn:z">  Jane &amp; <Z:b>John</Z:b> <![CDATA[<x>]]> </Z:Authors>"#;
        let mut tokenizer = Tokenizer::new(input.as_bytes());
        tokenizer
            .expect_element(&PropertyName::new("urn:z", "Authors"))
            .unwrap();
        assert_eq!(
            tokenizer.collect_string_value().unwrap().as_deref(),
            Some("Jane & John <x>")
        );
    }

    #[test]
    fn unknown_prefix() {
        let mut tokenizer = Tokenizer::new(b"<X:prop/>");
        assert!(matches!(tokenizer.token(), Err(Error::Xml(_))));
    }
}
