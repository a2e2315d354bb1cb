/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::fmt::Display;

use tokenizer::Tokenizer;

use crate::schema::PropertyName;

pub mod header;
pub mod tokenizer;

#[derive(Debug)]
pub enum Error {
    Xml(Box<quick_xml::Error>),
    UnexpectedToken(Box<UnexpectedToken>),
}

#[derive(Debug)]
pub struct UnexpectedToken {
    pub expected: Option<Token>,
    pub found: Token,
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    ElementStart(PropertyName),
    ElementEnd,
    Text(String),
    Eof,
}

pub trait DavParser: Sized {
    fn parse(stream: &mut Tokenizer<'_>) -> Result<Self>;

    fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        Self::parse(&mut Tokenizer::new(bytes))
    }
}

impl Token {
    pub fn into_unexpected(self) -> Error {
        Error::UnexpectedToken(Box::new(UnexpectedToken {
            expected: None,
            found: self,
        }))
    }
}

impl PropertyName {
    pub fn into_unexpected(self) -> Error {
        Token::ElementStart(self).into_unexpected()
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::ElementStart(name) => write!(f, "element {name}"),
            Token::ElementEnd => f.write_str("end of element"),
            Token::Text(_) => f.write_str("text"),
            Token::Eof => f.write_str("end of document"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Xml(err) => write!(f, "Invalid XML: {err}"),
            Error::UnexpectedToken(token) => match &token.expected {
                Some(expected) => write!(f, "Expected {expected}, found {}", token.found),
                None => write!(f, "Unexpected {}", token.found),
            },
        }
    }
}

impl From<Error> for trc::Error {
    fn from(err: Error) -> Self {
        trc::ResourceEvent::BadParameters
            .into_err()
            .details("Failed to parse XML request body")
            .reason(err)
    }
}
