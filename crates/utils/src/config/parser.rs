/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{iter::Peekable, str::Chars};

use ahash::AHashMap;

use super::{Config, Result};

const MAX_NEST_LEVEL: usize = 10;

// Flattens a TOML document into dotted keys. Array items are keyed by
// their zero-padded position.
struct TomlParser<'x, 'y> {
    keys: &'y mut Config,
    iter: Peekable<Chars<'x>>,
    line: usize,
    pos: usize,
    table_counts: AHashMap<String, usize>,
}

impl Config {
    pub fn new(toml: impl AsRef<str>) -> Result<Self> {
        let mut config = Config::default();
        config.parse(toml.as_ref())?;
        Ok(config)
    }

    pub fn parse(&mut self, toml: &str) -> Result<()> {
        let mut parser = TomlParser {
            keys: self,
            iter: toml.chars().peekable(),
            line: 1,
            pos: 0,
            table_counts: AHashMap::new(),
        };
        let mut table = String::new();

        while let Some(ch) = parser.next_non_space(true)? {
            match ch {
                '[' => {
                    let is_array = parser.iter.next_if_eq(&'[').is_some();
                    table = parser.key(if is_array { ']' } else { '\0' })?;
                    if is_array {
                        parser.expect_char(']')?;
                        parser.expect_char(']')?;
                        let count = parser.table_counts.entry(table.clone()).or_insert(0);
                        table = format!("{table}.{count:04}");
                        *count += 1;
                    } else {
                        parser.expect_char(']')?;
                    }
                    parser.expect_eol()?;
                }
                ch => {
                    let mut key = parser.key_with_first(ch, '=')?;
                    parser.expect_char('=')?;
                    if !table.is_empty() {
                        key = format!("{table}.{key}");
                    }
                    parser.value(key, 0)?;
                    parser.expect_eol()?;
                }
            }
        }

        Ok(())
    }
}

impl TomlParser<'_, '_> {
    fn next_char(&mut self) -> Option<char> {
        let ch = self.iter.next()?;
        if ch == '\n' {
            self.line += 1;
            self.pos = 0;
        } else {
            self.pos += 1;
        }
        Some(ch)
    }

    fn error(&self, message: impl AsRef<str>) -> String {
        format!(
            "{} at line {}, column {}.",
            message.as_ref(),
            self.line,
            self.pos
        )
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.iter.peek() {
            if *ch == '\n' {
                break;
            }
            self.next_char();
        }
    }

    fn next_non_space(&mut self, skip_newlines: bool) -> Result<Option<char>> {
        while let Some(ch) = self.next_char() {
            match ch {
                ' ' | '\t' | '\r' => {}
                '\n' if skip_newlines => {}
                '#' => self.skip_comment(),
                ch => return Ok(Some(ch)),
            }
        }

        Ok(None)
    }

    fn peek_non_space(&mut self, skip_newlines: bool) -> Option<char> {
        while let Some(ch) = self.iter.peek().copied() {
            match ch {
                ' ' | '\t' | '\r' => {
                    self.next_char();
                }
                '\n' if skip_newlines => {
                    self.next_char();
                }
                '#' => self.skip_comment(),
                ch => return Some(ch),
            }
        }

        None
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        match self.next_non_space(false)? {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(self.error(format!("Expected {expected:?} but found {ch:?}"))),
            None => Err(self.error(format!("Expected {expected:?} but found end of file"))),
        }
    }

    fn expect_eol(&mut self) -> Result<()> {
        match self.next_non_space(false)? {
            Some('\n') | None => Ok(()),
            Some(ch) => Err(self.error(format!("Expected end of line but found {ch:?}"))),
        }
    }

    fn key(&mut self, stop_char: char) -> Result<String> {
        match self.next_non_space(false)? {
            Some(ch) => self.key_with_first(ch, stop_char),
            None => Err(self.error("Unexpected end of file")),
        }
    }

    fn key_with_first(&mut self, first: char, stop_char: char) -> Result<String> {
        let mut key = String::new();
        let mut ch = Some(first);

        loop {
            match ch {
                Some(quote @ ('"' | '\'')) => {
                    key.push_str(&self.string(quote)?);
                }
                Some(ch @ ('a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-')) => {
                    key.push(ch);
                    while let Some(ch) = self.iter.next_if(|ch| {
                        ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-'
                    }) {
                        self.pos += 1;
                        key.push(ch);
                    }
                }
                Some(ch) => {
                    return Err(self.error(format!("Unexpected character {ch:?} in key")));
                }
                None => return Err(self.error("Unexpected end of file")),
            }

            match self.peek_non_space(false) {
                Some('.') => {
                    self.next_char();
                    key.push('.');
                    ch = self.next_non_space(false)?;
                }
                Some(']') | Some('=') => break,
                Some(ch) if ch == stop_char => break,
                Some(ch) => {
                    return Err(self.error(format!("Unexpected character {ch:?} after key")));
                }
                None => return Err(self.error("Unexpected end of file")),
            }
        }

        if key.is_empty() {
            Err(self.error("Empty key"))
        } else {
            Ok(key)
        }
    }

    fn string(&mut self, quote: char) -> Result<String> {
        let mut value = String::new();
        let is_literal = quote == '\'';

        while let Some(ch) = self.next_char() {
            match ch {
                ch if ch == quote => return Ok(value),
                '\n' => break,
                '\\' if !is_literal => match self.next_char() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('\'') => value.push('\''),
                    Some('u') => {
                        let mut code = String::with_capacity(4);
                        for _ in 0..4 {
                            if let Some(ch) = self.next_char() {
                                code.push(ch);
                            }
                        }
                        match u32::from_str_radix(&code, 16)
                            .ok()
                            .and_then(char::from_u32)
                        {
                            Some(ch) => value.push(ch),
                            None => {
                                return Err(self.error(format!("Invalid escape \\u{code}")));
                            }
                        }
                    }
                    Some(ch) => {
                        return Err(self.error(format!("Invalid escape sequence \\{ch}")));
                    }
                    None => break,
                },
                ch => value.push(ch),
            }
        }

        Err(self.error("Unterminated string"))
    }

    fn insert(&mut self, key: String, value: String) -> Result<()> {
        if self.keys.keys.insert(key.clone(), value).is_none() {
            Ok(())
        } else {
            Err(self.error(format!("Duplicate key {key:?}")))
        }
    }

    fn value(&mut self, key: String, nest_level: usize) -> Result<()> {
        if nest_level > MAX_NEST_LEVEL {
            return Err(self.error("Too many nested arrays or tables"));
        }

        match self.next_non_space(false)? {
            Some(quote @ ('"' | '\'')) => {
                let value = self.string(quote)?;
                self.insert(key, value)
            }
            Some('[') => {
                let mut index = 0;
                loop {
                    match self.peek_non_space(true) {
                        Some(']') => {
                            self.next_char();
                            break;
                        }
                        Some(',') if index > 0 => {
                            self.next_char();
                        }
                        Some(_) => {
                            self.value(format!("{key}.{index:04}"), nest_level + 1)?;
                            index += 1;
                        }
                        None => return Err(self.error("Unterminated array")),
                    }
                }
                Ok(())
            }
            Some('{') => {
                loop {
                    match self.peek_non_space(false) {
                        Some('}') => {
                            self.next_char();
                            break;
                        }
                        Some(',') => {
                            self.next_char();
                        }
                        Some(_) => {
                            let sub_key = self.key('=')?;
                            self.expect_char('=')?;
                            self.value(format!("{key}.{sub_key}"), nest_level + 1)?;
                        }
                        None => return Err(self.error("Unterminated inline table")),
                    }
                }
                Ok(())
            }
            Some(ch) => {
                let mut value = String::from(ch);
                while let Some(ch) = self
                    .iter
                    .next_if(|ch| !matches!(ch, '\n' | '\r' | ',' | ']' | '}' | '#'))
                {
                    self.pos += 1;
                    value.push(ch);
                }
                let value = value.trim_end().to_string();
                if value.is_empty() {
                    Err(self.error("Empty value"))
                } else {
                    self.insert(key, value)
                }
            }
            None => Err(self.error("Expected value but found end of file")),
        }
    }
}
