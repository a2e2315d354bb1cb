/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{borrow::Cow, slice::Iter};

use super::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    NeedsMoreData,
    Parse(Cow<'static, str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    User,
    Pass,
    Apop,
    Quit,
    Stat,
    List,
    Retr,
    Dele,
    Noop,
    Rset,
    Top,
    Uidl,
    Capa,
}

pub const DEFAULT_MAX_REQUEST_SIZE: usize = 8192;

/// Incremental line parser. Bytes are buffered until a line feed is
/// received; lines longer than the limit are discarded up to the next
/// line feed and reported as a single parse error.
#[derive(Debug)]
pub struct Parser {
    buf: Vec<u8>,
    max_request_size: usize,
    overflow: bool,
}

impl Parser {
    pub fn new(max_request_size: usize) -> Self {
        Parser {
            buf: Vec::with_capacity(64),
            max_request_size,
            overflow: false,
        }
    }

    pub fn parse(&mut self, bytes: &mut Iter<'_, u8>) -> Result<Command, Error> {
        for &byte in bytes {
            match byte {
                b'\n' => {
                    let result = if self.overflow {
                        self.overflow = false;
                        Err(Error::Parse("Request too long.".into()))
                    } else {
                        parse_line(self.buf.strip_suffix(b"\r").unwrap_or(&self.buf[..]))
                    };
                    self.buf.clear();
                    return result;
                }
                _ if self.buf.len() < self.max_request_size => {
                    self.buf.push(byte);
                }
                _ => {
                    self.overflow = true;
                }
            }
        }

        Err(Error::NeedsMoreData)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new(DEFAULT_MAX_REQUEST_SIZE)
    }
}

fn parse_line(line: &[u8]) -> Result<Command, Error> {
    let line = std::str::from_utf8(line).map_err(|_| Error::Parse("Invalid UTF-8.".into()))?;
    let line = line.trim_start();
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let verb = hashify::tiny_map_ignore_case!(verb.as_bytes(),
        "USER" => Verb::User,
        "PASS" => Verb::Pass,
        "APOP" => Verb::Apop,
        "QUIT" => Verb::Quit,
        "STAT" => Verb::Stat,
        "LIST" => Verb::List,
        "RETR" => Verb::Retr,
        "DELE" => Verb::Dele,
        "NOOP" => Verb::Noop,
        "RSET" => Verb::Rset,
        "TOP" => Verb::Top,
        "UIDL" => Verb::Uidl,
        "CAPA" => Verb::Capa,
    )
    .ok_or_else(|| {
        if verb.is_empty() {
            Error::Parse("Empty command.".into())
        } else {
            Error::Parse(format!("Unknown command {:?}.", verb).into())
        }
    })?;

    let mut args = rest.split_ascii_whitespace();
    let command = match verb {
        Verb::User => Command::User {
            name: args
                .next()
                .ok_or_else(|| Error::Parse("Missing user name.".into()))?
                .to_string(),
        },
        Verb::Apop => Command::Apop {
            name: args
                .next()
                .ok_or_else(|| Error::Parse("Missing user name.".into()))?
                .to_string(),
            digest: args
                .next()
                .ok_or_else(|| Error::Parse("Missing digest.".into()))?
                .to_string(),
        },
        Verb::Quit => Command::Quit,
        Verb::Stat => Command::Stat,
        Verb::Noop => Command::Noop,
        Verb::Rset => Command::Rset,
        Verb::Capa => Command::Capa,
        Verb::List => Command::List {
            msg: args.next().map(parse_msg).transpose()?,
        },
        Verb::Uidl => Command::Uidl {
            msg: args.next().map(parse_msg).transpose()?,
        },
        Verb::Retr => Command::Retr {
            msg: parse_msg(args.next().unwrap_or_default())?,
        },
        Verb::Dele => Command::Dele {
            msg: parse_msg(args.next().unwrap_or_default())?,
        },
        Verb::Top => Command::Top {
            msg: parse_msg(args.next().unwrap_or_default())?,
            n: args
                .next()
                .and_then(|n| n.parse::<u32>().ok())
                .ok_or_else(|| Error::Parse("Invalid number of lines.".into()))?,
        },
        Verb::Pass => {
            // Passwords may contain spaces
            return if !rest.is_empty() {
                Ok(Command::Pass {
                    string: rest.to_string(),
                })
            } else {
                Err(Error::Parse("Missing password.".into()))
            };
        }
    };

    if args.next().is_none() {
        Ok(command)
    } else {
        Err(Error::Parse("Too many arguments.".into()))
    }
}

fn parse_msg(value: &str) -> Result<u32, Error> {
    match value.parse::<u32>() {
        Ok(msg) if msg > 0 => Ok(msg),
        _ => Err(Error::Parse("Invalid message number.".into())),
    }
}
