/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use crate::{Condition, Depth, If, RequestHeaders, Timeout};

impl<'x> RequestHeaders<'x> {
    pub fn new(uri: &'x str) -> Self {
        RequestHeaders {
            uri,
            ..Default::default()
        }
    }

    /// Parses a request header, returning `false` when the header is unknown
    /// or its value is malformed.
    pub fn parse(&mut self, key: &str, value: &'x str) -> bool {
        hashify::fnc_map_ignore_case!(key.as_bytes(),
            "Depth" => {
                if let Some(depth) = Depth::parse(value) {
                    self.depth = depth;
                    return true;
                }
            },
            "Timeout" => {
                if let Some(timeout) = Timeout::parse(value) {
                    self.timeout = timeout;
                    return true;
                }
            },
            "Content-Type" => {
                self.content_type = Some(value.trim());
                return true;
            },
            "Lock-Token" => {
                if let Some(token) = parse_coded_url(value) {
                    self.lock_token = Some(token);
                    return true;
                }
            },
            "If" => {
                if let Some(if_) = If::parse(value) {
                    self.if_ = if_;
                    return true;
                }
            },
            _ => {}
        );

        false
    }
}

impl Depth {
    pub fn parse(value: &str) -> Option<Self> {
        hashify::tiny_map_ignore_case!(value.trim().as_bytes(),
            "0" => Depth::Zero,
            "1" => Depth::One,
            "infinity" => Depth::Infinity,
        )
    }
}

impl Timeout {
    /// Picks the first understood value from a comma separated list of
    /// preferences.
    pub fn parse(value: &str) -> Option<Self> {
        value.split(',').find_map(|value| {
            let value = value.trim();
            if value.eq_ignore_ascii_case("infinite") {
                Some(Timeout::Infinite)
            } else if value
                .get(..7)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("second-"))
            {
                value[7..].parse().ok().map(Timeout::Second)
            } else {
                None
            }
        })
    }
}

impl<'x> If<'x> {
    pub fn parse(value: &'x str) -> Option<Vec<If<'x>>> {
        let bytes = value.as_bytes();
        let mut pos = 0;
        let mut resource = None;
        let mut result = Vec::new();

        while let Some(&ch) = bytes.get(pos) {
            match ch {
                b'<' => {
                    let (tag, next) = delimited(value, pos, '>')?;
                    resource = Some(tag);
                    pos = next;
                }
                b'(' => {
                    pos += 1;
                    let mut list = Vec::new();
                    let mut is_not = false;

                    loop {
                        match *bytes.get(pos)? {
                            b')' => {
                                pos += 1;
                                break;
                            }
                            b'<' => {
                                let (token, next) = delimited(value, pos, '>')?;
                                list.push(Condition::StateToken { is_not, token });
                                is_not = false;
                                pos = next;
                            }
                            b'[' => {
                                let (tag, next) = delimited(value, pos, ']')?;
                                list.push(Condition::ETag { is_not, tag });
                                is_not = false;
                                pos = next;
                            }
                            b'N' | b'n'
                                if bytes[pos..]
                                    .get(..3)
                                    .is_some_and(|word| word.eq_ignore_ascii_case(b"not")) =>
                            {
                                is_not = true;
                                pos += 3;
                            }
                            ch if ch.is_ascii_whitespace() => pos += 1,
                            _ => return None,
                        }
                    }

                    if list.is_empty() {
                        return None;
                    }

                    result.push(If { resource, list });
                }
                ch if ch.is_ascii_whitespace() => pos += 1,
                _ => return None,
            }
        }

        if !result.is_empty() {
            Some(result)
        } else {
            None
        }
    }
}

fn delimited(value: &str, start: usize, end_ch: char) -> Option<(&str, usize)> {
    let inner = value.get(start + 1..)?;
    let end = inner.find(end_ch)?;
    Some((&inner[..end], start + end + 2))
}

fn parse_coded_url(value: &str) -> Option<&str> {
    let value = value.trim();
    value
        .strip_prefix('<')
        .and_then(|value| value.strip_suffix('>'))
        .or(Some(value))
        .filter(|value| !value.is_empty())
}
