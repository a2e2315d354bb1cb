/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{borrow::Cow, fmt::Display};

pub enum Response<T> {
    Ok(Cow<'static, str>),
    Err(Cow<'static, str>),
    List(Vec<(u32, T)>),
    Message {
        bytes: Vec<u8>,
        lines: Option<u32>,
    },
    Capability,
}

impl<T: Display> Response<T> {
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Response::Ok(message) => {
                let mut buf = Vec::with_capacity(message.len() + 6);
                buf.extend_from_slice(b"+OK ");
                buf.extend_from_slice(message.as_bytes());
                buf.extend_from_slice(b"\r\n");
                buf
            }
            Response::Err(message) => {
                let mut buf = Vec::with_capacity(message.len() + 6);
                buf.extend_from_slice(b"-ERR ");
                buf.extend_from_slice(message.as_bytes());
                buf.extend_from_slice(b"\r\n");
                buf
            }
            Response::List(items) => {
                let mut buf = Vec::with_capacity(items.len() * 8 + 10);
                buf.extend_from_slice(format!("+OK {} messages\r\n", items.len()).as_bytes());
                for (num, item) in items {
                    buf.extend_from_slice(num.to_string().as_bytes());
                    buf.extend_from_slice(b" ");
                    buf.extend_from_slice(item.to_string().as_bytes());
                    buf.extend_from_slice(b"\r\n");
                }
                buf.extend_from_slice(b".\r\n");
                buf
            }
            Response::Message { bytes, lines } => {
                let mut buf = Vec::with_capacity(bytes.len() + 10);
                buf.extend_from_slice(b"+OK ");
                buf.extend_from_slice(bytes.len().to_string().as_bytes());
                buf.extend_from_slice(b" octets\r\n");

                let mut last_byte = b'\n';
                let mut line_len = 0;
                let mut in_body = false;
                let mut body_lines = 0;

                // Transparency procedure
                for &byte in bytes {
                    if lines.is_some_and(|lines| in_body && body_lines == lines) {
                        break;
                    }

                    if byte == b'\n' && last_byte != b'\r' {
                        buf.push(b'\r');
                    }
                    if byte == b'.' && last_byte == b'\n' {
                        buf.push(b'.');
                    }
                    buf.push(byte);
                    last_byte = byte;

                    match byte {
                        b'\n' => {
                            if in_body {
                                body_lines += 1;
                            } else if line_len == 0 {
                                in_body = true;
                            }
                            line_len = 0;
                        }
                        b'\r' => {}
                        _ => {
                            line_len += 1;
                        }
                    }
                }

                if last_byte != b'\n' {
                    buf.extend_from_slice(b"\r\n");
                }

                buf.extend_from_slice(b".\r\n");
                buf
            }
            Response::Capability => {
                let mut buf = Vec::with_capacity(128);
                buf.extend_from_slice(b"+OK Capability list follows\r\n");
                for capa in [
                    "USER",
                    "TOP",
                    "UIDL",
                    "PIPELINING",
                    "EXPIRE NEVER",
                    "IMPLEMENTATION Stalwart POP3",
                ] {
                    buf.extend_from_slice(capa.as_bytes());
                    buf.extend_from_slice(b"\r\n");
                }
                buf.extend_from_slice(b".\r\n");
                buf
            }
        }
    }
}

pub trait SerializeResponse {
    fn serialize(&self) -> Vec<u8>;
}

impl SerializeResponse for trc::Error {
    fn serialize(&self) -> Vec<u8> {
        let message = self
            .value_as_str(trc::Key::Details)
            .or_else(|| self.value_as_str(trc::Key::Reason))
            .unwrap_or("Internal Server Error");
        let mut buf = Vec::with_capacity(message.len() + 6);
        buf.extend_from_slice(b"-ERR ");
        buf.extend_from_slice(message.as_bytes());
        buf.extend_from_slice(b"\r\n");
        buf
    }
}
