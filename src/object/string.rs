//! Strings.

use crate::filter::ascii_hex::decode_hex_digit;
use crate::reader::{Readable, Reader};
use crate::trivia::is_white_space_character;
use log::warn;
use std::fmt::{Debug, Formatter};

/// A string object, holding an arbitrary sequence of bytes.
///
/// The written form (literal between parentheses, or hex between angle
/// brackets) is a pure encoding choice; two strings are equal if their
/// decoded bytes are.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct String(Vec<u8>);

impl String {
    /// Create a new string from its content.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(data.into())
    }

    /// Returns the content of the string.
    pub fn get(&self) -> &[u8] {
        &self.0
    }

    /// Consume the string and return its content.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<&[u8]> for String {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<&str> for String {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl Debug for String {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "({s})"),
            Err(_) => <[u8] as Debug>::fmt(&self.0, f),
        }
    }
}

impl Readable for String {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        match r.peek_byte()? {
            b'(' => read_literal(r).map(Self),
            b'<' => read_hex(r).map(Self),
            _ => None,
        }
    }
}

fn read_literal(r: &mut Reader<'_>) -> Option<Vec<u8>> {
    r.forward_tag(b"(")?;

    let mut out = vec![];
    let mut depth = 1;

    loop {
        match r.read_byte()? {
            b'(' => {
                depth += 1;
                out.push(b'(');
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                out.push(b')');
            }
            b'\\' => read_escape(r, &mut out)?,
            // An end-of-line marker inside a literal string is read as a
            // single LINE FEED, whichever of CR, LF or CRLF it was.
            b'\r' => {
                out.push(b'\n');
                r.forward_tag(b"\n");
            }
            b'\n' => out.push(b'\n'),
            other => out.push(other),
        }
    }

    Some(out)
}

fn read_escape(r: &mut Reader<'_>, out: &mut Vec<u8>) -> Option<()> {
    let next = r.read_byte()?;

    if is_octal_digit(next) {
        // Up to three octal digits; shorter sequences are allowed.
        let mut value = (next - b'0') as u16;

        for _ in 0..2 {
            match r.eat(is_octal_digit) {
                Some(digit) => value = value * 8 + (digit - b'0') as u16,
                None => break,
            }
        }

        if value > 255 {
            warn!("overflow while decoding octal string escape");
        } else {
            out.push(value as u8);
        }
    } else {
        match next {
            b'n' => out.push(0xa),
            b'r' => out.push(0xd),
            b't' => out.push(0x9),
            b'b' => out.push(0x8),
            b'f' => out.push(0xc),
            b'(' => out.push(b'('),
            b')' => out.push(b')'),
            b'\\' => out.push(b'\\'),
            // A reverse solidus followed by an end-of-line marker splits the
            // string across lines and produces no bytes.
            b'\r' => {
                r.forward_tag(b"\n");
            }
            b'\n' => {}
            other => out.push(other),
        }
    }

    Some(())
}

fn read_hex(r: &mut Reader<'_>) -> Option<Vec<u8>> {
    r.forward_tag(b"<")?;

    let mut digits = vec![];

    loop {
        let b = r.read_byte()?;

        if b == b'>' {
            break;
        } else if is_white_space_character(b) {
            continue;
        } else {
            digits.push(decode_hex_digit(b)?);
        }
    }

    // A final odd digit acts as if followed by zero.
    if digits.len() % 2 != 0 {
        digits.push(0);
    }

    Some(digits.chunks_exact(2).map(|d| d[0] << 4 | d[1]).collect())
}

fn is_octal_digit(byte: u8) -> bool {
    matches!(byte, b'0'..=b'7')
}
