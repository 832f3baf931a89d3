//! Numbers.

use crate::object::Object;
use crate::reader::{Readable, Reader};
use log::debug;
use std::str::FromStr;

pub(crate) fn is_digit(byte: u8) -> bool {
    byte.is_ascii_digit()
}

/// Skip a numeric token: an optional sign followed by digits, with at most
/// one decimal point somewhere among them.
pub(crate) fn skip_number(r: &mut Reader<'_>) -> Option<()> {
    r.forward_if(|b| b == b'+' || b == b'-');

    match r.peek_byte()? {
        b'.' => {
            r.read_byte()?;
            r.forward_while_1(is_digit)?;
        }
        b'0'..=b'9' => {
            r.forward_while_1(is_digit)?;
            if r.forward_tag(b".").is_some() {
                r.forward_while(is_digit);
            }
        }
        _ => return None,
    }

    Some(())
}

/// Read a numeric object. A token containing a decimal point is a real,
/// anything else is an integer.
pub(crate) fn read_number(r: &mut Reader<'_>) -> Option<Object> {
    let start = r.offset();
    skip_number(r)?;
    let data = r.range(start..r.offset())?;
    let text = std::str::from_utf8(data).ok()?;

    if text.contains('.') {
        Some(Object::Real(f64::from_str(text).ok()?))
    } else {
        Some(Object::Integer(i64::from_str(text).ok()?))
    }
}

impl Readable for i64 {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        match read_number(r)? {
            Object::Integer(i) => Some(i),
            Object::Real(real) => {
                let truncated = real.trunc() as i64;
                debug!("real {real} was truncated to {truncated}");

                Some(truncated)
            }
            _ => None,
        }
    }
}

impl Readable for f64 {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        read_number(r)?.as_f64()
    }
}

// Unlike `i64`, the unsigned readers reject real tokens outright. They sit
// on the object-reference lookahead path, where `1.5 2 R` must stay a real
// followed by further objects instead of collapsing into a reference.
macro_rules! int_num {
    ($i:ident) => {
        impl Readable for $i {
            fn read(r: &mut Reader<'_>) -> Option<$i> {
                match read_number(r)? {
                    Object::Integer(n) => n.try_into().ok(),
                    _ => None,
                }
            }
        }
    };
}

int_num!(u8);
int_num!(u16);
int_num!(u32);
int_num!(u64);
int_num!(usize);
