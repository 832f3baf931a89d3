//! Names.

use crate::filter::ascii_hex::decode_hex_digit;
use crate::reader::{Readable, Reader};
use crate::trivia::is_regular_character;
use core::borrow::Borrow;
use core::fmt::{self, Debug, Formatter};
use core::ops::Deref;
use smallvec::SmallVec;

type NameInner = SmallVec<[u8; 31]>;

/// A PDF name object.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(NameInner);

impl Deref for Name {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Name {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for Name {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl Name {
    /// Create a new name from a sequence of bytes, decoding `#hh` escapes.
    pub fn new(data: &[u8]) -> Self {
        if !data.contains(&b'#') {
            Self(SmallVec::from_slice(data))
        } else {
            let mut result = SmallVec::new();
            let mut r = Reader::new(data);

            while let Some(b) = r.read_byte() {
                if b == b'#'
                    && let Some(hex) = r.peek_bytes(2)
                    && let Some(high) = decode_hex_digit(hex[0])
                    && let Some(low) = decode_hex_digit(hex[1])
                {
                    result.push(high << 4 | low);
                    r.skip_bytes(2);
                } else {
                    result.push(b);
                }
            }

            Self(result)
        }
    }

    /// Create a new name from raw bytes, taking them verbatim.
    pub fn from_unescaped(data: &[u8]) -> Self {
        Self(SmallVec::from_slice(data))
    }

    /// Return a string representation of the name.
    ///
    /// Returns a placeholder in case the name is not UTF-8 encoded.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or("{non-ascii name}")
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match core::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "/{s}"),
            Err(_) => <[u8] as Debug>::fmt(&self.0, f),
        }
    }
}

impl Readable for Name {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let start = r.offset();
        skip_name(r)?;
        let end = r.offset();

        // Exclude the leading solidus.
        let data = r.range(start + 1..end)?;
        Some(Self::new(data))
    }
}

fn skip_name(r: &mut Reader<'_>) -> Option<()> {
    r.forward_tag(b"/")?;

    while let Some(b) = r.eat(is_regular_character) {
        if b == b'#' {
            r.eat(|n| n.is_ascii_hexdigit())?;
            r.eat(|n| n.is_ascii_hexdigit())?;
        }
    }

    Some(())
}

#[cfg(test)]
mod tests {
    use crate::object::Name;
    use crate::reader::Reader;
    use std::ops::Deref;

    fn name_impl(data: &[u8]) -> Option<Name> {
        Reader::new(data).read::<Name>()
    }

    #[test]
    fn name_1() {
        assert_eq!(name_impl(b"/").unwrap().deref(), b"");
    }

    #[test]
    fn name_2() {
        assert!(name_impl(b"dfg").is_none());
    }

    #[test]
    fn name_3() {
        assert!(name_impl(b"/AB#FG").is_none());
    }

    #[test]
    fn name_4() {
        assert_eq!(name_impl(b"/Name1").unwrap().deref(), b"Name1");
    }

    #[test]
    fn name_5() {
        assert_eq!(
            name_impl(b"/A;Name_With-Various***Characters?").unwrap().deref(),
            b"A;Name_With-Various***Characters?"
        );
    }

    #[test]
    fn name_6() {
        assert_eq!(name_impl(b"/1.2").unwrap().deref(), b"1.2");
    }

    #[test]
    fn name_7() {
        assert_eq!(name_impl(b"/lime#20Green").unwrap().deref(), b"lime Green");
    }

    #[test]
    fn name_8() {
        assert_eq!(
            name_impl(b"/paired#28#29parentheses").unwrap().deref(),
            b"paired()parentheses"
        );
    }

    #[test]
    fn name_9() {
        assert_eq!(name_impl(b"/A#3b").unwrap().deref(), b"A;");
    }

    #[test]
    fn name_10() {
        assert_eq!(name_impl(b"/A#3B").unwrap().deref(), b"A;");
    }

    #[test]
    fn name_trailing() {
        assert_eq!(name_impl(b"/k1  ").unwrap().deref(), b"k1");
    }
}
