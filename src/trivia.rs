//! Comments and white spaces.

use crate::reader::Reader;

#[inline(always)]
pub(crate) fn is_white_space_character(char: u8) -> bool {
    matches!(char, 0x00 | 0x09 | 0x0a | 0x0c | 0x0d | 0x20)
}

#[inline(always)]
pub(crate) fn is_delimiter_character(char: u8) -> bool {
    matches!(
        char,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

#[inline(always)]
pub(crate) fn is_regular_character(char: u8) -> bool {
    !is_white_space_character(char) && !is_delimiter_character(char)
}

#[inline(always)]
pub(crate) fn is_eol_character(char: u8) -> bool {
    matches!(char, 0x0a | 0x0d)
}

/// Skip a comment, which runs from `%` to the next end-of-line marker.
pub(crate) fn skip_comment(r: &mut Reader<'_>) -> Option<()> {
    r.forward_tag(b"%")?;
    r.forward_while(|b| !is_eol_character(b));

    Some(())
}
