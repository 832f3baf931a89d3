//! Streams.

use crate::filter::Filters;
use crate::object::dict::keys::LENGTH;
use crate::object::{Dict, Object};
use crate::reader::{Readable, Reader, find};
use crate::trivia::is_eol_character;
use std::fmt::{Debug, Formatter};

/// A stream object: a dictionary together with a raw byte payload.
///
/// The dictionary's `Length` entry declares the exact byte count of the
/// payload. `Length` may be an indirect reference, in which case the payload
/// boundary can only be settled once the reference is resolved; the object
/// store does this when such a stream is fetched.
#[derive(Clone, PartialEq)]
pub struct Stream {
    dict: Dict,
    data: Vec<u8>,
}

impl Stream {
    /// Create a new stream from a dictionary and a payload.
    pub fn new(dict: Dict, data: Vec<u8>) -> Self {
        Self { dict, data }
    }

    /// Return the dictionary of the stream.
    pub fn dict(&self) -> &Dict {
        &self.dict
    }

    /// Return a mutable reference to the dictionary of the stream.
    pub fn dict_mut(&mut self) -> &mut Dict {
        &mut self.dict
    }

    /// Return the raw (potentially filtered) payload of the stream.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Truncate the payload to the given number of bytes.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Return the decoded payload of the stream, applying the filter chain
    /// declared in its dictionary.
    ///
    /// The result is not cached, so calling this multiple times is expensive.
    pub fn decoded(&self, filters: &Filters) -> Option<Vec<u8>> {
        filters.decode_stream(self)
    }

    /// Parse the payload of a stream whose dictionary has already been read.
    ///
    /// The reader must be positioned right after the dictionary.
    pub(crate) fn read_payload(r: &mut Reader<'_>, dict: Dict) -> Option<Self> {
        r.skip_white_spaces_and_comments();
        r.forward_tag(b"stream")?;
        // The keyword is followed by a single line feed, optionally preceded
        // by a carriage return.
        r.forward_tag(b"\r\n").or_else(|| r.forward_tag(b"\n"))?;

        let data = match dict.get(LENGTH) {
            Some(Object::Integer(len)) => {
                let data = r.read_bytes((*len).try_into().ok()?)?.to_vec();
                r.skip_white_spaces();
                r.forward_tag(b"endstream")?;

                data
            }
            // `Length` is an indirect reference (or missing): the payload
            // runs up to the closing keyword and the store truncates it once
            // the reference is resolved.
            _ => {
                let start = r.offset();
                let rest = r.tail()?;
                let end = find(rest, b"endstream")?;

                r.jump(start + end);
                r.forward_tag(b"endstream")?;

                trim_trailing_eol(&rest[..end]).to_vec()
            }
        };

        Some(Stream { dict, data })
    }
}

/// Strip the end-of-line marker that separates the payload from `endstream`.
fn trim_trailing_eol(data: &[u8]) -> &[u8] {
    match data {
        [head @ .., b'\r', b'\n'] => head,
        [head @ .., b] if is_eol_character(*b) => head,
        _ => data,
    }
}

impl Debug for Stream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stream (len: {:?})", self.data.len())
    }
}

impl Readable for Stream {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let dict = r.read::<Dict>()?;

        Self::read_payload(r, dict)
    }
}

#[cfg(test)]
mod tests {
    use crate::object::Stream;
    use crate::reader::Reader;

    #[test]
    fn stream_1() {
        let data = b"<< /Length 10 >> stream\nabcdefghij\nendstream";
        let stream = Reader::new(data).read::<Stream>().unwrap();

        assert_eq!(stream.raw_data(), b"abcdefghij");
    }

    #[test]
    fn stream_crlf() {
        let data = b"<< /Length 3 >> stream\r\nabc\r\nendstream";
        let stream = Reader::new(data).read::<Stream>().unwrap();

        assert_eq!(stream.raw_data(), b"abc");
    }

    #[test]
    fn stream_indirect_length() {
        // The length is a reference, so the payload runs up to `endstream`.
        let data = b"<< /Length 8 0 R >> stream\nabcdefghij\nendstream";
        let stream = Reader::new(data).read::<Stream>().unwrap();

        assert_eq!(stream.raw_data(), b"abcdefghij");
    }

    #[test]
    fn stream_missing_newline() {
        assert!(
            Reader::new(b"<< /Length 3 >> stream abc\nendstream")
                .read::<Stream>()
                .is_none()
        );
    }

    #[test]
    fn stream_truncated() {
        assert!(
            Reader::new(b"<< /Length 100 >> stream\nabc\nendstream")
                .read::<Stream>()
                .is_none()
        );
    }
}
