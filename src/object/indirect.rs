//! Indirect objects.

use crate::object::{ObjRef, Object};
use crate::reader::{Readable, Reader};

/// An object labelled with an object and generation number, by which other
/// objects can refer to it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    /// The reference under which the object is addressable.
    pub reference: ObjRef,
    /// The wrapped object.
    pub object: Object,
}

impl IndirectObject {
    /// Create a new indirect object.
    pub fn new(obj_number: u32, gen_number: u16, object: Object) -> Self {
        Self {
            reference: ObjRef::new(obj_number, gen_number),
            object,
        }
    }

    /// Parse an indirect object from the start of `data`, returning it
    /// together with the number of bytes consumed, including leading white
    /// space.
    pub fn parse(data: &[u8]) -> Option<(Self, usize)> {
        let mut r = Reader::new(data);
        r.skip_white_spaces_and_comments();

        let object = r.read::<Self>()?;

        Some((object, r.offset()))
    }
}

impl Readable for IndirectObject {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let obj_number = r.read::<u32>()?;
        r.skip_white_spaces_and_comments();
        let gen_number = r.read::<u16>()?;
        r.skip_white_spaces_and_comments();
        r.forward_tag(b"obj")?;
        r.skip_white_spaces_and_comments();

        let object = r.read::<Object>()?;

        r.skip_white_spaces_and_comments();
        // Be lenient and don't require it.
        r.forward_tag(b"endobj");

        Some(Self::new(obj_number, gen_number, object))
    }
}
