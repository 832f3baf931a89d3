//! Arrays.

use crate::object::Object;
use crate::reader::{Readable, Reader};

/// An array of PDF objects.
pub type Array = Vec<Object>;

impl Readable for Array {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        r.forward_tag(b"[")?;

        let mut items = vec![];

        loop {
            r.skip_white_spaces_and_comments();

            if r.forward_tag(b"]").is_some() {
                return Some(items);
            }

            items.push(r.read::<Object>()?);
        }
    }
}
