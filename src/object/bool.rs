//! Booleans.

use crate::reader::{Readable, Reader};

impl Readable for bool {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        if r.forward_tag(b"true").is_some() {
            Some(true)
        } else if r.forward_tag(b"false").is_some() {
            Some(false)
        } else {
            None
        }
    }
}
