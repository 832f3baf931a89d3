//! PDF objects.
//!
//! PDF knows nine primitive object types: booleans, integers, reals,
//! strings, names, arrays, dictionaries, streams and the null object. On top
//! of those, an object can be labelled with an object and generation number
//! (an *indirect object*), which allows any other object to refer to it by
//! an *object reference*.

use crate::reader::{Readable, Reader};

pub mod array;
pub mod bool;
pub mod dict;
pub mod indirect;
pub mod name;
pub mod null;
pub mod number;
pub mod r#ref;
pub mod stream;
pub mod string;

pub use array::Array;
pub use dict::Dict;
pub use indirect::IndirectObject;
pub use name::Name;
pub use null::Null;
pub use r#ref::ObjRef;
pub use stream::Stream;

/// A primitive PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// A null object.
    Null(Null),
    /// A boolean object.
    Boolean(bool),
    /// An integer object.
    Integer(i64),
    /// A real object.
    Real(f64),
    /// A string object.
    String(string::String),
    /// A name object.
    Name(Name),
    /// An array object.
    Array(Array),
    /// A dict object.
    Dict(Dict),
    /// A stream object.
    // Can only be an indirect object in theory and thus comes with some caveats,
    // but we just treat it the same.
    Stream(Stream),
    /// A reference to an indirect object.
    Reference(ObjRef),
}

impl Object {
    /// Parse an object from the start of `data`, returning it together with
    /// the number of bytes consumed, including leading white space.
    pub fn parse(data: &[u8]) -> Option<(Self, usize)> {
        let mut r = Reader::new(data);
        r.skip_white_spaces_and_comments();

        let object = r.read::<Self>()?;

        Some((object, r.offset()))
    }

    /// Create a null object with no diagnostic.
    pub fn null() -> Self {
        Self::Null(Null::new())
    }

    /// Returns whether the object is the null object.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    /// Returns the value of a boolean object.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value of an integer object.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value of a numeric object as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Returns a reference to the value of a string object.
    pub fn as_string(&self) -> Option<&string::String> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the value of a name object.
    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Self::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Returns a reference to the items of an array object.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns a reference to the entries of a dict object.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Returns a reference to a stream object.
    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Self::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value of an object reference.
    pub fn as_reference(&self) -> Option<ObjRef> {
        match self {
            Self::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Consume the object and return the contained dict, if any.
    pub fn into_dict(self) -> Option<Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Consume the object and return the contained array, if any.
    pub fn into_array(self) -> Option<Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Consume the object and return the contained stream, if any.
    pub fn into_stream(self) -> Option<Stream> {
        match self {
            Self::Stream(s) => Some(s),
            _ => None,
        }
    }
}

impl Readable for Object {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let object = match r.peek_byte()? {
            b'n' => Self::Null(r.read::<Null>()?),
            b't' | b'f' => Self::Boolean(r.read::<bool>()?),
            b'/' => Self::Name(r.read::<Name>()?),
            b'<' => match r.peek_bytes(2)? {
                b"<<" => {
                    let dict = r.read::<Dict>()?;

                    let mut probe = r.clone();
                    probe.skip_white_spaces_and_comments();

                    if probe.peek_tag(b"stream").is_some() {
                        Self::Stream(Stream::read_payload(r, dict)?)
                    } else {
                        Self::Dict(dict)
                    }
                }
                _ => Self::String(r.read::<string::String>()?),
            },
            b'(' => Self::String(r.read::<string::String>()?),
            b'.' | b'+' | b'-' | b'0'..=b'9' => {
                // A number here may equally be the start of an object
                // reference, which only a look-ahead over the following two
                // tokens can decide.
                if let Some(obj_ref) = r.read::<ObjRef>() {
                    Self::Reference(obj_ref)
                } else {
                    number::read_number(r)?
                }
            }
            b'[' => Self::Array(r.read::<Array>()?),
            _ => return None,
        };

        Some(object)
    }
}
