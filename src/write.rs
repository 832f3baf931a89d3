//! Serializing objects back into bytes.
//!
//! Each object type has exactly one written form, so emitting an object and
//! parsing the result yields an equal object. Dictionaries are emitted with
//! their keys sorted, which keeps the output deterministic; a stream's
//! `Length` entry is rewritten to the actual payload length at emission time.

use crate::object::dict::keys::LENGTH;
use crate::object::{Dict, IndirectObject, Name, ObjRef, Object, Stream, string};
use crate::trivia::is_regular_character;
use log::warn;

/// A type that can be serialized into its PDF byte representation.
pub trait WriteTo {
    /// Append the byte representation of `self` to `out`.
    fn write_to(&self, out: &mut Vec<u8>);

    /// Return the byte representation of `self`.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![];
        self.write_to(&mut out);

        out
    }
}

impl WriteTo for Object {
    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Object::Null(_) => out.extend_from_slice(b"null"),
            Object::Boolean(true) => out.extend_from_slice(b"true"),
            Object::Boolean(false) => out.extend_from_slice(b"false"),
            Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
            Object::Real(r) => write_real(*r, out),
            Object::String(s) => s.write_to(out),
            Object::Name(n) => n.write_to(out),
            Object::Array(a) => {
                out.push(b'[');

                for (i, item) in a.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    item.write_to(out);
                }

                out.push(b']');
            }
            Object::Dict(d) => d.write_to(out),
            Object::Stream(s) => s.write_to(out),
            Object::Reference(r) => r.write_to(out),
        }
    }
}

fn write_real(r: f64, out: &mut Vec<u8>) {
    if !r.is_finite() {
        warn!("replaced non-finite real {r} with 0 during serialization");
        out.push(b'0');
    } else if r == r.trunc() {
        // Keep the decimal point, otherwise the value reads back as an
        // integer.
        out.extend_from_slice(format!("{r:.1}").as_bytes());
    } else {
        out.extend_from_slice(format!("{r}").as_bytes());
    }
}

impl WriteTo for string::String {
    fn write_to(&self, out: &mut Vec<u8>) {
        let bytes = self.get();
        let binary = bytes.iter().filter(|b| !b.is_ascii_graphic() && **b != b' ').count();

        // Mostly binary content reads better (and often shorter) in hex form.
        if binary * 2 > bytes.len() {
            out.push(b'<');
            for b in bytes {
                out.extend_from_slice(format!("{b:02X}").as_bytes());
            }
            out.push(b'>');
        } else {
            out.push(b'(');
            for b in bytes {
                match b {
                    b'(' => out.extend_from_slice(b"\\("),
                    b')' => out.extend_from_slice(b"\\)"),
                    b'\\' => out.extend_from_slice(b"\\\\"),
                    b'\n' => out.extend_from_slice(b"\\n"),
                    b'\r' => out.extend_from_slice(b"\\r"),
                    b'\t' => out.extend_from_slice(b"\\t"),
                    0x08 => out.extend_from_slice(b"\\b"),
                    0x0c => out.extend_from_slice(b"\\f"),
                    other => out.push(*other),
                }
            }
            out.push(b')');
        }
    }
}

impl WriteTo for Name {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.push(b'/');

        for b in self.as_ref() {
            if is_regular_character(*b) && b.is_ascii_graphic() && *b != b'#' {
                out.push(*b);
            } else {
                out.extend_from_slice(format!("#{b:02X}").as_bytes());
            }
        }
    }
}

impl WriteTo for Dict {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"<<");

        for (key, value) in self.entries() {
            key.write_to(out);
            out.push(b' ');
            value.write_to(out);
        }

        out.extend_from_slice(b">>");
    }
}

impl WriteTo for Stream {
    fn write_to(&self, out: &mut Vec<u8>) {
        // The dictionary must declare the actual payload length, whatever it
        // claimed before.
        let mut dict = self.dict().clone();
        dict.insert(
            Name::new(LENGTH),
            Object::Integer(self.raw_data().len() as i64),
        );

        dict.write_to(out);
        out.extend_from_slice(b"\nstream\n");
        out.extend_from_slice(self.raw_data());
        out.extend_from_slice(b"\nendstream");
    }
}

impl WriteTo for ObjRef {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(format!("{} {} R", self.obj_number, self.gen_number).as_bytes());
    }
}

impl WriteTo for IndirectObject {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(
            format!(
                "{} {} obj\n",
                self.reference.obj_number, self.reference.gen_number
            )
            .as_bytes(),
        );
        self.object.write_to(out);
        out.extend_from_slice(b"\nendobj");
    }
}

#[cfg(test)]
mod tests {
    use crate::object::dict::keys::LENGTH;
    use crate::object::{Dict, IndirectObject, Name, Null, ObjRef, Object, Stream};
    use crate::reader::Reader;
    use crate::write::WriteTo;

    fn roundtrip(object: Object) {
        let bytes = object.to_bytes();
        let mut r = Reader::new(&bytes);

        assert_eq!(r.read::<Object>().unwrap(), object);
        assert_eq!(r.offset(), bytes.len());
    }

    #[test]
    fn roundtrip_null() {
        roundtrip(Object::Null(Null::new()));
    }

    #[test]
    fn roundtrip_bool() {
        roundtrip(Object::Boolean(true));
        roundtrip(Object::Boolean(false));
    }

    #[test]
    fn roundtrip_integer() {
        roundtrip(Object::Integer(0));
        roundtrip(Object::Integer(-7));
        roundtrip(Object::Integer(i64::MAX));
    }

    #[test]
    fn roundtrip_real() {
        roundtrip(Object::Real(0.0));
        roundtrip(Object::Real(1.0));
        roundtrip(Object::Real(-32.01));
        roundtrip(Object::Real(0.000123));
        roundtrip(Object::Real(-123456789.5));
    }

    #[test]
    fn roundtrip_string() {
        roundtrip(Object::String("Hi (there)".into()));
        roundtrip(Object::String("back\\slash".into()));
        roundtrip(Object::String("with \n\r\t escapes".into()));
        roundtrip(Object::String(b"\x00\x01\xfe\xff".as_slice().into()));
    }

    #[test]
    fn roundtrip_name() {
        roundtrip(Object::Name(Name::new(b"Type")));
        roundtrip(Object::Name(Name::new(b"Has Space#And")));
        roundtrip(Object::Name(Name::new(b"A;Name_With-Various***Characters?")));
    }

    #[test]
    fn roundtrip_array() {
        roundtrip(Object::Array(vec![
            Object::Integer(1),
            Object::Real(2.5),
            Object::Reference(ObjRef::new(3, 0)),
            Object::Array(vec![Object::Boolean(false)]),
        ]));
    }

    #[test]
    fn roundtrip_dict() {
        let mut dict = Dict::new();
        dict.insert(Name::new(b"A"), Object::Integer(1));
        dict.insert(Name::new(b"B"), Object::Reference(ObjRef::new(4, 1)));
        dict.insert(Name::new(b"Nested"), Object::Dict(Dict::new()));

        roundtrip(Object::Dict(dict));
    }

    #[test]
    fn roundtrip_stream() {
        let mut dict = Dict::new();
        // Deliberately wrong; emission must rewrite it.
        dict.insert(Name::new(LENGTH), Object::Integer(999));

        let stream = Stream::new(dict, b"payload bytes".to_vec());
        let bytes = Object::Stream(stream).to_bytes();

        let parsed = Reader::new(&bytes).read::<Object>().unwrap();
        let parsed = parsed.as_stream().unwrap();

        assert_eq!(parsed.raw_data(), b"payload bytes");
        assert_eq!(parsed.dict().get_integer(LENGTH), Some(13));
    }

    #[test]
    fn reference_form() {
        assert_eq!(ObjRef::new(12, 0).to_bytes(), b"12 0 R");
    }

    #[test]
    fn indirect_form() {
        let object = IndirectObject::new(12, 0, Object::String("Brillig".into()));

        assert_eq!(object.to_bytes(), b"12 0 obj\n(Brillig)\nendobj");
    }

    #[test]
    fn dict_sorted() {
        let mut dict = Dict::new();
        dict.insert(Name::new(b"B"), Object::Integer(2));
        dict.insert(Name::new(b"A"), Object::Integer(1));

        assert_eq!(Object::Dict(dict).to_bytes(), b"<</A 1/B 2>>");
    }

    #[test]
    fn real_keeps_point() {
        assert_eq!(Object::Real(4.0).to_bytes(), b"4.0");
    }

    #[test]
    fn binary_string_hex() {
        let bytes = Object::String(b"\x90\x1f\xa0".as_slice().into()).to_bytes();

        assert_eq!(bytes, b"<901FA0>");
    }
}
