//! Dictionaries.

use crate::object::{Array, Name, Object, ObjRef};
use crate::reader::{Readable, Reader};
use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt::{Debug, Formatter};
use std::ops::Deref;

/// A dictionary, which is a key-value map, keys being names and values being
/// any PDF object or object reference.
#[derive(Clone, Default, PartialEq)]
pub struct Dict(HashMap<Name, Object>);

impl Dict {
    /// Create a new empty dictionary.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Returns the number of entries in the dictionary.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks whether the dictionary contains an entry with a specific key.
    pub fn contains_key(&self, key: impl Deref<Target = [u8]>) -> bool {
        self.0.contains_key(key.deref())
    }

    /// Returns the entry for a specific key.
    pub fn get(&self, key: impl Deref<Target = [u8]>) -> Option<&Object> {
        self.0.get(key.deref())
    }

    /// Insert an entry, returning the value it replaces, if any.
    pub fn insert(&mut self, key: Name, value: Object) -> Option<Object> {
        self.0.insert(key, value)
    }

    /// Remove an entry, returning its value, if any.
    pub fn remove(&mut self, key: impl Deref<Target = [u8]>) -> Option<Object> {
        self.0.remove(key.deref())
    }

    /// Returns an iterator over all keys in the dictionary.
    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.0.keys()
    }

    /// Returns an iterator over all entries in the dictionary.
    pub fn iter(&self) -> hash_map::Iter<'_, Name, Object> {
        self.0.iter()
    }

    /// Returns the entries of the dictionary, sorted by key.
    pub fn entries(&self) -> Vec<(&Name, &Object)> {
        let mut entries = self.0.iter().collect::<Vec<_>>();
        entries.sort_by(|(n1, _), (n2, _)| n1.as_ref().cmp(n2.as_ref()));

        entries
    }

    /// Returns the entry for a key as an integer.
    pub fn get_integer(&self, key: impl Deref<Target = [u8]>) -> Option<i64> {
        self.get(key)?.as_integer()
    }

    /// Returns the entry for a key as a usize.
    pub fn get_usize(&self, key: impl Deref<Target = [u8]>) -> Option<usize> {
        self.get_integer(key)?.try_into().ok()
    }

    /// Returns the entry for a key as a name.
    pub fn get_name(&self, key: impl Deref<Target = [u8]>) -> Option<&Name> {
        self.get(key)?.as_name()
    }

    /// Returns the entry for a key as an array.
    pub fn get_array(&self, key: impl Deref<Target = [u8]>) -> Option<&Array> {
        self.get(key)?.as_array()
    }

    /// Returns the entry for a key as an object reference.
    pub fn get_ref(&self, key: impl Deref<Target = [u8]>) -> Option<ObjRef> {
        self.get(key)?.as_reference()
    }

    /// Insert every entry of `other` whose key is not yet present.
    pub(crate) fn merge_missing(&mut self, other: Dict) {
        for (key, value) in other.0 {
            self.0.entry(key).or_insert(value);
        }
    }
}

impl Debug for Dict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug_struct = f.debug_struct("Dict");

        for (key, value) in self.entries() {
            debug_struct.field(key.as_str(), value);
        }

        debug_struct.finish()
    }
}

impl Readable for Dict {
    fn read(r: &mut Reader<'_>) -> Option<Self> {
        r.forward_tag(b"<<")?;

        let mut dict = Dict::new();

        loop {
            r.skip_white_spaces_and_comments();

            if r.forward_tag(b">>").is_some() {
                break Some(dict);
            }

            let Some(key) = r.read::<Name>() else {
                // In case there is garbage in-between, be lenient and just
                // try to skip it.
                r.read::<Object>()?;
                continue;
            };

            r.skip_white_spaces_and_comments();
            let value = r.read::<Object>()?;

            // A duplicate key keeps the value seen last.
            dict.insert(key, value);
        }
    }
}

/// The dictionary keys this crate reads or writes.
#[allow(missing_docs)]
pub mod keys {
    macro_rules! key {
        ($i:ident, $e:expr) => {
            pub const $i: &'static [u8] = $e;
        };
    }

    // A
    key!(ASCII85_DECODE, b"ASCII85Decode");
    key!(ASCII85_DECODE_ABBREVIATION, b"A85");
    key!(ASCII_HEX_DECODE, b"ASCIIHexDecode");
    key!(ASCII_HEX_DECODE_ABBREVIATION, b"AHx");

    // B
    key!(BITS_PER_COMPONENT, b"BitsPerComponent");

    // C
    key!(CATALOG, b"Catalog");
    key!(COLORS, b"Colors");
    key!(COLUMNS, b"Columns");
    key!(CONTENTS, b"Contents");
    key!(COUNT, b"Count");

    // D
    key!(DECODE_PARMS, b"DecodeParms");

    // E
    key!(ENCRYPT, b"Encrypt");

    // F
    key!(FILTER, b"Filter");
    key!(FIRST, b"First");
    key!(FLATE_DECODE, b"FlateDecode");
    key!(FLATE_DECODE_ABBREVIATION, b"Fl");

    // I
    key!(ID, b"ID");
    key!(INDEX, b"Index");
    key!(INFO, b"Info");

    // K
    key!(KIDS, b"Kids");

    // L
    key!(LENGTH, b"Length");

    // M
    key!(MEDIA_BOX, b"MediaBox");

    // N
    key!(N, b"N");

    // O
    key!(OBJ_STM, b"ObjStm");
    key!(OUTLINES, b"Outlines");

    // P
    key!(PAGE, b"Page");
    key!(PAGES, b"Pages");
    key!(PARENT, b"Parent");
    key!(PREDICTOR, b"Predictor");
    key!(PREV, b"Prev");
    key!(PROC_SET, b"ProcSet");

    // R
    key!(RESOURCES, b"Resources");
    key!(ROOT, b"Root");

    // S
    key!(SIZE, b"Size");

    // T
    key!(TYPE, b"Type");

    // W
    key!(W, b"W");

    // X
    key!(XREF, b"XRef");
    key!(XREF_STM, b"XRefStm");
}

#[cfg(test)]
mod tests {
    use crate::object::dict::keys::TYPE;
    use crate::object::{Dict, Name, ObjRef, Object};
    use crate::reader::Reader;

    fn dict_impl(data: &[u8]) -> Option<Dict> {
        Reader::new(data).read::<Dict>()
    }

    #[test]
    fn empty_dict_1() {
        assert_eq!(dict_impl(b"<<>>").unwrap().len(), 0);
    }

    #[test]
    fn empty_dict_2() {
        assert_eq!(dict_impl(b"<<   \n >>").unwrap().len(), 0);
    }

    #[test]
    fn dict_1() {
        let dict = dict_impl(b"<<  /Hi 34.0 >>").unwrap();

        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get(Name::new(b"Hi")), Some(&Object::Real(34.0)));
    }

    #[test]
    fn dict_2() {
        let dict = dict_impl(b"<<  /Hi \n 34 /Second true >>").unwrap();

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get_integer(Name::new(b"Hi")), Some(34));
        assert_eq!(dict.get(Name::new(b"Second")), Some(&Object::Boolean(true)));
    }

    #[test]
    fn dict_complex() {
        let data = b"<< /Type /Example
/Version 0.01
/Integeritem 12
/StringItem (a string) >>";

        let dict = dict_impl(data).unwrap();

        assert_eq!(dict.len(), 4);
        assert_eq!(dict.get_name(TYPE), Some(&Name::new(b"Example")));
        assert_eq!(dict.get(Name::new(b"Version")), Some(&Object::Real(0.01)));
        assert_eq!(dict.get_integer(Name::new(b"Integeritem")), Some(12));
        assert_eq!(
            dict.get(Name::new(b"StringItem")),
            Some(&Object::String("a string".into()))
        );
    }

    #[test]
    fn dict_with_refs() {
        let dict = dict_impl(b"<< /A 12 0 R /B 7 >>").unwrap();

        assert_eq!(dict.get_ref(Name::new(b"A")), Some(ObjRef::new(12, 0)));
        assert_eq!(dict.get_integer(Name::new(b"B")), Some(7));
    }

    #[test]
    fn dict_duplicate_key() {
        let dict = dict_impl(b"<< /A 1 /A 2 >>").unwrap();

        assert_eq!(dict.get_integer(Name::new(b"A")), Some(2));
    }

    #[test]
    fn dict_with_trailing() {
        assert_eq!(dict_impl(b"<<  /Hi 67.0  >>trailing data").unwrap().len(), 1);
    }

    #[test]
    fn dict_with_comment() {
        let dict = dict_impl(b"<<  /Hi % A comment \n 67 % Another comment \n >>").unwrap();

        assert_eq!(dict.get_integer(Name::new(b"Hi")), Some(67));
    }

    #[test]
    fn dict_with_escaped_name() {
        let dict = dict_impl(b"<< /PANTONE#20104#20C 234 >>").unwrap();

        assert!(dict.contains_key(Name::new(b"PANTONE 104 C")));
    }

    #[test]
    fn garbage_in_between() {
        let dict = dict_impl(b"<< /A 1\n2000\n /B 2 >>").unwrap();

        assert_eq!(dict.get_integer(Name::new(b"A")), Some(1));
        assert_eq!(dict.get_integer(Name::new(b"B")), Some(2));
    }
}
