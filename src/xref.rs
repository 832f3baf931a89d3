//! Reading and querying the cross-reference data of a PDF file.
//!
//! Every revision of a PDF file ends in a cross-reference section, either a
//! classical `xref` table or a compressed cross-reference stream, possibly a
//! hybrid of both. Sections are chained backwards through the `Prev` trailer
//! entry; entries of newer sections shadow those of older ones, and within a
//! hybrid revision the entries of the `XRefStm` stream mask the classical
//! table. Walking the whole chain produces the *effective* map from object
//! number to location.

use crate::file::LoadError;
use crate::filter::Filters;
use crate::object::dict::keys::{FIRST, INDEX, N, PREV, SIZE, W, XREF_STM};
use crate::object::{Dict, IndirectObject, Object, Stream};
use crate::reader::{Reader, rfind};
use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};

/// A single cross-reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// The object number is unused.
    Free {
        /// The object number of the next free object in the free list.
        next_free: u32,
        /// The generation number a reuse of this object number must carry.
        gen_number: u16,
    },
    /// The object is stored as an indirect object in the file.
    InUse {
        /// The byte offset of the object within the file.
        offset: usize,
        /// The generation number of the object.
        gen_number: u16,
    },
    /// The object is stored inside an object stream.
    ///
    /// Such objects implicitly have generation number 0.
    Compressed {
        /// The object number of the object stream holding the object.
        stream_number: u32,
        /// The zero-based index of the object within the object stream.
        index: u32,
    },
}

impl XrefEntry {
    /// The generation number recorded for this entry.
    pub fn gen_number(&self) -> u16 {
        match self {
            XrefEntry::Free { gen_number, .. } => *gen_number,
            XrefEntry::InUse { gen_number, .. } => *gen_number,
            XrefEntry::Compressed { .. } => 0,
        }
    }
}

/// The two forms a cross-reference section can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefKind {
    /// A classical `xref` table followed by a `trailer` dictionary.
    Table,
    /// A cross-reference stream.
    Stream,
}

pub(crate) type XrefMap = FxHashMap<u32, XrefEntry>;

/// The effective cross-reference data of a file: the merged entry map, the
/// cascaded trailer, the offset of the most recent section and its form.
pub(crate) struct XrefData {
    pub(crate) map: XrefMap,
    pub(crate) trailer: Dict,
    pub(crate) start: usize,
    pub(crate) kind: XrefKind,
}

/// Walk the whole cross-reference chain of the file.
pub(crate) fn load(data: &[u8], filters: &Filters) -> Result<XrefData, LoadError> {
    let start = find_startxref(data)?;
    let kind = section_kind(data, start).ok_or(LoadError::BadXref)?;

    let mut map = XrefMap::default();
    let mut trailer = Dict::new();
    let mut visited = FxHashSet::default();

    parse_section(data, start, &mut map, &mut trailer, &mut visited, filters)
        .ok_or(LoadError::BadXref)?;

    Ok(XrefData {
        map,
        trailer,
        start,
        kind,
    })
}

/// Locate the most recent cross-reference section: the decimal offset
/// between the last `startxref` and the last `%%EOF`.
pub(crate) fn find_startxref(data: &[u8]) -> Result<usize, LoadError> {
    let eof = rfind(data, b"%%EOF").ok_or(LoadError::NoEof)?;
    let startxref = rfind(&data[..eof], b"startxref").ok_or(LoadError::NoStartxref)?;

    let mut r = Reader::new_at(data, startxref + b"startxref".len());
    r.skip_white_spaces_and_comments();

    r.read::<usize>().ok_or(LoadError::NoStartxref)
}

fn section_kind(data: &[u8], pos: usize) -> Option<XrefKind> {
    let mut r = Reader::new_at(data, pos);
    r.skip_white_spaces_and_comments();

    match r.peek_byte()? {
        b'x' => Some(XrefKind::Table),
        // An indirect object, and therefore a cross-reference stream.
        b'0'..=b'9' => Some(XrefKind::Stream),
        other => {
            warn!("cross-reference section starts with unexpected byte {other:#x}");

            None
        }
    }
}

/// Parse one cross-reference section and recurse into the sections it links
/// to. Since sections are visited from newest to oldest, every insertion
/// keeps an already-present entry: the first writer wins.
fn parse_section(
    data: &[u8],
    pos: usize,
    map: &mut XrefMap,
    trailer: &mut Dict,
    visited: &mut FxHashSet<usize>,
    filters: &Filters,
) -> Option<()> {
    if !visited.insert(pos) {
        warn!("cycle in cross-reference chain at offset {pos}");

        return Some(());
    }

    let mut r = Reader::new_at(data, pos);
    r.skip_white_spaces_and_comments();

    match section_kind(data, pos)? {
        XrefKind::Table => parse_table(data, &mut r, map, trailer, visited, filters),
        XrefKind::Stream => parse_stream(data, &mut r, map, trailer, visited, filters),
    }
}

fn parse_table(
    data: &[u8],
    r: &mut Reader<'_>,
    map: &mut XrefMap,
    trailer: &mut Dict,
    visited: &mut FxHashSet<usize>,
    filters: &Filters,
) -> Option<()> {
    r.forward_tag(b"xref")?;

    let mut entries = vec![];

    loop {
        r.skip_white_spaces_and_comments();

        if r.forward_tag(b"trailer").is_some() {
            break;
        }

        // A subsection: `first count`, then `count` fixed-form entries.
        let start = r.read::<u32>()?;
        r.skip_white_spaces();
        let count = r.read::<u32>()?;

        for i in 0..count {
            r.skip_white_spaces();
            let offset = r.read::<u64>()?;
            r.skip_white_spaces();
            let gen_number = r.read::<u16>()?;
            r.skip_white_spaces();

            let entry = match r.read_byte()? {
                b'n' => XrefEntry::InUse {
                    offset: offset.try_into().ok()?,
                    gen_number,
                },
                b'f' => XrefEntry::Free {
                    next_free: offset.try_into().ok()?,
                    gen_number,
                },
                other => {
                    warn!("unknown cross-reference entry type {:?}", other as char);

                    return None;
                }
            };

            entries.push((start + i, entry));
        }
    }

    r.skip_white_spaces_and_comments();
    let own_trailer = r.read::<Dict>()?;

    // In a hybrid file, the entries of the `XRefStm` mask the classical
    // table of the same revision, so they are merged first.
    if let Some(stm) = own_trailer.get_usize(XREF_STM) {
        parse_section(data, stm, map, trailer, visited, filters)?;
    }

    for (number, entry) in entries {
        map.entry(number).or_insert(entry);
    }

    let prev = own_trailer.get_usize(PREV);
    trailer.merge_missing(own_trailer);

    if let Some(prev) = prev {
        parse_section(data, prev, map, trailer, visited, filters)?;
    }

    Some(())
}

fn parse_stream(
    data: &[u8],
    r: &mut Reader<'_>,
    map: &mut XrefMap,
    trailer: &mut Dict,
    visited: &mut FxHashSet<usize>,
    filters: &Filters,
) -> Option<()> {
    let object = r.read::<IndirectObject>()?;
    let stream = object.object.into_stream()?;
    let decoded = stream.decoded(filters)?;
    let dict = stream.dict();

    let widths = dict.get_array(W)?;
    let widths = widths
        .iter()
        .map(|w| w.as_integer().and_then(|w| usize::try_from(w).ok()))
        .collect::<Option<Vec<_>>>()?;

    let [w1, w2, w3] = widths.as_slice() else {
        warn!("W does not hold exactly three widths");

        return None;
    };

    if widths.iter().any(|w| *w > 8) {
        warn!("cross-reference stream field is wider than eight bytes");

        return None;
    }

    let size = dict.get_integer(SIZE).and_then(|s| u32::try_from(s).ok())?;

    // `Index` defaults to a single range covering everything.
    let ranges = match dict.get_array(INDEX) {
        Some(index) => index
            .chunks_exact(2)
            .map(|pair| {
                Some((
                    u32::try_from(pair[0].as_integer()?).ok()?,
                    u32::try_from(pair[1].as_integer()?).ok()?,
                ))
            })
            .collect::<Option<Vec<_>>>()?,
        None => vec![(0, size)],
    };

    let mut xr = Reader::new(&decoded);
    let mut entries = vec![];

    for (start, count) in ranges {
        for i in 0..count {
            // A missing type field defaults to type 1.
            let f1 = if *w1 == 0 { 1 } else { read_be(xr.read_bytes(*w1)?)? };
            let f2 = if *w2 == 0 { 0 } else { read_be(xr.read_bytes(*w2)?)? };
            let f3 = if *w3 == 0 { 0 } else { read_be(xr.read_bytes(*w3)?)? };

            let number = start + i;

            let entry = match f1 {
                0 => XrefEntry::Free {
                    next_free: u32::try_from(f2).ok()?,
                    gen_number: clamp_gen(f3),
                },
                1 => XrefEntry::InUse {
                    offset: usize::try_from(f2).ok()?,
                    gen_number: clamp_gen(f3),
                },
                2 => XrefEntry::Compressed {
                    stream_number: u32::try_from(f2).ok()?,
                    index: u32::try_from(f3).ok()?,
                },
                other => {
                    warn!("unknown cross-reference entry type {other}");

                    continue;
                }
            };

            entries.push((number, entry));
        }
    }

    for (number, entry) in entries {
        map.entry(number).or_insert(entry);
    }

    let prev = dict.get_usize(PREV);
    trailer.merge_missing(dict.clone());

    if let Some(prev) = prev {
        parse_section(data, prev, map, trailer, visited, filters)?;
    }

    Some(())
}

fn clamp_gen(value: u64) -> u16 {
    u16::try_from(value).unwrap_or_else(|_| {
        warn!("generation number {value} exceeds 65535");

        u16::MAX
    })
}

/// Read a big-endian integer of up to eight bytes.
fn read_be(data: &[u8]) -> Option<u64> {
    if data.is_empty() || data.len() > 8 {
        return None;
    }

    Some(data.iter().fold(0, |acc, b| acc << 8 | *b as u64))
}

/// The number of bytes required to store the given value big-endian.
pub(crate) fn required_width(max: u64) -> usize {
    let mut width = 1;

    while width < 8 && max >= 1 << (8 * width) {
        width += 1;
    }

    width
}

/// Append a big-endian integer using exactly `width` bytes.
pub(crate) fn push_be(out: &mut Vec<u8>, value: u64, width: usize) {
    for i in (0..width).rev() {
        out.push((value >> (8 * i)) as u8);
    }
}

/// An object stream: a decoded payload holding `N` compressed objects,
/// preceded by `N` pairs of object number and offset relative to `First`.
pub(crate) struct ObjectStream {
    data: Vec<u8>,
    first: usize,
    offsets: Vec<(u32, usize)>,
}

impl ObjectStream {
    pub(crate) fn new(stream: &Stream, filters: &Filters) -> Option<Self> {
        let num_objects = stream.dict().get_usize(N)?;
        let first = stream.dict().get_usize(FIRST)?;
        let data = stream.decoded(filters)?;

        let mut r = Reader::new(&data);
        let mut offsets = vec![];

        for _ in 0..num_objects {
            r.skip_white_spaces_and_comments();
            let obj_number = r.read::<u32>()?;
            r.skip_white_spaces_and_comments();
            let offset = r.read::<usize>()?;
            offsets.push((obj_number, offset));
        }

        Some(Self {
            data,
            first,
            offsets,
        })
    }

    /// Return the object at the given index, which should hold the given
    /// object number. If the index row disagrees with the request, the
    /// index is rescanned for the correct offset.
    pub(crate) fn get(&self, index: u32, obj_number: u32) -> Option<Object> {
        let mut entry = self.offsets.get(index as usize).copied();

        if entry.map(|(number, _)| number) != Some(obj_number) {
            warn!("object stream index does not list {obj_number} at {index}, rescanning");

            entry = self
                .offsets
                .iter()
                .find(|(number, _)| *number == obj_number)
                .copied();
        }

        let (_, offset) = entry?;

        let mut r = Reader::new_at(&self.data, self.first.checked_add(offset)?);
        r.skip_white_spaces_and_comments();

        r.read::<Object>()
    }
}
