//! The object store of a PDF file.
//!
//! A [`File`] models an open PDF file as a map from object number to the
//! current version of that object: an unmodified on-disk location, a new
//! in-memory version added by the caller, or a freed slot. Fetching an
//! on-disk object parses it lazily from the backing bytes; saving appends
//! the in-memory versions followed by a fresh cross-reference section, so
//! existing bytes are never rewritten.

use crate::filter::flate::deflate_encode;
use crate::filter::{DecodeFn, Filters};
use crate::object::dict::keys::{
    ENCRYPT, FILTER, FLATE_DECODE, ID, INDEX, INFO, LENGTH, PREV, ROOT, SIZE, TYPE, W, XREF,
};
use crate::object::{Array, Dict, IndirectObject, Name, Null, ObjRef, Object, Stream};
use crate::reader::Reader;
use crate::write::WriteTo;
use crate::xref::{self, XrefEntry, XrefKind, push_be, required_width};
use log::warn;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// An error opening a PDF file.
#[derive(Debug)]
pub enum LoadError {
    /// The file does not start with `%PDF-1.`.
    BadHeader,
    /// The file has no `%%EOF` marker.
    NoEof,
    /// The file has no `startxref` offset before the `%%EOF` marker.
    NoStartxref,
    /// The cross-reference chain could not be parsed.
    BadXref,
    /// The underlying file operation failed.
    Io(io::Error),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::BadHeader => write!(f, "file does not have a PDF header"),
            LoadError::NoEof => write!(f, "file does not have a PDF ending"),
            LoadError::NoStartxref => write!(f, "could not find the startxref offset"),
            LoadError::BadXref => write!(f, "could not parse the cross-reference data"),
            LoadError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<io::Error> for LoadError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// An error adding an object to the store.
#[derive(Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The generation number of the added object is lower than that of the
    /// version it overwrites.
    GenerationTooSmall {
        /// The smallest generation number the slot accepts.
        minimum: u16,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::GenerationTooSmall { minimum } => {
                write!(f, "generation number is too small, must be at least {minimum}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// An error saving a PDF file.
#[derive(Debug)]
pub enum SaveError {
    /// The store has no backing file to append to.
    NoBackingFile,
    /// The underlying file operation failed.
    Io(io::Error),
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::NoBackingFile => write!(f, "store has no backing file"),
            SaveError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SaveError {}

impl From<io::Error> for SaveError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// The current version of one object number.
#[derive(Debug, Clone)]
enum Slot {
    /// The object lives in the backing file and is parsed on demand.
    OnDisk(XrefEntry),
    /// A new or overwriting version added by the caller, not yet on disk.
    InMemory(IndirectObject),
    /// The object number is freed; the stored value is the generation number
    /// a future reuse must carry at least.
    Free(u16),
}

/// An open PDF file, exposed as a store of numbered objects.
pub struct File {
    path: Option<PathBuf>,
    data: Vec<u8>,
    objects: FxHashMap<u32, Slot>,
    /// The maximum known object number plus one.
    size: u32,
    /// The byte offset of the most recent cross-reference section, which the
    /// next save links to via `Prev`.
    prev: Option<usize>,
    kind: XrefKind,
    filters: Filters,

    /// The reference to the document's catalog dictionary.
    pub root: Option<ObjRef>,
    /// The reference to the document's information dictionary.
    pub info: Option<ObjRef>,
    /// The document's encryption dictionary.
    pub encrypt: Option<Dict>,
    /// The file identifier: an array of two byte strings.
    pub id: Option<Array>,
}

impl File {
    /// Open a PDF file for manipulation of its objects.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = fs::read(path)?;

        let mut file = Self::from_bytes(data)?;
        file.path = Some(path.to_path_buf());

        Ok(file)
    }

    /// Open an in-memory PDF file.
    ///
    /// The resulting store has no backing file, so it can be inspected and
    /// modified, but only written out with [`File::save_as`].
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LoadError> {
        if data.get(..7) != Some(b"%PDF-1.".as_slice()) {
            return Err(LoadError::BadHeader);
        }

        let filters = Filters::default();
        let xref = xref::load(&data, &filters)?;

        let mut objects = FxHashMap::default();
        let mut max_number = 0;

        for (number, entry) in xref.map {
            max_number = max_number.max(number);

            let slot = match entry {
                XrefEntry::Free { gen_number, .. } => Slot::Free(gen_number),
                other => Slot::OnDisk(other),
            };

            objects.insert(number, slot);
        }

        let size = xref
            .trailer
            .get_integer(SIZE)
            .and_then(|s| u32::try_from(s).ok())
            .unwrap_or(0)
            .max(max_number + 1);

        // Every object number below the size has a defined slot; numbers the
        // cross-reference data does not cover count as free.
        for number in 1..size {
            objects.entry(number).or_insert(Slot::Free(0));
        }

        // Slot 0 is the head of the free list.
        objects.insert(0, Slot::Free(u16::MAX));

        let encrypt = match xref.trailer.get(ENCRYPT) {
            Some(Object::Dict(dict)) => Some(dict.clone()),
            Some(other) => {
                warn!("ignoring non-dictionary Encrypt entry: {other:?}");

                None
            }
            None => None,
        };

        Ok(Self {
            path: None,
            root: xref.trailer.get_ref(ROOT),
            info: xref.trailer.get_ref(INFO),
            encrypt,
            id: xref.trailer.get_array(ID).cloned(),
            objects,
            size,
            prev: Some(xref.start),
            kind: xref.kind,
            filters,
            data,
        })
    }

    /// Create a new PDF file with no objects.
    ///
    /// Writes a minimal `%PDF-1.7` prefix so that subsequent saves work as
    /// plain appends.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Ok(Self::create_impl(path.as_ref())?)
    }

    fn create_impl(path: &Path) -> io::Result<Self> {
        let data = b"%PDF-1.7".to_vec();
        fs::write(path, &data)?;

        let mut objects = FxHashMap::default();
        objects.insert(0, Slot::Free(u16::MAX));

        Ok(Self {
            path: Some(path.to_path_buf()),
            data,
            objects,
            size: 1,
            prev: None,
            kind: XrefKind::Table,
            filters: Filters::default(),
            root: None,
            info: None,
            encrypt: None,
            id: None,
        })
    }

    /// Close the file.
    ///
    /// The store and its backing byte view are dropped; unsaved
    /// modifications are lost.
    pub fn close(self) {}

    /// The maximum known object number plus one. This is the `Size` the next
    /// save emits in its trailer.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The form of cross-reference section [`File::save`] emits. Defaults to
    /// the form the file was opened with, or a classical table for a created
    /// file.
    pub fn xref_kind(&self) -> XrefKind {
        self.kind
    }

    /// Choose the form of cross-reference section [`File::save`] emits.
    pub fn set_xref_kind(&mut self, kind: XrefKind) {
        self.kind = kind;
    }

    /// Register a decode function for streams with the given filter name,
    /// replacing any previously registered one.
    pub fn register_filter(&mut self, name: Name, decode: DecodeFn) {
        self.filters.register(name, decode);
    }

    /// The filters used to decode streams of this file.
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Return the referenced object.
    ///
    /// This never fails: a reference that does not resolve (the slot is
    /// absent, freed, or points at bytes that cannot be parsed) yields
    /// [`Object::Null`] carrying a diagnostic, since dangling references are
    /// commonplace in real files and the caller must be able to skip them.
    pub fn get(&self, reference: ObjRef) -> Object {
        let mut chain = SmallVec::new();

        self.get_impl(reference, &mut chain)
    }

    fn get_impl(&self, reference: ObjRef, chain: &mut SmallVec<[u32; 8]>) -> Object {
        if chain.contains(&reference.obj_number) {
            return Object::Null(Null::with_reason(format!(
                "cycle while resolving {reference}"
            )));
        }

        chain.push(reference.obj_number);

        let object = match self.objects.get(&reference.obj_number) {
            None => Object::Null(Null::with_reason(format!("{reference} not found"))),
            Some(Slot::Free(_)) => {
                Object::Null(Null::with_reason(format!("{reference} is a free object")))
            }
            Some(Slot::InMemory(object)) => object.object.clone(),
            Some(Slot::OnDisk(entry)) => self.get_on_disk(reference, *entry, chain),
        };

        // A stream may declare its length indirectly; the payload boundary
        // can only be settled now.
        let object = self.resolve_stream_length(object, chain);

        chain.pop();

        object
    }

    fn get_on_disk(
        &self,
        reference: ObjRef,
        entry: XrefEntry,
        chain: &mut SmallVec<[u32; 8]>,
    ) -> Object {
        match entry {
            XrefEntry::Free { .. } => {
                Object::Null(Null::with_reason(format!("{reference} is a free object")))
            }
            XrefEntry::InUse { offset, .. } => {
                if offset >= self.data.len() {
                    return Object::Null(Null::with_reason(format!(
                        "{reference} points at offset {offset}, outside the file"
                    )));
                }

                let mut r = Reader::new_at(&self.data, offset);

                match r.read::<IndirectObject>() {
                    Some(object) => {
                        if object.reference != reference {
                            warn!(
                                "object at offset {offset} is {}, expected {reference}",
                                object.reference
                            );
                        }

                        object.object
                    }
                    None => Object::Null(Null::with_reason(format!(
                        "no parsable indirect object for {reference} at offset {offset}"
                    ))),
                }
            }
            XrefEntry::Compressed {
                stream_number,
                index,
            } => {
                // The generation number of an object stream is implicitly 0.
                let container = self.get_impl(ObjRef::new(stream_number, 0), chain);

                let Some(stream) = container.into_stream() else {
                    return Object::Null(Null::with_reason(format!(
                        "container of {reference}, object {stream_number}, is not a stream"
                    )));
                };

                let Some(object_stream) = xref::ObjectStream::new(&stream, &self.filters) else {
                    return Object::Null(Null::with_reason(format!(
                        "could not decode object stream {stream_number}"
                    )));
                };

                object_stream
                    .get(index, reference.obj_number)
                    .unwrap_or_else(|| {
                        Object::Null(Null::with_reason(format!(
                            "object stream {stream_number} does not hold {reference}"
                        )))
                    })
            }
        }
    }

    fn resolve_stream_length(
        &self,
        object: Object,
        chain: &mut SmallVec<[u32; 8]>,
    ) -> Object {
        let Object::Stream(mut stream) = object else {
            return object;
        };

        if let Some(length_ref) = stream.dict().get(LENGTH).and_then(Object::as_reference) {
            match self.get_impl(length_ref, chain) {
                Object::Integer(length) if length >= 0 => {
                    stream.truncate(length as usize);
                    stream
                        .dict_mut()
                        .insert(Name::new(LENGTH), Object::Integer(length));
                }
                other => {
                    warn!("stream length {length_ref} did not resolve to an integer: {other:?}")
                }
            }
        }

        Object::Stream(stream)
    }

    /// Add an indirect object to the store, masking any existing version of
    /// its object number. Only the most recently added version is saved.
    ///
    /// The generation number must be at least that of the version it masks
    /// (freed slots record the generation a reuse must carry); otherwise
    /// nothing is stored and [`StoreError::GenerationTooSmall`] reports the
    /// minimum acceptable value.
    pub fn add(&mut self, object: IndirectObject) -> Result<ObjRef, StoreError> {
        let reference = object.reference;

        if let Some(slot) = self.objects.get(&reference.obj_number) {
            let minimum = match slot {
                Slot::OnDisk(entry) => entry.gen_number(),
                Slot::InMemory(existing) => existing.reference.gen_number,
                Slot::Free(gen_number) => *gen_number,
            };

            if reference.gen_number < minimum {
                return Err(StoreError::GenerationTooSmall { minimum });
            }
        }

        self.size = self.size.max(reference.obj_number + 1);
        self.objects
            .insert(reference.obj_number, Slot::InMemory(object));

        Ok(reference)
    }

    /// Add an object under the next unused object number, at generation 0,
    /// and return the reference it received.
    pub fn add_object(&mut self, object: Object) -> ObjRef {
        let reference = ObjRef::new(self.size, 0);
        self.size += 1;

        self.objects.insert(
            reference.obj_number,
            Slot::InMemory(IndirectObject {
                reference,
                object,
            }),
        );

        reference
    }

    /// Free the object with the given number.
    ///
    /// The slot records the next acceptable generation number, one above the
    /// freed generation. Freeing a missing or already-free slot is a no-op.
    pub fn free(&mut self, number: u32) {
        let Some(slot) = self.objects.get(&number) else {
            return;
        };

        let next_gen = match slot {
            Slot::OnDisk(XrefEntry::InUse { gen_number, .. }) => gen_number.saturating_add(1),
            // Objects in object streams always have generation 0.
            Slot::OnDisk(XrefEntry::Compressed { .. }) => 1,
            Slot::OnDisk(XrefEntry::Free { .. }) | Slot::Free(_) => return,
            Slot::InMemory(object) => object.reference.gen_number.saturating_add(1),
        };

        self.objects.insert(number, Slot::Free(next_gen));
    }

    /// Append the added objects and a fresh cross-reference section to the
    /// backing file.
    ///
    /// After saving, the store remains usable and acts as though the file
    /// had just been opened: the saved versions are now on-disk objects, and
    /// further modifications append another revision. On failure the file is
    /// left at its pre-call size.
    pub fn save(&mut self) -> Result<(), SaveError> {
        let path = self.path.clone().ok_or(SaveError::NoBackingFile)?;

        let base = self.data.len();
        let mut buf = vec![];

        // A blank line separates the new revision from the existing bytes.
        if !self.data.ends_with(b"\n\n") {
            buf.extend_from_slice(b"\n\n");
        }

        // New objects, in ascending object number order.
        let mut dirty = self
            .objects
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::InMemory(_)))
            .map(|(number, _)| *number)
            .collect::<Vec<_>>();
        dirty.sort_unstable();

        let mut written = vec![];

        for number in dirty {
            let Some(Slot::InMemory(object)) = self.objects.get(&number) else {
                unreachable!();
            };

            let offset = base + buf.len();
            object.write_to(&mut buf);
            buf.push(b'\n');

            written.push((number, offset, object.reference.gen_number));
        }

        // The new section covers the written objects and the free list.
        let mut section = FxHashMap::default();

        let mut free = self
            .objects
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Free(_)))
            .map(|(number, _)| *number)
            .collect::<Vec<_>>();
        free.sort_unstable();

        // Free slots form a linked list ordered by object number, headed by
        // slot 0; the terminal link points back to 0.
        for (i, number) in free.iter().enumerate() {
            let Some(Slot::Free(gen_number)) = self.objects.get(number) else {
                unreachable!();
            };

            section.insert(
                *number,
                XrefEntry::Free {
                    next_free: free.get(i + 1).copied().unwrap_or(0),
                    gen_number: *gen_number,
                },
            );
        }

        for (number, offset, gen_number) in &written {
            section.insert(
                *number,
                XrefEntry::InUse {
                    offset: *offset,
                    gen_number: *gen_number,
                },
            );
        }

        let xref_offset = base + buf.len();

        let xref_object = match self.kind {
            XrefKind::Table => {
                self.write_xref_table(&mut buf, &section);

                None
            }
            XrefKind::Stream => Some(self.write_xref_stream(&mut buf, section, xref_offset)),
        };

        buf.extend_from_slice(format!("\nstartxref\n{xref_offset}\n%%EOF").as_bytes());

        if let Err(err) = append_to(&path, &buf) {
            // Leave the file at its pre-call size.
            let _ = fs::OpenOptions::new()
                .write(true)
                .open(&path)
                .and_then(|file| file.set_len(base as u64));

            return Err(SaveError::Io(err));
        }

        // The write landed; the saved versions are now on-disk objects.
        self.data.extend_from_slice(&buf);

        for (number, offset, gen_number) in written {
            self.objects.insert(
                number,
                Slot::OnDisk(XrefEntry::InUse { offset, gen_number }),
            );
        }

        if let Some((number, offset)) = xref_object {
            self.objects.insert(
                number,
                Slot::OnDisk(XrefEntry::InUse {
                    offset,
                    gen_number: 0,
                }),
            );
            self.size = self.size.max(number + 1);
        }

        self.prev = Some(xref_offset);

        Ok(())
    }

    /// Write the store to a fresh file at the given path, materializing
    /// every live object into a single revision.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        let mut out = Self::create_impl(path.as_ref())?;

        out.kind = self.kind;
        out.root = self.root;
        out.info = self.info;
        out.encrypt = self.encrypt.clone();
        out.id = self.id.clone();

        let mut numbers = self
            .objects
            .keys()
            .copied()
            .filter(|number| *number != 0)
            .collect::<Vec<_>>();
        numbers.sort_unstable();

        for number in numbers {
            match &self.objects[&number] {
                Slot::Free(gen_number) => {
                    out.objects.insert(number, Slot::Free(*gen_number));
                    out.size = out.size.max(number + 1);
                }
                Slot::InMemory(object) => {
                    let _ = out.add(object.clone());
                }
                Slot::OnDisk(entry) => {
                    let reference = ObjRef::new(number, entry.gen_number());
                    let object = self.get(reference);

                    if object.is_null() {
                        warn!("skipping {reference}, which did not resolve");

                        continue;
                    }

                    let _ = out.add(IndirectObject {
                        reference,
                        object,
                    });
                }
            }
        }

        out.save()
    }

    /// Emit a classical cross-reference table followed by its trailer.
    fn write_xref_table(&self, buf: &mut Vec<u8>, section: &FxHashMap<u32, XrefEntry>) {
        let mut numbers = section.keys().copied().collect::<Vec<_>>();
        numbers.sort_unstable();

        buf.extend_from_slice(b"xref\n");

        for group in consecutive_groups(&numbers) {
            buf.extend_from_slice(format!("{} {}\n", group[0], group.len()).as_bytes());

            for number in group {
                match section[number] {
                    XrefEntry::Free {
                        next_free,
                        gen_number,
                    } => buf.extend_from_slice(
                        format!("{next_free:010} {gen_number:05} f\r\n").as_bytes(),
                    ),
                    XrefEntry::InUse { offset, gen_number } => buf.extend_from_slice(
                        format!("{offset:010} {gen_number:05} n\r\n").as_bytes(),
                    ),
                    XrefEntry::Compressed { .. } => {
                        unreachable!("compressed entries cannot appear in a table")
                    }
                }
            }
        }

        buf.extend_from_slice(b"trailer\n");
        Object::Dict(self.trailer_dict(self.size)).write_to(buf);
    }

    /// Emit a cross-reference stream covering the section, including the
    /// stream object itself. Returns its object number and offset.
    fn write_xref_stream(
        &self,
        buf: &mut Vec<u8>,
        mut section: FxHashMap<u32, XrefEntry>,
        xref_offset: usize,
    ) -> (u32, usize) {
        // The stream is an object of its own, allocated past the current
        // maximum, and indexes itself.
        let stream_number = self.size;

        section.insert(
            stream_number,
            XrefEntry::InUse {
                offset: xref_offset,
                gen_number: 0,
            },
        );

        let mut numbers = section.keys().copied().collect::<Vec<_>>();
        numbers.sort_unstable();

        let rows = numbers
            .iter()
            .map(|number| match section[number] {
                XrefEntry::Free {
                    next_free,
                    gen_number,
                } => (0u64, next_free as u64, gen_number as u64),
                XrefEntry::InUse { offset, gen_number } => {
                    (1, offset as u64, gen_number as u64)
                }
                XrefEntry::Compressed {
                    stream_number,
                    index,
                } => (2, stream_number as u64, index as u64),
            })
            .collect::<Vec<_>>();

        // Each field is as wide as its largest value requires.
        let mut widths = [1, 1, 1];

        for (f1, f2, f3) in &rows {
            widths[0] = widths[0].max(required_width(*f1));
            widths[1] = widths[1].max(required_width(*f2));
            widths[2] = widths[2].max(required_width(*f3));
        }

        let mut payload = vec![];

        for (f1, f2, f3) in rows {
            push_be(&mut payload, f1, widths[0]);
            push_be(&mut payload, f2, widths[1]);
            push_be(&mut payload, f3, widths[2]);
        }

        let mut index = vec![];

        for group in consecutive_groups(&numbers) {
            index.push(Object::Integer(group[0] as i64));
            index.push(Object::Integer(group.len() as i64));
        }

        let mut dict = self.trailer_dict(stream_number + 1);
        dict.insert(Name::new(TYPE), Object::Name(Name::new(XREF)));
        dict.insert(
            Name::new(W),
            Object::Array(widths.iter().map(|w| Object::Integer(*w as i64)).collect()),
        );
        dict.insert(Name::new(INDEX), Object::Array(index));
        dict.insert(Name::new(FILTER), Object::Name(Name::new(FLATE_DECODE)));

        let stream = Stream::new(dict, deflate_encode(&payload));

        IndirectObject::new(stream_number, 0, Object::Stream(stream)).write_to(buf);

        (stream_number, xref_offset)
    }

    /// The trailer of a new revision: `Size`, `Root` and `Prev`, plus
    /// `Info`, `Encrypt` and `ID` when set.
    fn trailer_dict(&self, size: u32) -> Dict {
        let mut trailer = Dict::new();
        trailer.insert(Name::new(SIZE), Object::Integer(size as i64));

        match self.root {
            Some(root) => {
                trailer.insert(Name::new(ROOT), Object::Reference(root));
            }
            None => warn!("saving a file without a Root reference"),
        }

        if let Some(prev) = self.prev {
            trailer.insert(Name::new(PREV), Object::Integer(prev as i64));
        }

        if let Some(info) = self.info {
            trailer.insert(Name::new(INFO), Object::Reference(info));
        }

        if let Some(encrypt) = &self.encrypt {
            trailer.insert(Name::new(ENCRYPT), Object::Dict(encrypt.clone()));
        }

        if let Some(id) = &self.id {
            trailer.insert(Name::new(ID), Object::Array(id.clone()));
        }

        trailer
    }
}

fn append_to(path: &Path, buf: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new().append(true).open(path)?;
    file.write_all(buf)?;
    file.flush()
}

/// Group sorted object numbers into consecutive runs. Two numbers belong to
/// the same run iff they differ by one.
fn consecutive_groups(numbers: &[u32]) -> Vec<&[u32]> {
    let mut groups = vec![];
    let mut start = 0;

    for i in 1..numbers.len() {
        if numbers[i] != numbers[i - 1] + 1 {
            groups.push(&numbers[start..i]);
            start = i;
        }
    }

    if !numbers.is_empty() {
        groups.push(&numbers[start..]);
    }

    groups
}

#[cfg(test)]
mod tests {
    use crate::file::{File, LoadError, SaveError, StoreError};
    use crate::filter::flate::deflate_encode;
    use crate::object::dict::keys::{
        CATALOG, CONTENTS, COUNT, KIDS, LENGTH, MEDIA_BOX, OUTLINES, PAGE, PAGES, PARENT,
        PROC_SET, RESOURCES, TYPE,
    };
    use crate::object::{Dict, IndirectObject, Name, ObjRef, Object, Stream};
    use crate::reader::find;
    use crate::xref::XrefKind;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("pdfmod-{}-{name}.pdf", std::process::id()));
        let _ = std::fs::remove_file(&path);

        path
    }

    /// The six objects of a minimal document: a catalog, outlines, a page
    /// tree with one empty page, its content stream, and a procset.
    fn minimal_document() -> Vec<IndirectObject> {
        let mut catalog = Dict::new();
        catalog.insert(Name::new(TYPE), Object::Name(Name::new(CATALOG)));
        catalog.insert(Name::new(OUTLINES), Object::Reference(ObjRef::new(2, 0)));
        catalog.insert(Name::new(PAGES), Object::Reference(ObjRef::new(3, 0)));

        let mut outlines = Dict::new();
        outlines.insert(Name::new(TYPE), Object::Name(Name::new(OUTLINES)));
        outlines.insert(Name::new(COUNT), Object::Integer(0));

        let mut pages = Dict::new();
        pages.insert(Name::new(TYPE), Object::Name(Name::new(PAGES)));
        pages.insert(
            Name::new(KIDS),
            Object::Array(vec![Object::Reference(ObjRef::new(4, 0))]),
        );
        pages.insert(Name::new(COUNT), Object::Integer(1));

        let mut resources = Dict::new();
        resources.insert(Name::new(PROC_SET), Object::Reference(ObjRef::new(6, 0)));

        let mut page = Dict::new();
        page.insert(Name::new(TYPE), Object::Name(Name::new(PAGE)));
        page.insert(Name::new(PARENT), Object::Reference(ObjRef::new(3, 0)));
        page.insert(
            Name::new(MEDIA_BOX),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        page.insert(Name::new(CONTENTS), Object::Reference(ObjRef::new(5, 0)));
        page.insert(Name::new(RESOURCES), Object::Dict(resources));

        let mut content_dict = Dict::new();
        content_dict.insert(Name::new(LENGTH), Object::Integer(0));

        vec![
            IndirectObject::new(1, 0, Object::Dict(catalog)),
            IndirectObject::new(2, 0, Object::Dict(outlines)),
            IndirectObject::new(3, 0, Object::Dict(pages)),
            IndirectObject::new(4, 0, Object::Dict(page)),
            IndirectObject::new(5, 0, Object::Stream(Stream::new(content_dict, vec![]))),
            IndirectObject::new(6, 0, Object::Array(vec![Object::Name(Name::new(b"PDF"))])),
        ]
    }

    #[test]
    fn create_and_reopen() {
        let path = temp_path("create-and-reopen");
        let objects = minimal_document();

        let mut file = File::create(&path).unwrap();
        for object in &objects {
            file.add(object.clone()).unwrap();
        }
        file.root = Some(ObjRef::new(1, 0));
        file.save().unwrap();

        let data = std::fs::read(&path).unwrap();
        assert!(data.starts_with(b"%PDF-1.7"));
        assert!(data.ends_with(b"%%EOF"));

        let reopened = File::open(&path).unwrap();
        assert_eq!(reopened.root, Some(ObjRef::new(1, 0)));
        assert_eq!(reopened.size(), 7);

        for object in &objects {
            assert_eq!(reopened.get(object.reference), object.object);
        }
    }

    #[test]
    fn get_absent() {
        let path = temp_path("get-absent");
        let file = File::create(&path).unwrap();

        let Object::Null(null) = file.get(ObjRef::new(9, 0)) else {
            panic!("expected a null object");
        };

        assert!(null.reason().unwrap().contains("not found"));
    }

    #[test]
    fn generation_rules() {
        let path = temp_path("generation-rules");
        let mut file = File::create(&path).unwrap();

        file.add(IndirectObject::new(1, 0, Object::Integer(1)))
            .unwrap();
        file.free(1);

        // The freed slot records the generation a reuse must carry.
        assert_eq!(
            file.add(IndirectObject::new(1, 0, Object::Integer(2))),
            Err(StoreError::GenerationTooSmall { minimum: 1 })
        );
        assert!(file.add(IndirectObject::new(1, 1, Object::Integer(2))).is_ok());

        // Equal generation overwrites, lower does not.
        assert!(file.add(IndirectObject::new(1, 1, Object::Integer(3))).is_ok());
        assert_eq!(
            file.add(IndirectObject::new(1, 0, Object::Integer(4))),
            Err(StoreError::GenerationTooSmall { minimum: 1 })
        );
    }

    #[test]
    fn free_of_saved_object() {
        let path = temp_path("free-of-saved");
        let mut file = File::create(&path).unwrap();

        file.add(IndirectObject::new(1, 0, Object::Integer(1)))
            .unwrap();
        file.root = Some(ObjRef::new(1, 0));
        file.save().unwrap();

        file.free(1);

        assert_eq!(
            file.add(IndirectObject::new(1, 0, Object::Integer(2))),
            Err(StoreError::GenerationTooSmall { minimum: 1 })
        );
    }

    #[test]
    fn add_object_allocates() {
        let path = temp_path("add-object");
        let mut file = File::create(&path).unwrap();

        assert_eq!(
            file.add_object(Object::String("first".into())),
            ObjRef::new(1, 0)
        );
        assert_eq!(
            file.add_object(Object::String("second".into())),
            ObjRef::new(2, 0)
        );
        assert_eq!(file.size(), 3);
    }

    #[test]
    fn shadowing_and_free() {
        let path = temp_path("shadowing-and-free");

        let mut file = File::create(&path).unwrap();
        file.add(IndirectObject::new(1, 0, Object::Dict(Dict::new())))
            .unwrap();
        file.add(IndirectObject::new(10, 0, Object::String("v1".into())))
            .unwrap();
        file.root = Some(ObjRef::new(1, 0));
        file.save().unwrap();

        file.add(IndirectObject::new(10, 0, Object::String("v2".into())))
            .unwrap();
        file.save().unwrap();

        // The newest revision wins.
        let mut reopened = File::open(&path).unwrap();
        assert_eq!(reopened.get(ObjRef::new(10, 0)), Object::String("v2".into()));

        reopened.free(10);
        reopened.save().unwrap();

        let reopened = File::open(&path).unwrap();
        let Object::Null(null) = reopened.get(ObjRef::new(10, 0)) else {
            panic!("expected a null object");
        };
        assert!(null.reason().unwrap().contains("free"));
    }

    #[test]
    fn unmodified_save_preserves() {
        let path = temp_path("unmodified-save");
        let objects = minimal_document();

        let mut file = File::create(&path).unwrap();
        for object in &objects {
            file.add(object.clone()).unwrap();
        }
        file.root = Some(ObjRef::new(1, 0));
        file.save().unwrap();

        let mut reopened = File::open(&path).unwrap();
        reopened.save().unwrap();

        let reopened = File::open(&path).unwrap();
        for object in &objects {
            assert_eq!(reopened.get(object.reference), object.object);
        }
        assert_eq!(reopened.size(), 7);
    }

    #[test]
    fn xref_stream_save() {
        let path = temp_path("xref-stream-save");

        let mut file = File::create(&path).unwrap();
        file.set_xref_kind(XrefKind::Stream);
        file.add(IndirectObject::new(1, 0, Object::Dict(Dict::new())))
            .unwrap();
        file.add(IndirectObject::new(2, 0, Object::String("v1".into())))
            .unwrap();
        file.root = Some(ObjRef::new(1, 0));
        file.save().unwrap();

        let mut reopened = File::open(&path).unwrap();
        assert_eq!(reopened.xref_kind(), XrefKind::Stream);
        // Objects 1 and 2 plus the cross-reference stream at 3.
        assert_eq!(reopened.size(), 4);
        assert_eq!(reopened.get(ObjRef::new(2, 0)), Object::String("v1".into()));

        let xref_stream = reopened.get(ObjRef::new(3, 0));
        assert_eq!(
            xref_stream.as_stream().unwrap().dict().get_name(TYPE),
            Some(&Name::new(b"XRef"))
        );

        // A second revision chains through Prev.
        reopened
            .add(IndirectObject::new(2, 0, Object::String("v2".into())))
            .unwrap();
        reopened.save().unwrap();

        let reopened = File::open(&path).unwrap();
        assert_eq!(reopened.get(ObjRef::new(2, 0)), Object::String("v2".into()));
        assert_eq!(reopened.get(ObjRef::new(1, 0)), Object::Dict(Dict::new()));
    }

    #[test]
    fn free_list_bytes() {
        let path = temp_path("free-list-bytes");

        let mut file = File::create(&path).unwrap();
        for i in 1..=3 {
            file.add(IndirectObject::new(i, 0, Object::Integer(i as i64)))
                .unwrap();
        }
        file.root = Some(ObjRef::new(1, 0));
        file.free(2);
        file.save().unwrap();

        let data = std::fs::read(&path).unwrap();

        // One consecutive run covering slots 0 to 3.
        assert!(find(&data, b"xref\n0 4\n").is_some());
        // Slot 0 heads the free list and links to slot 2, which terminates
        // it by pointing back to 0 with the bumped generation.
        assert!(find(&data, b"0000000002 65535 f\r\n").is_some());
        assert!(find(&data, b"0000000000 00001 f\r\n").is_some());
    }

    fn simple_table_file(body: &[(u32, &[u8])], trailer_extra: &str) -> Vec<u8> {
        let mut data = b"%PDF-1.7\n".to_vec();
        let mut offsets = vec![];

        for (number, bytes) in body {
            offsets.push((*number, data.len()));
            data.extend_from_slice(bytes);
        }

        let size = body.iter().map(|(n, _)| n + 1).max().unwrap_or(1);
        let xref = data.len();

        data.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
        for (number, offset) in offsets {
            data.extend_from_slice(format!("{number} 1\n{offset:010} 00000 n \n").as_bytes());
        }
        data.extend_from_slice(
            format!("trailer\n<</Size {size}{trailer_extra}>>\nstartxref\n{xref}\n%%EOF")
                .as_bytes(),
        );

        data
    }

    #[test]
    fn length_reference_resolved() {
        let data = simple_table_file(
            &[
                (1, b"1 0 obj\n<</Length 2 0 R>>\nstream\nhello world\nendstream\nendobj\n"),
                (2, b"2 0 obj\n5\nendobj\n"),
            ],
            "",
        );

        let file = File::from_bytes(data).unwrap();

        let Object::Stream(stream) = file.get(ObjRef::new(1, 0)) else {
            panic!("expected a stream");
        };

        assert_eq!(stream.raw_data(), b"hello");
        assert_eq!(stream.dict().get_integer(LENGTH), Some(5));
    }

    #[test]
    fn length_reference_cycle() {
        let data = simple_table_file(
            &[
                (1, b"1 0 obj\n<</Length 2 0 R>>\nstream\naaa\nendstream\nendobj\n"),
                (2, b"2 0 obj\n<</Length 1 0 R>>\nstream\nbbb\nendstream\nendobj\n"),
            ],
            "",
        );

        let file = File::from_bytes(data).unwrap();

        // Must terminate; the length stays unresolved.
        let Object::Stream(stream) = file.get(ObjRef::new(1, 0)) else {
            panic!("expected a stream");
        };
        assert_eq!(stream.raw_data(), b"aaa");
    }

    #[test]
    fn compressed_objects() {
        let mut data = b"%PDF-1.7\n".to_vec();

        let obj4 = data.len();
        data.extend_from_slice(
            b"4 0 obj\n<</Type/ObjStm/N 2/First 10/Length 17>>\nstream\n11 0 12 4 (a) (b)\nendstream\nendobj\n",
        );

        let obj5 = data.len();
        let mut rows = vec![];
        for (f1, f2, f3) in [
            (0u64, 0u64, 65535u64),
            (1, obj4 as u64, 0),
            (1, obj5 as u64, 0),
            (2, 4, 0),
            (2, 4, 1),
        ] {
            crate::xref::push_be(&mut rows, f1, 1);
            crate::xref::push_be(&mut rows, f2, 3);
            crate::xref::push_be(&mut rows, f3, 2);
        }
        let compressed = deflate_encode(&rows);

        data.extend_from_slice(
            format!(
                "5 0 obj\n<</Type/XRef/Size 13/Index[0 1 4 2 11 2]/W[1 3 2]/Filter/FlateDecode/Length {}>>\nstream\n",
                compressed.len()
            )
            .as_bytes(),
        );
        data.extend_from_slice(&compressed);
        data.extend_from_slice(b"\nendstream\nendobj\n");
        data.extend_from_slice(format!("startxref\n{obj5}\n%%EOF").as_bytes());

        let file = File::from_bytes(data).unwrap();

        assert_eq!(file.size(), 13);
        assert_eq!(file.get(ObjRef::new(11, 0)), Object::String("a".into()));
        assert_eq!(file.get(ObjRef::new(12, 0)), Object::String("b".into()));

        // Numbers the cross-reference data does not cover are free slots.
        assert!(file.get(ObjRef::new(7, 0)).is_null());
    }

    #[test]
    fn save_as_materializes() {
        let path = temp_path("save-as-src");
        let copy = temp_path("save-as-copy");
        let objects = minimal_document();

        let mut file = File::create(&path).unwrap();
        for object in &objects {
            file.add(object.clone()).unwrap();
        }
        file.root = Some(ObjRef::new(1, 0));
        file.save().unwrap();

        // A second revision, so the source holds several.
        file.add(IndirectObject::new(2, 0, Object::String("other".into())))
            .unwrap();
        file.save().unwrap();

        file.save_as(&copy).unwrap();

        let data = std::fs::read(&copy).unwrap();
        // A single revision: one startxref in the whole file.
        assert_eq!(
            crate::reader::find(&data, b"startxref"),
            crate::reader::rfind(&data, b"startxref")
        );

        let reopened = File::open(&copy).unwrap();
        assert_eq!(reopened.root, Some(ObjRef::new(1, 0)));
        assert_eq!(
            reopened.get(ObjRef::new(2, 0)),
            Object::String("other".into())
        );
        for object in objects.iter().filter(|o| o.reference.obj_number != 2) {
            assert_eq!(reopened.get(object.reference), object.object);
        }
    }

    #[test]
    fn bad_header() {
        assert!(matches!(
            File::from_bytes(b"not a pdf at all".to_vec()),
            Err(LoadError::BadHeader)
        ));
    }

    #[test]
    fn no_backing_file() {
        let data = simple_table_file(&[(1, b"1 0 obj\n(x)\nendobj\n")], "/Root 1 0 R");
        let mut file = File::from_bytes(data).unwrap();

        assert!(matches!(file.save(), Err(SaveError::NoBackingFile)));
    }
}
