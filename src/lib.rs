/*!
A low-level library for incremental, random-access manipulation of the objects
stored in a PDF file.

A PDF file is, at its core, an append-only object store: a header, a sequence
of numbered indirect objects, and one or more cross-reference sections that
let a reader locate any object by `(object number, generation number)` without
scanning the whole file. This crate exposes that store directly: open a file,
fetch objects by reference, add or overwrite objects, free object numbers, and
save — where saving appends an incremental update (new objects plus a fresh
cross-reference section) without rewriting any existing bytes.

This crate deliberately stays below the document level. It knows nothing about
catalogs, page trees, fonts or rendering; higher-level abstractions are meant
to be built on top of it.

# Example
This short example opens a PDF file, reads its catalog, adds a piece of
metadata and appends the change to the file.

```no_run
use pdfmod::File;
use pdfmod::object::{IndirectObject, Name, Object};

let mut file = File::open("example.pdf")?;

// Every well-formed document has a catalog; `get` never fails, it returns
// `Object::Null` with a diagnostic for dangling references.
let root = file.root.expect("document has no catalog");
let catalog = file.get(root);
println!("{catalog:?}");

// Overwrite the catalog with a modified copy.
if let Object::Dict(mut dict) = catalog {
    dict.insert(Name::new(b"PageLayout"), Object::Name(Name::new(b"TwoColumnLeft")));
    file.add(IndirectObject::new(
        root.obj_number,
        root.gen_number,
        Object::Dict(dict),
    ))?;
}

// Appends the new catalog version and a new cross-reference section.
file.save()?;
# Ok::<(), Box<dyn std::error::Error>>(())
```

# Features
- Parsing of all nine primitive object types, object references and indirect
  objects, byte-for-byte per the `Syntax` chapter of the PDF reference.
- Cross-reference tables in all their forms: classical tables, compressed
  cross-reference streams, and hybrid files, chained over any number of
  incremental updates.
- Objects compressed into object streams are located and decoded on demand.
- Appending incremental updates, emitting either a classical table or a
  cross-reference stream, matching the form the file was opened with.
- Serialization of every object type, including streams whose `Length` is
  kept consistent with the payload.

# Limitations
- Encrypted documents are not supported: the `Encrypt` trailer value is
  preserved across saves, but strings and streams are returned as stored.
- Only the filters needed to read cross-reference and object streams are
  built in (`FlateDecode`, `ASCII85Decode`, `ASCIIHexDecode`). Further
  decoders can be registered per store, keyed by filter name.
- Existing bytes are never rewritten; every mutation is an append. Freed
  object numbers only become reusable space for readers that honor free
  lists.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub(crate) mod reader;
pub(crate) mod trivia;
pub(crate) mod util;

pub mod file;
pub mod filter;
pub mod object;
pub mod write;
pub mod xref;

pub use file::{File, LoadError, SaveError, StoreError};
pub use object::{Dict, IndirectObject, Name, Object, ObjRef};
