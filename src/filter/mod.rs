//! Decoding stream filters.
//!
//! Only the filters needed to read cross-reference streams and object
//! streams are built in. Everything else can be supplied by the caller: a
//! [`Filters`] value is an open registry from filter name to decode
//! function, and each store carries its own, so there is no process-wide
//! state.

pub mod ascii_85;
pub mod ascii_hex;
pub mod flate;

use crate::object::dict::keys::{
    ASCII85_DECODE, ASCII85_DECODE_ABBREVIATION, ASCII_HEX_DECODE, ASCII_HEX_DECODE_ABBREVIATION,
    DECODE_PARMS, FILTER, FLATE_DECODE, FLATE_DECODE_ABBREVIATION,
};
use crate::object::{Dict, Name, Object, Stream};
use crate::util::OptionLog;
use log::warn;
use rustc_hash::FxHashMap;

/// A decode function: the raw bytes and the (already positionally matched)
/// decode parameters in, the decoded bytes out.
pub type DecodeFn = fn(&[u8], Option<&Dict>) -> Option<Vec<u8>>;

/// A registry of stream filters, keyed by filter name.
#[derive(Clone)]
pub struct Filters {
    map: FxHashMap<Name, DecodeFn>,
}

impl Default for Filters {
    fn default() -> Self {
        let mut filters = Self {
            map: FxHashMap::default(),
        };

        filters.register(Name::new(FLATE_DECODE), flate::decode);
        filters.register(Name::new(FLATE_DECODE_ABBREVIATION), flate::decode);
        filters.register(Name::new(ASCII85_DECODE), |data, _| ascii_85::decode(data));
        filters.register(Name::new(ASCII85_DECODE_ABBREVIATION), |data, _| {
            ascii_85::decode(data)
        });
        filters.register(Name::new(ASCII_HEX_DECODE), |data, _| {
            ascii_hex::decode(data)
        });
        filters.register(Name::new(ASCII_HEX_DECODE_ABBREVIATION), |data, _| {
            ascii_hex::decode(data)
        });

        filters
    }
}

impl Filters {
    /// Register a decode function for a filter name, replacing any previous
    /// one registered under that name.
    pub fn register(&mut self, name: Name, decode: DecodeFn) {
        self.map.insert(name, decode);
    }

    /// Apply a single filter to the given data.
    pub fn apply(&self, name: &Name, data: &[u8], params: Option<&Dict>) -> Option<Vec<u8>> {
        let Some(decode) = self.map.get(name.as_ref()) else {
            warn!("unknown filter: {}", name.as_str());

            return None;
        };

        decode(data, params).warn_none(&format!("failed to apply filter {}", name.as_str()))
    }

    /// Decode the payload of a stream by applying the filter chain declared
    /// in its dictionary.
    ///
    /// `Filter` may be a single name or an array of names applied in order;
    /// `DecodeParms` matches positionally.
    pub fn decode_stream(&self, stream: &Stream) -> Option<Vec<u8>> {
        let dict = stream.dict();

        let filters = match dict.get(FILTER) {
            None => return Some(stream.raw_data().to_vec()),
            Some(Object::Name(name)) => vec![name.clone()],
            Some(Object::Array(names)) => names
                .iter()
                .map(|n| n.as_name().cloned())
                .collect::<Option<Vec<_>>>()?,
            Some(other) => {
                warn!("malformed Filter entry: {other:?}");

                return None;
            }
        };

        let params = match dict.get(DECODE_PARMS) {
            None => vec![],
            Some(Object::Dict(d)) => vec![Some(d.clone())],
            Some(Object::Array(items)) => items
                .iter()
                .map(|i| i.as_dict().cloned())
                .collect::<Vec<_>>(),
            Some(Object::Null(_)) => vec![],
            Some(other) => {
                warn!("malformed DecodeParms entry: {other:?}");

                vec![]
            }
        };

        let mut current = stream.raw_data().to_vec();

        for (i, name) in filters.iter().enumerate() {
            let param = params.get(i).and_then(|p| p.as_ref());
            current = self.apply(name, &current, param)?;
        }

        Some(current)
    }
}

impl std::fmt::Debug for Filters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filters")
            .field("names", &self.map.keys().collect::<Vec<_>>())
            .finish()
    }
}
