//! A decoder for flate-encoded streams, with PNG predictor support.

use crate::object::Dict;
use crate::object::dict::keys::{BITS_PER_COMPONENT, COLORS, COLUMNS, PREDICTOR};
use log::warn;

/// Decode a flate-encoded stream and undo any predictor declared in the
/// decode parameters.
pub fn decode(data: &[u8], params: Option<&Dict>) -> Option<Vec<u8>> {
    let decoded = inflate(data)?;

    match params {
        None => Some(decoded),
        Some(params) => apply_predictor(decoded, &PredictorParams::from_dict(params)),
    }
}

/// The payload is normally wrapped in a zlib envelope, but some producers
/// write bare deflate data.
fn inflate(data: &[u8]) -> Option<Vec<u8>> {
    miniz_oxide::inflate::decompress_to_vec_zlib(data)
        .ok()
        .or_else(|| miniz_oxide::inflate::decompress_to_vec(data).ok())
}

/// Compress data into a zlib envelope.
pub(crate) fn deflate_encode(data: &[u8]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    let mut e = ZlibEncoder::new(Vec::new(), Compression::new(6));
    e.write_all(data).unwrap();
    e.finish().unwrap()
}

struct PredictorParams {
    predictor: u8,
    colors: u8,
    bits_per_component: u8,
    columns: usize,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

impl PredictorParams {
    fn from_dict(dict: &Dict) -> Self {
        let default = Self::default();

        Self {
            predictor: dict
                .get_integer(PREDICTOR)
                .and_then(|p| p.try_into().ok())
                .unwrap_or(default.predictor),
            colors: dict
                .get_integer(COLORS)
                .and_then(|c| c.try_into().ok())
                .unwrap_or(default.colors),
            bits_per_component: dict
                .get_integer(BITS_PER_COMPONENT)
                .and_then(|b| b.try_into().ok())
                .unwrap_or(default.bits_per_component),
            columns: dict.get_usize(COLUMNS).unwrap_or(default.columns),
        }
    }
}

fn apply_predictor(data: Vec<u8>, params: &PredictorParams) -> Option<Vec<u8>> {
    match params.predictor {
        1 => Some(data),
        predictor if predictor >= 10 => {
            if params.bits_per_component != 8 {
                warn!(
                    "unsupported predictor bit depth {}",
                    params.bits_per_component
                );

                return None;
            }

            let bytes_per_pixel = params.colors as usize;
            let row_len = params.columns * bytes_per_pixel;

            png_unfilter(&data, row_len, bytes_per_pixel)
        }
        other => {
            warn!("unsupported predictor {other}");

            None
        }
    }
}

/// Reconstruct PNG-filtered rows. Each row starts with a filter tag byte,
/// followed by `row_len` filtered bytes.
fn png_unfilter(data: &[u8], row_len: usize, bytes_per_pixel: usize) -> Option<Vec<u8>> {
    if row_len == 0 {
        return None;
    }

    let stride = row_len + 1;

    if !data.len().is_multiple_of(stride) {
        warn!("predictor input is not a whole number of rows");

        return None;
    }

    let num_rows = data.len() / stride;
    let mut out = vec![0; num_rows * row_len];

    for row in 0..num_rows {
        let tag = data[row * stride];
        let input = &data[row * stride + 1..(row + 1) * stride];

        let (done, rest) = out.split_at_mut(row * row_len);
        let prev = if row == 0 {
            None
        } else {
            done.get((row - 1) * row_len..)
        };
        let cur = &mut rest[..row_len];

        for i in 0..row_len {
            let left = if i >= bytes_per_pixel {
                cur[i - bytes_per_pixel]
            } else {
                0
            };
            let up = prev.map(|p| p[i]).unwrap_or(0);
            let up_left = if i >= bytes_per_pixel {
                prev.map(|p| p[i - bytes_per_pixel]).unwrap_or(0)
            } else {
                0
            };

            cur[i] = match tag {
                0 => input[i],
                1 => input[i].wrapping_add(left),
                2 => input[i].wrapping_add(up),
                3 => input[i].wrapping_add(((left as u16 + up as u16) / 2) as u8),
                4 => input[i].wrapping_add(paeth(left, up, up_left)),
                _ => {
                    warn!("unknown row filter {tag}");

                    return None;
                }
            };
        }
    }

    Some(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
