//! Decoder for the host's url-encoded stream map
//!
//! The stream map is not valid form encoding: values that were already
//! decoded once may contain the separators again. We split on the literal
//! separators first and percent-decode every value on its own.

use crate::error::VidmapError;
use std::collections::BTreeMap;
use tracing::warn;

/// Separator between variants
pub const VARIANT_SEPARATOR: char = ',';
/// Separator between the fields of one variant
pub const FIELD_SEPARATOR: char = '&';

/// Decoded stream map as parallel lists keyed by field name.
///
/// Every list has exactly `len()` entries; index `i` refers to the same
/// variant in all of them. A field missing from a record is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMap {
    fields: BTreeMap<String, Vec<Option<String>>>,
    len: usize,
}

/// One variant of the stream map, borrowed from a [`StreamMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamMapRecord<'a> {
    pub itag: Option<&'a str>,
    pub url: Option<&'a str>,
    pub quality: Option<&'a str>,
    pub fallback_host: Option<&'a str>,
    /// Scrambled signature token
    pub s: Option<&'a str>,
    /// Already descrambled signature
    pub sig: Option<&'a str>,
    pub mime_type: Option<&'a str>,
}

impl StreamMap {
    /// Decode a raw stream map, failing on the first malformed record
    pub fn decode(raw: &str) -> Result<Self, VidmapError> {
        let mut map = StreamMap::default();
        for (index, variant) in split_variants(raw).enumerate() {
            let record = decode_record(variant)
                .map_err(|e| VidmapError::DecodeError(format!("record {}: {}", index, e)))?;
            map.push(record);
        }
        Ok(map)
    }

    /// Decode a raw stream map, dropping malformed records.
    ///
    /// Returns the surviving records together with one error per dropped
    /// record, keyed by its position in the raw input.
    pub fn decode_lenient(raw: &str) -> (Self, Vec<(usize, VidmapError)>) {
        let mut map = StreamMap::default();
        let mut errors = Vec::new();

        for (index, variant) in split_variants(raw).enumerate() {
            match decode_record(variant) {
                Ok(record) => map.push(record),
                Err(e) => {
                    warn!("Dropping stream map record {}: {}", index, e);
                    errors.push((index, VidmapError::DecodeError(e)));
                }
            }
        }

        (map, errors)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Values of one field across all records
    pub fn field(&self, name: &str) -> Option<&[Option<String>]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// Names of all fields seen in any record
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Value of `name` for record `index`
    pub fn value(&self, name: &str, index: usize) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.get(index))
            .and_then(|value| value.as_deref())
    }

    /// Typed view of record `index`
    pub fn record(&self, index: usize) -> Option<StreamMapRecord<'_>> {
        if index >= self.len {
            return None;
        }
        Some(StreamMapRecord {
            itag: self.value("itag", index),
            url: self.value("url", index),
            quality: self.value("quality", index),
            fallback_host: self.value("fallback_host", index),
            s: self.value("s", index),
            sig: self.value("sig", index),
            mime_type: self.value("type", index),
        })
    }

    /// Iterate over all records in input order
    pub fn records(&self) -> impl Iterator<Item = StreamMapRecord<'_>> {
        (0..self.len).filter_map(move |index| self.record(index))
    }

    fn push(&mut self, record: Vec<(String, String)>) {
        let index = self.len;
        self.len += 1;

        for (key, value) in record {
            let values = self
                .fields
                .entry(key)
                .or_insert_with(|| vec![None; index]);
            // Repeated keys within one record: the last one wins
            if values.len() > index {
                values[index] = Some(value);
            } else {
                values.push(Some(value));
            }
        }

        for values in self.fields.values_mut() {
            values.resize(self.len, None);
        }
    }
}

fn split_variants(raw: &str) -> impl Iterator<Item = &str> {
    let mut variants = raw.split(VARIANT_SEPARATOR);
    // An empty map has no records, not one empty record
    if raw.is_empty() {
        variants.next();
    }
    variants
}

fn decode_record(variant: &str) -> Result<Vec<(String, String)>, String> {
    variant
        .split(FIELD_SEPARATOR)
        .map(|field| {
            let (key, value) = field
                .split_once('=')
                .ok_or_else(|| format!("field {:?} has no '='", field))?;
            let value = urlencoding::decode(value)
                .map_err(|e| format!("field {:?} is not valid UTF-8: {}", key, e))?;
            Ok((key.to_string(), value.into_owned()))
        })
        .collect()
}
