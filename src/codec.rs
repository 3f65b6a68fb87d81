//! Pluggable text codecs keyed by canonical type identifier.

use std::collections::HashMap;
use std::fmt;

use crate::error::{ConfigError, DecodeError, Result};
use crate::value::{self, Value};

/// Converts a typed value into its encoded text form.
///
/// Encode functions are total: they must accept any [`Value`] variant,
/// because raw assignment can store a value whose variant differs from the
/// option's declared type.
pub type EncodeFn = Box<dyn Fn(&Value) -> String + Send + Sync>;

/// Converts encoded text back into a typed value.
pub type DecodeFn =
    Box<dyn Fn(&str) -> std::result::Result<Value, DecodeError> + Send + Sync>;

/// Conversion functions registered for one type identifier.
///
/// Either half may be absent; an absent half selects the fallback behavior
/// for that direction (generic string form for encode, pass-through for
/// decode), never an error.
pub struct CodecEntry {
    encode: Option<EncodeFn>,
    decode: Option<DecodeFn>,
}

impl CodecEntry {
    pub fn has_encode(&self) -> bool {
        self.encode.is_some()
    }

    pub fn has_decode(&self) -> bool {
        self.decode.is_some()
    }
}

impl fmt::Debug for CodecEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecEntry")
            .field("encode", &self.has_encode())
            .field("decode", &self.has_decode())
            .finish()
    }
}

/// Registry of text conversions, looked up by canonical type identifier.
///
/// [`Codec::new`] stocks the registry with conversions for every
/// [`Value`](crate::Value) variant; [`Codec::empty`] starts bare.
/// Registrations persist for the codec's lifetime and change only through
/// [`register_type`](Codec::register_type) and its unregister
/// counterparts.
#[derive(Debug)]
pub struct Codec {
    types: HashMap<String, CodecEntry>,
}

impl Codec {
    /// A registry stocked with the default conversions.
    pub fn new() -> Self {
        let mut codec = Self::empty();

        codec.register_type(
            value::STR,
            Some(display_encode()),
            Some(Box::new(|s: &str| Ok(Value::Str(s.to_string())))),
        );

        codec.register_type(
            value::INT,
            Some(display_encode()),
            Some(Box::new(|s: &str| {
                s.trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|e| DecodeError::new(value::INT, s, e))
            })),
        );

        codec.register_type(
            value::FLOAT,
            Some(display_encode()),
            Some(Box::new(|s: &str| {
                s.trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|e| DecodeError::new(value::FLOAT, s, e))
            })),
        );

        codec.register_type(
            value::BOOL,
            Some(display_encode()),
            Some(Box::new(|s: &str| match s.to_ascii_lowercase().as_str() {
                "1" | "yes" | "true" | "on" => Ok(Value::Bool(true)),
                "0" | "no" | "false" | "off" => Ok(Value::Bool(false)),
                _ => Err(DecodeError::new(value::BOOL, s, "not a boolean token")),
            })),
        );

        codec.register_type(
            value::STR_SET,
            Some(display_encode()),
            Some(Box::new(|s: &str| {
                Ok(Value::StrSet(clean_split(s).map(String::from).collect()))
            })),
        );

        codec.register_type(
            value::STR_LIST,
            Some(display_encode()),
            Some(Box::new(|s: &str| {
                Ok(Value::StrList(clean_split(s).map(String::from).collect()))
            })),
        );

        codec.register_type(
            value::INT_LIST,
            Some(display_encode()),
            Some(Box::new(|s: &str| {
                let mut items = Vec::new();
                for piece in clean_split(s) {
                    let n = piece
                        .parse::<i64>()
                        .map_err(|e| DecodeError::new(value::INT_LIST, s, e))?;
                    items.push(n);
                }
                Ok(Value::IntList(items))
            })),
        );

        codec
    }

    /// A registry with no conversions at all. Every type falls back until
    /// registered.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register conversions for a type identifier, replacing any existing
    /// registration wholesale. A `None` half keeps the fallback behavior
    /// for that direction.
    pub fn register_type(
        &mut self,
        type_name: &str,
        encode: Option<EncodeFn>,
        decode: Option<DecodeFn>,
    ) {
        self.types
            .insert(type_name.to_string(), CodecEntry { encode, decode });
    }

    /// Remove a registration. Fails if the identifier was never registered.
    pub fn unregister_type(&mut self, type_name: &str) -> Result<()> {
        if self.types.remove(type_name).is_none() {
            return Err(ConfigError::UnknownType(type_name.to_string()));
        }
        Ok(())
    }

    /// Remove every registration, leaving an empty registry.
    pub fn unregister_all_types(&mut self) {
        self.types.clear();
    }

    pub fn entry(&self, type_name: &str) -> Option<&CodecEntry> {
        self.types.get(type_name)
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Encode a value using the registration for `type_name`, falling back
    /// to the generic string form when the identifier is absent, has no
    /// encode half, or is `None`. Never fails.
    pub fn encode(&self, value: &Value, type_name: Option<&str>) -> String {
        if let Some(ty) = type_name
            && let Some(entry) = self.types.get(ty)
            && let Some(encode) = &entry.encode
        {
            return encode(value);
        }
        value.to_string()
    }

    /// Decode text using the registration for `type_name`, falling back to
    /// passing the text through unchanged. Never fails because a type is
    /// unregistered; a registered decode function may still reject
    /// malformed text.
    pub fn decode(
        &self,
        text: &str,
        type_name: Option<&str>,
    ) -> std::result::Result<Value, DecodeError> {
        if let Some(ty) = type_name
            && let Some(entry) = self.types.get(ty)
            && let Some(decode) = &entry.decode
        {
            return decode(text);
        }
        Ok(Value::Str(text.to_string()))
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

fn display_encode() -> EncodeFn {
    Box::new(|v: &Value| v.to_string())
}

/// Split on commas, trim each piece, and drop pieces that are empty after
/// trimming.
fn clean_split(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|p| !p.is_empty())
}
