//! The typed configuration registry.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::mem;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::codec::{Codec, DecodeFn, EncodeFn};
use crate::error::{ConfigError, Result};
use crate::format::{Format, IniFormat};
use crate::section::{Section, SectionData, SectionMut};
use crate::value::Value;

/// A registry of typed options grouped into named sections.
///
/// Options are addressed by flat keys (`"section.option"` with the
/// default delimiter) or through section views. Each option can carry a
/// schema entry recording its default value and declared type; in strict
/// mode (the default), reading or writing an option without a schema
/// entry is an error. File contents pass through the codec on the way in
/// and out, so stored values stay typed.
pub struct Config {
    delimiter: String,
    strict: bool,
    sections: Vec<SectionData>,
    codec: Codec,
    format: Box<dyn Format>,
    sources: Vec<PathBuf>,
}

impl Config {
    /// A registry with the default settings: strict mode on, `.` key
    /// delimiter, the stocked codec, the INI format, and no sources.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// The config-wide strict flag. Sections without an explicit override
    /// inherit it at every check.
    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Path sources configured at construction, in precedence order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Split a flat key into section and option names on the first
    /// delimiter occurrence. Later occurrences belong to the option name.
    fn split_key<'k>(&self, key: &'k str) -> Result<(&'k str, &'k str)> {
        key.split_once(self.delimiter.as_str())
            .ok_or_else(|| ConfigError::InvalidKey(key.to_string()))
    }

    /// Define an option by flat key, inferring the type identifier from
    /// the default's variant. The section is created if needed and the
    /// stored value is seeded with the default.
    pub fn define(&mut self, key: &str, default: impl Into<Value>) -> Result<()> {
        let (section, option) = self.split_key(key)?;
        self.section(section).define(option, default);
        Ok(())
    }

    /// Define an option by flat key with an explicit type identifier.
    pub fn define_as(
        &mut self,
        key: &str,
        default: impl Into<Value>,
        type_name: &str,
    ) -> Result<()> {
        let (section, option) = self.split_key(key)?;
        self.section(section).define_as(option, default, type_name);
        Ok(())
    }

    /// Look up an option by flat key. A key without the delimiter is an
    /// [`InvalidKey`](ConfigError::InvalidKey) error; a missing section,
    /// a missing option, and a strict-mode rejection all read as
    /// `Ok(None)`. Never creates a section.
    pub fn get(&self, key: &str) -> Result<Option<&Value>> {
        let (section, option) = self.split_key(key)?;
        let Some(data) = self.sections.iter().find(|s| s.name == section) else {
            return Ok(None);
        };
        match data.get_value(option, self.strict) {
            Err(ConfigError::UnknownOption(_)) => Ok(None),
            other => other,
        }
    }

    /// Assign an option by flat key, storing the value verbatim. The
    /// section is created if needed; the assignment itself is subject to
    /// the section's strict check.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let (section, option) = self.split_key(key)?;
        let value = value.into();
        self.section(section).set(option, value)
    }

    /// Exclusive access to a section, creating it on first use.
    pub fn section(&mut self, name: &str) -> SectionMut<'_> {
        self.section_entry(name, None)
    }

    /// Like [`section`](Config::section), but a newly created section
    /// starts with the given strict override. The override is ignored
    /// when the section already exists.
    pub fn section_with_strict(&mut self, name: &str, strict: bool) -> SectionMut<'_> {
        self.section_entry(name, Some(strict))
    }

    fn section_entry(&mut self, name: &str, strict: Option<bool>) -> SectionMut<'_> {
        let pos = match self.sections.iter().position(|s| s.name == name) {
            Some(i) => i,
            None => {
                self.sections.push(SectionData::new(name, strict));
                self.sections.len() - 1
            }
        };
        SectionMut {
            data: &mut self.sections[pos],
            codec: &self.codec,
            default_strict: self.strict,
        }
    }

    /// Shared access to a section, without creating it.
    pub fn find_section(&self, name: &str) -> Option<Section<'_>> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|data| self.view(data))
    }

    /// Sections in creation order.
    pub fn sections(&self) -> impl Iterator<Item = Section<'_>> {
        self.sections.iter().map(|data| self.view(data))
    }

    fn view<'a>(&'a self, data: &'a SectionData) -> Section<'a> {
        Section {
            data,
            codec: &self.codec,
            default_strict: self.strict,
        }
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Drop every section, schema and values alike. Codec registrations
    /// are untouched.
    pub fn clear(&mut self) {
        self.sections.clear();
    }

    /// Snapshot the held values as nested maps.
    pub fn to_map(&self) -> BTreeMap<String, BTreeMap<String, Value>> {
        self.sections
            .iter()
            .map(|data| {
                let options = data
                    .values
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                (data.name.clone(), options)
            })
            .collect()
    }

    /// Snapshot the held values in their encoded text form.
    pub fn to_encoded_map(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.sections()
            .map(|section| {
                let options = section
                    .encoded_items()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect();
                (section.name().to_string(), options)
            })
            .collect()
    }

    /// Register conversions on the owned codec. See
    /// [`Codec::register_type`].
    pub fn register_type(
        &mut self,
        type_name: &str,
        encode: Option<EncodeFn>,
        decode: Option<DecodeFn>,
    ) {
        self.codec.register_type(type_name, encode, decode);
    }

    pub fn unregister_type(&mut self, type_name: &str) -> Result<()> {
        self.codec.unregister_type(type_name)
    }

    pub fn unregister_all_types(&mut self) {
        self.codec.unregister_all_types();
    }

    /// Load every configured source in order. A source that cannot be
    /// opened is logged at warn level and skipped, so one missing file
    /// does not block the rest; errors raised while parsing or decoding
    /// an opened source propagate and abort the call.
    pub fn read(&mut self) -> Result<()> {
        let sources = self.sources.clone();
        self.read_paths(&sources)
    }

    /// Like [`read`](Config::read), but for an explicit path list instead
    /// of the configured sources.
    pub fn read_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        for path in paths {
            let path = path.as_ref();
            let file = match open_source(path) {
                Ok(f) => f,
                Err(e) => {
                    warn!("Skipping unreadable config source {}: {}", path.display(), e);
                    continue;
                }
            };
            let mut reader = BufReader::new(file);
            self.read_with_format(&mut reader)?;
        }
        Ok(())
    }

    /// Parse one already-open stream. No open-failure tolerance applies.
    pub fn read_from(&mut self, reader: impl Read) -> Result<()> {
        let mut reader = BufReader::new(reader);
        self.read_with_format(&mut reader)
    }

    /// Write the current state to the first configured source.
    pub fn write(&mut self) -> Result<()> {
        let Some(path) = self.sources.first().cloned() else {
            return Err(ConfigError::Io(std::io::Error::new(
                ErrorKind::NotFound,
                "no config source to write",
            )));
        };
        self.write_path(path)
    }

    /// Write the current state to an explicit path.
    pub fn write_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_with_format(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the current state to a stream.
    pub fn write_to(&mut self, mut writer: impl Write) -> Result<()> {
        self.write_with_format(&mut writer)
    }

    // The format needs `&mut Config` while being owned by it, so it is
    // swapped out for the duration of the call.

    fn read_with_format(&mut self, reader: &mut dyn BufRead) -> Result<()> {
        let mut format = mem::replace(&mut self.format, Box::new(IniFormat::new()));
        let result = format.read(reader, self);
        self.format = format;
        result
    }

    fn write_with_format(&mut self, writer: &mut dyn Write) -> Result<()> {
        let mut format = mem::replace(&mut self.format, Box::new(IniFormat::new()));
        let result = format.write(writer, self);
        self.format = format;
        result
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("delimiter", &self.delimiter)
            .field("strict", &self.strict)
            .field("sections", &self.sections)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Config`].
///
/// # Example
///
/// ```
/// use optreg::Config;
///
/// let mut config = Config::builder()
///     .source("app.cfg")
///     .strict(false)
///     .delimiter("/")
///     .build();
/// config.set("net/port", 8080).unwrap();
/// ```
pub struct ConfigBuilder {
    sources: Vec<PathBuf>,
    strict: bool,
    delimiter: String,
    format: Option<Box<dyn Format>>,
    codec: Option<Codec>,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            sources: Vec::new(),
            strict: true,
            delimiter: ".".to_string(),
            format: None,
            codec: None,
        }
    }

    /// Append a path source. Sources are read in order, so later ones
    /// override earlier ones; the first is the write target.
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(path.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Change the key delimiter.
    ///
    /// # Panics
    ///
    /// Panics if `delimiter` is empty.
    pub fn delimiter(mut self, delimiter: &str) -> Self {
        assert!(!delimiter.is_empty(), "delimiter must not be empty");
        self.delimiter = delimiter.to_string();
        self
    }

    pub fn format(mut self, format: Box<dyn Format>) -> Self {
        self.format = Some(format);
        self
    }

    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn build(self) -> Config {
        Config {
            delimiter: self.delimiter,
            strict: self.strict,
            sections: Vec::new(),
            codec: self.codec.unwrap_or_default(),
            format: self
                .format
                .unwrap_or_else(|| Box::new(IniFormat::new())),
            sources: self.sources,
        }
    }
}

/// Open a path for reading, treating a directory as an open failure.
/// `File::open` accepts a directory on some platforms and the error only
/// surfaces at the first read.
fn open_source(path: &Path) -> std::io::Result<File> {
    let file = File::open(path)?;
    if file.metadata()?.is_dir() {
        return Err(std::io::Error::new(
            ErrorKind::IsADirectory,
            "is a directory",
        ));
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    #[test]
    fn test_define_then_get_returns_default() {
        let mut config = Config::new();
        config.define("net.port", 8080).unwrap();
        assert_eq!(config.get("net.port").unwrap(), Some(&Value::Int(8080)));
    }

    #[test]
    fn test_key_without_delimiter_is_invalid() {
        let mut config = Config::new();
        assert!(matches!(
            config.define("port", 1),
            Err(ConfigError::InvalidKey(_))
        ));
        assert!(matches!(
            config.get("port"),
            Err(ConfigError::InvalidKey(_))
        ));
        assert!(matches!(
            config.set("port", 1),
            Err(ConfigError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_key_splits_on_first_delimiter() {
        let mut config = Config::new();
        config.define("a.b.c", 1).unwrap();
        let section = config.find_section("a").unwrap();
        assert_eq!(section.get("b.c").unwrap(), Some(&Value::Int(1)));
    }

    #[test]
    fn test_custom_delimiter() {
        let mut config = Config::builder().delimiter("::").build();
        config.define("a::x", 1).unwrap();
        assert_eq!(config.get("a::x").unwrap(), Some(&Value::Int(1)));
        assert!(matches!(
            config.get("a.x"),
            Err(ConfigError::InvalidKey(_))
        ));
    }

    #[test]
    #[should_panic(expected = "delimiter must not be empty")]
    fn test_empty_delimiter_panics() {
        let _ = Config::builder().delimiter("");
    }

    #[test]
    fn test_builder_keeps_sources_in_order() {
        let config = Config::builder()
            .source("base.cfg")
            .source("local.cfg")
            .build();
        assert_eq!(
            config.sources(),
            [PathBuf::from("base.cfg"), PathBuf::from("local.cfg")]
        );
        assert!(Config::new().sources().is_empty());
    }

    #[test]
    fn test_get_flattens_missing_and_strict_rejections() {
        let mut config = Config::new();
        config.define("a.x", 1).unwrap();
        // Missing section, missing option, and strict rejection all read
        // as a soft miss through the flat-key path.
        assert_eq!(config.get("nope.x").unwrap(), None);
        assert_eq!(config.get("a.ghost").unwrap(), None);
        // get never creates the section it looked up.
        assert!(config.find_section("nope").is_none());
    }

    #[test]
    fn test_set_creates_section_lazily() {
        let mut config = Config::builder().strict(false).build();
        config.set("fresh.x", 5).unwrap();
        assert_eq!(config.len(), 1);
        assert_eq!(config.get("fresh.x").unwrap(), Some(&Value::Int(5)));
    }

    #[test]
    fn test_set_strict_checks_the_option() {
        let mut config = Config::new();
        let err = config.set("a.x", 5).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOption(_)));
        // The section itself still came into being; only the option was
        // rejected.
        assert!(config.find_section("a").is_some());
    }

    #[test]
    fn test_retroactive_strict_inheritance() {
        let mut config = Config::new();
        config.section("a");
        assert!(config.find_section("a").unwrap().strict());

        config.set_strict(false);
        assert!(!config.find_section("a").unwrap().strict());
        config.set("a.x", 1).unwrap();

        // An explicit override pins the section regardless of the flag.
        config.section("b").set_strict(true);
        config.set_strict(true);
        assert!(config.find_section("b").unwrap().strict());
        config.set_strict(false);
        assert!(config.find_section("b").unwrap().strict());
    }

    #[test]
    fn test_section_with_strict_applies_only_at_creation() {
        let mut config = Config::new();
        config.section_with_strict("a", false);
        assert!(!config.find_section("a").unwrap().strict());
        // The section exists, so a later override request is ignored.
        config.section_with_strict("a", true);
        assert!(!config.find_section("a").unwrap().strict());
    }

    #[test]
    fn test_sections_iterate_in_creation_order() {
        let mut config = Config::new();
        config.define("b.x", 1).unwrap();
        config.define("a.y", 2).unwrap();
        let names: Vec<&str> = config.sections().map(|s| s.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn test_clear_keeps_codec_registrations() {
        let mut config = Config::new();
        config.define("a.x", 1).unwrap();
        config.register_type(
            "upper",
            Some(Box::new(|v: &Value| v.to_string().to_uppercase())),
            None,
        );
        config.clear();
        assert!(config.is_empty());
        assert!(config.codec().is_registered("upper"));
    }

    #[test]
    fn test_to_map_and_encoded_map() {
        let mut config = Config::new();
        config.define("net.port", 8080).unwrap();
        config.define("net.host", "localhost").unwrap();

        let map = config.to_map();
        assert_eq!(map["net"]["port"], Value::Int(8080));

        let encoded = config.to_encoded_map();
        assert_eq!(encoded["net"]["port"], "8080");
        assert_eq!(encoded["net"]["host"], "localhost");
    }

    #[test]
    fn test_registered_type_used_by_encoded_reads() {
        let mut config = Config::new();
        config.define("a.x", 255).unwrap();
        config.register_type(
            value::INT,
            Some(Box::new(|v: &Value| {
                format!("0x{:x}", v.as_int().unwrap_or(0))
            })),
            Some(Box::new(|s: &str| {
                i64::from_str_radix(s.trim_start_matches("0x"), 16)
                    .map(Value::Int)
                    .map_err(|e| crate::DecodeError::new(value::INT, s, e))
            })),
        );
        let section = config.find_section("a").unwrap();
        assert_eq!(section.get_encoded("x").unwrap(), Some("0xff".to_string()));
    }

    #[test]
    fn test_round_trip_through_streams() {
        let mut config = Config::new();
        config.define("a.port", 8080).unwrap();
        config.define("a.debug", false).unwrap();

        let mut buf = Vec::new();
        config.write_to(&mut buf).unwrap();

        let mut reloaded = Config::new();
        reloaded.define("a.port", 0).unwrap();
        reloaded.define("a.debug", true).unwrap();
        reloaded.read_from(buf.as_slice()).unwrap();

        assert_eq!(reloaded.get("a.port").unwrap(), Some(&Value::Int(8080)));
        assert_eq!(reloaded.get("a.debug").unwrap(), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_write_without_sources_fails() {
        let mut config = Config::new();
        assert!(matches!(config.write(), Err(ConfigError::Io(_))));
    }
}
