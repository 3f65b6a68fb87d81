//! Named groups of typed options with per-section strict control.

use std::collections::HashMap;

use crate::codec::Codec;
use crate::error::{ConfigError, Result};
use crate::value::Value;

/// Schema entry recorded by `define`: the option's default value and the
/// canonical identifier of its declared type.
///
/// Entries are replaced wholesale on redefinition, never merged.
#[derive(Debug, Clone)]
pub struct OptionInfo {
    pub default: Value,
    pub type_name: String,
}

/// Owned storage for one section. Values keep insertion order; overwrites
/// keep the original position.
#[derive(Debug)]
pub(crate) struct SectionData {
    pub(crate) name: String,
    pub(crate) strict: Option<bool>,
    pub(crate) schema: HashMap<String, OptionInfo>,
    pub(crate) values: Vec<(String, Value)>,
}

impl SectionData {
    pub(crate) fn new(name: &str, strict: Option<bool>) -> Self {
        Self {
            name: name.to_string(),
            strict,
            schema: HashMap::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn effective_strict(&self, default: bool) -> bool {
        self.strict.unwrap_or(default)
    }

    fn value_index(&self, name: &str) -> Option<usize> {
        self.values.iter().position(|(k, _)| k == name)
    }

    pub(crate) fn value(&self, name: &str) -> Option<&Value> {
        self.value_index(name).map(|i| &self.values[i].1)
    }

    fn store(&mut self, name: &str, value: Value) {
        match self.value_index(name) {
            Some(i) => self.values[i].1 = value,
            None => self.values.push((name.to_string(), value)),
        }
    }

    fn check_option(&self, name: &str, default_strict: bool) -> Result<()> {
        if self.effective_strict(default_strict) && !self.schema.contains_key(name) {
            return Err(ConfigError::UnknownOption(name.to_string()));
        }
        Ok(())
    }

    pub(crate) fn define(&mut self, name: &str, default: Value, type_name: Option<&str>) {
        let type_name = match type_name {
            Some(ty) => ty.to_string(),
            None => default.type_name().to_string(),
        };
        self.store(name, default.clone());
        self.schema
            .insert(name.to_string(), OptionInfo { default, type_name });
    }

    pub(crate) fn get_value(&self, name: &str, default_strict: bool) -> Result<Option<&Value>> {
        self.check_option(name, default_strict)?;
        Ok(self.value(name))
    }

    pub(crate) fn set_value(
        &mut self,
        name: &str,
        value: Value,
        default_strict: bool,
    ) -> Result<()> {
        self.check_option(name, default_strict)?;
        self.store(name, value);
        Ok(())
    }

    pub(crate) fn set_encoded_value(
        &mut self,
        name: &str,
        text: &str,
        codec: &Codec,
        default_strict: bool,
    ) -> Result<()> {
        self.check_option(name, default_strict)?;
        let ty = self.schema.get(name).map(|info| info.type_name.as_str());
        let value = codec.decode(text, ty)?;
        self.store(name, value);
        Ok(())
    }

    pub(crate) fn remove_option(&mut self, name: &str) -> Result<()> {
        if self.schema.remove(name).is_none() {
            return Err(ConfigError::UnknownOption(name.to_string()));
        }
        if let Some(i) = self.value_index(name) {
            self.values.remove(i);
        }
        Ok(())
    }
}

/// Shared view of a section.
///
/// Bundles the section's data with the owning config's codec and strict
/// default, so strict resolution always reflects the config at the time of
/// the call (changing the config flag requires `&mut Config`, which ends
/// every outstanding view).
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub(crate) data: &'a SectionData,
    pub(crate) codec: &'a Codec,
    pub(crate) default_strict: bool,
}

impl<'a> Section<'a> {
    pub fn name(&self) -> &'a str {
        &self.data.name
    }

    /// Number of held option values.
    pub fn len(&self) -> usize {
        self.data.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.values.is_empty()
    }

    /// Membership in the held values. Does not consult the schema or
    /// strict mode.
    pub fn contains(&self, name: &str) -> bool {
        self.data.value(name).is_some()
    }

    /// Whether strict mode is in effect: the per-section override if one
    /// was set, otherwise the owning config's flag.
    pub fn strict(&self) -> bool {
        self.data.effective_strict(self.default_strict)
    }

    /// Look up an option value. Fails with
    /// [`UnknownOption`](ConfigError::UnknownOption) when strict mode is
    /// in effect and the option is not in the schema; a merely absent
    /// option is `Ok(None)`.
    pub fn get(&self, name: &str) -> Result<Option<&'a Value>> {
        self.data.get_value(name, self.default_strict)
    }

    /// Look up an option and encode it with the codec, using the type
    /// identifier recorded at definition time.
    pub fn get_encoded(&self, name: &str) -> Result<Option<String>> {
        let ty = self.data.schema.get(name).map(|info| info.type_name.as_str());
        Ok(self.get(name)?.map(|v| self.codec.encode(v, ty)))
    }

    /// The default recorded for an option, if it was defined.
    pub fn default_for(&self, name: &str) -> Option<&'a Value> {
        self.data.schema.get(name).map(|info| &info.default)
    }

    pub fn option_info(&self, name: &str) -> Option<&'a OptionInfo> {
        self.data.schema.get(name)
    }

    /// Option names and values in insertion order.
    pub fn items(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + use<'a> {
        self.data.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode each held option lazily, in insertion order. Encoding
    /// happens as the iterator advances, so a fresh call reflects the
    /// current values and codec registrations.
    pub fn encoded_items(&self) -> impl Iterator<Item = (&'a str, String)> + use<'a> {
        let data = self.data;
        let codec = self.codec;
        data.values.iter().map(move |(k, v)| {
            let ty = data.schema.get(k).map(|info| info.type_name.as_str());
            (k.as_str(), codec.encode(v, ty))
        })
    }
}

/// Exclusive view of a section. Everything [`Section`] offers, plus
/// definition and mutation.
#[derive(Debug)]
pub struct SectionMut<'a> {
    pub(crate) data: &'a mut SectionData,
    pub(crate) codec: &'a Codec,
    pub(crate) default_strict: bool,
}

impl<'a> SectionMut<'a> {
    /// Reborrow as a shared view.
    pub fn as_ref(&self) -> Section<'_> {
        Section {
            data: self.data,
            codec: self.codec,
            default_strict: self.default_strict,
        }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn len(&self) -> usize {
        self.data.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.values.is_empty()
    }

    /// Membership in the held values. Does not consult the schema or
    /// strict mode.
    pub fn contains(&self, name: &str) -> bool {
        self.data.value(name).is_some()
    }

    pub fn strict(&self) -> bool {
        self.data.effective_strict(self.default_strict)
    }

    /// Set the per-section strict override, decoupling this section from
    /// the config-wide flag.
    pub fn set_strict(&mut self, strict: bool) {
        self.data.strict = Some(strict);
    }

    /// Define an option: record its default and type in the schema and
    /// seed the stored value with the default. The type identifier is
    /// inferred from the default's variant. Redefinition overwrites both
    /// the schema entry and the stored value.
    pub fn define(&mut self, name: &str, default: impl Into<Value>) {
        self.data.define(name, default.into(), None);
    }

    /// Define an option with an explicit type identifier. The default is
    /// stored verbatim, so its variant may differ from the declared type.
    pub fn define_as(&mut self, name: &str, default: impl Into<Value>, type_name: &str) {
        self.data.define(name, default.into(), Some(type_name));
    }

    pub fn get(&self, name: &str) -> Result<Option<&Value>> {
        self.data.get_value(name, self.default_strict)
    }

    pub fn get_encoded(&self, name: &str) -> Result<Option<String>> {
        self.as_ref().get_encoded(name)
    }

    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.data.schema.get(name).map(|info| &info.default)
    }

    pub fn option_info(&self, name: &str) -> Option<&OptionInfo> {
        self.data.schema.get(name)
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn encoded_items(&self) -> impl Iterator<Item = (&str, String)> {
        self.as_ref().encoded_items()
    }

    /// Store a value verbatim, without any conversion. Subject to the
    /// strict check.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.data.set_value(name, value.into(), self.default_strict)
    }

    /// Decode text through the codec using the option's declared type,
    /// then store the result. Subject to the strict check.
    pub fn set_encoded(&mut self, name: &str, text: &str) -> Result<()> {
        self.data
            .set_encoded_value(name, text, self.codec, self.default_strict)
    }

    /// Drop this section's schema and values.
    pub fn clear(&mut self) {
        self.data.schema.clear();
        self.data.values.clear();
    }

    /// Remove an option from the schema and the held values. Fails with
    /// [`UnknownOption`](ConfigError::UnknownOption) when the option was
    /// never defined; removal is a schema-level operation.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.data.remove_option(name)
    }
}
