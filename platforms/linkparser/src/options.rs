use std::collections::BTreeMap;
use std::time::Duration;

use bitflags::bitflags;
use lg_solver::{CostModel, SearchOptions};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

bitflags! {
    /// Output toggles, packed like the other flag sets of the engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DisplayFlags: u16 {
        const ON               = 1 << 0;
        const WALLS            = 1 << 1;
        const POSTSCRIPT       = 1 << 2;
        const CONSTITUENTS     = 1 << 3;
        const BAD              = 1 << 4;
        const LINKS            = 1 << 5;
        const UNION            = 1 << 6;
        const WORD_SUBSCRIPTS  = 1 << 7;
        const LINK_SUBSCRIPTS  = 1 << 8;
    }
}

/// Every key an [`OptionsPatch`] accepts, in declaration order.
pub const OPTION_KEYS: [&str; 28] = [
    "verbosity",
    "linkage_limit",
    "disjunct_cost",
    "min_null_count",
    "max_null_count",
    "null_block",
    "islands_ok",
    "short_length",
    "all_short_connectors",
    "max_memory",
    "max_parse_time",
    "max_sentence_length",
    "allow_null",
    "echo_on",
    "batch_mode",
    "panic_mode",
    "screen_width",
    "display_on",
    "display_walls",
    "display_postscript",
    "display_constituents",
    "display_bad",
    "display_links",
    "display_union",
    "display_word_subscripts",
    "display_link_subscripts",
    "spell_guess",
    "cost_model_type",
];

impl Default for DisplayFlags {
    fn default() -> Self {
        DisplayFlags::ON | DisplayFlags::WALLS | DisplayFlags::WORD_SUBSCRIPTS | DisplayFlags::LINK_SUBSCRIPTS
    }
}

/// Settings read at parse time. Values are copied into each parse; the
/// resource flags report on the parse that used them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    pub verbosity: u8,
    pub linkage_limit: usize,
    pub disjunct_cost: u32,
    pub min_null_count: usize,
    pub max_null_count: usize,
    pub null_block: usize,
    pub islands_ok: bool,
    pub short_length: usize,
    pub all_short_connectors: bool,
    /// Bytes; negative means unlimited.
    pub max_memory: i64,
    /// Seconds; negative means unlimited.
    pub max_parse_time: i64,
    /// Words between the walls; 0 means unlimited.
    pub max_sentence_length: usize,
    pub allow_null: bool,
    pub echo_on: bool,
    pub batch_mode: bool,
    pub panic_mode: bool,
    pub screen_width: usize,
    pub display: DisplayFlags,
    pub spell_guess: bool,
    pub cost_model: CostModel,
    timer_expired: bool,
    memory_exhausted: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            verbosity: 1,
            linkage_limit: 10000,
            disjunct_cost: 2,
            min_null_count: 0,
            max_null_count: 250,
            null_block: 1,
            islands_ok: false,
            short_length: 16,
            all_short_connectors: false,
            max_memory: -1,
            max_parse_time: -1,
            max_sentence_length: 170,
            allow_null: true,
            echo_on: false,
            batch_mode: false,
            panic_mode: false,
            screen_width: 79,
            display: DisplayFlags::default(),
            spell_guess: false,
            cost_model: CostModel::Vdal,
            timer_expired: false,
            memory_exhausted: false,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_on(&self) -> bool {
        self.display.contains(DisplayFlags::ON)
    }

    pub fn display_walls(&self) -> bool {
        self.display.contains(DisplayFlags::WALLS)
    }

    pub fn display_postscript(&self) -> bool {
        self.display.contains(DisplayFlags::POSTSCRIPT)
    }

    pub fn display_constituents(&self) -> bool {
        self.display.contains(DisplayFlags::CONSTITUENTS)
    }

    pub fn display_links(&self) -> bool {
        self.display.contains(DisplayFlags::LINKS)
    }

    pub fn display_union(&self) -> bool {
        self.display.contains(DisplayFlags::UNION)
    }

    pub fn display_bad(&self) -> bool {
        self.display.contains(DisplayFlags::BAD)
    }

    pub fn display_word_subscripts(&self) -> bool {
        self.display.contains(DisplayFlags::WORD_SUBSCRIPTS)
    }

    pub fn display_link_subscripts(&self) -> bool {
        self.display.contains(DisplayFlags::LINK_SUBSCRIPTS)
    }

    pub fn cost_model_type(&self) -> &'static str {
        self.cost_model.as_str()
    }

    pub fn set_cost_model_type(&mut self, name: &str) -> Result<(), ConfigError> {
        self.cost_model = name.parse().map_err(|_| ConfigError::CostModel(name.to_string()))?;
        Ok(())
    }

    pub fn timer_expired(&self) -> bool {
        self.timer_expired
    }

    pub fn memory_exhausted(&self) -> bool {
        self.memory_exhausted
    }

    pub fn resources_exhausted(&self) -> bool {
        self.timer_expired || self.memory_exhausted
    }

    pub fn reset_resources(&mut self) {
        self.timer_expired = false;
        self.memory_exhausted = false;
    }

    pub(crate) fn record_resources(&mut self, timer_expired: bool, memory_exhausted: bool) {
        self.timer_expired |= timer_expired;
        self.memory_exhausted |= memory_exhausted;
    }

    /// A copy with every key `other` sets taken from `other`.
    pub fn merge(&self, other: impl Into<OptionsPatch>) -> ParseOptions {
        let mut merged = self.clone();
        other.into().apply(&mut merged);
        merged
    }

    /// Sets one option from its textual form, as it would appear in a config file.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let json = match value.parse::<serde_json::Value>() {
            Ok(parsed) => parsed,
            Err(_) => serde_json::Value::String(value.to_string()),
        };
        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), json);
        let patch = OptionsPatch::from_value(serde_json::Value::Object(object))?;
        patch.apply(self);
        Ok(())
    }

    /// Every option key with its current value.
    pub fn to_map(&self) -> BTreeMap<String, serde_json::Value> {
        match serde_json::to_value(OptionsPatch::from(self)) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }

    pub fn to_search_options(&self) -> SearchOptions {
        SearchOptions {
            linkage_limit: self.linkage_limit,
            disjunct_cost: self.disjunct_cost,
            min_null_count: self.min_null_count,
            max_null_count: self.max_null_count,
            null_block: self.null_block,
            islands_ok: self.islands_ok,
            short_length: self.short_length,
            all_short_connectors: self.all_short_connectors,
            allow_null: self.allow_null,
            max_memory: usize::try_from(self.max_memory).ok(),
            max_parse_time: u64::try_from(self.max_parse_time).ok().map(Duration::from_secs),
            max_sentence_length: (self.max_sentence_length > 0).then_some(self.max_sentence_length),
            cost_model: self.cost_model,
            verbosity: self.verbosity,
        }
    }

    /// The relaxed settings used for the one retry after a failed, exhausted parse.
    /// The retry has no time limit of its own; the memory limit still holds.
    pub(crate) fn panic_options(&self, words: usize) -> ParseOptions {
        ParseOptions {
            max_parse_time: -1,
            islands_ok: true,
            all_short_connectors: true,
            min_null_count: 0,
            max_null_count: words,
            allow_null: true,
            ..self.clone()
        }
    }
}

/// A partial set of options: every key optional, unknown keys rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkage_limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disjunct_cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_null_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_null_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_block: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub islands_ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_short_connectors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_memory: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parse_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sentence_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_null: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echo_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panic_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_walls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_postscript: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_constituents: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_bad: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_links: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_union: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_word_subscripts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_link_subscripts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spell_guess: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_model_type: Option<String>,
}

impl OptionsPatch {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Deserializes and validates; unknown keys and bad values are configuration errors.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        if let Some(object) = value.as_object() {
            if let Some(key) = object.keys().find(|key| !OPTION_KEYS.contains(&key.as_str())) {
                return Err(ConfigError::UnknownOption(key.clone()));
            }
        }
        let patch: OptionsPatch = serde_json::from_value(value)?;
        if let Some(name) = &patch.cost_model_type {
            if name.parse::<CostModel>().is_err() {
                return Err(ConfigError::CostModel(name.clone()));
            }
        }
        Ok(patch)
    }

    fn apply(self, options: &mut ParseOptions) {
        let patch = self;
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(value) = patch.$field {
                    options.$field = value;
                })*
            };
        }
        take!(
            verbosity,
            linkage_limit,
            disjunct_cost,
            min_null_count,
            max_null_count,
            null_block,
            islands_ok,
            short_length,
            all_short_connectors,
            max_memory,
            max_parse_time,
            max_sentence_length,
            allow_null,
            echo_on,
            batch_mode,
            panic_mode,
            screen_width,
            spell_guess
        );

        let flags = [
            (patch.display_on, DisplayFlags::ON),
            (patch.display_walls, DisplayFlags::WALLS),
            (patch.display_postscript, DisplayFlags::POSTSCRIPT),
            (patch.display_constituents, DisplayFlags::CONSTITUENTS),
            (patch.display_bad, DisplayFlags::BAD),
            (patch.display_links, DisplayFlags::LINKS),
            (patch.display_union, DisplayFlags::UNION),
            (patch.display_word_subscripts, DisplayFlags::WORD_SUBSCRIPTS),
            (patch.display_link_subscripts, DisplayFlags::LINK_SUBSCRIPTS),
        ];
        for (value, flag) in flags {
            if let Some(on) = value {
                options.display.set(flag, on);
            }
        }

        // Validated when the patch was built
        if let Some(model) = patch.cost_model_type.and_then(|name| name.parse().ok()) {
            options.cost_model = model;
        }
    }
}

impl From<&ParseOptions> for OptionsPatch {
    fn from(o: &ParseOptions) -> Self {
        let flag = |f: DisplayFlags| Some(o.display.contains(f));
        OptionsPatch {
            verbosity: Some(o.verbosity),
            linkage_limit: Some(o.linkage_limit),
            disjunct_cost: Some(o.disjunct_cost),
            min_null_count: Some(o.min_null_count),
            max_null_count: Some(o.max_null_count),
            null_block: Some(o.null_block),
            islands_ok: Some(o.islands_ok),
            short_length: Some(o.short_length),
            all_short_connectors: Some(o.all_short_connectors),
            max_memory: Some(o.max_memory),
            max_parse_time: Some(o.max_parse_time),
            max_sentence_length: Some(o.max_sentence_length),
            allow_null: Some(o.allow_null),
            echo_on: Some(o.echo_on),
            batch_mode: Some(o.batch_mode),
            panic_mode: Some(o.panic_mode),
            screen_width: Some(o.screen_width),
            display_on: flag(DisplayFlags::ON),
            display_walls: flag(DisplayFlags::WALLS),
            display_postscript: flag(DisplayFlags::POSTSCRIPT),
            display_constituents: flag(DisplayFlags::CONSTITUENTS),
            display_bad: flag(DisplayFlags::BAD),
            display_links: flag(DisplayFlags::LINKS),
            display_union: flag(DisplayFlags::UNION),
            display_word_subscripts: flag(DisplayFlags::WORD_SUBSCRIPTS),
            display_link_subscripts: flag(DisplayFlags::LINK_SUBSCRIPTS),
            spell_guess: Some(o.spell_guess),
            cost_model_type: Some(o.cost_model.as_str().to_string()),
        }
    }
}

impl From<ParseOptions> for OptionsPatch {
    fn from(o: ParseOptions) -> Self {
        OptionsPatch::from(&o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert_eq!(options.verbosity, 1);
        assert_eq!(options.linkage_limit, 10000);
        assert_eq!(options.disjunct_cost, 2);
        assert_eq!(options.short_length, 16);
        assert_eq!(options.max_memory, -1);
        assert!(options.allow_null);
        assert!(!options.islands_ok);
        assert!(options.display_walls());
        assert_eq!(options.cost_model_type(), "vdal");
        assert!(!options.resources_exhausted());
    }

    #[test]
    fn test_merge_takes_right_hand_values() {
        let base = ParseOptions { verbosity: 3, islands_ok: true, ..ParseOptions::default() };

        // 1. A patch only touches what it names
        let patch = OptionsPatch { verbosity: Some(0), display_walls: Some(false), ..OptionsPatch::default() };
        let merged = base.merge(patch);
        assert_eq!(merged.verbosity, 0);
        assert!(merged.islands_ok);
        assert!(!merged.display_walls());

        // 2. A full option set replaces every key
        let replaced = base.merge(&ParseOptions::default());
        assert_eq!(replaced, ParseOptions::default());
    }

    #[test]
    fn test_json_patch() {
        let patch = OptionsPatch::from_json(r#"{"linkage_limit": 5, "cost_model_type": "corpus"}"#).unwrap();
        let options = ParseOptions::default().merge(patch);
        assert_eq!(options.linkage_limit, 5);
        assert_eq!(options.cost_model, CostModel::Corpus);
    }

    #[test]
    fn test_bad_options_are_rejected() {
        assert!(matches!(
            OptionsPatch::from_json(r#"{"linkage_limt": 5}"#),
            Err(ConfigError::UnknownOption(key)) if key == "linkage_limt"
        ));
        assert!(matches!(
            OptionsPatch::from_json(r#"{"cost_model_type": "bogus"}"#),
            Err(ConfigError::CostModel(_))
        ));
        assert!(matches!(OptionsPatch::from_json(r#"{"verbosity": "loud"}"#), Err(ConfigError::Malformed(_))));

        let mut options = ParseOptions::default();
        assert!(options.set_cost_model_type("Corpus").is_ok());
        assert!(options.set_cost_model_type("nope").is_err());
        assert_eq!(options.cost_model, CostModel::Corpus);
    }

    #[test]
    fn test_set_from_text() {
        let mut options = ParseOptions::default();
        options.set("islands_ok", "true").unwrap();
        options.set("cost_model_type", "corpus").unwrap();
        options.set("max_parse_time", "30").unwrap();
        assert!(options.islands_ok);
        assert_eq!(options.cost_model, CostModel::Corpus);
        assert_eq!(options.to_search_options().max_parse_time, Some(Duration::from_secs(30)));
        assert!(options.set("no_such_key", "1").is_err());
    }

    #[test]
    fn test_resource_flags() {
        let mut options = ParseOptions::default();
        options.record_resources(true, false);
        assert!(options.timer_expired());
        assert!(options.resources_exhausted());
        options.reset_resources();
        assert!(!options.resources_exhausted());
    }

    #[test]
    fn test_unknown_keys_found_before_values() {
        // 1. The unknown key is named even when a known key is malformed too
        let result = OptionsPatch::from_json(r#"{"verbosity": "loud", "display_unoin": true}"#);
        assert!(matches!(result, Err(ConfigError::UnknownOption(key)) if key == "display_unoin"));

        // 2. Every listed key is accepted
        for key in OPTION_KEYS {
            let mut object = serde_json::Map::new();
            object.insert(key.to_string(), serde_json::Value::Null);
            assert!(OptionsPatch::from_value(serde_json::Value::Object(object)).is_ok(), "{}", key);
        }

        // 3. A non-object is malformed, not an unknown key
        assert!(matches!(OptionsPatch::from_json("[1, 2]"), Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn test_panic_options_relax_the_search() {
        let options = ParseOptions { max_parse_time: 0, max_memory: 4096, ..ParseOptions::default() };
        let relaxed = options.panic_options(7);
        assert_eq!(relaxed.max_parse_time, -1);
        assert_eq!(relaxed.max_memory, 4096);
        assert_eq!(relaxed.max_null_count, 7);
        assert!(relaxed.islands_ok && relaxed.all_short_connectors && relaxed.allow_null);
        assert_eq!(relaxed.to_search_options().max_parse_time, None);
    }

    #[test]
    fn test_to_map_lists_every_key() {
        let map = ParseOptions::default().to_map();
        assert_eq!(map.len(), OPTION_KEYS.len());
        assert!(OPTION_KEYS.iter().all(|key| map.contains_key(*key)));
        assert_eq!(map["cost_model_type"], serde_json::json!("vdal"));
        assert_eq!(map["display_walls"], serde_json::json!(true));
        assert_eq!(map["max_memory"], serde_json::json!(-1));
    }
}
