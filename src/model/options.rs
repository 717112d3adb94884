//! Option schemas and resolved option values.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: Typed accessors on `ResolvedOptions` instead of raw map access
//! - 1.1.0: Min/max length constraints for string options
//! - 1.0.0: Initial schema model

use std::collections::HashMap;

use crate::model::entity::{Attachment, Channel, Role, User};

/// The fixed enumeration of option types the wire schema supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl OptionType {
    /// Wire type code for this option type.
    pub fn wire_code(self) -> u8 {
        match self {
            OptionType::String => 3,
            OptionType::Integer => 4,
            OptionType::Boolean => 5,
            OptionType::User => 6,
            OptionType::Channel => 7,
            OptionType::Role => 8,
            OptionType::Mentionable => 9,
            OptionType::Number => 10,
            OptionType::Attachment => 11,
        }
    }
}

/// A declared choice value. Heterogeneous: string options carry string
/// choices, integer/number options carry numeric ones.
#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceValue {
    String(String),
    Integer(i64),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub name: String,
    pub value: ChoiceValue,
}

impl Choice {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Choice {
            name: name.into(),
            value: ChoiceValue::String(value.into()),
        }
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Choice {
            name: name.into(),
            value: ChoiceValue::Integer(value),
        }
    }

    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Choice {
            name: name.into(),
            value: ChoiceValue::Number(value),
        }
    }
}

/// Declarative schema for one named option.
///
/// `choices` and `autocomplete` are mutually exclusive; the exclusion is
/// enforced when the owning definition is loaded, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSchema {
    pub kind: OptionType,
    pub description: String,
    pub required: bool,
    pub choices: Vec<Choice>,
    pub autocomplete: bool,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<u16>,
    pub max_length: Option<u16>,
    pub channel_types: Vec<u8>,
}

impl OptionSchema {
    pub fn new(kind: OptionType, description: impl Into<String>) -> Self {
        OptionSchema {
            kind,
            description: description.into(),
            required: false,
            choices: Vec::new(),
            autocomplete: false,
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            channel_types: Vec::new(),
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(OptionType::String, description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(OptionType::Integer, description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(OptionType::Boolean, description)
    }

    pub fn user(description: impl Into<String>) -> Self {
        Self::new(OptionType::User, description)
    }

    pub fn channel(description: impl Into<String>) -> Self {
        Self::new(OptionType::Channel, description)
    }

    pub fn role(description: impl Into<String>) -> Self {
        Self::new(OptionType::Role, description)
    }

    pub fn mentionable(description: impl Into<String>) -> Self {
        Self::new(OptionType::Mentionable, description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::new(OptionType::Number, description)
    }

    pub fn attachment(description: impl Into<String>) -> Self {
        Self::new(OptionType::Attachment, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn autocomplete(mut self) -> Self {
        self.autocomplete = true;
        self
    }

    pub fn min_value(mut self, value: f64) -> Self {
        self.min_value = Some(value);
        self
    }

    pub fn max_value(mut self, value: f64) -> Self {
        self.max_value = Some(value);
        self
    }

    pub fn min_length(mut self, length: u16) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn max_length(mut self, length: u16) -> Self {
        self.max_length = Some(length);
        self
    }

    pub fn channel_types(mut self, kinds: Vec<u8>) -> Self {
        self.channel_types = kinds;
        self
    }
}

/// A mentionable option resolved to its concrete shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Mention {
    Role(Role),
    User(User),
}

/// A fully-validated option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(User),
    Channel(Channel),
    Role(Role),
    Mention(Mention),
    Attachment(Attachment),
}

/// The validated options of one dispatch, keyed by option name.
///
/// Absent optional options have no entry; the typed accessors return `None`
/// both for absent options and for type mismatches (the latter cannot occur
/// for options that went through the validator).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOptions {
    values: HashMap<String, OptionValue>,
}

impl ResolvedOptions {
    pub(crate) fn insert(&mut self, name: String, value: OptionValue) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptionValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(OptionValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(OptionValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(OptionValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_user(&self, name: &str) -> Option<&User> {
        match self.values.get(name) {
            Some(OptionValue::User(u)) => Some(u),
            _ => None,
        }
    }

    pub fn get_channel(&self, name: &str) -> Option<&Channel> {
        match self.values.get(name) {
            Some(OptionValue::Channel(c)) => Some(c),
            _ => None,
        }
    }

    pub fn get_role(&self, name: &str) -> Option<&Role> {
        match self.values.get(name) {
            Some(OptionValue::Role(r)) => Some(r),
            _ => None,
        }
    }

    pub fn get_mention(&self, name: &str) -> Option<&Mention> {
        match self.values.get(name) {
            Some(OptionValue::Mention(m)) => Some(m),
            _ => None,
        }
    }

    pub fn get_attachment(&self, name: &str) -> Option<&Attachment> {
        match self.values.get(name) {
            Some(OptionValue::Attachment(a)) => Some(a),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
