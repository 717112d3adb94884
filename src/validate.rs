//! Runtime option validation.
//!
//! - **Version**: 1.3.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.3.0: Lazy role/channel resolution through the transport
//! - 1.2.0: Choice containment checks
//! - 1.0.0: Required/optional and min/max checks
//!
//! Reproduces the semantics of the remote declarative schema at dispatch
//! time: required-ness, min/max constraints, choice containment, and lazy
//! resolution of reference-typed options. Options are checked independently
//! in schema order; the first failing option aborts the dispatch. A fetch
//! *miss* is a validation failure; a fetch *error* propagates as a transport
//! failure and never reaches the handler's result channel.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;

use crate::model::entity::{Channel, Role};
use crate::model::event::{EntityRef, MentionablePayload, RawOptionValue};
use crate::model::options::{
    ChoiceValue, Mention, OptionSchema, OptionType, OptionValue, ResolvedOptions,
};
use crate::outcome::Failure;
use crate::transport::{EntityKind, GuildEntity, Transport};

/// Why one option was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationErrorKind {
    /// A required option was not provided.
    Missing,
    /// The raw value's shape does not match the declared type.
    TypeMismatch { expected: OptionType },
    /// A bare identifier did not resolve to an existing entity. Distinct
    /// from `Missing`: the option was provided, the entity was not found.
    FetchMiss { kind: EntityKind, id: String },
    TooShort { min: u16, len: usize },
    TooLong { max: u16, len: usize },
    BelowMinimum { min: f64 },
    AboveMaximum { max: f64 },
    /// The value is not in the declared choice list.
    NotAChoice,
    /// A mentionable resolved to a shape this core does not support
    /// (a member payload without an embedded user). Known gap.
    UnsupportedMentionable,
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationErrorKind::Missing => write!(f, "required but not provided"),
            ValidationErrorKind::TypeMismatch { expected } => {
                write!(f, "value does not match declared type {expected:?}")
            }
            ValidationErrorKind::FetchMiss { kind, id } => {
                write!(f, "{kind} `{id}` not found")
            }
            ValidationErrorKind::TooShort { min, len } => {
                write!(f, "length {len} below minimum {min}")
            }
            ValidationErrorKind::TooLong { max, len } => {
                write!(f, "length {len} above maximum {max}")
            }
            ValidationErrorKind::BelowMinimum { min } => write!(f, "value below minimum {min}"),
            ValidationErrorKind::AboveMaximum { max } => write!(f, "value above maximum {max}"),
            ValidationErrorKind::NotAChoice => write!(f, "value not in the declared choices"),
            ValidationErrorKind::UnsupportedMentionable => {
                write!(f, "mentionable shape not supported")
            }
        }
    }
}

/// One rejected option, carrying everything diagnostics need: the option
/// name, the full raw payload, and the declared schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub option: String,
    pub kind: ValidationErrorKind,
    pub raw: Option<RawOptionValue>,
    pub schema: OptionSchema,
}

impl ValidationFailure {
    pub fn into_failure(self) -> Failure {
        Failure::new(format!("option `{}`: {}", self.option, self.kind))
            .with_debug("option", self.option)
            .with_debug("constraint", self.kind.to_string())
            .with_debug("raw", format!("{:?}", self.raw))
            .with_debug("declared_type", format!("{:?}", self.schema.kind))
    }
}

enum Checked {
    Value(OptionValue),
    Absent,
    Rejected(ValidationFailure),
}

/// Validates one interaction's raw options against a declared schema map.
pub struct OptionValidator<'a> {
    transport: &'a dyn Transport,
    guild_id: Option<&'a str>,
}

impl<'a> OptionValidator<'a> {
    pub fn new(transport: &'a dyn Transport, guild_id: Option<&'a str>) -> Self {
        OptionValidator {
            transport,
            guild_id,
        }
    }

    /// Validate every declared option. First failure wins; no partial error
    /// accumulation. Absent optional options produce no entry.
    pub async fn validate(
        &self,
        raw: &HashMap<String, RawOptionValue>,
        schema: &BTreeMap<String, OptionSchema>,
    ) -> Result<std::result::Result<ResolvedOptions, ValidationFailure>> {
        let mut resolved = ResolvedOptions::default();
        for (name, option) in schema {
            match self.check_option(name, raw.get(name), option).await? {
                Checked::Value(value) => resolved.insert(name.clone(), value),
                Checked::Absent => {}
                Checked::Rejected(failure) => return Ok(Err(failure)),
            }
        }
        Ok(Ok(resolved))
    }

    async fn check_option(
        &self,
        name: &str,
        raw: Option<&RawOptionValue>,
        schema: &OptionSchema,
    ) -> Result<Checked> {
        let Some(raw) = raw else {
            if schema.required {
                return Ok(Checked::Rejected(ValidationFailure {
                    option: name.to_string(),
                    kind: ValidationErrorKind::Missing,
                    raw: None,
                    schema: schema.clone(),
                }));
            }
            // Absent optional value: stop here, no further checks run.
            return Ok(Checked::Absent);
        };

        let reject = |kind| {
            Checked::Rejected(ValidationFailure {
                option: name.to_string(),
                kind,
                raw: Some(raw.clone()),
                schema: schema.clone(),
            })
        };
        let mismatch = || reject(ValidationErrorKind::TypeMismatch { expected: schema.kind });

        let checked = match schema.kind {
            OptionType::String => match raw {
                RawOptionValue::String(value) => {
                    if let Some(min) = schema.min_length {
                        if value.len() < min as usize {
                            return Ok(reject(ValidationErrorKind::TooShort {
                                min,
                                len: value.len(),
                            }));
                        }
                    }
                    if let Some(max) = schema.max_length {
                        if value.len() > max as usize {
                            return Ok(reject(ValidationErrorKind::TooLong {
                                max,
                                len: value.len(),
                            }));
                        }
                    }
                    if !schema.choices.is_empty()
                        && !schema
                            .choices
                            .iter()
                            .any(|c| matches!(&c.value, ChoiceValue::String(v) if v == value))
                    {
                        return Ok(reject(ValidationErrorKind::NotAChoice));
                    }
                    Checked::Value(OptionValue::String(value.clone()))
                }
                _ => mismatch(),
            },
            OptionType::Integer => match raw {
                RawOptionValue::Integer(value) => {
                    if let Some(kind) = check_range(*value as f64, schema) {
                        return Ok(reject(kind));
                    }
                    if !schema.choices.is_empty()
                        && !schema
                            .choices
                            .iter()
                            .any(|c| matches!(&c.value, ChoiceValue::Integer(v) if v == value))
                    {
                        return Ok(reject(ValidationErrorKind::NotAChoice));
                    }
                    Checked::Value(OptionValue::Integer(*value))
                }
                _ => mismatch(),
            },
            OptionType::Number => match raw {
                RawOptionValue::Number(value) => {
                    if let Some(kind) = check_range(*value, schema) {
                        return Ok(reject(kind));
                    }
                    if !schema.choices.is_empty()
                        && !schema
                            .choices
                            .iter()
                            .any(|c| matches!(&c.value, ChoiceValue::Number(v) if v == value))
                    {
                        return Ok(reject(ValidationErrorKind::NotAChoice));
                    }
                    Checked::Value(OptionValue::Number(*value))
                }
                _ => mismatch(),
            },
            OptionType::Boolean => match raw {
                RawOptionValue::Boolean(value) => Checked::Value(OptionValue::Boolean(*value)),
                _ => mismatch(),
            },
            OptionType::User => match raw {
                RawOptionValue::User(user) => Checked::Value(OptionValue::User(user.clone())),
                _ => mismatch(),
            },
            OptionType::Role => match raw {
                RawOptionValue::Role(EntityRef::Resolved(role)) => {
                    Checked::Value(OptionValue::Role(role.clone()))
                }
                RawOptionValue::Role(EntityRef::Id(id)) => {
                    match self.fetch_role(id).await? {
                        Some(role) => Checked::Value(OptionValue::Role(role)),
                        None => reject(ValidationErrorKind::FetchMiss {
                            kind: EntityKind::Role,
                            id: id.clone(),
                        }),
                    }
                }
                _ => mismatch(),
            },
            OptionType::Channel => match raw {
                RawOptionValue::Channel(EntityRef::Resolved(channel)) => {
                    Checked::Value(OptionValue::Channel(channel.clone()))
                }
                RawOptionValue::Channel(EntityRef::Id(id)) => {
                    match self.fetch_channel(id).await? {
                        Some(channel) => Checked::Value(OptionValue::Channel(channel)),
                        None => reject(ValidationErrorKind::FetchMiss {
                            kind: EntityKind::Channel,
                            id: id.clone(),
                        }),
                    }
                }
                _ => mismatch(),
            },
            OptionType::Mentionable => match raw {
                RawOptionValue::Mentionable(MentionablePayload::Role(role)) => {
                    Checked::Value(OptionValue::Mention(Mention::Role(role.clone())))
                }
                RawOptionValue::Mentionable(MentionablePayload::User(user)) => {
                    Checked::Value(OptionValue::Mention(Mention::User(user.clone())))
                }
                RawOptionValue::Mentionable(MentionablePayload::Member(member)) => {
                    match &member.user {
                        Some(user) => {
                            Checked::Value(OptionValue::Mention(Mention::User(user.clone())))
                        }
                        // Partial member payloads without a user are not
                        // supported; kept as an explicit gap.
                        None => reject(ValidationErrorKind::UnsupportedMentionable),
                    }
                }
                _ => mismatch(),
            },
            OptionType::Attachment => match raw {
                RawOptionValue::Attachment(attachment) => {
                    Checked::Value(OptionValue::Attachment(attachment.clone()))
                }
                _ => mismatch(),
            },
        };
        Ok(checked)
    }

    async fn fetch_role(&self, id: &str) -> Result<Option<Role>> {
        let Some(guild_id) = self.guild_id else {
            return Ok(None);
        };
        let entity = self
            .transport
            .fetch_guild_entity(guild_id, EntityKind::Role, id)
            .await?;
        Ok(match entity {
            Some(GuildEntity::Role(role)) => Some(role),
            _ => None,
        })
    }

    async fn fetch_channel(&self, id: &str) -> Result<Option<Channel>> {
        let Some(guild_id) = self.guild_id else {
            return Ok(None);
        };
        let entity = self
            .transport
            .fetch_guild_entity(guild_id, EntityKind::Channel, id)
            .await?;
        Ok(match entity {
            Some(GuildEntity::Channel(channel)) => Some(channel),
            _ => None,
        })
    }
}

// Min first, then max; only one side can be reported per call.
fn check_range(value: f64, schema: &OptionSchema) -> Option<ValidationErrorKind> {
    if let Some(min) = schema.min_value {
        if value < min {
            return Some(ValidationErrorKind::BelowMinimum { min });
        }
    }
    if let Some(max) = schema.max_value {
        if value > max {
            return Some(ValidationErrorKind::AboveMaximum { max });
        }
    }
    None
}
