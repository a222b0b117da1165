//! Schema-driven domain values for stashed payloads.
//!
//! A [`Schema`] declares each field once: which table owns it, how it is cast, and
//! whether it is required or zero-filled. A [`Domain`] built from that schema converts
//! JSON payloads to typed values, remembers which fields were explicitly touched, and
//! writes those fields back into SeaORM active models without issuing no-op writes.
//!
//! Equality is decided on cast values only. A `tdo` sent as `true` is stored as the
//! integer `1` at parse time, so it compares equal to a persisted `1`; no coercion
//! happens at comparison time.

use crate::errors::{Error, Result};
use chrono::NaiveDate;
use sea_orm::sea_query::ValueType;
use sea_orm::{ActiveModelTrait, EntityTrait, IdenStatic, Iterable, ModelTrait, Value};
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// How input keys that the schema does not declare are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Unknown keys are skipped
    #[default]
    Lenient,
    /// Unknown keys are rejected with [`Error::UnknownField`]
    Strict,
}

/// Table a field is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOwner {
    /// The identity table (`team_members`, `applications`, ...)
    Entity,
    /// The weekly table (`team_member_data`, `application_data`, ...)
    Data,
    /// Not persisted by `fill_model`; read by the coordinator directly
    Virtual,
}

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Trimmed string; empty strings become null
    Str,
    /// Calendar date in `YYYY-MM-DD` form
    Date,
    /// Reference to another record by id, given as an integer or `{ "id": n }`
    Ref,
    /// List of strings
    StrList,
}

/// Per-field options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Validators report the field when it is missing
    pub required: bool,
    /// Missing values read as zero
    pub zero_fill: bool,
}

/// One schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, identical to the column name of its owner table
    pub name: &'static str,
    /// Owning table
    pub owner: FieldOwner,
    /// Cast type
    pub kind: FieldKind,
    /// Options
    pub options: FieldOptions,
}

impl FieldSpec {
    /// Declares an optional field.
    #[must_use]
    pub const fn new(name: &'static str, owner: FieldOwner, kind: FieldKind) -> Self {
        Self {
            name,
            owner,
            kind,
            options: FieldOptions {
                required: false,
                zero_fill: false,
            },
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.options.required = true;
        self
    }

    /// Marks the field as zero-filled when absent.
    #[must_use]
    pub const fn zero_fill(mut self) -> Self {
        self.options.zero_fill = true;
        self
    }
}

/// A named list of fields.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    /// Schema name, used in log lines and error messages
    pub name: &'static str,
    /// Declared fields
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }
}

/// A cast field value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    /// Absent or explicitly null
    #[default]
    Null,
    /// Integer or reference id
    Int(i64),
    /// Boolean
    Bool(bool),
    /// Non-empty trimmed string
    Str(String),
    /// Calendar date
    Date(NaiveDate),
    /// List of strings
    List(Vec<String>),
}

impl FieldValue {
    const fn fits(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Self::Null, _)
                | (Self::Int(_), FieldKind::Int | FieldKind::Ref)
                | (Self::Bool(_), FieldKind::Bool)
                | (Self::Str(_), FieldKind::Str)
                | (Self::Date(_), FieldKind::Date)
                | (Self::List(_), FieldKind::StrList)
        )
    }

    fn to_json(&self) -> Json {
        match self {
            Self::Null => Json::Null,
            Self::Int(value) => Json::from(*value),
            Self::Bool(value) => Json::Bool(*value),
            Self::Str(value) => Json::String(value.clone()),
            Self::Date(value) => Json::String(value.format("%Y-%m-%d").to_string()),
            Self::List(values) => Json::from(values.clone()),
        }
    }
}

/// A transient, schema-typed value object.
#[derive(Debug, Clone)]
pub struct Domain {
    schema: &'static Schema,
    values: BTreeMap<&'static str, FieldValue>,
    dirty: BTreeSet<&'static str>,
}

impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self
                .schema
                .fields
                .iter()
                .all(|spec| self.get(spec.name) == other.get(spec.name))
    }
}

impl Domain {
    /// Creates an empty domain for `schema`.
    #[must_use]
    pub const fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    /// Builds a domain from a JSON object, casting every declared field.
    ///
    /// Every field present in `input` is marked as set. Zero-filled fields that are
    /// absent read as `0` without being marked.
    pub fn from_json(schema: &'static Schema, input: &Json, mode: ParseMode) -> Result<Self> {
        let object = input.as_object().ok_or_else(|| {
            Error::invalid_field(schema.name, "payload must be a JSON object")
        })?;

        let mut domain = Self::new(schema);
        for (key, raw) in object {
            let Some(spec) = schema.field(key) else {
                match mode {
                    ParseMode::Strict => {
                        return Err(Error::UnknownField { field: key.clone() });
                    }
                    ParseMode::Lenient => {
                        debug!(schema = schema.name, field = %key, "Ignoring unknown field");
                        continue;
                    }
                }
            };
            let value = cast(spec, raw)?;
            domain.values.insert(spec.name, value);
            domain.dirty.insert(spec.name);
        }
        domain.apply_zero_fill();
        Ok(domain)
    }

    fn apply_zero_fill(&mut self) {
        for spec in self.schema.fields {
            if spec.options.zero_fill {
                let slot = self.values.entry(spec.name).or_insert(FieldValue::Null);
                if *slot == FieldValue::Null {
                    *slot = FieldValue::Int(0);
                }
            }
        }
    }

    /// Copies the columns of `model` that belong to `owner` into this domain.
    ///
    /// Loaded values are not marked as set.
    pub fn absorb_model<M>(&mut self, model: &M, owner: FieldOwner)
    where
        M: ModelTrait,
    {
        for spec in self.schema.fields.iter().filter(|spec| spec.owner == owner) {
            let Some(column) = find_column::<M::Entity>(spec.name) else {
                warn!(schema = self.schema.name, field = spec.name, "No column for field");
                continue;
            };
            self.values
                .insert(spec.name, from_db_value(spec.kind, model.get(column)));
        }
        self.apply_zero_fill();
    }

    /// The schema this domain was built from.
    #[must_use]
    pub const fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Current value of a field, `Null` when absent.
    #[must_use]
    pub fn get(&self, name: &str) -> &FieldValue {
        static NULL: FieldValue = FieldValue::Null;
        self.values.get(name).unwrap_or(&NULL)
    }

    /// Sets a field and marks it as set.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<()> {
        let spec = self
            .schema
            .field(name)
            .ok_or_else(|| Error::UnknownField {
                field: name.to_string(),
            })?;
        if !value.fits(spec.kind) {
            return Err(Error::invalid_field(
                name,
                format!("{value:?} does not fit {:?}", spec.kind),
            ));
        }
        self.values.insert(spec.name, value);
        self.dirty.insert(spec.name);
        Ok(())
    }

    /// Whether the field was explicitly set.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    /// Names of explicitly set fields.
    #[must_use]
    pub fn set_fields(&self) -> Vec<&'static str> {
        self.dirty.iter().copied().collect()
    }

    /// Integer or reference value.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            FieldValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Boolean value, `false` when unset.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.bool(name).unwrap_or(false)
    }

    /// String value.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            FieldValue::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Date value.
    #[must_use]
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.get(name) {
            FieldValue::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// List value, empty when unset.
    #[must_use]
    pub fn list(&self, name: &str) -> &[String] {
        match self.get(name) {
            FieldValue::List(values) => values,
            _ => &[],
        }
    }

    /// The `id` field.
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.int("id")
    }

    /// Serializes every present field back to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Json {
        let object: Map<String, Json> = self
            .values
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.to_json()))
            .collect();
        Json::Object(object)
    }

    /// Writes the fields owned by `owner` into `target`.
    ///
    /// With `only_set`, fields that were never explicitly set are skipped. A field whose
    /// value already equals the target's current value is not written. Returns the names
    /// of the fields that changed.
    pub fn fill_model<A>(&self, target: &mut A, owner: FieldOwner, only_set: bool) -> Vec<&'static str>
    where
        A: ActiveModelTrait,
    {
        let mut changed = Vec::new();
        for spec in self.schema.fields.iter().filter(|spec| spec.owner == owner) {
            if only_set && !self.is_set(spec.name) {
                continue;
            }
            let Some(column) = find_column::<A::Entity>(spec.name) else {
                warn!(schema = self.schema.name, field = spec.name, "No column for field");
                continue;
            };
            let Some(value) = to_db_value(spec.kind, self.get(spec.name)) else {
                continue;
            };
            if target.get(column).into_value().as_ref() == Some(&value) {
                continue;
            }
            target.set(column, value);
            changed.push(spec.name);
        }
        changed
    }
}

fn find_column<E>(name: &str) -> Option<E::Column>
where
    E: EntityTrait,
{
    E::Column::iter().find(|column| column.as_str() == name)
}

fn to_db_value(kind: FieldKind, value: &FieldValue) -> Option<Value> {
    let db_value = match kind {
        FieldKind::Int | FieldKind::Ref => match value {
            FieldValue::Int(int) => Some(*int),
            _ => None,
        }
        .into(),
        FieldKind::Bool => match value {
            FieldValue::Bool(flag) => Some(*flag),
            _ => None,
        }
        .into(),
        FieldKind::Str => match value {
            FieldValue::Str(text) => Some(text.clone()),
            _ => None,
        }
        .into(),
        FieldKind::Date => match value {
            FieldValue::Date(date) => Some(*date),
            _ => None,
        }
        .into(),
        FieldKind::StrList => return None,
    };
    Some(db_value)
}

fn from_db_value(kind: FieldKind, value: Value) -> FieldValue {
    let cast = match kind {
        FieldKind::Int | FieldKind::Ref => {
            <Option<i64> as ValueType>::try_from(value).map(|v| v.map(FieldValue::Int))
        }
        FieldKind::Bool => {
            <Option<bool> as ValueType>::try_from(value).map(|v| v.map(FieldValue::Bool))
        }
        FieldKind::Str => {
            <Option<String> as ValueType>::try_from(value).map(|v| v.map(FieldValue::Str))
        }
        FieldKind::Date => {
            <Option<NaiveDate> as ValueType>::try_from(value).map(|v| v.map(FieldValue::Date))
        }
        FieldKind::StrList => return FieldValue::Null,
    };
    cast.ok().flatten().unwrap_or_default()
}

fn cast(spec: &FieldSpec, raw: &Json) -> Result<FieldValue> {
    let invalid = || {
        Error::invalid_field(
            spec.name,
            format!("cannot read {raw} as {:?}", spec.kind),
        )
    };

    if raw.is_null() {
        return Ok(FieldValue::Null);
    }

    match spec.kind {
        FieldKind::Int => cast_int(raw).ok_or_else(invalid),
        FieldKind::Ref => match raw {
            Json::Object(object) => object
                .get("id")
                .and_then(cast_int)
                .ok_or_else(invalid),
            Json::Bool(_) => Err(invalid()),
            _ => cast_int(raw).ok_or_else(invalid),
        },
        FieldKind::Bool => match raw {
            Json::Bool(flag) => Ok(FieldValue::Bool(*flag)),
            Json::Number(number) => match number.as_i64() {
                Some(0) => Ok(FieldValue::Bool(false)),
                Some(1) => Ok(FieldValue::Bool(true)),
                _ => Err(invalid()),
            },
            Json::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "" => Ok(FieldValue::Null),
                "true" | "1" | "yes" | "y" => Ok(FieldValue::Bool(true)),
                "false" | "0" | "no" | "n" => Ok(FieldValue::Bool(false)),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        },
        FieldKind::Str => match raw {
            Json::String(text) => {
                let trimmed = text.trim();
                Ok(if trimmed.is_empty() {
                    FieldValue::Null
                } else {
                    FieldValue::Str(trimmed.to_string())
                })
            }
            Json::Number(number) => Ok(FieldValue::Str(number.to_string())),
            _ => Err(invalid()),
        },
        FieldKind::Date => match raw {
            Json::String(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(FieldValue::Null);
                }
                let day = trimmed.get(..10).unwrap_or(trimmed);
                NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .map(FieldValue::Date)
                    .map_err(|_| invalid())
            }
            _ => Err(invalid()),
        },
        FieldKind::StrList => match raw {
            Json::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(|text| text.trim().to_string()).ok_or_else(invalid))
                .collect::<Result<Vec<_>>>()
                .map(FieldValue::List),
            Json::String(text) => Ok(FieldValue::List(vec![text.trim().to_string()])),
            _ => Err(invalid()),
        },
    }
}

fn cast_int(raw: &Json) -> Option<FieldValue> {
    match raw {
        Json::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0)
                    .map(|float| float as i64)
            })
            .map(FieldValue::Int),
        // Older clients sent boolean flags for integer counters
        Json::Bool(flag) => Some(FieldValue::Int(i64::from(*flag))),
        Json::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Some(FieldValue::Null)
            } else {
                trimmed.parse().ok().map(FieldValue::Int)
            }
        }
        _ => None,
    }
}
