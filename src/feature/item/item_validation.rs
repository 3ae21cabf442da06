//! The rules a submitted item must follow.

use super::item_repository::NewItem;
use crate::infra::{
    error::ClientError,
    validation::{self, Valid},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

/// Allowed trimmed length of an item name, in UTF-16 code units.
pub const NAME_LENGTH: RangeInclusive<usize> = 3..=100;

/// Allowed trimmed length of an item description, in UTF-16 code units.
pub const DESCRIPTION_LENGTH: RangeInclusive<usize> = 5..=500;

/// An item as submitted by a client, before validation.
///
/// Fields hold whatever JSON the client sent, so that a missing field and a
/// field of the wrong type can both be reported as validation errors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct ItemPayload {
    /// The item's name.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "MyItem")]
    pub name: Option<Value>,
    /// The item's description.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "A very interesting item")]
    pub description: Option<Value>,
}

impl ItemPayload {
    /// Field names in the order their errors are reported.
    pub const FIELDS: [&'static str; 2] = ["name", "description"];

    /// A payload with both fields set to text.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: Some(Value::String(name.into())),
            description: Some(Value::String(description.into())),
        }
    }

    /// Every broken rule, name errors first.
    pub fn errors(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => validation::messages(&errors, &Self::FIELDS),
        }
    }

    /// Validates the payload, turning it into a trimmed [`NewItem`].
    pub fn into_new_item(self) -> Result<NewItem, ClientError> {
        let valid = Valid::new(self).map_err(|errors| {
            ClientError::Validation(validation::messages(&errors, &Self::FIELDS))
        })?;
        Ok(NewItem::from(valid))
    }
}

impl From<Map<String, Value>> for ItemPayload {
    fn from(mut fields: Map<String, Value>) -> Self {
        Self {
            name: fields.remove("name"),
            description: fields.remove("description"),
        }
    }
}

impl<'de> Deserialize<'de> for ItemPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(Self::from)
    }
}

impl Validate for ItemPayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = check_text("name", self.name.as_ref(), NAME_LENGTH) {
            errors.add("name", e);
        }
        if let Err(e) = check_text("description", self.description.as_ref(), DESCRIPTION_LENGTH) {
            errors.add("description", e);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<Valid<ItemPayload>> for NewItem {
    fn from(payload: Valid<ItemPayload>) -> Self {
        let payload = payload.into_inner();
        NewItem {
            name: trimmed(payload.name),
            description: trimmed(payload.description),
        }
    }
}

fn trimmed(value: Option<Value>) -> String {
    match value {
        Some(Value::String(text)) => text.trim().to_string(),
        _ => String::new(),
    }
}

/// At most one error per field: a missing or non-text value is not length checked.
fn check_text(
    field: &str,
    value: Option<&Value>,
    length: RangeInclusive<usize>,
) -> Result<(), ValidationError> {
    let text = match value {
        Some(Value::String(text)) if !text.is_empty() => text,
        _ => {
            return Err(validation::error(
                "required",
                format!("{field} is required and must be a string"),
            ))
        }
    };
    let len = text.trim().encode_utf16().count();
    if len < *length.start() {
        Err(validation::error(
            "min_length",
            format!("{field} must be at least {} characters", length.start()),
        ))
    } else if len > *length.end() {
        Err(validation::error(
            "max_length",
            format!("{field} must be less than {} characters", length.end()),
        ))
    } else {
        Ok(())
    }
}
