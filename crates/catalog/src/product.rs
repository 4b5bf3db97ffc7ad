//! Product records and validation.
//!
//! A product is either **customizable** (priced by a range over a weight
//! range) or **fixed** (a list of weight/price options with a default).
//! Exactly one of the two field-sets is present on a stored record; the
//! builder strips whichever set is inconsistent with the `customizable`
//! flag rather than rejecting the input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Inclusive price bounds for customizable products.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    /// Lowest price.
    pub min: f64,
    /// Highest price.
    pub max: f64,
}

/// Inclusive weight bounds for customizable products.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightRange {
    /// Lowest weight.
    pub min: f64,
    /// Highest weight.
    pub max: f64,
}

/// One weight/price option for fixed products.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightPrice {
    /// Weight of this option.
    pub weight: f64,
    /// Price of this option.
    pub price: f64,
}

/// A stored catalog record.
///
/// Timestamps are optional on decode so records written before the
/// timestamp fields existed still load; such records sort as oldest when
/// listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Globally unique, server-generated identifier.
    pub id: String,
    /// Display title; unique across all products, case-insensitive.
    pub title: String,
    /// Which variant field-set this record carries.
    pub customizable: bool,
    /// Whether the product is currently offered.
    pub is_active: bool,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Customizable variant: allowed price range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    /// Customizable variant: allowed weight range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_range: Option<WeightRange>,
    /// Fixed variant: offered weight/price options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_weights: Option<Vec<WeightPrice>>,
    /// Fixed variant: pre-selected weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_weight: Option<f64>,
}

/// Client-supplied product fields, before validation and id assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    /// Display title.
    pub title: String,
    /// Which variant field-set applies.
    #[serde(default)]
    pub customizable: bool,
    /// Whether the product is offered. Defaults to true.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Customizable variant: allowed price range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    /// Customizable variant: allowed weight range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_range: Option<WeightRange>,
    /// Fixed variant: offered weight/price options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_weights: Option<Vec<WeightPrice>>,
    /// Fixed variant: pre-selected weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_weight: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl ProductDraft {
    /// Validates client-controlled fields.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] if the trimmed title is empty
    /// or longer than [`MAX_TITLE_LENGTH`] characters.
    pub fn validate(&self) -> CatalogResult<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(CatalogError::validation("title must not be empty"));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(CatalogError::validation(format!(
                "title must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }
        Ok(())
    }

    /// Builds the stored record: trims the title and strips the variant
    /// field-set inconsistent with the `customizable` flag.
    ///
    /// The stripping is defense-in-depth against payloads that carry both
    /// field-sets; the kept set may still be empty (a customizable product
    /// with no ranges is storable).
    #[must_use]
    pub fn build(
        self,
        id: String,
        is_active: bool,
        created_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Product {
        let (price_range, weight_range, available_weights, default_weight) = if self.customizable {
            (self.price_range, self.weight_range, None, None)
        } else {
            (None, None, self.available_weights, self.default_weight)
        };

        Product {
            id,
            title: self.title.trim().to_string(),
            customizable: self.customizable,
            is_active,
            created_at,
            updated_at: Some(updated_at),
            price_range,
            weight_range,
            available_weights,
            default_weight,
        }
    }
}

/// Normalizes a title for uniqueness comparison: trimmed and lower-cased.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}
