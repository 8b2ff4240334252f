//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::EcommerceError;

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, EcommerceError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(EcommerceError::validation("SKU must not be empty")); }
        if value.len() > 50 { return Err(EcommerceError::validation("SKU too long")); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// URL slug derived from a display name: lower-case ASCII alphanumerics joined by single dashes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn from_name(name: &str) -> Result<Self, EcommerceError> {
        let mut slug = String::with_capacity(name.len());
        for c in name.trim().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        let slug = slug.trim_end_matches('-').to_string();
        if slug.is_empty() {
            return Err(EcommerceError::validation("name must contain at least one letter or digit"));
        }
        Ok(Self(slug))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

/// Promotion code, matched case-insensitively and stored upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromoCode(String);

impl PromoCode {
    pub fn new(value: &str) -> Result<Self, EcommerceError> {
        let value = value.trim().to_uppercase();
        if value.is_empty() { return Err(EcommerceError::validation("promotion code must not be empty")); }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(EcommerceError::validation("promotion code may only contain letters, digits, '-' and '_'"));
        }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

/// Parses a monetary amount from its textual form. Never defaults on bad input.
pub fn parse_amount(raw: &str) -> Result<Decimal, EcommerceError> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| EcommerceError::validation(format!("invalid amount: {raw:?}")))?;
    ensure_non_negative(amount, "amount")?;
    Ok(amount)
}

pub fn ensure_non_negative(amount: Decimal, field: &str) -> Result<(), EcommerceError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(EcommerceError::validation(format!("{field} must not be negative")));
    }
    Ok(())
}

/// Money columns hold two decimal places; anything finer is rejected rather than rounded.
pub fn ensure_money(amount: Decimal, field: &str) -> Result<(), EcommerceError> {
    ensure_non_negative(amount, field)?;
    if amount.normalize().scale() > 2 {
        return Err(EcommerceError::validation(format!("{field} must have at most 2 decimal places")));
    }
    Ok(())
}
