//! Record definitions
//!
//! A catalog entry plus the two shapes callers hand in: full field sets for
//! creation and partial patches for updates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::search::render_number;

/// A single video game entry
///
/// The identifier is not part of the record; the store keys records by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,

    /// Free-form age classification label (e.g. "E", "T", "M")
    pub age_rating: String,

    /// Free-form difficulty label
    pub difficulty: String,

    /// Approximate hours to finish; non-negative by convention
    pub hours_approx: f64,

    pub platform: String,

    /// Non-negative by convention
    pub price: f64,
}

/// Field set used to create a new record
pub type RecordFields = Record;

impl Record {
    pub fn new(
        name: impl Into<String>,
        age_rating: impl Into<String>,
        difficulty: impl Into<String>,
        hours_approx: f64,
        platform: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            name: name.into(),
            age_rating: age_rating.into(),
            difficulty: difficulty.into(),
            hours_approx,
            platform: platform.into(),
            price,
        }
    }

    /// Reject numeric fields that cannot be stored or rendered stably
    pub fn validate(&self) -> Result<()> {
        check_finite("hours_approx", self.hours_approx)?;
        check_finite("price", self.price)
    }

    /// Apply every field set in `patch`, keeping the rest
    pub fn apply(&mut self, patch: RecordPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age_rating) = patch.age_rating {
            self.age_rating = age_rating;
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(hours) = patch.hours_approx {
            self.hours_approx = hours;
        }
        if let Some(platform) = patch.platform {
            self.platform = platform;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Age rating: {}", self.age_rating)?;
        writeln!(f, "Difficulty: {}", self.difficulty)?;
        writeln!(f, "Hours approx: {}", render_number(self.hours_approx))?;
        writeln!(f, "Platform: {}", self.platform)?;
        write!(f, "Price: ${}", render_number(self.price))
    }
}

/// Partial update: `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub age_rating: Option<String>,
    pub difficulty: Option<String>,
    pub hours_approx: Option<f64>,
    pub platform: Option<String>,
    pub price: Option<f64>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn age_rating(mut self, age_rating: impl Into<String>) -> Self {
        self.age_rating = Some(age_rating.into());
        self
    }

    pub fn difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    pub fn hours_approx(mut self, hours: f64) -> Self {
        self.hours_approx = Some(hours);
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(hours) = self.hours_approx {
            check_finite("hours_approx", hours)?;
        }
        if let Some(price) = self.price {
            check_finite("price", price)?;
        }
        Ok(())
    }
}

fn check_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CatalogError::Validation(format!(
            "{} must be a finite number, got {}",
            field, value
        )))
    }
}
