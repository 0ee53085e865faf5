//! Checks run before a form is submitted. A failure here never reaches
//! the network.

use crate::error::{Error, Result};
use crate::models::{Id, Property, PropertyFields};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Landlord listing form, held as the raw text the user typed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDraft {
    /// Set when editing an existing listing
    pub id: Option<Id>,
    pub title: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub price_per_day: String,
    pub available_from: String,
    pub available_until: String,
    pub image_url: String,
}

impl PropertyDraft {
    /// Pre-fill the form from a stored listing
    pub fn from_property(property: &Property) -> Self {
        Self {
            id: Some(property.id.clone()),
            title: property.title.clone(),
            description: property.description.clone(),
            address: property.address.clone(),
            city: property.city.clone().unwrap_or_default(),
            price_per_day: property.price_per_day.to_string(),
            available_from: property.available_from.format(DATE_FORMAT).to_string(),
            available_until: property.available_until.format(DATE_FORMAT).to_string(),
            image_url: property.image_url.clone().unwrap_or_default(),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    /// Parse into the record sent to the API
    pub fn validate(&self) -> Result<PropertyFields> {
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("address", &self.address),
            ("price per day", &self.price_per_day),
            ("available from", &self.available_from),
            ("available until", &self.available_until),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "Fill in the required fields: {}.",
                missing.join(", ")
            )));
        }

        let price_per_day = parse_price(&self.price_per_day)?;
        let available_from = parse_date("available from", &self.available_from)?;
        let available_until = parse_date("available until", &self.available_until)?;

        if available_from > available_until {
            return Err(Error::Validation(
                "The availability window must start on or before its end.".into(),
            ));
        }

        Ok(PropertyFields {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            address: self.address.trim().to_string(),
            city: non_empty(&self.city),
            price_per_day,
            available_from,
            available_until,
            image_url: non_empty(&self.image_url),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Non-negative, finite price. Accepts a decimal comma.
pub fn parse_price(raw: &str) -> Result<f64> {
    let normalized = raw.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        Ok(_) => Err(Error::Validation("Price must be zero or more.".into())),
        Err(_) => Err(Error::Validation(format!("{:?} is not a valid price.", raw.trim()))),
    }
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| Error::Validation(format!("{} must be a date like 2024-01-31.", field)))
}

/// Booking dates: both chosen, start before end
pub fn reservation_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate)> {
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok((start, end)),
        (Some(_), Some(_)) => Err(Error::Validation(
            "The check-out date must be after the check-in date.".into(),
        )),
        _ => Err(Error::Validation(
            "Select the dates before booking.".into(),
        )),
    }
}

/// Review form for one reservation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewDraft {
    pub rating: Option<i64>,
    pub comment: String,
}

impl ReviewDraft {
    /// Rating in 1..=5 and a non-blank comment
    pub fn validate(&self) -> Result<(u8, String)> {
        let comment = self.comment.trim();
        let rating = match self.rating {
            Some(rating) if !comment.is_empty() => rating,
            _ => return Err(Error::Validation("Fill in rating and comment.".into())),
        };

        if !(1..=5).contains(&rating) {
            return Err(Error::Validation("Rating must be between 1 and 5.".into()));
        }

        Ok((rating as u8, comment.to_string()))
    }
}
