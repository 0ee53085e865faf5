use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier as emitted by the marketplace.
///
/// Older records use integers, newer ones UUID strings. The value is kept
/// opaque and echoed back in the representation it arrived in. Two ids are
/// equal when their text is, so `12` and `"12"` name the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Num(i64),
    Text(String),
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Id::Num(a), Id::Num(b)) => a == b,
            (Id::Text(a), Id::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for Id {}

impl Hash for Id {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Num(n) => write!(f, "{}", n),
            Id::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Num(n)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::from(s.to_string())
    }
}

impl From<String> for Id {
    /// Numeric text becomes `Id::Num` so ids typed on the command line
    /// match the ones the API hands out.
    fn from(s: String) -> Self {
        match s.parse::<i64>() {
            Ok(n) => Id::Num(n),
            Err(_) => Id::Text(s),
        }
    }
}

/// Role tag of a marketplace user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    #[serde(rename = "locador")]
    Landlord,
    #[serde(rename = "locatario")]
    Renter,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Landlord => "locador",
            UserType::Renter => "locatario",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logged-in identity, also the shape of the persisted session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    /// Fields the API may add later; kept so a rewrite of the session
    /// record does not drop them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    pub fn is_landlord(&self) -> bool {
        self.user_type == UserType::Landlord
    }
}

/// A listing as returned by the landlord catalog and the renter search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub price_per_day: f64,
    pub available_from: NaiveDate,
    pub available_until: NaiveDate,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Only present on the owner's catalog listing
    #[serde(default, rename = "total_reservas")]
    pub total_reservations: u32,
    #[serde(default)]
    pub average_rating: Option<f64>,
}

impl Property {
    /// Image reference, ignoring the empty strings old forms submitted
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// Editable attributes of a listing, sent in full on create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFields {
    pub title: String,
    pub description: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub price_per_day: f64,
    pub available_from: NaiveDate,
    pub available_until: NaiveDate,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A stored review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: u8,
    pub comment: String,
}

/// A review listed on a property, with its author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyReview {
    pub rating: u8,
    pub comment: String,
    pub renter_name: String,
}

/// Reservation as the owning landlord sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandlordReservation {
    pub reservation_id: Id,
    pub property_id: Id,
    pub renter_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub approved: Option<bool>,
}

/// Reservation as the renter who booked it sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenterReservation {
    pub reservation_id: Id,
    pub property_id: Id,
    pub property_title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub review: Option<Review>,
}

impl RenterReservation {
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}
