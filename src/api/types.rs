use crate::models::{Id, PropertyFields, User, UserType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper price bound sent when the renter leaves "max price" empty
pub const UNBOUNDED_MAX_PRICE: f64 = 999_999.0;

/// Renter search filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// City or address fragment
    pub city: String,
    /// Minimum price per day, 0 when unset
    pub min_price: Option<f64>,
    /// Maximum price per day, unbounded when unset
    pub max_price: Option<f64>,
    /// Stay start; no date constraint when either date is unset
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl SearchFilters {
    /// Query string pairs. Unset dates go out as empty values so the
    /// server decides what "no date constraint" means.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("city", self.city.trim().to_string()),
            ("min_price", self.min_price.unwrap_or(0.0).to_string()),
            (
                "max_price",
                self.max_price.unwrap_or(UNBOUNDED_MAX_PRICE).to_string(),
            ),
            ("start_date", format_date(self.start_date)),
            ("end_date", format_date(self.end_date)),
        ]
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub user_type: UserType,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProfileEdit<'a> {
    pub id: &'a Id,
    pub name: &'a str,
    pub email: &'a str,
}

/// Create body: the full form plus the owner
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewProperty<'a> {
    #[serde(flatten)]
    pub fields: &'a PropertyFields,
    pub owner_id: &'a Id,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ApprovalUpdate {
    pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationRequest {
    pub property_id: Id,
    pub renter_id: Id,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSubmission {
    pub reservation_id: Id,
    pub rating: u8,
    pub comment: String,
}

/// `{"message": ...}` acknowledgement
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    pub message: String,
}

/// `{"error": ...}` body of a rejected request
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResponse {
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Registered {
    pub user_id: Id,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PropertyCreated {
    pub property_id: Id,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReservationCreated {
    pub reservation_id: Id,
}
