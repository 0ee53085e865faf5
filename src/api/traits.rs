use crate::api::types::{Registration, ReservationRequest, ReviewSubmission, SearchFilters};
use crate::error::Result;
use crate::models::{
    Id, LandlordReservation, Property, PropertyFields, PropertyReview, RenterReservation, User,
};
use async_trait::async_trait;

/// Operations the marketplace API exposes to its client.
///
/// Mutations return nothing (or the id the server assigned); callers
/// re-fetch the collection they touched.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Create an account, returning the new user id
    async fn register(&self, registration: &Registration) -> Result<Id>;

    /// Look up the account registered under `email`
    async fn login(&self, email: &str) -> Result<User>;

    /// Change name and email, returning the server's acknowledgement
    async fn edit_profile(&self, id: &Id, name: &str, email: &str) -> Result<String>;

    async fn list_owned(&self, owner_id: &Id) -> Result<Vec<Property>>;

    async fn create_property(&self, owner_id: &Id, fields: &PropertyFields) -> Result<Id>;

    /// Full-record replace
    async fn update_property(&self, id: &Id, fields: &PropertyFields) -> Result<()>;

    async fn delete_property(&self, id: &Id) -> Result<()>;

    /// Reservations received for every listing of `owner_id`
    async fn landlord_reservations(&self, owner_id: &Id) -> Result<Vec<LandlordReservation>>;

    async fn set_approval(&self, reservation_id: &Id, approved: bool) -> Result<()>;

    async fn search(&self, filters: &SearchFilters) -> Result<Vec<Property>>;

    /// Request a booking, returning the pending reservation's id
    async fn reserve(&self, request: &ReservationRequest) -> Result<Id>;

    async fn my_reservations(&self, renter_id: &Id) -> Result<Vec<RenterReservation>>;

    async fn submit_review(&self, review: &ReviewSubmission) -> Result<()>;

    async fn property_reviews(&self, property_id: &Id) -> Result<Vec<PropertyReview>>;
}
