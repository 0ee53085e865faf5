use crate::api::traits::MarketplaceApi;
use crate::api::types::{
    Ack, ApprovalUpdate, ErrorBody, LoginRequest, LoginResponse, NewProperty, ProfileEdit,
    PropertyCreated, Registered, Registration, ReservationCreated, ReservationRequest,
    ReviewSubmission, SearchFilters,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    Id, LandlordReservation, Property, PropertyFields, PropertyReview, RenterReservation, User,
};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// JSON-over-HTTP client for the marketplace API
pub struct HttpApi {
    client: Client,
    base: Url,
    base_str: String,
}

impl HttpApi {
    /// Create a client for `base_url` (e.g. `http://localhost:5000/api`)
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_timeout(&config.api_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_str = base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_str)
            .map_err(|e| Error::Config(format!("invalid API URL {:?}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!("invalid API URL {:?}", base_url)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rental-scout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base,
            base_str,
        })
    }

    /// Base URL requests are sent to, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_str
    }

    /// Join path segments onto the base URL, escaping each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }
}

/// Decode a success body, or turn a rejection into `Error::Server`
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .map(|b| b.error)
            .filter(|m| !m.trim().is_empty());
        warn!("API returned status {}: {}", status, message.as_deref().unwrap_or("<no error body>"));
        return Err(Error::Server {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json::<T>().await?)
}

#[async_trait]
impl MarketplaceApi for HttpApi {
    async fn register(&self, registration: &Registration) -> Result<Id> {
        let url = self.endpoint(&["auth", "register"]);
        let response = self.client.post(url).json(registration).send().await?;
        let registered: Registered = read_json(response).await?;
        info!("Registered {} as {}", registration.email, registration.user_type);
        Ok(registered.user_id)
    }

    async fn login(&self, email: &str) -> Result<User> {
        let url = self.endpoint(&["auth", "login"]);
        let response = self
            .client
            .post(url)
            .json(&LoginRequest { email })
            .send()
            .await?;
        let login: LoginResponse = read_json(response).await?;
        Ok(login.user)
    }

    async fn edit_profile(&self, id: &Id, name: &str, email: &str) -> Result<String> {
        let url = self.endpoint(&["auth", "edit"]);
        let response = self
            .client
            .put(url)
            .json(&ProfileEdit { id, name, email })
            .send()
            .await?;
        let ack: Ack = read_json(response).await?;
        Ok(ack.message)
    }

    async fn list_owned(&self, owner_id: &Id) -> Result<Vec<Property>> {
        let owner = owner_id.to_string();
        self.get_json(self.endpoint(&["locador", "properties", &owner]))
            .await
    }

    async fn create_property(&self, owner_id: &Id, fields: &PropertyFields) -> Result<Id> {
        let url = self.endpoint(&["locador", "properties"]);
        let response = self
            .client
            .post(url)
            .json(&NewProperty { fields, owner_id })
            .send()
            .await?;
        let created: PropertyCreated = read_json(response).await?;
        info!("Created property {} ({})", created.property_id, fields.title);
        Ok(created.property_id)
    }

    async fn update_property(&self, id: &Id, fields: &PropertyFields) -> Result<()> {
        let id = id.to_string();
        let url = self.endpoint(&["locador", "property", &id]);
        let response = self.client.put(url).json(fields).send().await?;
        let _: Ack = read_json(response).await?;
        info!("Updated property {}", id);
        Ok(())
    }

    async fn delete_property(&self, id: &Id) -> Result<()> {
        let id = id.to_string();
        let url = self.endpoint(&["locador", "property", &id]);
        let response = self.client.delete(url).send().await?;
        let _: Ack = read_json(response).await?;
        info!("Deleted property {}", id);
        Ok(())
    }

    async fn landlord_reservations(&self, owner_id: &Id) -> Result<Vec<LandlordReservation>> {
        let owner = owner_id.to_string();
        self.get_json(self.endpoint(&["locador", "reservations", &owner]))
            .await
    }

    async fn set_approval(&self, reservation_id: &Id, approved: bool) -> Result<()> {
        let id = reservation_id.to_string();
        let url = self.endpoint(&["locador", "reservation", &id]);
        let response = self
            .client
            .put(url)
            .json(&ApprovalUpdate { approved })
            .send()
            .await?;
        let _: Ack = read_json(response).await?;
        info!("Reservation {} approved={}", id, approved);
        Ok(())
    }

    async fn search(&self, filters: &SearchFilters) -> Result<Vec<Property>> {
        let url = self.endpoint(&["locatario", "search"]);
        debug!("GET {} {:?}", url, filters);
        let response = self
            .client
            .get(url)
            .query(&filters.query_pairs())
            .send()
            .await?;
        read_json(response).await
    }

    async fn reserve(&self, request: &ReservationRequest) -> Result<Id> {
        let url = self.endpoint(&["locatario", "reserve"]);
        let response = self.client.post(url).json(request).send().await?;
        let created: ReservationCreated = read_json(response).await?;
        info!(
            "Requested reservation {} for property {}",
            created.reservation_id, request.property_id
        );
        Ok(created.reservation_id)
    }

    async fn my_reservations(&self, renter_id: &Id) -> Result<Vec<RenterReservation>> {
        let renter = renter_id.to_string();
        self.get_json(self.endpoint(&["locatario", "my-reservations", &renter]))
            .await
    }

    async fn submit_review(&self, review: &ReviewSubmission) -> Result<()> {
        let url = self.endpoint(&["locatario", "review"]);
        let response = self.client.post(url).json(review).send().await?;
        let _: Ack = read_json(response).await?;
        info!("Reviewed reservation {}", review.reservation_id);
        Ok(())
    }

    async fn property_reviews(&self, property_id: &Id) -> Result<Vec<PropertyReview>> {
        let id = property_id.to_string();
        self.get_json(self.endpoint(&["locatario", "property", &id, "reviews"]))
            .await
    }
}
