use super::{render, Confirm, Notifier, ViewFlags, ViewScope};
use crate::api::MarketplaceApi;
use crate::error::{Error, Result};
use crate::lifecycle::{self, Decision, Reservation as _};
use crate::models::{Id, LandlordReservation, Property, User, UserType};
use crate::session::Session;
use crate::validation::PropertyDraft;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LandlordTab {
    #[default]
    Listings,
    Editor,
    Reservations,
}

#[derive(Debug, Default)]
struct LandlordState {
    properties: Vec<Property>,
    reservations: Vec<LandlordReservation>,
}

/// Landlord dashboard: own listings, the listing editor, and received
/// reservations.
///
/// Every successful mutation is followed by one re-fetch of the collection
/// it touched; server responses are never merged into local state.
pub struct LandlordDashboard {
    api: Arc<dyn MarketplaceApi>,
    user: User,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn Confirm>,
    flags: ViewFlags,
    state: Arc<RwLock<LandlordState>>,
    scope: ViewScope,
    pub tab: LandlordTab,
    pub form: PropertyDraft,
}

impl LandlordDashboard {
    pub fn open(
        api: Arc<dyn MarketplaceApi>,
        session: &Session,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn Confirm>,
        flags: ViewFlags,
    ) -> Result<Self> {
        let user = session.require()?;
        if !user.is_landlord() {
            return Err(Error::WrongRole {
                expected: UserType::Landlord,
            });
        }

        Ok(Self {
            api,
            user: user.clone(),
            notifier,
            confirm,
            flags,
            state: Arc::new(RwLock::new(LandlordState::default())),
            scope: ViewScope::new(),
            tab: LandlordTab::default(),
            form: PropertyDraft::default(),
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub async fn properties(&self) -> Vec<Property> {
        self.state.read().await.properties.clone()
    }

    pub async fn reservations(&self) -> Vec<LandlordReservation> {
        self.state.read().await.reservations.clone()
    }

    /// Fetch listings and reservations, as on view entry
    pub async fn load(&self) -> bool {
        let properties = self.refresh_properties().await;
        let reservations = self.refresh_reservations().await;
        properties && reservations
    }

    pub async fn refresh_properties(&self) -> bool {
        match self.api.list_owned(&self.user.id).await {
            Ok(properties) => {
                debug!("Loaded {} properties", properties.len());
                self.state.write().await.properties = properties;
                true
            }
            Err(e) => {
                warn!("Failed to load properties: {}", e);
                self.notifier.alert(&e.user_message("Failed to load properties."));
                false
            }
        }
    }

    pub async fn refresh_reservations(&self) -> bool {
        match self.api.landlord_reservations(&self.user.id).await {
            Ok(reservations) => {
                debug!("Loaded {} reservations", reservations.len());
                self.state.write().await.reservations = reservations;
                true
            }
            Err(e) => {
                warn!("Failed to load reservations: {}", e);
                self.notifier
                    .alert(&e.user_message("Failed to load reservations."));
                false
            }
        }
    }

    /// Reload both collections in the background. Resolves to `false`
    /// without touching state if the view is closed before the responses
    /// arrive.
    pub fn spawn_refresh(&self) -> JoinHandle<bool> {
        let api = Arc::clone(&self.api);
        let owner = self.user.id.clone();
        let state = Arc::clone(&self.state);
        let notifier = Arc::clone(&self.notifier);
        let liveness = self.scope.liveness();

        tokio::spawn(async move {
            let properties = api.list_owned(&owner).await;
            let reservations = api.landlord_reservations(&owner).await;

            if !liveness.is_alive() {
                debug!("Landlord view closed, discarding refresh");
                return false;
            }

            let mut ok = true;
            let mut state = state.write().await;
            match properties {
                Ok(properties) => state.properties = properties,
                Err(e) => {
                    ok = false;
                    notifier.alert(&e.user_message("Failed to load properties."));
                }
            }
            match reservations {
                Ok(reservations) => state.reservations = reservations,
                Err(e) => {
                    ok = false;
                    notifier.alert(&e.user_message("Failed to load reservations."));
                }
            }
            ok
        })
    }

    /// Open an empty editor for a new listing
    pub fn new_listing(&mut self) {
        self.form = PropertyDraft::default();
        self.tab = LandlordTab::Editor;
    }

    /// Open the editor pre-filled with a loaded listing
    pub async fn edit(&mut self, property_id: &Id) -> bool {
        let draft = self
            .state
            .read()
            .await
            .properties
            .iter()
            .find(|p| &p.id == property_id)
            .map(PropertyDraft::from_property);

        match draft {
            Some(draft) => {
                self.form = draft;
                self.tab = LandlordTab::Editor;
                true
            }
            None => {
                self.notifier.alert("Property not found.");
                false
            }
        }
    }

    /// Submit the editor: update when it holds an existing id, create
    /// otherwise. The form is kept on failure so the user can retry.
    pub async fn save(&mut self) -> bool {
        let fields = match self.form.validate() {
            Ok(fields) => fields,
            Err(e) => {
                self.notifier.alert(&e.user_message("Invalid property."));
                return false;
            }
        };

        let result = match &self.form.id {
            Some(id) => self
                .api
                .update_property(id, &fields)
                .await
                .map(|_| "Property updated!"),
            None => self
                .api
                .create_property(&self.user.id, &fields)
                .await
                .map(|_| "Property registered!"),
        };

        match result {
            Ok(message) => {
                self.notifier.alert(message);
                self.form = PropertyDraft::default();
                self.tab = LandlordTab::Listings;
                self.refresh_properties().await;
                true
            }
            Err(e) => {
                warn!("Failed to save property: {}", e);
                self.notifier.alert(&e.user_message("Failed to save property."));
                false
            }
        }
    }

    /// Delete after explicit confirmation. Declining sends nothing.
    pub async fn delete(&self, property_id: &Id) -> bool {
        if !self
            .confirm
            .confirm("Are you sure you want to delete this property?")
        {
            debug!("Deletion of property {} cancelled", property_id);
            return false;
        }

        match self.api.delete_property(property_id).await {
            Ok(()) => {
                self.notifier.alert("Property removed!");
                self.refresh_properties().await;
                true
            }
            Err(e) => {
                warn!("Failed to delete property {}: {}", property_id, e);
                self.notifier
                    .alert(&e.user_message("Failed to delete property."));
                false
            }
        }
    }

    pub async fn approve(&self, reservation_id: &Id) -> bool {
        self.decide(reservation_id, Decision::Approve).await
    }

    pub async fn reject(&self, reservation_id: &Id) -> bool {
        self.decide(reservation_id, Decision::Reject).await
    }

    /// Approve or reject a pending reservation
    pub async fn decide(&self, reservation_id: &Id, decision: Decision) -> bool {
        let current = self
            .state
            .read()
            .await
            .reservations
            .iter()
            .find(|r| &r.reservation_id == reservation_id)
            .map(|r| r.approval());

        let Some(current) = current else {
            self.notifier.alert("Reservation not found.");
            return false;
        };

        if let Err(e) = lifecycle::decide(current, decision) {
            self.notifier.alert(&e.user_message("Reservation already decided."));
            return false;
        }

        match self
            .api
            .set_approval(reservation_id, decision.approved())
            .await
        {
            Ok(()) => {
                self.notifier.alert("Reservation updated!");
                self.refresh_reservations().await;
                true
            }
            Err(e) => {
                warn!("Failed to update reservation {}: {}", reservation_id, e);
                self.notifier
                    .alert(&e.user_message("Failed to update reservation."));
                false
            }
        }
    }

    /// Text rendering of the active tab
    pub async fn render(&self) -> String {
        let state = self.state.read().await;
        let mut out = render::greeting(&self.user);

        match self.tab {
            LandlordTab::Listings => {
                out.push_str(&render::owned_listings(&state.properties, self.flags));
            }
            LandlordTab::Editor => {
                out.push_str(&render::property_draft(&self.form));
            }
            LandlordTab::Reservations => {
                out.push_str(&render::received_reservations(&state.reservations));
            }
        }
        out
    }
}
