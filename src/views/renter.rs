use super::{render, system_clock, Clock, Notifier, ViewFlags, ViewScope};
use crate::api::{MarketplaceApi, ReservationRequest, ReviewSubmission, SearchFilters};
use crate::error::{Error, Result};
use crate::lifecycle::{self, ApprovalState, Reservation as _, Timing};
use crate::models::{Id, Property, PropertyReview, RenterReservation, Review, User, UserType};
use crate::session::Session;
use crate::validation::{self, ReviewDraft};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenterTab {
    #[default]
    Search,
    Reservations,
}

/// Result area of the search tab
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchOutcome {
    /// No search issued yet
    #[default]
    NotSearched,
    /// The server answered with an empty list
    NoResults,
    Results(Vec<Property>),
}

impl SearchOutcome {
    fn from_results(results: Vec<Property>) -> Self {
        if results.is_empty() {
            SearchOutcome::NoResults
        } else {
            SearchOutcome::Results(results)
        }
    }
}

/// What a reservation card shows in its review area
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewSlot {
    /// Input form for rating and comment
    Form,
    /// The review already attached
    Stored(Review),
    Unavailable,
}

#[derive(Debug, Default)]
struct RenterState {
    search: SearchOutcome,
    reservations: Vec<RenterReservation>,
}

/// Renter dashboard: property search and the renter's own reservations
pub struct RenterDashboard {
    api: Arc<dyn MarketplaceApi>,
    user: User,
    notifier: Arc<dyn Notifier>,
    flags: ViewFlags,
    clock: Clock,
    state: Arc<RwLock<RenterState>>,
    scope: ViewScope,
    drafts: HashMap<Id, ReviewDraft>,
    pub tab: RenterTab,
    pub filters: SearchFilters,
}

impl RenterDashboard {
    pub fn open(
        api: Arc<dyn MarketplaceApi>,
        session: &Session,
        notifier: Arc<dyn Notifier>,
        flags: ViewFlags,
    ) -> Result<Self> {
        let user = session.require()?;
        if user.is_landlord() {
            return Err(Error::WrongRole {
                expected: UserType::Renter,
            });
        }

        Ok(Self {
            api,
            user: user.clone(),
            notifier,
            flags,
            clock: system_clock,
            state: Arc::new(RwLock::new(RenterState::default())),
            scope: ViewScope::new(),
            drafts: HashMap::new(),
            tab: RenterTab::default(),
            filters: SearchFilters::default(),
        })
    }

    /// Replace the source of "now" used to split and gate reservations
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Switch tabs; entering the reservations tab re-fetches them
    pub async fn show_tab(&mut self, tab: RenterTab) {
        self.tab = tab;
        if tab == RenterTab::Reservations {
            self.refresh_reservations().await;
        }
    }

    pub async fn search_outcome(&self) -> SearchOutcome {
        self.state.read().await.search.clone()
    }

    pub async fn reservations(&self) -> Vec<RenterReservation> {
        self.state.read().await.reservations.clone()
    }

    /// Run the search with the current filters. A failure keeps the
    /// previous results on screen.
    pub async fn search(&self) -> bool {
        match self.api.search(&self.filters).await {
            Ok(results) => {
                debug!("Search returned {} properties", results.len());
                self.state.write().await.search = SearchOutcome::from_results(results);
                true
            }
            Err(e) => {
                warn!("Search failed: {}", e);
                self.notifier
                    .alert(&e.user_message("Failed to search properties."));
                false
            }
        }
    }

    /// Book `property_id` for the dates in the search filters
    pub async fn reserve(&self, property_id: &Id) -> bool {
        let (start_date, end_date) =
            match validation::reservation_dates(self.filters.start_date, self.filters.end_date) {
                Ok(dates) => dates,
                Err(e) => {
                    self.notifier.alert(&e.user_message("Select the dates before booking."));
                    return false;
                }
            };

        let request = ReservationRequest {
            property_id: property_id.clone(),
            renter_id: self.user.id.clone(),
            start_date,
            end_date,
        };

        match self.api.reserve(&request).await {
            Ok(_) => {
                self.notifier.alert("Reservation requested successfully!");
                self.refresh_reservations().await;
                true
            }
            Err(e) => {
                warn!("Failed to book property {}: {}", property_id, e);
                self.notifier.alert(&e.user_message("Failed to book property."));
                false
            }
        }
    }

    pub async fn refresh_reservations(&self) -> bool {
        match self.api.my_reservations(&self.user.id).await {
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

    /// Reload reservations in the background; a response arriving after
    /// the view is closed is dropped.
    pub fn spawn_refresh(&self) -> JoinHandle<bool> {
        let api = Arc::clone(&self.api);
        let renter = self.user.id.clone();
        let state = Arc::clone(&self.state);
        let notifier = Arc::clone(&self.notifier);
        let liveness = self.scope.liveness();

        tokio::spawn(async move {
            let result = api.my_reservations(&renter).await;

            if !liveness.is_alive() {
                debug!("Renter view closed, discarding refresh");
                return false;
            }

            match result {
                Ok(reservations) => {
                    state.write().await.reservations = reservations;
                    true
                }
                Err(e) => {
                    notifier.alert(&e.user_message("Failed to load reservations."));
                    false
                }
            }
        })
    }

    /// Loaded reservations split into (upcoming, concluded)
    pub async fn reservation_groups(&self) -> (Vec<RenterReservation>, Vec<RenterReservation>) {
        let now = (self.clock)();
        let state = self.state.read().await;
        let (upcoming, concluded) = lifecycle::partition_by_timing(&state.reservations, now);
        (
            upcoming.into_iter().cloned().collect(),
            concluded.into_iter().cloned().collect(),
        )
    }

    /// A review attached to a reservation that is not approved is never
    /// shown as the renter's review.
    pub fn review_slot(&self, reservation: &RenterReservation) -> ReviewSlot {
        if let Some(review) = &reservation.review {
            if reservation.approval() == ApprovalState::Approved {
                return ReviewSlot::Stored(review.clone());
            }
            warn!(
                "Ignoring review on reservation {} ({})",
                reservation.reservation_id,
                reservation.approval().label()
            );
            ReviewSlot::Unavailable
        } else if lifecycle::can_review(reservation, (self.clock)()) {
            ReviewSlot::Form
        } else {
            ReviewSlot::Unavailable
        }
    }

    pub fn set_review_rating(&mut self, reservation_id: &Id, rating: i64) {
        self.drafts.entry(reservation_id.clone()).or_default().rating = Some(rating);
    }

    pub fn set_review_comment(&mut self, reservation_id: &Id, comment: &str) {
        self.drafts.entry(reservation_id.clone()).or_default().comment = comment.to_string();
    }

    pub fn review_draft(&self, reservation_id: &Id) -> Option<&ReviewDraft> {
        self.drafts.get(reservation_id)
    }

    /// Send the review typed for `reservation_id`. Incomplete input or an
    /// ineligible reservation is reported without any request.
    pub async fn submit_review(&mut self, reservation_id: &Id) -> bool {
        let draft = self.drafts.get(reservation_id).cloned().unwrap_or_default();
        let (rating, comment) = match draft.validate() {
            Ok(parsed) => parsed,
            Err(e) => {
                self.notifier.alert(&e.user_message("Fill in rating and comment."));
                return false;
            }
        };

        let block = {
            let state = self.state.read().await;
            state
                .reservations
                .iter()
                .find(|r| &r.reservation_id == reservation_id)
                .map(|r| lifecycle::review_block(r, (self.clock)()))
        };

        match block {
            None => {
                self.notifier.alert("Reservation not found.");
                return false;
            }
            Some(Some(block)) => {
                self.notifier.alert(block.message());
                return false;
            }
            Some(None) => {}
        }

        let submission = ReviewSubmission {
            reservation_id: reservation_id.clone(),
            rating,
            comment,
        };

        match self.api.submit_review(&submission).await {
            Ok(()) => {
                self.notifier.alert("Review submitted successfully!");
                self.drafts.remove(reservation_id);
                self.refresh_reservations().await;
                true
            }
            Err(e) => {
                warn!("Failed to submit review for {}: {}", reservation_id, e);
                self.notifier.alert(&e.user_message("Failed to submit review."));
                false
            }
        }
    }

    pub async fn property_reviews(&self, property_id: &Id) -> Option<Vec<PropertyReview>> {
        match self.api.property_reviews(property_id).await {
            Ok(reviews) => Some(reviews),
            Err(e) => {
                warn!("Failed to load reviews for {}: {}", property_id, e);
                self.notifier.alert(&e.user_message("Failed to load reviews."));
                None
            }
        }
    }

    /// Text rendering of the active tab
    pub async fn render(&self) -> String {
        let mut out = render::greeting(&self.user);

        match self.tab {
            RenterTab::Search => {
                let outcome = self.search_outcome().await;
                out.push_str(&render::search_outcome(&outcome, self.flags));
            }
            RenterTab::Reservations => {
                let (upcoming, concluded) = self.reservation_groups().await;
                let slots = |items: &[RenterReservation]| {
                    items
                        .iter()
                        .map(|r| (r.clone(), self.review_slot(r)))
                        .collect::<Vec<_>>()
                };
                out.push_str(&render::renter_reservations(
                    Timing::Upcoming,
                    &slots(&upcoming),
                    self.flags,
                ));
                out.push_str(&render::renter_reservations(
                    Timing::Concluded,
                    &slots(&concluded),
                    self.flags,
                ));
            }
        }
        out
    }
}
