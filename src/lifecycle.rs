//! Reservation lifecycle.
//!
//! Approval moves once, from `Pending` to `Approved` or `Rejected`.
//! Independently, a reservation is `Upcoming` until its end date has
//! passed and `Concluded` afterwards. A review may be attached only to an
//! approved, concluded reservation that has none yet.

use crate::error::{Error, Result};
use crate::models::{LandlordReservation, RenterReservation, Review};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Approval field of a reservation (`null` / `true` / `false` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalState {
    pub fn from_flag(approved: Option<bool>) -> Self {
        match approved {
            None => ApprovalState::Pending,
            Some(true) => ApprovalState::Approved,
            Some(false) => ApprovalState::Rejected,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ApprovalState::Pending => None,
            ApprovalState::Approved => Some(true),
            ApprovalState::Rejected => Some(false),
        }
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self, ApprovalState::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApprovalState::Pending => "Pending",
            ApprovalState::Approved => "Approved",
            ApprovalState::Rejected => "Rejected",
        }
    }
}

/// Landlord's answer to a reservation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn approved(&self) -> bool {
        matches!(self, Decision::Approve)
    }

    pub fn target(&self) -> ApprovalState {
        match self {
            Decision::Approve => ApprovalState::Approved,
            Decision::Reject => ApprovalState::Rejected,
        }
    }
}

/// Apply a landlord decision. Decided reservations are terminal.
pub fn decide(current: ApprovalState, decision: Decision) -> Result<ApprovalState> {
    if current.is_decided() {
        return Err(Error::InvalidTransition {
            from: current,
            to: decision.target(),
        });
    }
    Ok(decision.target())
}

/// Where a reservation sits relative to the current instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timing {
    Upcoming,
    Concluded,
}

impl Timing {
    /// `Concluded` iff the end instant is strictly before `now`.
    /// A reservation ending exactly now is still upcoming.
    pub fn classify(end_date: NaiveDate, now: DateTime<Utc>) -> Self {
        if end_instant(end_date) < now {
            Timing::Concluded
        } else {
            Timing::Upcoming
        }
    }
}

/// Date-only values are read as midnight UTC
pub fn end_instant(end_date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&end_date.and_time(NaiveTime::MIN))
}

/// Why the review form is not offered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewBlock {
    NotApproved,
    NotConcluded,
    AlreadyReviewed,
}

impl ReviewBlock {
    pub fn message(&self) -> &'static str {
        match self {
            ReviewBlock::NotApproved => "Only approved reservations can be reviewed.",
            ReviewBlock::NotConcluded => "Reviews open after the reservation ends.",
            ReviewBlock::AlreadyReviewed => "This reservation has already been reviewed.",
        }
    }
}

/// Common view over both reservation projections
pub trait Reservation {
    fn approved(&self) -> Option<bool>;
    fn end_date(&self) -> NaiveDate;

    /// Only the renter projection carries the review
    fn review(&self) -> Option<&Review> {
        None
    }

    fn approval(&self) -> ApprovalState {
        ApprovalState::from_flag(self.approved())
    }

    fn timing(&self, now: DateTime<Utc>) -> Timing {
        Timing::classify(self.end_date(), now)
    }
}

impl Reservation for LandlordReservation {
    fn approved(&self) -> Option<bool> {
        self.approved
    }

    fn end_date(&self) -> NaiveDate {
        self.end_date
    }
}

impl Reservation for RenterReservation {
    fn approved(&self) -> Option<bool> {
        self.approved
    }

    fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    fn review(&self) -> Option<&Review> {
        self.review.as_ref()
    }
}

/// `None` when a review may be written now
pub fn review_block<R: Reservation + ?Sized>(reservation: &R, now: DateTime<Utc>) -> Option<ReviewBlock> {
    if reservation.review().is_some() {
        Some(ReviewBlock::AlreadyReviewed)
    } else if reservation.approval() != ApprovalState::Approved {
        Some(ReviewBlock::NotApproved)
    } else if reservation.timing(now) != Timing::Concluded {
        Some(ReviewBlock::NotConcluded)
    } else {
        None
    }
}

pub fn can_review<R: Reservation + ?Sized>(reservation: &R, now: DateTime<Utc>) -> bool {
    review_block(reservation, now).is_none()
}

/// Split into (upcoming, concluded), keeping server order within each
pub fn partition_by_timing<R: Reservation>(reservations: &[R], now: DateTime<Utc>) -> (Vec<&R>, Vec<&R>) {
    reservations
        .iter()
        .partition(|r| r.timing(now) == Timing::Upcoming)
}
