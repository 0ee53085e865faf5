//! Plain-text rendering of dashboard content.

use super::{ReviewSlot, SearchOutcome, ViewFlags};
use crate::lifecycle::{ApprovalState, Timing};
use crate::models::{LandlordReservation, Property, PropertyReview, RenterReservation, User};
use crate::validation::PropertyDraft;
use std::fmt::Write;

pub fn greeting(user: &User) -> String {
    format!("Hello, {}\n\n", user.name)
}

pub fn approval_label(approved: Option<bool>) -> &'static str {
    ApprovalState::from_flag(approved).label()
}

fn rating_label(rating: Option<f64>) -> String {
    match rating {
        Some(rating) => format!("⭐ {:.1} / 5", rating),
        None => "⭐ no reviews yet".to_string(),
    }
}

fn listing_body(out: &mut String, property: &Property, flags: ViewFlags) {
    let _ = writeln!(out, "[{}] {}", property.id, property.title);
    if flags.show_images {
        if let Some(image) = property.image() {
            let _ = writeln!(out, "   🖼  {}", image);
        }
    }
    if !property.description.is_empty() {
        let _ = writeln!(out, "   {}", property.description);
    }
    let _ = writeln!(out, "   {}", property.address);
    let _ = writeln!(
        out,
        "   💵 R${:.2}/day | Available {} to {}",
        property.price_per_day, property.available_from, property.available_until
    );
}

/// Landlord's listings with their reservation count and rating
pub fn owned_listings(properties: &[Property], flags: ViewFlags) -> String {
    let mut out = String::from("My properties\n");
    if properties.is_empty() {
        out.push_str("No properties registered yet.\n");
        return out;
    }

    for property in properties {
        listing_body(&mut out, property, flags);
        let _ = writeln!(
            out,
            "   📅 {} reservations | {}",
            property.total_reservations,
            rating_label(property.average_rating)
        );
        out.push('\n');
    }
    out
}

pub fn property_draft(draft: &PropertyDraft) -> String {
    let mut out = String::new();
    match &draft.id {
        Some(id) => {
            let _ = writeln!(out, "Edit property [{}]", id);
        }
        None => out.push_str("New property\n"),
    }
    for (label, value) in [
        ("Title", &draft.title),
        ("Description", &draft.description),
        ("Address", &draft.address),
        ("City", &draft.city),
        ("Price per day", &draft.price_per_day),
        ("Available from", &draft.available_from),
        ("Available until", &draft.available_until),
        ("Image URL", &draft.image_url),
    ] {
        let _ = writeln!(out, "   {}: {}", label, value);
    }
    out
}

pub fn received_reservations(reservations: &[LandlordReservation]) -> String {
    let mut out = String::from("Received reservations\n");
    if reservations.is_empty() {
        out.push_str("No reservations yet.\n");
        return out;
    }

    for r in reservations {
        let _ = writeln!(out, "[{}] property {}", r.reservation_id, r.property_id);
        let _ = writeln!(out, "   Renter: {}", r.renter_name);
        let _ = writeln!(out, "   Period: {} to {}", r.start_date, r.end_date);
        let _ = writeln!(out, "   Status: {}", approval_label(r.approved));
        if r.approved.is_none() {
            out.push_str("   Actions: approve | reject\n");
        }
        out.push('\n');
    }
    out
}

/// Search tab result area; "no results" is distinct from "not searched"
pub fn search_outcome(outcome: &SearchOutcome, flags: ViewFlags) -> String {
    let mut out = String::from("Results\n");
    match outcome {
        SearchOutcome::NotSearched => out.push_str("Search to see available properties.\n"),
        SearchOutcome::NoResults => out.push_str("No properties found.\n"),
        SearchOutcome::Results(properties) => {
            for property in properties {
                listing_body(&mut out, property, flags);
                if property.average_rating.is_some() {
                    let _ = writeln!(out, "   {}", rating_label(property.average_rating));
                }
                out.push('\n');
            }
        }
    }
    out
}

pub fn renter_reservations(
    timing: Timing,
    reservations: &[(RenterReservation, ReviewSlot)],
    flags: ViewFlags,
) -> String {
    let (title, empty) = match timing {
        Timing::Upcoming => ("📅 Upcoming reservations\n", "No upcoming reservations.\n"),
        Timing::Concluded => ("✅ Concluded reservations\n", "No past reservations.\n"),
    };

    let mut out = String::from(title);
    if reservations.is_empty() {
        out.push_str(empty);
        return out;
    }

    for (r, slot) in reservations {
        let _ = writeln!(out, "[{}] {}", r.reservation_id, r.property_title);
        if flags.show_images {
            if let Some(image) = r.image() {
                let _ = writeln!(out, "   🖼  {}", image);
            }
        }
        let _ = writeln!(out, "   From {} to {}", r.start_date, r.end_date);
        let _ = writeln!(out, "   Status: {}", approval_label(r.approved));
        match slot {
            ReviewSlot::Form => out.push_str("   Review this property: rating (1 to 5) and comment\n"),
            ReviewSlot::Stored(review) => {
                let _ = writeln!(out, "   Your review: ⭐ {}", review.rating);
                let _ = writeln!(out, "   {}", review.comment);
            }
            ReviewSlot::Unavailable => {}
        }
        out.push('\n');
    }
    out
}

pub fn property_reviews(reviews: &[PropertyReview]) -> String {
    if reviews.is_empty() {
        return "No reviews yet.\n".to_string();
    }

    let mut out = String::new();
    for review in reviews {
        let _ = writeln!(out, "⭐ {} by {}", review.rating, review.renter_name);
        let _ = writeln!(out, "   {}", review.comment);
    }
    out
}
