//! Agent kinds — the closed set of specialized response agents.
//!
//! Each kind is bound at construction time to one retrieval strategy, one
//! prompt template, and one generation provider. Dispatch over kinds is a
//! static table lookup, never open-ended runtime polymorphism.

use serde::{Deserialize, Serialize};

/// The three specialized agents a query can be routed to.
///
/// Immutable once assigned to a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Destinations, itineraries, travel tips. Context via pure retrieval.
    TravelSupport,
    /// Pricing, packages, payments. Context via the hybrid strategy.
    BookingPayments,
    /// Cancellation, refunds, terms. Context via the static cache.
    Policy,
}

impl AgentKind {
    /// All agent kinds, in routing-priority order.
    pub const ALL: [AgentKind; 3] = [
        AgentKind::TravelSupport,
        AgentKind::BookingPayments,
        AgentKind::Policy,
    ];

    /// The wire label for this kind (`travel_support`, `booking_payments`, `policy`).
    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::TravelSupport => "travel_support",
            AgentKind::BookingPayments => "booking_payments",
            AgentKind::Policy => "policy",
        }
    }

    /// Parse a classifier-emitted label, tolerating case and surrounding noise.
    ///
    /// Returns `None` for anything outside the closed set — callers decide
    /// the fallback, this type never guesses.
    pub fn parse_label(raw: &str) -> Option<AgentKind> {
        let normalized = raw.trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase();
        match normalized.as_str() {
            "travel_support" => Some(AgentKind::TravelSupport),
            "booking_payments" => Some(AgentKind::BookingPayments),
            "policy" => Some(AgentKind::Policy),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
