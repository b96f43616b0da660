//! Mock data providers standing in for real venue and transport APIs.
//!
//! Pure functions returning structured data; the engine only requires that
//! they are callable from steps.

use serde::{Deserialize, Serialize};

/// A candidate venue with its sustainability profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    /// Venue name.
    pub name: String,
    /// City the venue is in.
    pub city: String,
    /// Sustainability certification ("None" if uncertified).
    pub certification: String,
    /// Energy efficiency rating, 0-100.
    pub energy_rating: u32,
    /// Baseline event emissions for this venue.
    pub base_emissions_kg: f64,
}

/// Transport footprint estimate for getting attendees to the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportEstimate {
    /// Human-readable route description.
    pub route: String,
    /// Number of attendees travelling.
    pub attendees: u32,
    /// Assumed transport mix.
    pub transport_mode: String,
    /// Total transport emissions across all attendees.
    pub total_transport_emissions_kg: f64,
}

/// Search for certified green venues in a city.
pub fn search_green_venues(city: &str) -> Vec<Venue> {
    vec![
        Venue {
            name: "EcoHub Loft".to_string(),
            city: city.to_string(),
            certification: "LEED Gold".to_string(),
            energy_rating: 95,
            base_emissions_kg: 120.0,
        },
        Venue {
            name: "GreenSpire Hotel".to_string(),
            city: city.to_string(),
            certification: "Green Key".to_string(),
            energy_rating: 88,
            base_emissions_kg: 200.0,
        },
        Venue {
            name: "Industrial Space".to_string(),
            city: city.to_string(),
            certification: "None".to_string(),
            energy_rating: 40,
            base_emissions_kg: 550.0,
        },
    ]
}

/// Estimate attendee transport emissions between two cities.
pub fn estimate_transport_emissions(
    origin: &str,
    destination: &str,
    attendees: u32,
) -> TransportEstimate {
    TransportEstimate {
        route: format!("{} -> {}", origin, destination),
        attendees,
        transport_mode: "Train/Mix".to_string(),
        total_transport_emissions_kg: 450.0,
    }
}
