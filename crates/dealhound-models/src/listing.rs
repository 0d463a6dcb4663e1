use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A normalized candidate deal as supplied by a deal source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    /// Summarized product description used for pricing.
    pub description: String,
    /// Price the listing is being offered at.
    pub asking_price: Decimal,
    /// Listing URL. This is the deduplication key across cycles.
    pub url: String,
    #[serde(default)]
    pub raw_details: String,
    #[serde(default)]
    pub raw_features: String,
}

/// A priced listing. `discount` is `estimate - asking_price` and may be negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opportunity {
    pub listing: Listing,
    pub estimate: Decimal,
    pub discount: Decimal,
    #[serde(default = "Utc::now")]
    pub priced_at: DateTime<Utc>,
}

impl Opportunity {
    /// Build an opportunity from a raw ensemble estimate.
    ///
    /// The estimate is clamped at zero and rounded to cents before the discount
    /// is computed. Non-finite estimates are treated as zero.
    pub fn new(listing: Listing, estimate: f64) -> Self {
        let estimate = Decimal::from_f64(estimate.max(0.0))
            .unwrap_or(Decimal::ZERO)
            .round_dp(2);
        let discount = estimate - listing.asking_price;
        Self {
            listing,
            estimate,
            discount,
            priced_at: Utc::now(),
        }
    }

    pub fn url(&self) -> &str {
        &self.listing.url
    }
}
