use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::listing::Opportunity;

/// Opportunities surfaced in earlier cycles.
///
/// Owned by the caller between cycles. Only the listing URL matters for
/// deduplication; the full opportunity is kept so the record is readable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Memory {
    opportunities: Vec<Opportunity>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_opportunities(opportunities: Vec<Opportunity>) -> Self {
        Self { opportunities }
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.opportunities.iter().any(|o| o.listing.url == url)
    }

    pub fn urls(&self) -> HashSet<&str> {
        self.opportunities
            .iter()
            .map(|o| o.listing.url.as_str())
            .collect()
    }

    /// Record a surfaced opportunity. Returns false if its URL was already known.
    pub fn remember(&mut self, opportunity: Opportunity) -> bool {
        if self.contains_url(opportunity.url()) {
            return false;
        }
        self.opportunities.push(opportunity);
        true
    }

    pub fn opportunities(&self) -> &[Opportunity] {
        &self.opportunities
    }

    pub fn len(&self) -> usize {
        self.opportunities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Listing;
    use rust_decimal_macros::dec;

    fn opportunity(url: &str) -> Opportunity {
        Opportunity::new(
            Listing {
                description: "Cordless drill".to_string(),
                asking_price: dec!(59.00),
                url: url.to_string(),
                raw_details: String::new(),
                raw_features: String::new(),
            },
            140.0,
        )
    }

    #[test]
    fn remember_ignores_known_urls() {
        let mut memory = Memory::new();
        assert!(memory.remember(opportunity("https://d/1")));
        assert!(!memory.remember(opportunity("https://d/1")));
        assert!(memory.remember(opportunity("https://d/2")));
        assert_eq!(memory.len(), 2);
        assert!(memory.contains_url("https://d/2"));
        assert!(!memory.contains_url("https://d/3"));
    }

    #[test]
    fn serializes_as_plain_array() {
        let memory = Memory::from_opportunities(vec![opportunity("https://d/1")]);
        let json = serde_json::to_value(&memory).unwrap();
        assert!(json.is_array());
        let back: Memory = serde_json::from_value(json).unwrap();
        assert_eq!(back.urls().len(), 1);
    }
}
