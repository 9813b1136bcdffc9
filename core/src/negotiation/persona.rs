//! Agent roles, personalities and price mandates

use super::product::Product;
use crate::config::NegotiationSettings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the table played by the agent. The human plays the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    /// The role the human plays against this agent
    pub fn counterpart(&self) -> Role {
        match self {
            Role::Buyer => Role::Seller,
            Role::Seller => Role::Buyer,
        }
    }

    /// Capitalized label used in transcripts
    pub fn label(&self) -> &'static str {
        match self {
            Role::Buyer => "Buyer",
            Role::Seller => "Seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Buyer => write!(f, "buyer"),
            Role::Seller => write!(f, "seller"),
        }
    }
}

/// Static personality of an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    pub personality_type: String,
    pub traits: Vec<String>,
    pub catchphrases: Vec<String>,
    /// System instruction sent with every request
    pub system_prompt: String,
}

impl Personality {
    /// Confident buyer that protects its budget
    pub fn buyer() -> Self {
        Self {
            name: "ChatBuyer".to_string(),
            personality_type: "assertive value protector".to_string(),
            traits: vec![
                "confident".to_string(),
                "persuasive".to_string(),
                "value-conscious".to_string(),
                "strategic".to_string(),
            ],
            catchphrases: vec![
                "Given the quality here, my offer is already fair.".to_string(),
                "This price reflects both market reality and product value.".to_string(),
            ],
            system_prompt: "You are a confident, firm, value-protecting buyer. Persuasive but concise."
                .to_string(),
        }
    }

    /// Firm but friendly seller that always sells above market
    pub fn seller() -> Self {
        Self {
            name: "ChatSeller".to_string(),
            personality_type: "firm but friendly".to_string(),
            traits: vec![
                "persuasive".to_string(),
                "confident".to_string(),
                "value-focused".to_string(),
                "profit-minded".to_string(),
            ],
            catchphrases: vec![
                "These are top-quality goods.".to_string(),
                "I think you'll find the price fair for what you get.".to_string(),
            ],
            system_prompt: "You are a persuasive seller who always sells above market price."
                .to_string(),
        }
    }
}

/// Limits a buyer agent negotiates within
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerMandate {
    /// Hard ceiling on any offer or acceptance
    pub budget: u64,
    /// Anchor before the first offer, percent of fair price
    pub opening_pct: u64,
    /// Lowest counter-offer, percent of fair price
    pub floor_pct: u64,
    /// Accept seller prices up to fair + this percent
    pub tolerance_pct: u64,
}

/// Limits a seller agent negotiates within
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerMandate {
    /// Never accept or counter below this
    pub minimum_price: u64,
    /// Opening offer markup over market, in percent
    pub opening_markup_pct: u64,
    /// Assumed previous offer above fair before any offer was made
    pub fallback_margin: u64,
}

/// Numeric heuristics for one side of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mandate {
    Buyer(BuyerMandate),
    Seller(SellerMandate),
}

impl Mandate {
    pub fn role(&self) -> Role {
        match self {
            Mandate::Buyer(_) => Role::Buyer,
            Mandate::Seller(_) => Role::Seller,
        }
    }

    /// The headline limit: budget for buyers, minimum price for sellers
    pub fn limit(&self) -> u64 {
        match self {
            Mandate::Buyer(m) => m.budget,
            Mandate::Seller(m) => m.minimum_price,
        }
    }

    /// Label for the headline limit
    pub fn limit_label(&self) -> &'static str {
        match self {
            Mandate::Buyer(_) => "Buyer Budget",
            Mandate::Seller(_) => "Seller Minimum",
        }
    }
}

/// Everything fixed for the lifetime of a session
#[derive(Debug, Clone)]
pub struct Scenario {
    pub personality: Personality,
    pub product: Product,
    pub mandate: Mandate,
    pub currency: String,
}

impl Scenario {
    /// Build the scenario for the given agent role
    pub fn for_role(role: Role, settings: &NegotiationSettings) -> Self {
        match role {
            Role::Buyer => Self::buyer(settings),
            Role::Seller => Self::seller(settings),
        }
    }

    /// Buyer scenario: market 500, budget 450 unless overridden
    pub fn buyer(settings: &NegotiationSettings) -> Self {
        let overrides = &settings.buyer;
        Self {
            personality: overrides.personality.clone().unwrap_or_else(Personality::buyer),
            product: overrides
                .product
                .clone()
                .unwrap_or_else(|| Product::alphonso_mangoes(500)),
            mandate: Mandate::Buyer(BuyerMandate {
                budget: overrides.limit.unwrap_or(450),
                opening_pct: 75,
                floor_pct: 60,
                tolerance_pct: 2,
            }),
            currency: settings.currency.clone(),
        }
    }

    /// Seller scenario: market 600, minimum 460 unless overridden
    pub fn seller(settings: &NegotiationSettings) -> Self {
        let overrides = &settings.seller;
        Self {
            personality: overrides
                .personality
                .clone()
                .unwrap_or_else(Personality::seller),
            product: overrides
                .product
                .clone()
                .unwrap_or_else(|| Product::alphonso_mangoes(600)),
            mandate: Mandate::Seller(SellerMandate {
                minimum_price: overrides.limit.unwrap_or(460),
                opening_markup_pct: 15,
                fallback_margin: 50,
            }),
            currency: settings.currency.clone(),
        }
    }

    pub fn role(&self) -> Role {
        self.mandate.role()
    }

    /// Fair price from the agent's point of view
    pub fn fair_price(&self) -> u64 {
        self.product.fair_price(self.role())
    }

    /// Format an amount with the scenario currency
    pub fn money(&self, amount: u64) -> String {
        format!("{}{}", self.currency, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioOverrides;

    #[test]
    fn test_default_scenarios() {
        let settings = NegotiationSettings::default();

        let buyer = Scenario::buyer(&settings);
        assert_eq!(buyer.role(), Role::Buyer);
        assert_eq!(buyer.mandate.limit(), 450);
        assert_eq!(buyer.fair_price(), 535);
        assert_eq!(buyer.money(450), "₹450");

        let seller = Scenario::seller(&settings);
        assert_eq!(seller.role(), Role::Seller);
        assert_eq!(seller.mandate.limit(), 460);
        assert_eq!(seller.product.base_market_price, 600);
    }

    #[test]
    fn test_overrides_apply() {
        let settings = NegotiationSettings {
            currency: "$".to_string(),
            seller: ScenarioOverrides {
                limit: Some(700),
                product: Some(Product::alphonso_mangoes(650)),
                personality: None,
            },
            ..Default::default()
        };

        let seller = Scenario::for_role(Role::Seller, &settings);
        assert_eq!(seller.mandate.limit(), 700);
        assert_eq!(seller.product.base_market_price, 650);
        assert_eq!(seller.personality.name, "ChatSeller");
        assert_eq!(seller.money(12), "$12");
    }

    #[test]
    fn test_counterpart() {
        assert_eq!(Role::Buyer.counterpart(), Role::Seller);
        assert_eq!(Role::Seller.counterpart().label(), "Buyer");
    }
}
