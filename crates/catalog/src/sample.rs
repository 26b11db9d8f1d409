//! Built-in partner catalog used by the demo console and tests.

use offerlink_core::types::{Catalog, Partner, Program, PromotedProgram};

/// Three partners, six programs, a mix of active and inactive
/// promotions, with `pp1` already linked to `filter-123`.
pub fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        Partner::new(
            "partner1",
            "Augeo",
            vec![
                Program::new(
                    "prog1",
                    "LexisNexis",
                    vec![
                        PromotedProgram::new("pp1", "Legal Research Promotion")
                            .with_description(
                                "Promotional offers for legal research tools and services",
                            )
                            .with_current_filter("filter-123"),
                        PromotedProgram::new("pp2", "Student Discount Initiative")
                            .with_description("Special discounts for law students"),
                        PromotedProgram::new("pp3", "Professional Certification")
                            .with_description("Offers for legal certification programs"),
                        PromotedProgram::new("pp4", "Law Firm Solutions")
                            .with_description("Special services for law practices")
                            .inactive(),
                    ],
                ),
                Program::new(
                    "prog2",
                    "Fidelity Investments",
                    vec![
                        PromotedProgram::new("pp5", "Retirement Planning")
                            .with_description("Offers related to retirement planning services"),
                        PromotedProgram::new("pp6", "Wealth Management")
                            .with_description("Premium offers for wealth management clients"),
                        PromotedProgram::new("pp7", "Investment Advisory")
                            .with_description("Personalized investment consultation services"),
                    ],
                ),
                Program::new(
                    "prog3",
                    "American Express",
                    vec![
                        PromotedProgram::new("pp9", "Premium Card Offers")
                            .with_description("Exclusive offers for premium cardholders"),
                        PromotedProgram::new("pp10", "Travel Promotions")
                            .with_description("Special travel deals for members"),
                        PromotedProgram::new("pp11", "Dining Rewards")
                            .with_description("Exclusive dining experiences and rewards"),
                    ],
                ),
            ],
        ),
        Partner::new(
            "partner2",
            "ampliFI",
            vec![
                Program::new(
                    "prog4",
                    "Chase",
                    vec![
                        PromotedProgram::new("pp12", "Credit Card Rewards")
                            .with_description("Exclusive offers for Chase credit card holders"),
                        PromotedProgram::new("pp13", "Business Banking Solutions")
                            .with_description("Promotions for small business banking customers")
                            .inactive(),
                        PromotedProgram::new("pp14", "Home Lending")
                            .with_description("Special offers for mortgage and home equity"),
                    ],
                ),
                Program::new(
                    "prog5",
                    "Bank of America",
                    vec![
                        PromotedProgram::new("pp16", "Preferred Rewards")
                            .with_description("Special offers for preferred banking customers"),
                        PromotedProgram::new("pp17", "Cash Rewards Cards")
                            .with_description("Promotions for cash rewards credit cards"),
                        PromotedProgram::new("pp18", "Travel Rewards")
                            .with_description("Travel benefits for premium customers"),
                    ],
                ),
            ],
        ),
        Partner::new(
            "partner3",
            "John Deere",
            vec![Program::new(
                "prog6",
                "Dealer Network",
                vec![
                    PromotedProgram::new("pp19", "Oil Promotion")
                        .with_description("Special offers on oil changes and maintenance"),
                    PromotedProgram::new("pp20", "Parts Discount")
                        .with_description("Discounts on genuine John Deere parts"),
                    PromotedProgram::new("pp21", "Service Special")
                        .with_description("Seasonal service specials for equipment maintenance"),
                ],
            )],
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_shape() {
        let catalog = sample_catalog();
        assert_eq!(catalog.partner_count(), 3);
        assert_eq!(catalog.promotions().count(), 19);
        // Two promotions are deliberately inactive.
        assert_eq!(catalog.active_promotions().count(), 17);
        // pp1 carries a pre-existing filter link.
        let pp1 = catalog.find_promotion("pp1").unwrap();
        assert!(pp1.current_filter_ids.contains("filter-123"));
    }

    #[test]
    fn test_sample_ids_unique() {
        let catalog = sample_catalog();
        let mut ids: Vec<_> = catalog.promotions().map(|pp| pp.id.clone()).collect();
        ids.sort();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }
}
