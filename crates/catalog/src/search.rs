//! Structural search over the partner tree.
//!
//! Filtering produces a pruned copy: a promotion is retained when the
//! query is a case-insensitive substring of its name or description, and
//! a container is retained exactly when it keeps at least one
//! descendant. The source tree is never mutated and ordering is
//! preserved.

use offerlink_core::types::{Catalog, Partner, Program, PromotedProgram};

/// Filter the catalog by a text query. A blank or whitespace-only query
/// returns the catalog unchanged. Runs in one pass over the tree.
pub fn filter_catalog(catalog: &Catalog, query: &str) -> Catalog {
    let query = query.trim();
    if query.is_empty() {
        return catalog.clone();
    }

    let needle = query.to_lowercase();
    Catalog::new(
        catalog
            .partners
            .iter()
            .filter_map(|partner| filter_partner(partner, &needle))
            .collect(),
    )
}

fn filter_partner(partner: &Partner, needle: &str) -> Option<Partner> {
    let programs: Vec<Program> = partner
        .programs
        .iter()
        .filter_map(|program| filter_program(program, needle))
        .collect();

    if programs.is_empty() {
        return None;
    }

    Some(Partner {
        id: partner.id.clone(),
        name: partner.name.clone(),
        programs,
    })
}

fn filter_program(program: &Program, needle: &str) -> Option<Program> {
    let promoted_programs: Vec<PromotedProgram> = program
        .promoted_programs
        .iter()
        .filter(|pp| promotion_matches(pp, needle))
        .cloned()
        .collect();

    if promoted_programs.is_empty() {
        return None;
    }

    Some(Program {
        id: program.id.clone(),
        name: program.name.clone(),
        promoted_programs,
    })
}

fn promotion_matches(pp: &PromotedProgram, needle: &str) -> bool {
    pp.name.to_lowercase().contains(needle)
        || pp
            .description
            .as_ref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_catalog;

    #[test]
    fn test_blank_query_returns_everything() {
        let catalog = sample_catalog();
        for query in ["", "   ", "\t"] {
            let filtered = filter_catalog(&catalog, query);
            assert_eq!(filtered.partner_count(), catalog.partner_count());
            assert_eq!(filtered.promotions().count(), catalog.promotions().count());
        }
    }

    #[test]
    fn test_leaf_match_keeps_ancestor_chain_only() {
        let catalog = sample_catalog();
        let filtered = filter_catalog(&catalog, "legal");

        // Only the Augeo > LexisNexis branch survives, pruned to the
        // promotions that mention "legal".
        assert_eq!(filtered.partner_count(), 1);
        assert_eq!(filtered.partners[0].name, "Augeo");
        assert_eq!(filtered.partners[0].programs.len(), 1);
        let program = &filtered.partners[0].programs[0];
        assert_eq!(program.name, "LexisNexis");
        let ids: Vec<_> = program
            .promoted_programs
            .iter()
            .map(|pp| pp.id.as_str())
            .collect();
        // pp1 matches by name, pp3 by description; pp2/pp4 are pruned.
        assert_eq!(ids, vec!["pp1", "pp3"]);

        // A tighter query narrows to the single promotion.
        let narrow = filter_catalog(&catalog, "legal research");
        let ids: Vec<_> = narrow.promotions().map(|pp| pp.id.as_str()).collect();
        assert_eq!(ids, vec!["pp1"]);
    }

    #[test]
    fn test_match_is_case_insensitive_on_name_and_description() {
        let catalog = sample_catalog();

        let by_name = filter_catalog(&catalog, "WEALTH");
        assert_eq!(by_name.promotions().count(), 1);
        assert_eq!(by_name.promotions().next().unwrap().id, "pp6");

        // "mortgage" appears only in pp14's description.
        let by_description = filter_catalog(&catalog, "mortgage");
        assert_eq!(by_description.promotions().count(), 1);
        assert_eq!(by_description.promotions().next().unwrap().id, "pp14");
    }

    #[test]
    fn test_no_empty_containers_retained() {
        let catalog = sample_catalog();
        let filtered = filter_catalog(&catalog, "rewards");

        for partner in &filtered.partners {
            assert!(!partner.programs.is_empty());
            for program in &partner.programs {
                assert!(!program.promoted_programs.is_empty());
            }
        }
    }

    #[test]
    fn test_every_retained_leaf_actually_matches() {
        let catalog = sample_catalog();
        let filtered = filter_catalog(&catalog, "travel");
        assert!(filtered.promotions().count() >= 2);
        for pp in filtered.promotions() {
            assert!(promotion_matches(pp, "travel"), "{} kept spuriously", pp.id);
        }
    }

    #[test]
    fn test_order_preserved_after_narrow_then_widen() {
        let catalog = sample_catalog();
        let original: Vec<_> = catalog.promotions().map(|pp| pp.id.clone()).collect();

        let narrowed = filter_catalog(&catalog, "legal");
        assert!(narrowed.promotions().count() < original.len());

        // Clearing the query restores the full tree in original order.
        let widened = filter_catalog(&catalog, "");
        let restored: Vec<_> = widened.promotions().map(|pp| pp.id.clone()).collect();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_no_match_yields_empty_catalog() {
        let catalog = sample_catalog();
        let filtered = filter_catalog(&catalog, "zzz-no-such-offer");
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_inactive_leaves_still_searchable() {
        // Inactive promotions are visible (not selectable), so search
        // must retain them.
        let catalog = sample_catalog();
        let filtered = filter_catalog(&catalog, "law firm");
        assert_eq!(filtered.promotions().count(), 1);
        assert!(!filtered.promotions().next().unwrap().active);
    }
}
