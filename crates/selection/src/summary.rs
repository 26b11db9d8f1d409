//! Read-only rollup of the current selection.
//!
//! Projects the catalog down to selected promotions plus their ancestor
//! chain, with aggregate counts for the summary header. Recomputed from
//! scratch on every selection change; nothing is persisted.

use offerlink_core::types::{Catalog, Partner, Program};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCounts {
    pub selected_leaves: usize,
    pub partners_with_selection: usize,
    pub programs_with_selection: usize,
}

/// Pruned display tree plus counts.
#[derive(Debug, Clone)]
pub struct SelectionSummary {
    pub catalog: Catalog,
    pub counts: SelectionCounts,
}

/// Derive the selected-only view. A promotion appears iff its id is in
/// `selected`; an inactive promotion that was previously selected is
/// kept (selection is not revoked by deactivation). Containers with no
/// surviving promotions are dropped.
pub fn project(catalog: &Catalog, selected: &HashSet<String>) -> SelectionSummary {
    let mut counts = SelectionCounts::default();

    let partners: Vec<Partner> = catalog
        .partners
        .iter()
        .filter_map(|partner| {
            let programs: Vec<Program> = partner
                .programs
                .iter()
                .filter_map(|program| {
                    let promoted_programs: Vec<_> = program
                        .promoted_programs
                        .iter()
                        .filter(|pp| selected.contains(&pp.id))
                        .cloned()
                        .collect();
                    if promoted_programs.is_empty() {
                        return None;
                    }
                    counts.programs_with_selection += 1;
                    counts.selected_leaves += promoted_programs.len();
                    Some(Program {
                        id: program.id.clone(),
                        name: program.name.clone(),
                        promoted_programs,
                    })
                })
                .collect();
            if programs.is_empty() {
                return None;
            }
            counts.partners_with_selection += 1;
            Some(Partner {
                id: partner.id.clone(),
                name: partner.name.clone(),
                programs,
            })
        })
        .collect();

    SelectionSummary {
        catalog: Catalog::new(partners),
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offerlink_catalog::sample::sample_catalog;

    fn ids(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_selection_projects_empty() {
        let summary = project(&sample_catalog(), &HashSet::new());
        assert!(summary.catalog.is_empty());
        assert_eq!(summary.counts, SelectionCounts::default());
    }

    #[test]
    fn test_projection_keeps_only_selected_and_ancestors() {
        let catalog = sample_catalog();
        let summary = project(&catalog, &ids(&["pp1", "pp12"]));

        assert_eq!(summary.counts.selected_leaves, 2);
        assert_eq!(summary.counts.partners_with_selection, 2);
        assert_eq!(summary.counts.programs_with_selection, 2);

        // Augeo survives with only LexisNexis > pp1.
        let augeo = summary.catalog.find_partner("partner1").unwrap();
        assert_eq!(augeo.programs.len(), 1);
        assert_eq!(augeo.programs[0].promoted_programs.len(), 1);
        assert_eq!(augeo.programs[0].promoted_programs[0].id, "pp1");

        // John Deere had no selection and is dropped entirely.
        assert!(summary.catalog.find_partner("partner3").is_none());
    }

    #[test]
    fn test_inactive_but_selected_leaf_is_kept() {
        let catalog = sample_catalog();
        // pp4 is inactive; a previously recorded selection still shows.
        let summary = project(&catalog, &ids(&["pp4"]));
        assert_eq!(summary.counts.selected_leaves, 1);
        assert_eq!(
            summary.catalog.promotions().next().map(|pp| pp.id.as_str()),
            Some("pp4")
        );
    }

    #[test]
    fn test_counts_multiple_programs_same_partner() {
        let catalog = sample_catalog();
        let summary = project(&catalog, &ids(&["pp1", "pp5", "pp9"]));
        assert_eq!(summary.counts.partners_with_selection, 1);
        assert_eq!(summary.counts.programs_with_selection, 3);
        assert_eq!(summary.counts.selected_leaves, 3);
    }

    #[test]
    fn test_unknown_ids_ignored() {
        let catalog = sample_catalog();
        let summary = project(&catalog, &ids(&["pp1", "gone-elsewhere"]));
        assert_eq!(summary.counts.selected_leaves, 1);
    }
}
