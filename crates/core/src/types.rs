use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The smallest assignable unit: a concrete promotion running under a
/// program. Product filters are linked at this level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotedProgram {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Inactive promotions stay visible in catalogs but cannot be
    /// selected or bulk-assigned.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Ids of product filters already linked to this promotion. Used to
    /// seed the selection when a filter is reopened for editing.
    #[serde(default)]
    pub current_filter_ids: HashSet<String>,
}

fn default_active() -> bool {
    true
}

impl PromotedProgram {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            active: true,
            current_filter_ids: HashSet::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_current_filter(mut self, filter_id: impl Into<String>) -> Self {
        self.current_filter_ids.insert(filter_id.into());
        self
    }
}

/// A program owned by exactly one partner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    pub name: String,
    pub promoted_programs: Vec<PromotedProgram>,
}

impl Program {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        promoted_programs: Vec<PromotedProgram>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            promoted_programs,
        }
    }

    /// Active promotions only. Tri-state and bulk operations are always
    /// computed over this subset.
    pub fn active_promotions(&self) -> impl Iterator<Item = &PromotedProgram> {
        self.promoted_programs.iter().filter(|pp| pp.active)
    }
}

/// Top-level grouping in the catalog. Owns its programs by composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub programs: Vec<Program>,
}

impl Partner {
    pub fn new(id: impl Into<String>, name: impl Into<String>, programs: Vec<Program>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            programs,
        }
    }

    pub fn active_promotions(&self) -> impl Iterator<Item = &PromotedProgram> {
        self.programs.iter().flat_map(|p| p.active_promotions())
    }
}

/// The full partner / program / promoted-program tree. Read-only once
/// loaded; selection and filtering never mutate it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub partners: Vec<Partner>,
}

impl Catalog {
    pub fn new(partners: Vec<Partner>) -> Self {
        Self { partners }
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    pub fn partner_count(&self) -> usize {
        self.partners.len()
    }

    /// Every promotion in catalog order, regardless of active flag.
    pub fn promotions(&self) -> impl Iterator<Item = &PromotedProgram> {
        self.partners
            .iter()
            .flat_map(|p| p.programs.iter())
            .flat_map(|p| p.promoted_programs.iter())
    }

    pub fn active_promotions(&self) -> impl Iterator<Item = &PromotedProgram> {
        self.promotions().filter(|pp| pp.active)
    }

    /// Look up a promotion by id anywhere in the tree.
    pub fn find_promotion(&self, leaf_id: &str) -> Option<&PromotedProgram> {
        self.promotions().find(|pp| pp.id == leaf_id)
    }

    pub fn find_partner(&self, partner_id: &str) -> Option<&Partner> {
        self.partners.iter().find(|p| p.id == partner_id)
    }

    pub fn find_program(&self, program_id: &str) -> Option<&Program> {
        self.partners
            .iter()
            .flat_map(|p| p.programs.iter())
            .find(|p| p.id == program_id)
    }

    /// "Partner > Program" breadcrumb for a promotion, used when
    /// presenting bulk-run items.
    pub fn parent_path(&self, leaf_id: &str) -> Option<String> {
        for partner in &self.partners {
            for program in &partner.programs {
                if program.promoted_programs.iter().any(|pp| pp.id == leaf_id) {
                    return Some(format!("{} > {}", partner.name, program.name));
                }
            }
        }
        None
    }
}

/// Summary of a container's descendant selection, derived on demand and
/// never stored on nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Empty,
    Partial,
    Full,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![Partner::new(
            "partner1",
            "Augeo",
            vec![Program::new(
                "prog1",
                "LexisNexis",
                vec![
                    PromotedProgram::new("pp1", "Legal Research Promotion")
                        .with_current_filter("filter-123"),
                    PromotedProgram::new("pp2", "Student Discount Initiative"),
                    PromotedProgram::new("pp4", "Law Firm Solutions").inactive(),
                ],
            )],
        )])
    }

    #[test]
    fn test_lookup_and_parent_path() {
        let catalog = catalog();

        assert_eq!(
            catalog.find_promotion("pp1").map(|pp| pp.name.as_str()),
            Some("Legal Research Promotion")
        );
        assert!(catalog.find_promotion("nope").is_none());
        assert_eq!(
            catalog.parent_path("pp2").as_deref(),
            Some("Augeo > LexisNexis")
        );
        assert!(catalog.parent_path("nope").is_none());
    }

    #[test]
    fn test_active_promotions_skip_inactive() {
        let catalog = catalog();
        let active: Vec<_> = catalog.active_promotions().map(|pp| pp.id.as_str()).collect();
        assert_eq!(active, vec!["pp1", "pp2"]);

        let program = catalog.find_program("prog1").unwrap();
        assert_eq!(program.active_promotions().count(), 2);
        assert_eq!(program.promoted_programs.len(), 3);
    }

    #[test]
    fn test_serde_defaults() {
        let json = r#"{"id":"pp9","name":"Bare Minimum"}"#;
        let pp: PromotedProgram = serde_json::from_str(json).unwrap();
        assert!(pp.active);
        assert!(pp.description.is_none());
        assert!(pp.current_filter_ids.is_empty());
    }
}
