//! Expand/collapse bookkeeping for the partner tree view.

use offerlink_core::types::Catalog;
use std::collections::HashSet;

/// Which partners and programs are currently open. Purely presentational
/// state; it never affects selection or filtering.
#[derive(Debug, Default, Clone)]
pub struct ExpansionState {
    partners: HashSet<String>,
    programs: HashSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_partner(&mut self, partner_id: &str) {
        if !self.partners.remove(partner_id) {
            self.partners.insert(partner_id.to_string());
        }
    }

    pub fn toggle_program(&mut self, program_id: &str) {
        if !self.programs.remove(program_id) {
            self.programs.insert(program_id.to_string());
        }
    }

    pub fn is_partner_expanded(&self, partner_id: &str) -> bool {
        self.partners.contains(partner_id)
    }

    pub fn is_program_expanded(&self, program_id: &str) -> bool {
        self.programs.contains(program_id)
    }

    /// Open every partner and program in the given (usually filtered)
    /// catalog so search hits are immediately visible.
    pub fn expand_matches(&mut self, filtered: &Catalog) {
        for partner in &filtered.partners {
            self.partners.insert(partner.id.clone());
            for program in &partner.programs {
                self.programs.insert(program.id.clone());
            }
        }
    }

    pub fn collapse_all(&mut self) {
        self.partners.clear();
        self.programs.clear();
    }
}
