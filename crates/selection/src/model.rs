//! Source of truth for promotion selection.
//!
//! The model owns the set of selected leaf ids; partner- and
//! program-level check states are derived on every query, never stored.
//! Inactive promotions are excluded from toggles, select-all, and
//! tri-state computation throughout.

use offerlink_core::event_bus::{self, EventSink};
use offerlink_core::types::{Catalog, CheckState, Partner, Program};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

pub struct SelectionModel {
    catalog: Arc<Catalog>,
    selected: HashSet<String>,
    event_sink: Arc<dyn EventSink>,
}

impl SelectionModel {
    /// Empty selection over the given catalog.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            selected: HashSet::new(),
            event_sink: event_bus::noop_sink(),
        }
    }

    /// Selection seeded from promotions already linked to `filter_id`,
    /// the state a user sees when reopening a filter for editing.
    /// Inactive promotions keep their existing links; selection is not
    /// revoked when a promotion is deactivated elsewhere.
    pub fn seeded_for_filter(catalog: Arc<Catalog>, filter_id: &str) -> Self {
        let selected: HashSet<String> = catalog
            .promotions()
            .filter(|pp| pp.current_filter_ids.contains(filter_id))
            .map(|pp| pp.id.clone())
            .collect();
        debug!(
            filter_id = %filter_id,
            seeded = selected.len(),
            "Selection seeded from current filter links"
        );
        Self {
            catalog,
            selected,
            event_sink: event_bus::noop_sink(),
        }
    }

    /// Attach an event sink; `SelectionChanged` fires whenever the
    /// selected count moves.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Set or clear one leaf. Ignored for unknown ids and for inactive
    /// promotions; the UI disables those controls, but the model guards
    /// anyway.
    pub fn toggle_leaf(&mut self, leaf_id: &str, checked: bool) {
        let Some(pp) = self.catalog.find_promotion(leaf_id) else {
            return;
        };
        if !pp.active {
            return;
        }
        let before = self.selected.len();
        if checked {
            self.selected.insert(leaf_id.to_string());
        } else {
            self.selected.remove(leaf_id);
        }
        self.notify_if_changed(before);
    }

    /// Drive every active promotion under `program` to `checked`.
    /// Promotions already at the target are untouched; inactive ones are
    /// never written.
    pub fn toggle_program(&mut self, program: &Program, checked: bool) {
        let before = self.selected.len();
        for pp in program.active_promotions() {
            if checked {
                self.selected.insert(pp.id.clone());
            } else {
                self.selected.remove(&pp.id);
            }
        }
        self.notify_if_changed(before);
    }

    /// Drive every active promotion under every program of `partner` to
    /// `checked`.
    pub fn toggle_partner(&mut self, partner: &Partner, checked: bool) {
        let before = self.selected.len();
        for pp in partner.active_promotions() {
            if checked {
                self.selected.insert(pp.id.clone());
            } else {
                self.selected.remove(&pp.id);
            }
        }
        self.notify_if_changed(before);
    }

    /// Select every active promotion in the whole catalog.
    pub fn select_all(&mut self) {
        let before = self.selected.len();
        let catalog = Arc::clone(&self.catalog);
        for pp in catalog.active_promotions() {
            self.selected.insert(pp.id.clone());
        }
        self.notify_if_changed(before);
    }

    /// Clear the selection globally, including leaves hidden by the
    /// current filter view.
    pub fn clear_all(&mut self) {
        let before = self.selected.len();
        self.selected.clear();
        self.notify_if_changed(before);
    }

    pub fn is_selected(&self, leaf_id: &str) -> bool {
        self.selected.contains(leaf_id)
    }

    /// Global selected count, independent of any filter or reveal view.
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in catalog order. Ids that are no longer present in
    /// the catalog remain selected and are appended, sorted, after the
    /// catalog-ordered ids.
    pub fn selected_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .catalog
            .promotions()
            .filter(|pp| self.selected.contains(&pp.id))
            .map(|pp| pp.id.clone())
            .collect();
        if ids.len() < self.selected.len() {
            // Selected ids that vanished from the catalog still count;
            // append them in sorted order for determinism.
            let mut orphans: Vec<String> = self
                .selected
                .iter()
                .filter(|id| self.catalog.find_promotion(id).is_none())
                .cloned()
                .collect();
            orphans.sort();
            ids.extend(orphans);
        }
        ids
    }

    pub fn selected_set(&self) -> &HashSet<String> {
        &self.selected
    }

    /// Derived check state for a program: `Full` iff it has at least one
    /// active promotion and all of them are selected, `Empty` iff none
    /// are selected.
    pub fn program_state(&self, program: &Program) -> CheckState {
        self.state_over(program.active_promotions().map(|pp| pp.id.as_str()))
    }

    /// Derived check state for a partner, computed over its active
    /// promotions across all programs.
    pub fn partner_state(&self, partner: &Partner) -> CheckState {
        self.state_over(partner.active_promotions().map(|pp| pp.id.as_str()))
    }

    fn state_over<'a>(&self, ids: impl Iterator<Item = &'a str>) -> CheckState {
        let mut total = 0usize;
        let mut selected = 0usize;
        for id in ids {
            total += 1;
            if self.selected.contains(id) {
                selected += 1;
            }
        }
        if total == 0 || selected == 0 {
            CheckState::Empty
        } else if selected == total {
            CheckState::Full
        } else {
            CheckState::Partial
        }
    }

    fn notify_if_changed(&self, before: usize) {
        let now = self.selected.len();
        if now != before {
            self.event_sink.emit(event_bus::selection_changed(now));
        }
    }
}
