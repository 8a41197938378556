use crate::models::{Lead, LeadInput, Stage};

/// In-memory ordered collection of leads backing one board session.
///
/// The store is the single owner of its records while it lives: there is
/// exactly one writer and all operations are synchronous. New leads are
/// prepended, so store order is newest-first. `reassign_stage` rewrites the
/// stage field in place and never reorders the sequence.
#[derive(Debug, Default)]
pub struct LeadStore {
    leads: Vec<Lead>,
}

impl LeadStore {
    pub fn new() -> Self {
        Self { leads: Vec::new() }
    }

    /// Hydrate a store from an already-ordered sequence (newest first).
    pub fn from_leads(leads: Vec<Lead>) -> Self {
        Self { leads }
    }

    /// Current leads in store order. No side effects.
    pub fn list(&self) -> &[Lead] {
        &self.leads
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    pub fn get(&self, lead_id: i64) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == Some(lead_id))
    }

    /// Create a lead and prepend it to the store.
    ///
    /// The new lead gets the next free id and lands in the New stage unless
    /// a target stage is given.
    pub fn create(&mut self, input: LeadInput, target_stage: Option<Stage>) -> &Lead {
        let mut lead = Lead::new(input);
        lead.id = Some(self.next_id());
        if let Some(stage) = target_stage {
            lead.stage = stage;
        }
        self.leads.insert(0, lead);
        &self.leads[0]
    }

    /// Rewrite a lead's stage in place.
    ///
    /// An unknown id is tolerated as a no-op. A reassignment to the lead's
    /// current stage leaves every field untouched, including timestamps.
    pub fn reassign_stage(&mut self, lead_id: i64, new_stage: Stage) {
        if let Some(lead) = self.leads.iter_mut().find(|l| l.id == Some(lead_id)) {
            if lead.stage != new_stage {
                lead.stage = new_stage;
                lead.modified_ts = chrono::Utc::now().timestamp();
            }
        }
    }

    /// Ordered sub-sequence of leads in `stage` passing `filter`.
    ///
    /// Purely a projection: leads keep their relative order from the full
    /// sequence.
    pub fn column_for<F>(&self, stage: Stage, filter: F) -> Vec<&Lead>
    where
        F: Fn(&Lead) -> bool,
    {
        self.leads
            .iter()
            .filter(|l| l.stage == stage && filter(l))
            .collect()
    }

    /// Unfiltered column for `stage`.
    pub fn column(&self, stage: Stage) -> Vec<&Lead> {
        self.column_for(stage, |_| true)
    }

    /// Per-stage lead counts in board order. Always equals the length of the
    /// corresponding column.
    pub fn counts(&self) -> Vec<(Stage, usize)> {
        Stage::ALL
            .iter()
            .map(|&stage| (stage, self.column(stage).len()))
            .collect()
    }

    fn next_id(&self) -> i64 {
        self.leads
            .iter()
            .filter_map(|l| l.id)
            .max()
            .unwrap_or(0)
            + 1
    }
}
