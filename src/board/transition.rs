use crate::board::store::LeadStore;
use crate::models::Stage;

/// A completed move gesture against the board: which lead, and the column it
/// was dropped on. The source stage is resolved from the store, not trusted
/// from the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub lead_id: i64,
    pub destination: Stage,
}

/// What a move request did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The lead's stage field was rewritten.
    Moved { from: Stage, to: Stage },
    /// Destination equals the lead's current stage; the store is untouched.
    NoChange { stage: Stage },
    /// The lead id is not present in the store; the store is untouched.
    UnknownLead,
}

/// Apply a move request to the store.
///
/// Every stage-to-stage transition is legal, including dropping a lead back
/// onto its own column. A stale lead id is tolerated: the store is left
/// unchanged and the caller decides whether to surface it.
pub fn apply_move(store: &mut LeadStore, request: MoveRequest) -> MoveOutcome {
    let Some(lead) = store.get(request.lead_id) else {
        return MoveOutcome::UnknownLead;
    };
    let from = lead.stage;
    if from == request.destination {
        return MoveOutcome::NoChange { stage: from };
    }
    store.reassign_stage(request.lead_id, request.destination);
    MoveOutcome::Moved {
        from,
        to: request.destination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeadInput;

    fn store_with(stages: &[Stage]) -> LeadStore {
        let mut store = LeadStore::new();
        for (i, stage) in stages.iter().enumerate().rev() {
            store.create(
                LeadInput {
                    name: format!("Lead {}", i),
                    email: format!("lead{}@x.gov", i),
                    phone: "(45) 9999-0000".to_string(),
                    organization_id: None,
                    role: "Secretário".to_string(),
                    source: None,
                },
                Some(*stage),
            );
        }
        store
    }

    #[test]
    fn test_move_to_other_stage() {
        let mut store = store_with(&[Stage::New]);
        let id = store.list()[0].id.unwrap();

        let outcome = apply_move(&mut store, MoveRequest { lead_id: id, destination: Stage::Contacted });

        assert_eq!(outcome, MoveOutcome::Moved { from: Stage::New, to: Stage::Contacted });
        assert_eq!(store.get(id).unwrap().stage, Stage::Contacted);
    }

    #[test]
    fn test_move_to_same_stage_is_no_change() {
        let mut store = store_with(&[Stage::Qualified]);
        let id = store.list()[0].id.unwrap();
        let before_ts = store.get(id).unwrap().modified_ts;

        let outcome = apply_move(&mut store, MoveRequest { lead_id: id, destination: Stage::Qualified });

        assert_eq!(outcome, MoveOutcome::NoChange { stage: Stage::Qualified });
        assert_eq!(store.get(id).unwrap().modified_ts, before_ts);
    }

    #[test]
    fn test_move_unknown_lead() {
        let mut store = store_with(&[Stage::New]);
        let before: Vec<_> = store.list().iter().map(|l| (l.id, l.stage)).collect();

        let outcome = apply_move(&mut store, MoveRequest { lead_id: 404, destination: Stage::Converted });

        assert_eq!(outcome, MoveOutcome::UnknownLead);
        let after: Vec<_> = store.list().iter().map(|l| (l.id, l.stage)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_all_transitions_are_legal() {
        for from in Stage::ALL {
            for to in Stage::ALL {
                let mut store = store_with(&[from]);
                let id = store.list()[0].id.unwrap();
                let outcome = apply_move(&mut store, MoveRequest { lead_id: id, destination: to });
                match outcome {
                    MoveOutcome::Moved { .. } => assert_ne!(from, to),
                    MoveOutcome::NoChange { .. } => assert_eq!(from, to),
                    MoveOutcome::UnknownLead => panic!("lead should exist"),
                }
                assert_eq!(store.get(id).unwrap().stage, to);
            }
        }
    }
}
