//! Escalation State Machine: level and lifecycle with two-phase transitions
//!
//! ```text
//!   Level(1) ⇄ Level(2) ⇄ Level(3) ⇄ Level(4) ⇄ Level(5)
//!      │          │          │          │          │
//!      └──────────┴── finish ┴──────────┴──────────┴── advance ──▶ Finalized
//!
//!   Finalized: retreat only
//! ```
//!
//! Every action is first *planned*: the machine checks its guards and
//! returns a [`TransitionPlan`] describing the effects the caller has to run.
//! The plan is *committed* only after all effects succeeded. Dropping a plan
//! leaves the machine untouched, which is how a failed gateway call rolls
//! back.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::level::EscalationLevel;
use crate::ticket::{Lifecycle, TicketId};

/// User action on the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Advance,
    Retreat,
    Finish,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Advance => write!(f, "advance"),
            Self::Retreat => write!(f, "retreat"),
            Self::Finish => write!(f, "finish"),
        }
    }
}

/// Guard failure while planning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRejection {
    /// Advance or finish on a finalized ticket
    Finalized,
}

/// What a planned transition has to do and where it lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionPlan {
    /// Level n < 5 → n + 1. Effects run in order: status, note, next level.
    Advance {
        from: EscalationLevel,
        to: EscalationLevel,
    },
    /// Advance at level 5: status and note run concurrently, level stays.
    FinalizeAtTop { level: EscalationLevel },
    /// Level n > 1 → n - 1 through the previous-level effect.
    Retreat {
        from: EscalationLevel,
        to: EscalationLevel,
        lifecycle: Lifecycle,
    },
    /// Resolve now: status and note run concurrently, level stays.
    Finish { level: EscalationLevel },
}

impl TransitionPlan {
    pub fn action(&self) -> Action {
        match self {
            Self::Advance { .. } | Self::FinalizeAtTop { .. } => Action::Advance,
            Self::Retreat { .. } => Action::Retreat,
            Self::Finish { .. } => Action::Finish,
        }
    }

    /// Level the machine is at when the plan was made
    pub fn from_level(&self) -> EscalationLevel {
        match *self {
            Self::Advance { from, .. } | Self::Retreat { from, .. } => from,
            Self::FinalizeAtTop { level } | Self::Finish { level } => level,
        }
    }

    /// Level after commit
    pub fn target_level(&self) -> EscalationLevel {
        match *self {
            Self::Advance { to, .. } | Self::Retreat { to, .. } => to,
            Self::FinalizeAtTop { level } | Self::Finish { level } => level,
        }
    }

    /// Lifecycle after commit
    pub fn target_lifecycle(&self) -> Lifecycle {
        match *self {
            Self::Advance { .. } => Lifecycle::Active,
            Self::Retreat { lifecycle, .. } => lifecycle,
            Self::FinalizeAtTop { .. } | Self::Finish { .. } => Lifecycle::Finalized,
        }
    }

    /// Whether committing this plan closes out the level it started from
    pub fn finishes_current_level(&self) -> bool {
        !matches!(self, Self::Retreat { .. })
    }
}

/// A committed transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub action: Action,
    pub from: EscalationLevel,
    pub to: EscalationLevel,
    pub lifecycle: Lifecycle,
    /// Milliseconds since the machine was created
    pub elapsed_ms: u64,
}

/// Level plus lifecycle for one ticket
#[derive(Debug, Clone)]
pub struct EscalationMachine {
    ticket: TicketId,
    level: EscalationLevel,
    lifecycle: Lifecycle,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl EscalationMachine {
    pub fn new(ticket: TicketId, level: EscalationLevel, lifecycle: Lifecycle) -> Self {
        Self {
            ticket,
            level,
            lifecycle,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn ticket(&self) -> TicketId {
        self.ticket
    }

    pub fn level(&self) -> EscalationLevel {
        self.level
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_finalized(&self) -> bool {
        self.lifecycle.is_finalized()
    }

    /// Replace level and lifecycle with fresh host data; keeps the log
    pub fn reset(&mut self, level: EscalationLevel, lifecycle: Lifecycle) {
        self.level = level;
        self.lifecycle = lifecycle;
    }

    /// Plan any action
    pub fn plan(&self, action: Action) -> Result<Option<TransitionPlan>, PlanRejection> {
        match action {
            Action::Advance => self.plan_advance().map(Some),
            Action::Retreat => Ok(self.plan_retreat()),
            Action::Finish => self.plan_finish().map(Some),
        }
    }

    /// Move up one level, or finalize when already at the top
    pub fn plan_advance(&self) -> Result<TransitionPlan, PlanRejection> {
        if self.is_finalized() {
            return Err(PlanRejection::Finalized);
        }

        Ok(match self.level.next() {
            Some(to) => TransitionPlan::Advance {
                from: self.level,
                to,
            },
            None => TransitionPlan::FinalizeAtTop { level: self.level },
        })
    }

    /// Move down one level; `None` at level 1
    ///
    /// Allowed while finalized. Whether that is a deliberate recovery path is
    /// still open, so it is logged when it happens.
    pub fn plan_retreat(&self) -> Option<TransitionPlan> {
        let to = self.level.previous()?;

        if self.is_finalized() {
            tracing::warn!(
                ticket = %self.ticket,
                level = %self.level,
                "Retreat requested on a finalized ticket"
            );
        }

        Some(TransitionPlan::Retreat {
            from: self.level,
            to,
            lifecycle: self.lifecycle,
        })
    }

    /// Resolve the ticket at the current level
    pub fn plan_finish(&self) -> Result<TransitionPlan, PlanRejection> {
        if self.is_finalized() {
            return Err(PlanRejection::Finalized);
        }
        Ok(TransitionPlan::Finish { level: self.level })
    }

    /// Apply a plan whose effects all succeeded
    pub fn commit(&mut self, plan: TransitionPlan) -> &TransitionRecord {
        let record = TransitionRecord {
            action: plan.action(),
            from: self.level,
            to: plan.target_level(),
            lifecycle: plan.target_lifecycle(),
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
        };

        tracing::debug!(
            ticket = %self.ticket,
            action = %record.action,
            from = %record.from,
            to = %record.to,
            lifecycle = %record.lifecycle,
            "Escalation transition"
        );

        self.level = record.to;
        self.lifecycle = record.lifecycle;
        self.transitions.push(record);
        &self.transitions[self.transitions.len() - 1]
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "ticket={} level={} lifecycle={} transitions={}",
            self.ticket,
            self.level,
            self.lifecycle,
            self.transitions.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(level: u8, lifecycle: Lifecycle) -> EscalationMachine {
        EscalationMachine::new(
            TicketId(12345),
            EscalationLevel::new(level).unwrap(),
            lifecycle,
        )
    }

    #[test]
    fn test_advance_walks_up_to_top() {
        let mut sm = machine(1, Lifecycle::Active);
        for expected in 2..=5 {
            let plan = sm.plan_advance().unwrap();
            sm.commit(plan);
            assert_eq!(sm.level().get(), expected);
            assert!(!sm.is_finalized());
        }
        assert_eq!(sm.transitions().len(), 4);
    }

    #[test]
    fn test_advance_at_top_finalizes_without_level_change() {
        let mut sm = machine(5, Lifecycle::Active);
        let plan = sm.plan_advance().unwrap();
        assert!(matches!(plan, TransitionPlan::FinalizeAtTop { .. }));
        sm.commit(plan);
        assert_eq!(sm.level(), EscalationLevel::LAST);
        assert!(sm.is_finalized());
    }

    #[test]
    fn test_finalized_rejects_advance_and_finish() {
        let sm = machine(3, Lifecycle::Finalized);
        assert_eq!(sm.plan_advance(), Err(PlanRejection::Finalized));
        assert_eq!(sm.plan_finish(), Err(PlanRejection::Finalized));
    }

    #[test]
    fn test_retreat_at_first_level_is_none() {
        let sm = machine(1, Lifecycle::Active);
        assert_eq!(sm.plan_retreat(), None);
        assert_eq!(sm.plan(Action::Retreat), Ok(None));
    }

    #[test]
    fn test_retreat_while_finalized_keeps_lifecycle() {
        let mut sm = machine(4, Lifecycle::Finalized);
        let plan = sm.plan_retreat().unwrap();
        assert!(!plan.finishes_current_level());
        sm.commit(plan);
        assert_eq!(sm.level().get(), 3);
        assert!(sm.is_finalized());
    }

    #[test]
    fn test_finish_keeps_level() {
        let mut sm = machine(2, Lifecycle::Active);
        let plan = sm.plan_finish().unwrap();
        assert_eq!(plan.target_level().get(), 2);
        let record = sm.commit(plan);
        assert_eq!(record.action, Action::Finish);
        assert!(sm.is_finalized());
    }

    #[test]
    fn test_dropped_plan_changes_nothing() {
        let sm = machine(2, Lifecycle::Active);
        let _plan = sm.plan_advance().unwrap();
        assert_eq!(sm.level().get(), 2);
        assert!(sm.transitions().is_empty());
    }

    #[test]
    fn test_summary() {
        let sm = machine(2, Lifecycle::Active);
        assert_eq!(
            sm.summary(),
            "ticket=#12345 level=2 lifecycle=active transitions=0"
        );
    }
}
