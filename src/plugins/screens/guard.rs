//! Single-flight lock for map transitions and character switches.

use bevy::prelude::*;

use crate::world::TransitionRequest;

use super::scope::{Deadline, MapScreenScope};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LockState {
    #[default]
    Idle,
    Transitioning,
    Switching,
}

#[derive(Clone, Debug, PartialEq)]
enum Handoff {
    Activate(TransitionRequest),
    CompleteSwitch(TransitionRequest),
}

#[derive(Clone, Debug, PartialEq)]
struct PendingHandoff {
    deadline: Deadline,
    handoff: Handoff,
}

/// Owns the only writer of the lock state. A transition stays locked until
/// the next activation resets the guard; a switch releases its lock when the
/// handoff fires.
#[derive(Resource, Debug, Default)]
pub struct TransitionGuard {
    state: LockState,
    pending: Option<PendingHandoff>,
}

impl TransitionGuard {
    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state != LockState::Idle
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the lock for a map transition. Returns `false` (and changes
    /// nothing) when a transition or switch already holds it.
    pub fn try_begin_transition(&mut self, request: TransitionRequest, deadline: Deadline) -> bool {
        if self.is_locked() {
            return false;
        }
        self.state = LockState::Transitioning;
        self.pending = Some(PendingHandoff {
            deadline,
            handoff: Handoff::Activate(request),
        });
        true
    }

    pub fn try_begin_switch(&mut self, request: TransitionRequest, deadline: Deadline) -> bool {
        if self.is_locked() {
            return false;
        }
        self.cancel_pending();
        self.state = LockState::Switching;
        self.pending = Some(PendingHandoff {
            deadline,
            handoff: Handoff::CompleteSwitch(request),
        });
        true
    }

    /// Fires the pending handoff once its deadline passes. Handoffs whose
    /// activation has ended are discarded without firing.
    pub fn poll(&mut self, now: f64, scope: &MapScreenScope) -> Option<TransitionRequest> {
        let pending = self.pending.as_ref()?;

        if !scope.is_live(pending.deadline.token) {
            debug!("Dropping handoff from a finished map screen");
            self.pending = None;
            return None;
        }
        if !pending.deadline.is_due(now) {
            return None;
        }

        let pending = self.pending.take()?;
        match pending.handoff {
            Handoff::CompleteSwitch(request) => {
                self.state = LockState::Idle;
                Some(request)
            }
            Handoff::Activate(request) => Some(request),
        }
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    /// Fresh lock state for a new activation.
    pub fn reset(&mut self) {
        self.state = LockState::Idle;
        self.pending = None;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::ActivationPayload;

    fn request(target: &str) -> TransitionRequest {
        TransitionRequest {
            target_map_id: target.to_string(),
            payload: ActivationPayload::from_origin("plaza"),
        }
    }

    fn live_scope() -> MapScreenScope {
        let mut scope = MapScreenScope::default();
        scope.begin();
        scope
    }

    #[test]
    fn near_simultaneous_triggers_activate_once() {
        let scope = live_scope();
        let mut guard = TransitionGuard::default();

        assert!(guard.try_begin_transition(request("harbor"), scope.deadline(1.0, 0.4)));
        assert!(!guard.try_begin_transition(request("bakery"), scope.deadline(1.01, 0.4)));
        assert!(!guard.try_begin_transition(request("harbor"), scope.deadline(1.02, 0.4)));

        let mut activations = Vec::new();
        for step in 0..20 {
            let now = 1.0 + step as f64 * 0.05;
            if let Some(fired) = guard.poll(now, &scope) {
                activations.push(fired);
            }
        }
        assert_eq!(activations, vec![request("harbor")]);
        assert_eq!(guard.state(), LockState::Transitioning);
    }

    #[test]
    fn handoff_waits_for_fade() {
        let scope = live_scope();
        let mut guard = TransitionGuard::default();
        guard.try_begin_transition(request("harbor"), scope.deadline(2.0, 0.5));
        assert!(guard.poll(2.3, &scope).is_none());
        assert!(guard.poll(2.5, &scope).is_some());
    }

    #[test]
    fn transition_lock_is_not_released_by_handoff() {
        let scope = live_scope();
        let mut guard = TransitionGuard::default();
        guard.try_begin_transition(request("harbor"), scope.deadline(0.0, 0.4));
        guard.poll(1.0, &scope);
        assert!(guard.is_locked());
        assert!(!guard.try_begin_switch(request("plaza"), scope.deadline(1.0, 0.3)));
        guard.reset();
        assert!(!guard.is_locked());
    }

    #[test]
    fn switch_releases_lock_when_handoff_fires() {
        let scope = live_scope();
        let mut guard = TransitionGuard::default();
        assert!(guard.try_begin_switch(request("plaza"), scope.deadline(0.0, 0.3)));
        assert_eq!(guard.state(), LockState::Switching);
        assert!(!guard.try_begin_switch(request("plaza"), scope.deadline(0.1, 0.3)));

        assert_eq!(guard.poll(0.3, &scope), Some(request("plaza")));
        assert_eq!(guard.state(), LockState::Idle);
        assert!(!guard.has_pending());
    }

    #[test]
    fn ended_scope_discards_pending_handoff() {
        let mut scope = live_scope();
        let mut guard = TransitionGuard::default();
        guard.try_begin_transition(request("harbor"), scope.deadline(0.0, 0.4));
        scope.end();
        assert!(guard.poll(5.0, &scope).is_none());
        assert!(!guard.has_pending());
    }

    #[test]
    fn restarted_scope_does_not_fire_stale_handoff() {
        let mut scope = live_scope();
        let mut guard = TransitionGuard::default();
        guard.try_begin_switch(request("plaza"), scope.deadline(0.0, 0.3));
        scope.end();
        scope.begin();
        assert!(guard.poll(1.0, &scope).is_none());
    }
}
