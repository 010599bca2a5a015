//! Map-screen lifecycle scope and the deadline tokens tied to it.

use bevy::prelude::*;

/// Identifies one map-screen activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScopeToken(u64);

/// Lifecycle of the current map screen. Every deferred callback carries the
/// token of the activation that scheduled it and is dropped once that
/// activation has ended.
#[derive(Resource, Debug, Default)]
pub struct MapScreenScope {
    generation: u64,
    active: bool,
}

impl MapScreenScope {
    pub fn begin(&mut self) -> ScopeToken {
        self.generation += 1;
        self.active = true;
        ScopeToken(self.generation)
    }

    pub fn end(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn token(&self) -> ScopeToken {
        ScopeToken(self.generation)
    }

    pub fn is_live(&self, token: ScopeToken) -> bool {
        self.active && token.0 == self.generation
    }

    pub fn deadline(&self, now: f64, delay_seconds: f64) -> Deadline {
        Deadline {
            token: self.token(),
            at: now + delay_seconds,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Deadline {
    pub token: ScopeToken,
    pub at: f64,
}

impl Deadline {
    pub fn is_due(&self, now: f64) -> bool {
        now >= self.at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_die_with_their_activation() {
        let mut scope = MapScreenScope::default();
        let first = scope.begin();
        assert!(scope.is_live(first));

        scope.end();
        assert!(!scope.is_live(first));

        let second = scope.begin();
        assert!(scope.is_live(second));
        assert!(!scope.is_live(first));
    }

    #[test]
    fn deadline_is_due_at_boundary() {
        let mut scope = MapScreenScope::default();
        scope.begin();
        let deadline = scope.deadline(10.0, 0.3);
        assert!(!deadline.is_due(10.29));
        assert!(deadline.is_due(10.3));
    }
}
