//! Entity health
//!
//! Health is a bounded stat. Draining it reports damage or death, filling it
//! reports healing, and a dead entity can be flagged for deletion.

use kestrel_ecs::{Component, EntityData};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a change to a [`Health`] amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthEvent {
    Damaged,
    Healed,
    Died,
}

/// Hit points of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    max: f32,
    current: f32,
    /// Whether dying flags the owning entity for deletion
    pub delete_on_death: bool,
}

impl Health {
    /// Full health with the given maximum.
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            max,
            current: max,
            delete_on_death: true,
        }
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    /// Health as a 0.0-1.0 fraction
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Remove health. Already-dead health ignores further damage.
    ///
    /// Returns `Died` when this drain emptied it, `Damaged` for any other
    /// positive amount and `None` otherwise.
    pub fn drain(&mut self, amount: f32) -> Option<HealthEvent> {
        if self.is_empty() {
            return None;
        }
        self.current = (self.current - amount).clamp(0.0, self.max);
        if self.is_empty() {
            Some(HealthEvent::Died)
        } else if amount > 0.0 {
            Some(HealthEvent::Damaged)
        } else {
            None
        }
    }

    /// Restore health up to the maximum. Returns `Healed` for a positive amount.
    pub fn fill(&mut self, amount: f32) -> Option<HealthEvent> {
        self.current = (self.current + amount).clamp(0.0, self.max);
        (amount > 0.0).then_some(HealthEvent::Healed)
    }

    /// Change the maximum, keeping current health within it.
    pub fn set_max(&mut self, max: f32) {
        self.max = max.max(0.0);
        self.current = self.current.min(self.max);
    }
}

impl Component for Health {}

/// Drain the entity's [`Health`] and delete the entity if it died with
/// `delete_on_death` set. Entities without health are untouched.
pub fn apply_damage(data: &mut EntityData, amount: f32) -> Option<HealthEvent> {
    let health = data.components_mut().get_component_mut::<Health>()?;
    let event = health.drain(amount)?;
    let delete = event == HealthEvent::Died && health.delete_on_death;
    data.mark_changed();
    if delete {
        debug!(tag = data.tag(), "Entity died");
        data.delete();
    }
    Some(event)
}
