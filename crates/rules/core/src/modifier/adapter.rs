//! Listener adapters for modifiers and their durations.

use std::sync::Arc;

use tracing::trace;

use super::{Modifier, priority};
use crate::bus::Listener;
use crate::duration::DurationHandle;
use crate::error::ListenerError;
use crate::event::GameEvent;

/// Adapts a [`Modifier`] into a [`Listener`].
///
/// On each event: skip if the duration has expired, let the modifier
/// `observe` it, skip if `condition` rejects it, otherwise `apply` and record
/// the modifier on the event.
pub struct ModifierListener {
    modifier: Arc<dyn Modifier>,
}

impl ModifierListener {
    pub fn new(modifier: Arc<dyn Modifier>) -> Self {
        Self { modifier }
    }

    pub fn modifier(&self) -> &Arc<dyn Modifier> {
        &self.modifier
    }
}

impl Listener for ModifierListener {
    fn handle_event(&self, event: &mut GameEvent) -> Result<(), ListenerError> {
        if self.modifier.duration().is_expired() {
            trace!(
                target: "rules::modifier",
                modifier = self.modifier.id(),
                "Skipping expired modifier"
            );
            return Ok(());
        }
        self.modifier.observe(event);
        if !self.modifier.condition(event) {
            return Ok(());
        }

        self.modifier.apply(event)?;
        event.add_modifier(Arc::clone(&self.modifier));
        trace!(
            target: "rules::modifier",
            modifier = self.modifier.id(),
            event_type = %event.kind(),
            "Modifier applied"
        );
        Ok(())
    }

    fn priority(&self) -> i32 {
        self.modifier.priority()
    }

    fn name(&self) -> &str {
        self.modifier.id()
    }
}

/// Feeds the events a duration reacts to into its `tick`.
///
/// Runs at [`priority::CLOCK`], after every conventional band, so it only sees
/// events that were not cancelled along the way.
pub struct DurationTicker {
    name: String,
    duration: DurationHandle,
}

impl DurationTicker {
    pub fn new(name: impl Into<String>, duration: DurationHandle) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

impl Listener for DurationTicker {
    fn handle_event(&self, event: &mut GameEvent) -> Result<(), ListenerError> {
        self.duration.tick(event);
        Ok(())
    }

    fn priority(&self) -> i32 {
        priority::CLOCK
    }

    fn name(&self) -> &str {
        &self.name
    }
}
