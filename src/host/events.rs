//! Bridge from the engine's event bus into Bevy messages.
//!
//! The engine publishes synchronously to its subscribers; a subscriber installed at
//! startup queues every event, and [`forward_fog_events`] drains the queue once per
//! frame so other systems can read them as [`FogEventMessage`]s.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::engine::FogEngine;
use crate::fog::{FogEvent, SubscriptionId};

/// A fog engine event, re-published for Bevy systems
#[derive(Message, Debug, Clone)]
pub struct FogEventMessage(pub FogEvent);

/// Events queued by the bus subscriber since the last drain
#[derive(Resource, Clone, Default)]
pub struct FogEventQueue {
    events: Arc<Mutex<Vec<FogEvent>>>,
    subscription: Option<SubscriptionId>,
}

impl FogEventQueue {
    /// Subscribe to every event kind on `engine`
    pub fn attach(&mut self, engine: &mut FogEngine) {
        if let Some(previous) = self.subscription.take() {
            engine.unsubscribe(previous);
        }
        let sink = self.events.clone();
        self.subscription = Some(engine.subscribe_all(move |event| {
            if let Ok(mut queue) = sink.lock() {
                queue.push(event.clone());
            }
        }));
    }

    fn drain(&self) -> Vec<FogEvent> {
        self.events
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }
}

/// Resource tracking if the fog state has unsaved changes
#[derive(Resource, Default)]
pub struct SnapshotDirtyState {
    pub is_dirty: bool,
}

/// Whether an event changes what a saved snapshot would contain
fn changes_snapshot(event: &FogEvent) -> bool {
    match event {
        FogEvent::RegionSelected(_) | FogEvent::ToolChanged(_) | FogEvent::DataImported { .. } => {
            false
        }
        // The camera drives the viewport every frame
        FogEvent::ViewportUpdated(_) => false,
        _ => true,
    }
}

pub fn forward_fog_events(
    queue: Res<FogEventQueue>,
    mut messages: MessageWriter<FogEventMessage>,
    mut dirty_state: ResMut<SnapshotDirtyState>,
) {
    for event in queue.drain() {
        match &event {
            FogEvent::DataImported { region_count } => {
                debug!("Fog event: {} ({} regions)", event.kind(), region_count);
                dirty_state.is_dirty = false;
            }
            FogEvent::ViewportUpdated(_) => {}
            _ => debug!("Fog event: {}", event.kind()),
        }
        if changes_snapshot(&event) {
            dirty_state.is_dirty = true;
        }
        messages.write(FogEventMessage(event));
    }
}
