//! Typed publish/subscribe channel for fog state changes.
//!
//! Every payload is a variant of [`FogEvent`]. Subscribers register for one
//! [`FogEventKind`] or for all events and receive an opaque [`SubscriptionId`] to
//! unsubscribe with.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tools::FogTool;

use super::region::{FogRegion, RegionId};
use super::settings::FogSettings;
use super::viewport::Viewport;

#[derive(Debug, Clone, PartialEq)]
pub enum FogEvent {
    RegionCreated(FogRegion),
    RegionUpdated(FogRegion),
    RegionRemoved(RegionId),
    RegionsCleared(Vec<RegionId>),
    RegionRevealed(RegionId),
    RegionHidden(RegionId),
    /// `None` when the selection was cleared
    RegionSelected(Option<RegionId>),
    RegionAnimationComplete { id: RegionId, opacity: f32 },
    SettingsUpdated(FogSettings),
    ViewportUpdated(Viewport),
    ToolChanged(FogTool),
    FogOfWarToggled(bool),
    DataImported { region_count: usize },
}

/// Discriminant of [`FogEvent`], used as the subscription filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FogEventKind {
    RegionCreated,
    RegionUpdated,
    RegionRemoved,
    RegionsCleared,
    RegionRevealed,
    RegionHidden,
    RegionSelected,
    RegionAnimationComplete,
    SettingsUpdated,
    ViewportUpdated,
    ToolChanged,
    FogOfWarToggled,
    DataImported,
}

impl FogEvent {
    pub fn kind(&self) -> FogEventKind {
        match self {
            FogEvent::RegionCreated(_) => FogEventKind::RegionCreated,
            FogEvent::RegionUpdated(_) => FogEventKind::RegionUpdated,
            FogEvent::RegionRemoved(_) => FogEventKind::RegionRemoved,
            FogEvent::RegionsCleared(_) => FogEventKind::RegionsCleared,
            FogEvent::RegionRevealed(_) => FogEventKind::RegionRevealed,
            FogEvent::RegionHidden(_) => FogEventKind::RegionHidden,
            FogEvent::RegionSelected(_) => FogEventKind::RegionSelected,
            FogEvent::RegionAnimationComplete { .. } => FogEventKind::RegionAnimationComplete,
            FogEvent::SettingsUpdated(_) => FogEventKind::SettingsUpdated,
            FogEvent::ViewportUpdated(_) => FogEventKind::ViewportUpdated,
            FogEvent::ToolChanged(_) => FogEventKind::ToolChanged,
            FogEvent::FogOfWarToggled(_) => FogEventKind::FogOfWarToggled,
            FogEvent::DataImported { .. } => FogEventKind::DataImported,
        }
    }

    /// Whether this event changes what the renderer would draw
    pub fn affects_regions(&self) -> bool {
        matches!(
            self.kind(),
            FogEventKind::RegionCreated
                | FogEventKind::RegionUpdated
                | FogEventKind::RegionRemoved
                | FogEventKind::RegionsCleared
                | FogEventKind::RegionRevealed
                | FogEventKind::RegionHidden
                | FogEventKind::DataImported
        )
    }
}

impl FogEventKind {
    /// Event name as exposed to scripting hosts and logs
    pub fn name(&self) -> &'static str {
        match self {
            FogEventKind::RegionCreated => "regionCreated",
            FogEventKind::RegionUpdated => "regionUpdated",
            FogEventKind::RegionRemoved => "regionRemoved",
            FogEventKind::RegionsCleared => "regionsCleared",
            FogEventKind::RegionRevealed => "regionRevealed",
            FogEventKind::RegionHidden => "regionHidden",
            FogEventKind::RegionSelected => "regionSelected",
            FogEventKind::RegionAnimationComplete => "regionAnimationComplete",
            FogEventKind::SettingsUpdated => "settingsUpdated",
            FogEventKind::ViewportUpdated => "viewportUpdated",
            FogEventKind::ToolChanged => "toolChanged",
            FogEventKind::FogOfWarToggled => "fogOfWarToggled",
            FogEventKind::DataImported => "dataImported",
        }
    }
}

impl fmt::Display for FogEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type EventHandler = Box<dyn FnMut(&FogEvent) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    /// `None` receives every event
    filter: Option<FogEventKind>,
    handler: EventHandler,
}

#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        kind: FogEventKind,
        handler: impl FnMut(&FogEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.add(Some(kind), Box::new(handler))
    }

    pub fn subscribe_all(
        &mut self,
        handler: impl FnMut(&FogEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.add(None, Box::new(handler))
    }

    fn add(&mut self, filter: Option<FogEventKind>, handler: EventHandler) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.push(Subscription {
            id,
            filter,
            handler,
        });
        id
    }

    /// Returns false if the handle was unknown or already removed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != id);
        self.subscriptions.len() != before
    }

    /// Deliver an event to matching subscribers in subscription order
    pub fn emit(&mut self, event: &FogEvent) {
        let kind = event.kind();
        for sub in self
            .subscriptions
            .iter_mut()
            .filter(|sub| sub.filter.is_none_or(|filter| filter == kind))
        {
            (sub.handler)(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
