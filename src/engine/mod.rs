//! The fog engine: one explicitly owned instance per map view.
//!
//! `FogEngine` wires the region store, animation scheduler, tool state machine and
//! renderer together and publishes every state change on its event bus. Lifecycle is
//! `initialize(surface)`, then any number of operations and frames, then `dispose()`.
//! The engine is also a Bevy resource so the host systems can reach it directly.

#[cfg(test)]
mod tests;

use bevy::prelude::*;
use serde::Serialize;

use crate::constants::REVEALED_THRESHOLD;
use crate::fog::{
    AnimationScheduler, EventBus, FogError, FogEvent, FogEventKind, FogRegion, FogSettings,
    FogSnapshot, IndexConfig, RegionId, RegionOptions, RegionPatch, RegionStore, ShapeKind,
    SubscriptionId, Viewport,
};
use crate::render::{FogRenderer, FogSurface, FrameInput, FrameOutcome};
use crate::tools::{DrawingPreview, FogKey, FogTool, PointerButton, ToolCommand, ToolStateMachine};

/// Diagnostics snapshot for a host-side panel
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FogMetrics {
    pub fps: f32,
    pub total_regions: usize,
    /// Regions drawn in the last rendered frame
    pub visible_regions: usize,
    pub cache_entries: usize,
    pub pattern_tiles: usize,
    pub gpu_active: bool,
    pub animating: usize,
}

#[derive(Resource)]
pub struct FogEngine {
    store: RegionStore,
    animations: AnimationScheduler,
    tools: ToolStateMachine,
    renderer: FogRenderer,
    settings: FogSettings,
    viewport: Viewport,
    bus: EventBus,
    surface: Option<Box<dyn FogSurface>>,
    /// Time of the last `advance`, used as the start time of new transitions.
    /// Transitions started before the first `advance` begin at that call.
    clock_ms: Option<f64>,
}

impl Default for FogEngine {
    fn default() -> Self {
        Self::new(FogSettings::default(), IndexConfig::default())
    }
}

impl std::fmt::Debug for FogEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FogEngine")
            .field("regions", &self.store.len())
            .field("tool", &self.tools.tool())
            .field("settings", &self.settings)
            .field("viewport", &self.viewport)
            .field("initialized", &self.surface.is_some())
            .field("bus", &self.bus)
            .finish()
    }
}

impl FogEngine {
    pub fn new(mut settings: FogSettings, index: IndexConfig) -> Self {
        settings.sanitize();
        Self {
            store: RegionStore::new(index),
            animations: AnimationScheduler::new(),
            tools: ToolStateMachine::new(),
            renderer: FogRenderer::new(),
            settings,
            viewport: Viewport::default(),
            bus: EventBus::new(),
            surface: None,
            clock_ms: None,
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Attach a drawing surface and try to acquire its GPU compositor.
    ///
    /// A second call replaces the previous surface.
    pub fn initialize(&mut self, mut surface: Box<dyn FogSurface>) {
        if self.surface.is_some() {
            warn!("Fog engine re-initialized, replacing previous surface");
            self.release_surface();
        }
        let gpu = surface.acquire_gpu();
        self.renderer.attach_gpu(gpu);
        self.surface = Some(surface);
        info!(
            "Fog engine initialized ({} regions, quality {})",
            self.store.len(),
            self.settings.quality
        );
    }

    /// Release the surface, GPU resources, running transitions and subscribers.
    ///
    /// Region data is kept so the host can still export it.
    pub fn dispose(&mut self) {
        if self.surface.is_none() {
            return;
        }
        self.release_surface();
        self.bus.clear();
        info!("Fog engine disposed");
    }

    fn release_surface(&mut self) {
        self.surface = None;
        self.renderer.reset();
        self.animations.clear();
        self.tools.cancel();
    }

    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    // ------------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------------

    pub fn create_region(
        &mut self,
        kind: ShapeKind,
        points: &[Vec2],
        options: RegionOptions,
    ) -> Result<RegionId, FogError> {
        let id = self.store.create(kind, points, options)?;
        self.flush_events();
        Ok(id)
    }

    pub fn remove_region(&mut self, id: RegionId) -> bool {
        self.animations.cancel(id);
        if !self.store.remove(id) {
            return false;
        }
        if self.tools.forget_region(id) {
            self.store_selection_event(None);
        }
        self.flush_events();
        true
    }

    pub fn update_region(&mut self, id: RegionId, patch: RegionPatch) -> bool {
        if patch.opacity.is_some() {
            self.animations.cancel(id);
        }
        let updated = self.store.update(id, patch);
        self.flush_events();
        updated
    }

    pub fn reveal_region(&mut self, id: RegionId, animated: bool) -> bool {
        self.transition(id, 0.0, animated)
    }

    pub fn hide_region(&mut self, id: RegionId, animated: bool) -> bool {
        self.transition(id, 1.0, animated)
    }

    /// Reveal a hidden region or hide a revealed one.
    ///
    /// A region mid-transition is judged by where it is heading.
    pub fn toggle_region(&mut self, id: RegionId, animated: bool) -> bool {
        let Some(region) = self.store.get(id) else {
            return false;
        };
        let opacity = self.animations.target(id).unwrap_or(region.opacity);
        if opacity < REVEALED_THRESHOLD {
            self.hide_region(id, animated)
        } else {
            self.reveal_region(id, animated)
        }
    }

    /// Reveal every region. Returns the number of regions affected.
    pub fn reveal_all(&mut self, animated: bool) -> usize {
        self.transition_all(0.0, animated)
    }

    pub fn hide_all(&mut self, animated: bool) -> usize {
        self.transition_all(1.0, animated)
    }

    fn transition_all(&mut self, target: f32, animated: bool) -> usize {
        let ids: Vec<RegionId> = self.store.iter().map(|region| region.id).collect();
        ids.into_iter()
            .filter(|id| self.transition(*id, target, animated))
            .count()
    }

    fn transition(&mut self, id: RegionId, target: f32, animated: bool) -> bool {
        let Some(region) = self.store.get(id) else {
            return false;
        };

        let duration = self.settings.animation_duration_ms;
        if animated && self.settings.smooth_transitions && duration > 0.0 {
            if region.opacity != target || self.animations.is_animating(id) {
                let from = region.opacity;
                self.start_tween(id, from, target, duration);
                self.renderer.mark_dirty();
            }
            return true;
        }

        self.animations.cancel(id);
        if target < REVEALED_THRESHOLD {
            self.store.reveal(id);
        } else {
            self.store.hide(id);
        }
        self.flush_events();
        true
    }

    /// Tween a region to an arbitrary opacity, replacing any running transition
    pub fn animate_opacity(&mut self, id: RegionId, target: f32, duration_ms: f64) -> bool {
        let Some(region) = self.store.get(id) else {
            return false;
        };
        let target = if target.is_finite() {
            target.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let from = region.opacity;
        self.start_tween(id, from, target, duration_ms.max(0.0));
        self.renderer.mark_dirty();
        true
    }

    fn start_tween(&mut self, id: RegionId, from: f32, to: f32, duration_ms: f64) {
        match self.clock_ms {
            Some(now_ms) => self.animations.animate(id, from, to, now_ms, duration_ms),
            None => self
                .animations
                .animate_from_next_tick(id, from, to, duration_ms),
        }
    }

    /// Remove every region. Returns the removed ids in draw order.
    pub fn clear_regions(&mut self) -> Vec<RegionId> {
        self.animations.clear();
        self.tools.cancel();
        let had_selection = self.tools.selected();
        let ids = self.store.clear();
        if let Some(id) = had_selection {
            self.tools.forget_region(id);
            self.store_selection_event(None);
        }
        self.flush_events();
        ids
    }

    pub fn region(&self, id: RegionId) -> Option<&FogRegion> {
        self.store.get(id)
    }

    /// All regions in draw order
    pub fn regions(&self) -> Vec<&FogRegion> {
        self.store.iter().collect()
    }

    /// Regions containing a world-space point, topmost first
    pub fn regions_at(&self, world: Vec2) -> Vec<&FogRegion> {
        self.store.regions_at(world)
    }

    /// Regions whose bounding box intersects a world-space rectangle
    pub fn regions_in(&self, rect: Rect) -> Vec<&FogRegion> {
        self.store.query(rect)
    }

    pub fn region_count(&self) -> usize {
        self.store.len()
    }

    pub fn is_animating(&self, id: RegionId) -> bool {
        self.animations.is_animating(id)
    }

    pub fn rebuild_index(&mut self) {
        self.store.rebuild_index();
    }

    pub fn set_index_config(&mut self, config: IndexConfig) {
        self.store.set_index_config(config);
        self.renderer.mark_dirty();
    }

    pub fn index_config(&self) -> &IndexConfig {
        self.store.index_config()
    }

    // ------------------------------------------------------------------------
    // Settings & viewport
    // ------------------------------------------------------------------------

    pub fn settings(&self) -> &FogSettings {
        &self.settings
    }

    /// Change settings through a closure. Values are clamped afterwards.
    ///
    /// Returns false if nothing changed.
    pub fn update_settings(&mut self, f: impl FnOnce(&mut FogSettings)) -> bool {
        let mut next = self.settings.clone();
        f(&mut next);
        next.sanitize();
        if next == self.settings {
            return false;
        }
        self.apply_settings(next);
        true
    }

    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        self.update_settings(|settings| settings.enabled = enabled)
    }

    fn apply_settings(&mut self, next: FogSettings) {
        let previous = std::mem::replace(&mut self.settings, next);

        if previous.quality != self.settings.quality {
            debug!(
                "Render quality {} -> {}",
                previous.quality, self.settings.quality
            );
            self.renderer.clear_cache();
        }
        self.renderer.mark_dirty();

        if previous.enabled != self.settings.enabled {
            info!(
                "Fog of war {}",
                if self.settings.enabled { "enabled" } else { "disabled" }
            );
            self.bus
                .emit(&FogEvent::FogOfWarToggled(self.settings.enabled));
        }
        self.bus
            .emit(&FogEvent::SettingsUpdated(self.settings.clone()));
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Returns false if the viewport is invalid or unchanged
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        if !viewport.is_valid() {
            debug!("Ignored invalid viewport {:?}", viewport);
            return false;
        }
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        self.renderer.mark_dirty();
        self.bus.emit(&FogEvent::ViewportUpdated(viewport));
        true
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.viewport.screen_to_world(screen)
    }

    // ------------------------------------------------------------------------
    // Tools & input (surface pixel coordinates)
    // ------------------------------------------------------------------------

    pub fn active_tool(&self) -> FogTool {
        self.tools.tool()
    }

    pub fn set_tool(&mut self, tool: FogTool) -> bool {
        let had_selection = self.tools.selected().is_some();
        if !self.tools.set_tool(tool) {
            return false;
        }
        debug!("Fog tool: {:?}", tool);
        self.renderer.mark_dirty();
        self.bus.emit(&FogEvent::ToolChanged(tool));
        if had_selection {
            self.bus.emit(&FogEvent::RegionSelected(None));
        }
        true
    }

    pub fn selected_region(&self) -> Option<RegionId> {
        self.tools.selected()
    }

    /// Select a region without going through the pointer. Returns false if the region
    /// does not exist or was already selected.
    pub fn select_region(&mut self, id: Option<RegionId>) -> bool {
        if id.is_some_and(|id| !self.store.contains(id)) {
            return false;
        }
        if !self.tools.select(id) {
            return false;
        }
        self.renderer.mark_dirty();
        self.bus.emit(&FogEvent::RegionSelected(id));
        true
    }

    pub fn drawing_preview(&self) -> Option<DrawingPreview> {
        self.tools.preview()
    }

    /// Whether a drawing or drag is in progress
    pub fn is_interacting(&self) -> bool {
        self.tools.is_busy()
    }

    pub fn pointer_down(&mut self, screen: Vec2, button: PointerButton) {
        let world = self.viewport.screen_to_world(screen);
        let commands = self.tools.pointer_down(world, button, &self.store);
        self.apply_commands(commands);
    }

    pub fn pointer_move(&mut self, screen: Vec2) {
        let world = self.viewport.screen_to_world(screen);
        let commands = self.tools.pointer_move(world, &self.store);
        if self.tools.drawing().is_active() {
            self.renderer.mark_dirty();
        }
        self.apply_commands(commands);
    }

    pub fn pointer_up(&mut self, screen: Vec2, button: PointerButton) {
        let world = self.viewport.screen_to_world(screen);
        let commands = self.tools.pointer_up(world, button);
        self.renderer.mark_dirty();
        self.apply_commands(commands);
    }

    pub fn key_pressed(&mut self, key: FogKey) {
        let commands = self.tools.key_pressed(key);
        self.renderer.mark_dirty();
        self.apply_commands(commands);
    }

    /// Finish the polygon being drawn, if it has enough points
    pub fn complete_drawing(&mut self) {
        let commands = self.tools.complete();
        self.renderer.mark_dirty();
        self.apply_commands(commands);
    }

    /// Drop the in-progress drawing or drag
    pub fn cancel_interaction(&mut self) -> bool {
        let cancelled = self.tools.cancel();
        if cancelled {
            self.renderer.mark_dirty();
        }
        cancelled
    }

    fn apply_commands(&mut self, commands: Vec<ToolCommand>) {
        for command in commands {
            match command {
                ToolCommand::Create { kind, points } => {
                    if let Err(e) = self.store.create(kind, &points, RegionOptions::default()) {
                        debug!("Discarded drawing: {}", e);
                    }
                }
                ToolCommand::Translate { id, shape } => {
                    self.store.update(id, RegionPatch::shape(shape));
                }
                ToolCommand::Reveal(id) => {
                    self.transition(id, 0.0, true);
                }
                ToolCommand::Hide(id) => {
                    self.transition(id, 1.0, true);
                }
                ToolCommand::Remove(id) => {
                    self.remove_region(id);
                }
                ToolCommand::Select(selection) => {
                    self.renderer.mark_dirty();
                    self.store_selection_event(selection);
                }
                ToolCommand::SwitchTool(tool) => {
                    self.set_tool(tool);
                }
            }
        }
        self.flush_events();
    }

    fn store_selection_event(&mut self, selection: Option<RegionId>) {
        self.flush_events();
        self.bus.emit(&FogEvent::RegionSelected(selection));
    }

    // ------------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------------

    /// Advance running transitions to `now_ms`
    pub fn advance(&mut self, now_ms: f64) {
        self.clock_ms = Some(now_ms);
        if self.animations.is_idle() {
            return;
        }

        let completed = self.animations.tick(now_ms, &mut self.store);
        self.renderer.mark_dirty();
        for (id, opacity) in completed {
            self.store.finish_transition(id);
            self.flush_events();
            self.bus
                .emit(&FogEvent::RegionAnimationComplete { id, opacity });
        }
    }

    /// Draw a frame if anything changed
    pub fn render(&mut self, now_ms: f64) -> FrameOutcome {
        let input = FrameInput {
            store: &self.store,
            settings: &self.settings,
            viewport: &self.viewport,
            preview: self.tools.preview(),
            highlight: self.tools.selected(),
            busy: self.tools.is_busy() || !self.animations.is_idle(),
            now_ms,
        };
        self.renderer.render(self.surface.as_deref_mut(), input)
    }

    /// Advance and render in one call, the usual per-frame entry point
    pub fn frame(&mut self, now_ms: f64) -> FrameOutcome {
        self.advance(now_ms);
        self.render(now_ms)
    }

    pub fn metrics(&self) -> FogMetrics {
        FogMetrics {
            fps: self.renderer.fps(),
            total_regions: self.store.len(),
            visible_regions: self.renderer.visible_regions(),
            cache_entries: self.renderer.cache_len(),
            pattern_tiles: self.renderer.pattern_count(),
            gpu_active: self.renderer.gpu_active(),
            animating: self.animations.active_count(),
        }
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    pub fn export_snapshot(&self) -> FogSnapshot {
        FogSnapshot::new(
            self.store.iter().cloned().collect(),
            self.settings.clone(),
            self.viewport,
        )
    }

    pub fn export_json(&self) -> Result<String, FogError> {
        self.export_snapshot().to_json()
    }

    /// Replace all state with a snapshot.
    ///
    /// The snapshot is validated as a whole first; on error nothing changes.
    pub fn import_snapshot(&mut self, snapshot: FogSnapshot) -> Result<usize, FogError> {
        if let Err(e) = snapshot.validate() {
            warn!("Rejected fog snapshot: {}", e);
            return Err(e);
        }

        let FogSnapshot {
            regions,
            settings,
            viewport,
            ..
        } = snapshot;
        let region_count = regions.len();

        self.animations.clear();
        self.tools.cancel();
        if let Some(id) = self.tools.selected() {
            self.tools.forget_region(id);
            self.bus.emit(&FogEvent::RegionSelected(None));
        }

        self.store.replace_all(regions);
        self.store.drain_events();
        self.renderer.invalidate_all();

        if settings != self.settings {
            self.apply_settings(settings);
        }
        self.set_viewport(viewport);

        info!("Imported fog snapshot with {} regions", region_count);
        self.bus.emit(&FogEvent::DataImported { region_count });
        Ok(region_count)
    }

    pub fn import_json(&mut self, json: &str) -> Result<usize, FogError> {
        let snapshot = FogSnapshot::from_json(json).inspect_err(|e| {
            warn!("Rejected fog snapshot: {}", e);
        })?;
        self.import_snapshot(snapshot)
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    pub fn subscribe(
        &mut self,
        kind: FogEventKind,
        handler: impl FnMut(&FogEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(kind, handler)
    }

    pub fn subscribe_all(
        &mut self,
        handler: impl FnMut(&FogEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe_all(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Publish queued store events and invalidate what they touched
    fn flush_events(&mut self) {
        for event in self.store.drain_events() {
            match &event {
                FogEvent::RegionCreated(region) | FogEvent::RegionUpdated(region) => {
                    self.renderer.invalidate(region.id);
                }
                FogEvent::RegionRemoved(id) => {
                    self.renderer.invalidate(*id);
                }
                FogEvent::RegionsCleared(_) => {
                    self.renderer.invalidate_all();
                }
                _ if event.affects_regions() => self.renderer.mark_dirty(),
                _ => {}
            }
            self.bus.emit(&event);
        }
    }
}
