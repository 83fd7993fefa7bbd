//! Recording surface.
//!
//! Draw calls are stored as a list of commands behind a shared lock. The Bevy host
//! replays the list with gizmos; tests read it back directly.

use std::sync::{Arc, Mutex, MutexGuard};

use super::surface::{FillStyle, FogSurface, ScreenPath, StrokeStyle, SurfaceError};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Fill { path: ScreenPath, style: FillStyle },
    Stroke { path: ScreenPath, style: StrokeStyle },
}

#[derive(Debug, Default)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
    /// Incremented on every presented frame, lets readers skip unchanged lists
    pub generation: u64,
    /// Commands recorded since the last clear, not yet presented
    pending: Vec<DrawCommand>,
}

pub type SharedDisplayList = Arc<Mutex<DisplayList>>;

/// [`FogSurface`] that records into a [`DisplayList`].
///
/// Clones share the same list, so a host can keep one clone for reading after handing
/// the other to the engine.
#[derive(Debug, Clone, Default)]
pub struct DisplayListSurface {
    list: SharedDisplayList,
}

impl DisplayListSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> SharedDisplayList {
        self.list.clone()
    }

    fn lock(&self) -> Result<MutexGuard<'_, DisplayList>, SurfaceError> {
        self.list.lock().map_err(|_| SurfaceError::Poisoned)
    }

    /// Copy of the last presented frame
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.lock()
            .map(|list| list.commands.clone())
            .unwrap_or_default()
    }

    pub fn generation(&self) -> u64 {
        self.lock().map(|list| list.generation).unwrap_or_default()
    }
}

impl FogSurface for DisplayListSurface {
    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.lock()?.pending.clear();
        Ok(())
    }

    fn fill_path(&mut self, path: &ScreenPath, style: &FillStyle) -> Result<(), SurfaceError> {
        self.lock()?.pending.push(DrawCommand::Fill {
            path: path.clone(),
            style: style.clone(),
        });
        Ok(())
    }

    fn stroke_path(
        &mut self,
        path: &ScreenPath,
        style: &StrokeStyle,
    ) -> Result<(), SurfaceError> {
        self.lock()?.pending.push(DrawCommand::Stroke {
            path: path.clone(),
            style: style.clone(),
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        let mut list = self.lock()?;
        list.commands = std::mem::take(&mut list.pending);
        list.generation += 1;
        Ok(())
    }
}
