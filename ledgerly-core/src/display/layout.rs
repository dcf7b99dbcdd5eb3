//! Placement of overlay panels above bottom-anchored host elements

/// Bottom offset used when nothing obstructs the bottom edge
pub const DEFAULT_BOTTOM_OFFSET: u32 = 96;

/// Space kept between an obstructing element and the panel
pub const OBSTRUCTION_GAP: u32 = 12;

/// Measurement interface provided by the host UI
pub trait LayoutProbe: Send + Sync {
    /// Height of the fixed element anchored to the bottom edge, if any
    fn obstruction_height(&self) -> Option<u32>;
}

/// Probe returning a fixed measurement
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLayout(pub Option<u32>);

impl LayoutProbe for FixedLayout {
    fn obstruction_height(&self) -> Option<u32> {
        self.0
    }
}

/// Offset from the bottom edge at which a panel avoids the obstruction
pub fn bottom_offset(probe: &dyn LayoutProbe) -> u32 {
    match probe.obstruction_height() {
        Some(height) => height.saturating_add(OBSTRUCTION_GAP),
        None => DEFAULT_BOTTOM_OFFSET,
    }
}
