//! Message list windowing.
//!
//! One pure function decides which slice of the message log the view
//! materializes. Below the threshold the window is simply the full range;
//! above it only the viewport plus an overscan margin is rendered. Both
//! cases report the same total height and offset formula, so nothing jumps
//! when the count crosses the threshold.

use std::ops::Range;

use crate::config::{DEFAULT_ITEM_HEIGHT_PX, DEFAULT_OVERSCAN, DEFAULT_VIRTUALIZE_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowConfig {
    /// Windowing starts once the count exceeds this.
    pub threshold: usize,
    /// Fixed row height in pixels. Must be positive.
    pub item_height: f64,
    /// Extra rows rendered on each side of the viewport.
    pub overscan: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { threshold: DEFAULT_VIRTUALIZE_THRESHOLD, item_height: DEFAULT_ITEM_HEIGHT_PX, overscan: DEFAULT_OVERSCAN }
    }
}

/// Scroll position and size of the list container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_top: f64,
    pub container_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualWindow {
    pub start_index: usize,
    pub end_index: usize,
    /// Where the first materialized row sits in the full layout.
    pub offset_px: f64,
    /// Height of the full, unwindowed list.
    pub total_height_px: f64,
    pub virtualized: bool,
}

impl VirtualWindow {
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    /// The materialized rows of `items`.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end_index.min(items.len());
        let start = self.start_index.min(end);
        &items[start..end]
    }
}

/// What the message list should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListLayout {
    /// No messages yet.
    Welcome,
    Items(VirtualWindow),
}

impl ListLayout {
    #[must_use]
    pub fn window(&self) -> Option<&VirtualWindow> {
        match self {
            Self::Welcome => None,
            Self::Items(window) => Some(window),
        }
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compute_layout(total: usize, viewport: Viewport, config: &WindowConfig) -> ListLayout {
    if total == 0 {
        return ListLayout::Welcome;
    }

    let h = config.item_height;
    let total_height_px = total as f64 * h;

    if total <= config.threshold {
        return ListLayout::Items(VirtualWindow {
            start_index: 0,
            end_index: total,
            offset_px: 0.0,
            total_height_px,
            virtualized: false,
        });
    }

    let visible_start = (viewport.scroll_top.max(0.0) / h).floor() as usize;
    let visible_rows = (viewport.container_height.max(0.0) / h).ceil() as usize;
    let visible_end = visible_start
        .saturating_add(visible_rows)
        .saturating_add(config.overscan)
        .min(total);
    // Clamped to the end so a scroll offset past the list yields an empty window.
    let start_index = visible_start.saturating_sub(config.overscan).min(visible_end);

    ListLayout::Items(VirtualWindow {
        start_index,
        end_index: visible_end,
        offset_px: start_index as f64 * h,
        total_height_px,
        virtualized: true,
    })
}

#[cfg(test)]
#[path = "window_test.rs"]
mod tests;
