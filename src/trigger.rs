use std::ops::Range;

use crate::controller::PaginationController;

/// The row the trigger watches: the last anime currently rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub id: u64,
    pub index: usize,
}

/// Source of "anchor became visible" notifications.
pub trait Viewport {
    fn observe(&mut self, anchor: Anchor);
    fn disconnect(&mut self);
}

/// Viewport over the terminal list widget.
///
/// Level-triggered: every call to [`ListViewport::intersecting`] reports the
/// observed anchor while its row is inside the visible window.
#[derive(Debug, Default)]
pub struct ListViewport {
    observed: Option<Anchor>,
}

impl ListViewport {
    pub fn intersecting(&self, visible: Range<usize>) -> Option<Anchor> {
        self.observed.filter(|a| visible.contains(&a.index))
    }
}

impl Viewport for ListViewport {
    fn observe(&mut self, anchor: Anchor) {
        self.observed = Some(anchor);
    }

    fn disconnect(&mut self) {
        self.observed = None;
    }
}

/// Turns the anchor scrolling into view into exactly one page advance.
#[derive(Debug, Default)]
pub struct ScrollTrigger<V: Viewport> {
    viewport: V,
    armed: Option<Anchor>,
}

impl<V: Viewport> ScrollTrigger<V> {
    pub fn new(viewport: V) -> Self {
        Self {
            viewport,
            armed: None,
        }
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    #[cfg(test)]
    pub fn armed(&self) -> Option<Anchor> {
        self.armed
    }

    /// Re-arm on the given anchor. Called after every render; while a fetch is
    /// outstanding this only tears down the previous observation.
    pub fn attach(&mut self, anchor: Option<Anchor>, controller: &PaginationController) {
        self.detach();
        if controller.is_loading() {
            return;
        }
        if let Some(anchor) = anchor {
            self.viewport.observe(anchor);
            self.armed = Some(anchor);
        }
    }

    /// Release the current observation, if any.
    pub fn detach(&mut self) {
        if self.armed.take().is_some() {
            self.viewport.disconnect();
        }
    }

    /// Handle the viewport reporting `anchor` as visible. Fires at most once
    /// per `attach`.
    pub fn on_intersection(
        &mut self,
        anchor: Anchor,
        controller: &mut PaginationController,
    ) -> bool {
        if self.armed != Some(anchor) || !controller.has_more() {
            return false;
        }
        self.detach();
        tracing::debug!(anchor = anchor.id, "anchor visible, advancing");
        controller.advance_page()
    }
}
