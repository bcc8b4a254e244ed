//! DOM-free "click outside" behaviour used to dismiss menus and popovers.
//!
//! The first click observed after attachment is always ignored: it is
//! usually the click that opened the bound element.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Area that can tell whether a click target falls inside it.
pub trait Region {
    /// Click target type (element handle, point, ...).
    type Target: ?Sized;

    /// Whether `target` lies within this region.
    fn contains(&self, target: &Self::Target) -> bool;
}

/// Axis-aligned rectangle in cell or pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Region for Rect {
    type Target = (i32, i32);

    fn contains(&self, target: &(i32, i32)) -> bool {
        let (px, py) = *target;
        let right = i64::from(self.x) + i64::from(self.width);
        let bottom = i64::from(self.y) + i64::from(self.height);
        px >= self.x && py >= self.y && i64::from(px) < right && i64::from(py) < bottom
    }
}

/// What happened to a click delivered to [`ClickOutside::handle_click`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// First click after attachment; ignored.
    Suppressed,
    /// Click landed inside the bound region.
    Inside,
    /// Click landed outside; the notification was dispatched.
    Outside,
}

/// Behaviour bound to one region that reports clicks landing outside it.
pub struct ClickOutside<R> {
    region: R,
    initial_click: AtomicBool,
    on_outside: Box<dyn Fn() + Send + Sync>,
}

impl<R: Region> ClickOutside<R> {
    /// Attach the behaviour to `region`, dispatching to `on_outside`.
    pub fn attach<F>(region: R, on_outside: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            region,
            initial_click: AtomicBool::new(true),
            on_outside: Box::new(on_outside),
        }
    }

    /// Feed a document-level click into the behaviour.
    pub fn handle_click(&self, target: &R::Target) -> ClickOutcome {
        if self.initial_click.swap(false, Ordering::AcqRel) {
            return ClickOutcome::Suppressed;
        }
        if self.region.contains(target) {
            return ClickOutcome::Inside;
        }
        (self.on_outside)();
        ClickOutcome::Outside
    }

    /// The bound region.
    pub const fn region(&self) -> &R {
        &self.region
    }
}

impl<R: fmt::Debug> fmt::Debug for ClickOutside<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClickOutside")
            .field("region", &self.region)
            .field("initial_click", &self.initial_click.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
