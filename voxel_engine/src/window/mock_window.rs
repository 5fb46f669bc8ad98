/// MockWindow - scripted Window for frame-coordinator tests

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::graphics_device::Extent2D;
use crate::window::Window;

pub struct MockWindow {
    extent: Extent2D,
    /// Extents reported by the next `extent()` calls before `extent` is used
    scripted_extents: RefCell<VecDeque<Extent2D>>,
    resized: bool,
    should_close: bool,
    extent_queries: Cell<usize>,
    wait_event_calls: usize,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: Extent2D::new(width, height),
            scripted_extents: RefCell::new(VecDeque::new()),
            resized: false,
            should_close: false,
            extent_queries: Cell::new(0),
            wait_event_calls: 0,
        }
    }

    /// Report these extents first, then the steady extent
    pub fn script_extents(&self, extents: impl IntoIterator<Item = Extent2D>) {
        self.scripted_extents.borrow_mut().extend(extents);
    }

    pub fn set_extent(&mut self, width: u32, height: u32) {
        self.extent = Extent2D::new(width, height);
    }

    /// Resize and raise the resized flag, like a real framebuffer resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.set_extent(width, height);
        self.resized = true;
    }

    pub fn close(&mut self) {
        self.should_close = true;
    }

    pub fn extent_queries(&self) -> usize {
        self.extent_queries.get()
    }

    pub fn wait_event_calls(&self) -> usize {
        self.wait_event_calls
    }
}

impl Window for MockWindow {
    fn extent(&self) -> Extent2D {
        self.extent_queries.set(self.extent_queries.get() + 1);
        self.scripted_extents.borrow_mut().pop_front().unwrap_or(self.extent)
    }

    fn was_resized(&self) -> bool {
        self.resized
    }

    fn reset_resized_flag(&mut self) {
        self.resized = false;
    }

    fn should_close(&self) -> bool {
        self.should_close
    }

    fn wait_events(&mut self) {
        self.wait_event_calls += 1;
    }
}
