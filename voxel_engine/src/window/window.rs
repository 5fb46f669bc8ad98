/// Window trait - what the frame coordinator needs from the platform window

use crate::graphics_device::Extent2D;

pub trait Window {
    /// Current framebuffer size in pixels; empty while minimized
    fn extent(&self) -> Extent2D;

    /// True once the framebuffer was resized since the last `reset_resized_flag`
    fn was_resized(&self) -> bool;

    fn reset_resized_flag(&mut self);

    fn should_close(&self) -> bool;

    /// Block until at least one platform event has been processed
    fn wait_events(&mut self);
}
