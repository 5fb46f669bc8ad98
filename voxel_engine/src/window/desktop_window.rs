/// DesktopWindow - winit window driven with `pump_app_events`
///
/// The event loop is pumped by the application (`poll_events` once per frame,
/// `wait_events` while minimized) instead of handing control to `run_app`, so
/// the frame loop stays an ordinary `while` loop.

use std::time::Duration;

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use rustc_hash::FxHashSet;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window as WinitWindow, WindowId};

use crate::error::{Error, Result};
use crate::graphics_device::Extent2D;
use crate::window::Window;
use crate::{engine_debug, engine_error};

/// Event-handler side of the window
struct WindowState {
    title: String,
    initial_size: (u32, u32),
    window: Option<WinitWindow>,
    extent: Extent2D,
    resized: bool,
    close_requested: bool,
    pressed_keys: FxHashSet<KeyCode>,
    creation_error: Option<String>,
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = WinitWindow::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.initial_size.0, self.initial_size.1));
        match event_loop.create_window(attributes) {
            Ok(window) => {
                let size = window.inner_size();
                self.extent = Extent2D::new(size.width, size.height);
                self.window = Some(window);
            }
            Err(e) => {
                engine_error!("voxel::Window", "Failed to create window: {}", e);
                self.creation_error = Some(e.to_string());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                engine_debug!("voxel::Window", "Framebuffer resized to {}x{}", size.width, size.height);
                self.extent = Extent2D::new(size.width, size.height);
                self.resized = true;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            self.pressed_keys.insert(code);
                        }
                        ElementState::Released => {
                            self.pressed_keys.remove(&code);
                        }
                    }
                }
            }
            WindowEvent::Focused(false) => {
                self.pressed_keys.clear();
            }
            _ => {}
        }
    }
}

pub struct DesktopWindow {
    event_loop: EventLoop<()>,
    state: WindowState,
}

impl DesktopWindow {
    /// Open a window with the given title and logical size
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        let event_loop = EventLoop::new().map_err(|e| {
            engine_error!("voxel::Window", "Failed to create event loop: {}", e);
            Error::InitializationFailed(format!("Failed to create event loop: {}", e))
        })?;

        let mut window = Self {
            event_loop,
            state: WindowState {
                title: title.to_string(),
                initial_size: (width, height),
                window: None,
                extent: Extent2D::new(width, height),
                resized: false,
                close_requested: false,
                pressed_keys: FxHashSet::default(),
                creation_error: None,
            },
        };

        // The window is created from the first `resumed` callback
        window.pump(Some(Duration::ZERO));
        if let Some(message) = window.state.creation_error.take() {
            return Err(Error::InitializationFailed(format!("Failed to create window: {}", message)));
        }
        if window.state.window.is_none() {
            return Err(Error::InitializationFailed("Window was not created".to_string()));
        }
        window.state.resized = false;
        Ok(window)
    }

    /// Process pending events without blocking
    pub fn poll_events(&mut self) {
        self.pump(Some(Duration::ZERO));
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.state.pressed_keys.contains(&key)
    }

    pub fn request_close(&mut self) {
        self.state.close_requested = true;
    }

    fn pump(&mut self, timeout: Option<Duration>) {
        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(timeout, &mut self.state) {
            engine_debug!("voxel::Window", "Event loop exited with code {}", code);
            self.state.close_requested = true;
        }
    }
}

impl Window for DesktopWindow {
    fn extent(&self) -> Extent2D {
        self.state.extent
    }

    fn was_resized(&self) -> bool {
        self.state.resized
    }

    fn reset_resized_flag(&mut self) {
        self.state.resized = false;
    }

    fn should_close(&self) -> bool {
        self.state.close_requested
    }

    fn wait_events(&mut self) {
        self.pump(None);
    }
}

impl HasWindowHandle for DesktopWindow {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        self.state.window.as_ref().ok_or(HandleError::Unavailable)?.window_handle()
    }
}

impl HasDisplayHandle for DesktopWindow {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        self.event_loop.display_handle()
    }
}
