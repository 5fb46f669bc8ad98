//! Platform window abstraction and its winit implementation

pub mod desktop_window;
pub mod window;

#[cfg(test)]
pub mod mock_window;

pub use desktop_window::DesktopWindow;
pub use window::Window;
