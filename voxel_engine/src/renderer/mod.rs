//! Frame coordination
//!
//! `Renderer` drives the acquire / record / submit / present cycle over a
//! `Swapchain`; `FrameInfo` and `GlobalUbo` carry per-frame data to the
//! render systems.

mod frame_info;
mod renderer;

pub use frame_info::{FrameInfo, GlobalUbo, PointLight, MAX_LIGHTS};
pub use renderer::{FrameEnd, Renderer};
