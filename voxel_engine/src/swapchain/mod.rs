//! Swapchain state machine: image acquisition, submission and presentation

pub mod swapchain;

pub use swapchain::{Swapchain, SwapchainState};
