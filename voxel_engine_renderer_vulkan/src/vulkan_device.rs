/// VulkanDevice - instance, surface, logical device, queues and command pool
///
/// Creation order: instance (with validation layers and debug messenger when
/// enabled), window surface, physical device selection, logical device,
/// queues, command pool. `Drop` tears everything down in reverse after
/// waiting for the device to go idle.

use std::cell::RefCell;
use std::ffi::{CStr, CString};

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashMap;
use voxel_engine::voxel::device::{MemoryType, PushConstantRange};
use voxel_engine::voxel::{Engine, Error, RendererConfig, Result};
use voxel_engine::{engine_debug, engine_error, engine_info, engine_warn};

use crate::debug;
use crate::vulkan_format::memory_properties_from_vk;

const SOURCE: &str = "voxel::vulkan";

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Queue families used for rendering and presentation (possibly the same)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    /// Distinct family indices, graphics first
    pub fn unique(&self) -> Vec<u32> {
        let mut families: Vec<u32> = self.graphics.into_iter().chain(self.present).collect();
        families.dedup();
        families
    }
}

/// Map an ash error into an initialization failure, logging it
fn init_error(what: &str, e: impl std::fmt::Debug) -> Error {
    engine_error!(SOURCE, "{}: {:?}", what, e);
    Error::InitializationFailed(format!("{}: {:?}", what, e))
}

pub struct VulkanDevice {
    _entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,
    pub(crate) graphics_queue: vk::Queue,
    pub(crate) present_queue: vk::Queue,
    queue_families: QueueFamilyIndices,
    pub(crate) command_pool: vk::CommandPool,
    pub(crate) memory_types: Vec<MemoryType>,
    pub(crate) min_uniform_buffer_offset_alignment: u64,
    pub(crate) non_coherent_atom_size: u64,
    device_name: String,
    /// Push constant ranges declared per pipeline layout, checked against shader reflection
    pub(crate) layout_push_ranges: RefCell<FxHashMap<vk::PipelineLayout, Vec<PushConstantRange>>>,
}

impl VulkanDevice {
    /// Create the device and a presentation surface for `window`
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &RendererConfig) -> Result<Self> {
        let validation = config.enable_validation && cfg!(feature = "vulkan-validation");
        if config.enable_validation && !validation {
            engine_warn!(
                SOURCE,
                "Validation requested but the vulkan-validation feature is disabled"
            );
        }

        unsafe {
            let entry = ash::Entry::load().map_err(|e| init_error("Failed to load Vulkan library", e))?;

            let display_handle = window
                .display_handle()
                .map_err(|e| init_error("Failed to get display handle", e))?;
            let window_handle = window
                .window_handle()
                .map_err(|e| init_error("Failed to get window handle", e))?;

            let instance = Self::create_instance(&entry, display_handle.as_raw(), &config.app_name, config.app_version, validation)?;

            let debug_messenger = if validation {
                match Self::create_debug_messenger(&entry, &instance) {
                    Ok(messenger) => Some(messenger),
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                None
            };

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            let surface = match ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            ) {
                Ok(surface) => surface,
                Err(e) => {
                    Self::destroy_instance(&instance, &debug_messenger);
                    return Err(init_error("Failed to create surface", e));
                }
            };

            let rest = Self::create_logical_device(&instance, &surface_loader, surface);
            let (physical_device, queue_families, device) = match rest {
                Ok(parts) => parts,
                Err(e) => {
                    surface_loader.destroy_surface(surface, None);
                    Self::destroy_instance(&instance, &debug_messenger);
                    return Err(e);
                }
            };

            // Both families are present once the device was accepted
            let graphics_family = queue_families.graphics.unwrap_or_default();
            let present_family = queue_families.present.unwrap_or_default();
            let graphics_queue = device.get_device_queue(graphics_family, 0);
            let present_queue = device.get_device_queue(present_family, 0);

            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let command_pool = match device.create_command_pool(&pool_info, None) {
                Ok(pool) => pool,
                Err(e) => {
                    device.destroy_device(None);
                    surface_loader.destroy_surface(surface, None);
                    Self::destroy_instance(&instance, &debug_messenger);
                    return Err(init_error("Failed to create command pool", e));
                }
            };

            let memory = instance.get_physical_device_memory_properties(physical_device);
            let memory_types = memory.memory_types[..memory.memory_type_count as usize]
                .iter()
                .map(|t| MemoryType {
                    properties: memory_properties_from_vk(t.property_flags),
                    heap_index: t.heap_index,
                })
                .collect();

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "Unknown GPU".to_string());
            engine_info!(
                SOURCE,
                "Using '{}' (graphics family {}, present family {})",
                device_name,
                graphics_family,
                present_family
            );

            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

            Ok(Self {
                _entry: entry,
                instance,
                debug_messenger,
                surface_loader,
                surface,
                physical_device,
                device,
                swapchain_loader,
                graphics_queue,
                present_queue,
                queue_families,
                command_pool,
                memory_types,
                min_uniform_buffer_offset_alignment: properties.limits.min_uniform_buffer_offset_alignment,
                non_coherent_atom_size: properties.limits.non_coherent_atom_size.max(1),
                device_name,
                layout_push_ranges: RefCell::new(FxHashMap::default()),
            })
        }
    }

    unsafe fn create_instance(
        entry: &ash::Entry,
        display: raw_window_handle::RawDisplayHandle,
        app_name: &str,
        app_version: (u32, u32, u32),
        validation: bool,
    ) -> Result<ash::Instance> {
        let app_name = CString::new(app_name)
            .map_err(|e| Error::InitializationFailed(format!("Invalid application name: {}", e)))?;
        let engine_name = CString::new(Engine::NAME)
            .map_err(|e| Error::InitializationFailed(format!("Invalid engine name: {}", e)))?;
        let (major, minor, patch) = app_version;
        let (engine_major, engine_minor, engine_patch) = Engine::VERSION;

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, engine_major, engine_minor, engine_patch))
            .api_version(vk::API_VERSION_1_1);

        let mut extension_names = ash_window::enumerate_required_extensions(display)
            .map_err(|e| init_error("Failed to get required instance extensions", e))?
            .to_vec();

        let mut layer_names = Vec::new();
        if validation {
            let available = entry
                .enumerate_instance_layer_properties()
                .map_err(|e| init_error("Failed to enumerate instance layers", e))?;
            let has_layer = available
                .iter()
                .any(|layer| layer.layer_name_as_c_str() == Ok(VALIDATION_LAYER));
            if !has_layer {
                engine_error!(SOURCE, "Validation layers requested, but not available");
                return Err(Error::InitializationFailed(
                    "Validation layers requested, but not available".to_string(),
                ));
            }
            layer_names.push(VALIDATION_LAYER.as_ptr());
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        entry
            .create_instance(&create_info, None)
            .map_err(|e| init_error("Failed to create instance", e))
    }

    unsafe fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
        debug::reset_validation_stats();
        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
        let info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(debug::messenger_severities())
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug::vulkan_debug_callback));
        let messenger = debug_utils
            .create_debug_utils_messenger(&info, None)
            .map_err(|e| init_error("Failed to create debug messenger", e))?;
        engine_debug!(SOURCE, "Validation layers enabled");
        Ok((debug_utils, messenger))
    }

    /// Pick the first suitable GPU and create the logical device on it
    unsafe fn create_logical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<(vk::PhysicalDevice, QueueFamilyIndices, ash::Device)> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| init_error("Failed to enumerate physical devices", e))?;
        engine_debug!(SOURCE, "Found {} physical device(s)", physical_devices.len());

        let (physical_device, queue_families) = physical_devices
            .into_iter()
            .find_map(|pd| {
                let families = Self::find_queue_families(instance, surface_loader, surface, pd);
                Self::is_device_suitable(instance, surface_loader, surface, pd, &families).then_some((pd, families))
            })
            .ok_or_else(|| {
                engine_error!(SOURCE, "Failed to find a suitable GPU");
                Error::InitializationFailed("Failed to find a suitable GPU".to_string())
            })?;

        let priorities = [1.0];
        let queue_infos: Vec<_> = queue_families
            .unique()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
            })
            .collect();

        let extension_names = [ash::khr::swapchain::NAME.as_ptr()];
        let features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);
        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = instance
            .create_device(physical_device, &create_info, None)
            .map_err(|e| init_error("Failed to create logical device", e))?;
        Ok((physical_device, queue_families, device))
    }

    unsafe fn find_queue_families(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
    ) -> QueueFamilyIndices {
        let mut indices = QueueFamilyIndices::default();
        let families = instance.get_physical_device_queue_family_properties(physical_device);
        for (i, family) in families.iter().enumerate() {
            let i = i as u32;
            if family.queue_count > 0 && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                indices.graphics.get_or_insert(i);
            }
            let present = surface_loader
                .get_physical_device_surface_support(physical_device, i, surface)
                .unwrap_or(false);
            if family.queue_count > 0 && present {
                indices.present.get_or_insert(i);
            }
            if indices.is_complete() {
                break;
            }
        }
        indices
    }

    unsafe fn is_device_suitable(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
        families: &QueueFamilyIndices,
    ) -> bool {
        if !families.is_complete() {
            return false;
        }

        let has_swapchain = instance
            .enumerate_device_extension_properties(physical_device)
            .map(|extensions| {
                extensions
                    .iter()
                    .any(|ext| ext.extension_name_as_c_str() == Ok(ash::khr::swapchain::NAME))
            })
            .unwrap_or(false);
        if !has_swapchain {
            return false;
        }

        let formats = surface_loader
            .get_physical_device_surface_formats(physical_device, surface)
            .unwrap_or_default();
        let present_modes = surface_loader
            .get_physical_device_surface_present_modes(physical_device, surface)
            .unwrap_or_default();
        if formats.is_empty() || present_modes.is_empty() {
            return false;
        }

        instance.get_physical_device_features(physical_device).sampler_anisotropy == vk::TRUE
    }

    unsafe fn destroy_instance(
        instance: &ash::Instance,
        debug_messenger: &Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    ) {
        if let Some((debug_utils, messenger)) = debug_messenger {
            debug_utils.destroy_debug_utils_messenger(*messenger, None);
        }
        instance.destroy_instance(None);
    }

    // ===== ACCESSORS =====

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn queue_families(&self) -> QueueFamilyIndices {
        self.queue_families
    }

    pub fn validation_enabled(&self) -> bool {
        self.debug_messenger.is_some()
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                engine_warn!(SOURCE, "device_wait_idle failed before teardown: {:?}", e);
            }
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            Self::destroy_instance(&self.instance, &self.debug_messenger);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;
