/// SPIR-V loading and push constant reflection

use std::io::Cursor;
use std::path::Path;

use voxel_engine::voxel::device::PushConstantRange;
use voxel_engine::voxel::{Error, Result};
use voxel_engine::{engine_err, engine_error};

const SOURCE: &str = "voxel::vulkan";

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Read a compiled SPIR-V file into words
pub fn load_spirv(path: impl AsRef<Path>) -> Result<Vec<u32>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        engine_error!(SOURCE, "Failed to read shader '{}': {}", path.display(), e);
        Error::InvalidResource(format!("Failed to read shader '{}': {}", path.display(), e))
    })?;
    spirv_from_bytes(&bytes).map_err(|e| {
        engine_error!(SOURCE, "Invalid shader '{}': {}", path.display(), e);
        e
    })
}

/// Decode SPIR-V bytes, accepting either endianness
pub fn spirv_from_bytes(bytes: &[u8]) -> Result<Vec<u32>> {
    let words = ash::util::read_spv(&mut Cursor::new(bytes))
        .map_err(|e| Error::InvalidResource(format!("Malformed SPIR-V: {}", e)))?;
    match words.first() {
        Some(&SPIRV_MAGIC) => Ok(words),
        Some(&other) => Err(Error::InvalidResource(format!("Bad SPIR-V magic number {:#010x}", other))),
        None => Err(Error::InvalidResource("Empty SPIR-V module".to_string())),
    }
}

/// Size in bytes of the push constant block used by `code`, if any
pub(crate) fn reflect_push_constant_size(code: &[u32]) -> Result<Option<u32>> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!(SOURCE, "SPIR-V reflection failed: {:?}", e))?;

    let mut size = None;
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            if let spirq::var::Variable::PushConstant { ty, .. } = var {
                let nbyte = ty.nbyte().map(|n| n as u32).unwrap_or(0);
                size = Some(size.map_or(nbyte, |s: u32| s.max(nbyte)));
            }
        }
    }
    Ok(size)
}

/// Fail when the shaders read more push constant bytes than the layout declares
pub(crate) fn check_push_constant_size(reflected: Option<u32>, ranges: &[PushConstantRange]) -> Result<()> {
    let Some(reflected) = reflected else {
        return Ok(());
    };
    let declared = ranges.iter().map(|r| r.offset + r.size).max().unwrap_or(0);
    if reflected > declared {
        return Err(engine_err!(
            SOURCE,
            "Shaders use a {} byte push constant block but the pipeline layout declares {} bytes",
            reflected,
            declared
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "vulkan_shader_tests.rs"]
mod tests;
