//! Fallible wrappers around wgpu's shader and pipeline creation.
//!
//! wgpu reports WGSL compile and pipeline link problems through error
//! scopes rather than return values. These helpers capture that into a
//! `Result` carrying the driver's diagnostic text, so startup can refuse to
//! run with a broken program instead of dispatching into it.

use anyhow::{anyhow, Result};
use wgpu::Device;

/// Compiles a WGSL module, surfacing validation errors as a `Result`.
pub fn create_shader_module(
    device: &Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule> {
    with_validation(device, label, || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })
}

/// Runs `create` inside a validation error scope and turns any reported
/// error into `Err` tagged with `label`.
pub fn with_validation<T>(device: &Device, label: &str, create: impl FnOnce() -> T) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(error) => Err(anyhow!("{label}: {error}")),
    }
}
