use anyhow::Result;
use wgpu::{util::DeviceExt, BindGroup, BindGroupLayout, Buffer, Device, Queue};

use super::buffers::{GeometryBuffer, Params};
use super::render_target::RenderTarget;
use super::shader;

/// Workgroup edge length, fixed by contract with `compute_shader.wgsl`.
/// A design constant rather than a hardware query; workgroups past the image
/// edge are cut off by the shader's own bounds check.
pub const WORKGROUP_SIZE: u32 = 16;

/// Smallest workgroup count whose tiles fully cover `pixels`.
pub fn workgroup_count(pixels: u32) -> u32 {
    (pixels + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE
}

macro_rules! bind_group_entry {
    ($binding:expr, $resource:expr) => {
        wgpu::BindGroupEntry {
            binding: $binding,
            resource: $resource.as_entire_binding(),
        }
    };
}

const PARAMS_BIND: u32 = 0;
const SCENE_BIND: u32 = 1;
const OUTPUT_BIND: u32 = 2;

/// Owns the ray-tracing compute pipeline and the frame-parameter uniform,
/// and records one dispatch per frame covering the render target.
pub struct ComputeDispatcher {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: BindGroupLayout,
    params_buffer: Buffer,
}

impl ComputeDispatcher {
    pub fn new(device: &Device, params: &Params) -> Result<ComputeDispatcher> {
        let module = shader::create_shader_module(
            device,
            "raytrace compute shader",
            include_str!("compute_shader.wgsl"),
        )?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Compute Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: PARAMS_BIND,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: SCENE_BIND,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: OUTPUT_BIND,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba32Float,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Compute Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = shader::with_validation(device, "raytrace compute pipeline", || {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Compute Pipeline"),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: "main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            })
        })?;

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Params Buffer"),
            contents: bytemuck::bytes_of(params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Ok(ComputeDispatcher {
            pipeline,
            bind_group_layout,
            params_buffer,
        })
    }

    pub fn update_params(&self, queue: &Queue, params: &Params) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));
    }

    /// Binds the current frame's scene buffer and render target. Rebuilt
    /// every frame because the scene buffer is.
    pub fn bind(
        &self,
        device: &Device,
        geometry: &GeometryBuffer,
        target: &RenderTarget,
    ) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Compute Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                bind_group_entry!(PARAMS_BIND, self.params_buffer),
                bind_group_entry!(SCENE_BIND, geometry.buffer),
                wgpu::BindGroupEntry {
                    binding: OUTPUT_BIND,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                },
            ],
        })
    }

    /// Records the frame's compute pass: one dispatch whose 16x16 tiles
    /// cover the full `width` x `height` extent. Ending the pass is the
    /// synchronization point: wgpu transitions the storage texture out of
    /// compute-write usage at the pass boundary, so every write is visible
    /// to any later read in the same submission.
    pub fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        bind_group: &BindGroup,
        width: u32,
        height: u32,
    ) {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Raytrace Pass"),
            timestamp_writes: None,
        });
        cpass.set_pipeline(&self.pipeline);
        cpass.set_bind_group(0, bind_group, &[]);
        cpass.dispatch_workgroups(workgroup_count(width), workgroup_count(height), 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workgroups_cover_the_extent_with_minimal_overshoot() {
        for pixels in [1, 2, 15, 16, 17, 31, 32, 255, 256, 600, 800, 901, 1600] {
            let groups = workgroup_count(pixels);
            assert!(
                groups * WORKGROUP_SIZE >= pixels,
                "{pixels} pixels not covered by {groups} groups"
            );
            assert!(
                (groups - 1) * WORKGROUP_SIZE < pixels,
                "{groups} groups overshoot {pixels} pixels by a full tile"
            );
        }
    }

    #[test]
    fn exact_multiples_need_no_extra_group() {
        assert_eq!(workgroup_count(16), 1);
        assert_eq!(workgroup_count(256), 16);
        assert_eq!(workgroup_count(1600), 100);
    }
}
