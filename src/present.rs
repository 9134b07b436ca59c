use anyhow::Result;
use wgpu::{util::DeviceExt, BindGroup, BindGroupLayout, Buffer, Device, TextureFormat};

use super::render_target::RenderTarget;
use super::shader;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    tex_coords: [f32; 2],
}

// full-screen quad as a 4-vertex triangle strip (wgpu has no fan topology),
// texture row 0 mapped to the top of the screen
const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0],
        tex_coords: [0.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
        tex_coords: [1.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0],
        tex_coords: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
        tex_coords: [1.0, 0.0],
    },
];

const TEXTURE_BIND: u32 = 0;
const SAMPLER_BIND: u32 = 1;

/// Draws the finished render target onto the surface as a full-screen quad.
/// Read-only with respect to the target; the compute pass must have been
/// recorded (and its pass closed) earlier in the same encoder.
pub struct PresentPass {
    pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    vertex_buffer: Buffer,
    bind_group_layout: BindGroupLayout,
    bind_group: BindGroup,
}

impl PresentPass {
    pub fn new(
        device: &Device,
        surface_format: TextureFormat,
        target: &RenderTarget,
    ) -> Result<PresentPass> {
        let module = shader::create_shader_module(
            device,
            "present shader",
            include_str!("render_shader.wgsl"),
        )?;

        // ray-traced output is exact per pixel: nearest filtering, edges clamped
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Present Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Present Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: TEXTURE_BIND,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        // Rgba32Float is non-filterable without extra features
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: SAMPLER_BIND,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Present Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_attributes = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

        let pipeline = shader::with_validation(device, "present pipeline", || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Present Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: "vs_main",
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &vertex_attributes,
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: "fs_main",
                    compilation_options: Default::default(),
                    targets: &[Some(surface_format.into())],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        })?;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let bind_group = create_bind_group(device, &bind_group_layout, target, &sampler);

        Ok(PresentPass {
            pipeline,
            sampler,
            vertex_buffer,
            bind_group_layout,
            bind_group,
        })
    }

    /// Points the pass at a fresh render target after a resize.
    pub fn rebind(&mut self, device: &Device, target: &RenderTarget) {
        self.bind_group = create_bind_group(device, &self.bind_group_layout, target, &self.sampler);
    }

    /// Records the frame's render pass: one draw of the quad, sampling the
    /// render target onto `view`.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Present Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
    }
}

fn create_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    target: &RenderTarget,
    sampler: &wgpu::Sampler,
) -> BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Present Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: TEXTURE_BIND,
                resource: wgpu::BindingResource::TextureView(&target.view),
            },
            wgpu::BindGroupEntry {
                binding: SAMPLER_BIND,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
