use wgpu::{Buffer, Device, Queue};

use super::camera::Camera;
use super::scene::Scene;

/// Per-frame parameters for the compute shader, bound as a uniform.
///
/// Field placement mirrors the WGSL `Params` struct: the four leading `u32`s
/// fill the first 16-byte slot, and each `vec3` shares its slot with the
/// scalar that follows it, so the struct needs no trailing pad.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Params {
    pub screen_width: u32,    // u32, aligned to 4 bytes
    pub screen_height: u32,   // u32, aligned to 4 bytes
    pub sphere_count: u32,    // u32, aligned to 4 bytes
    pub plane_count: u32,     // u32, aligned to 4 bytes
    pub camera_pos: [f32; 3], // vec3, aligned to 16 bytes
    pub light_count: u32,     // u32, fills the vec3 slot
    pub camera_dir: [f32; 3], // vec3, aligned to 16 bytes
    pub focal_length: f32,    // f32, fills the vec3 slot
}

impl Params {
    pub fn new(width: u32, height: u32, scene: &Scene, camera: &Camera) -> Params {
        Params {
            screen_width: width,
            screen_height: height,
            sphere_count: scene.spheres.len() as u32,
            plane_count: scene.planes.len() as u32,
            camera_pos: camera.position.into(),
            light_count: scene.lights.len() as u32,
            camera_dir: camera.direction().into(),
            focal_length: camera.focal_length,
        }
    }
}

// wgpu rejects zero-sized bindings, so an all-empty scene still gets one
// 16-byte slot the shader never indexes into.
const MIN_SCENE_BUFFER_BYTES: u64 = 16;

/// The device-side scene buffer for one frame.
///
/// A fresh buffer is allocated every frame instead of pooling one; the scene
/// here is small and constant-shaped, so recreation stays cheap. The owner
/// drops the previous frame's instance at the start of the next rebuild,
/// after that frame's dispatch and draw have been submitted; wgpu keeps the
/// allocation alive until no in-flight work references it.
pub struct GeometryBuffer {
    pub buffer: Buffer,
}

impl GeometryBuffer {
    pub fn upload(device: &Device, queue: &Queue, scene: &Scene) -> GeometryBuffer {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Geometry Buffer"),
            size: (scene.packed_len() as u64).max(MIN_SCENE_BUFFER_BYTES),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // three sub-range writes at the contract offsets: spheres at 0,
        // planes right after them, lights after the planes
        if !scene.spheres.is_empty() {
            queue.write_buffer(&buffer, 0, bytemuck::cast_slice(&scene.spheres));
        }
        if !scene.planes.is_empty() {
            queue.write_buffer(
                &buffer,
                scene.plane_offset() as u64,
                bytemuck::cast_slice(&scene.planes),
            );
        }
        if !scene.lights.is_empty() {
            queue.write_buffer(
                &buffer,
                scene.light_offset() as u64,
                bytemuck::cast_slice(&scene.lights),
            );
        }

        GeometryBuffer { buffer }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn params_layout_matches_the_wgsl_uniform() {
        assert_eq!(size_of::<Params>(), 48);
        assert_eq!(offset_of!(Params, screen_width), 0);
        assert_eq!(offset_of!(Params, plane_count), 12);
        assert_eq!(offset_of!(Params, camera_pos), 16);
        assert_eq!(offset_of!(Params, light_count), 28);
        assert_eq!(offset_of!(Params, camera_dir), 32);
        assert_eq!(offset_of!(Params, focal_length), 44);
    }

    #[test]
    fn params_carry_the_scene_counts() {
        let scene = crate::define_scene::define_render_scene(0.0);
        let camera = Camera::new();
        let params = Params::new(800, 600, &scene, &camera);
        assert_eq!(params.sphere_count, 3);
        assert_eq!(params.plane_count, 6);
        assert_eq!(params.light_count, 1);
        assert_eq!(params.screen_width, 800);
        assert_eq!(params.screen_height, 600);
    }
}
