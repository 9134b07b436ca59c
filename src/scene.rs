//! Geometry records and their packed byte layout.
//!
//! Every record here is mirrored by a struct in `compute_shader.wgsl`, read
//! out of one shared storage buffer. The field order and the explicit
//! padding are part of that contract: a `vec3` occupies 16 bytes on the GPU
//! side whenever more data follows it, so each 3-float field that is not
//! already chased by a scalar carries a 4-byte pad. Reordering fields or
//! dropping a pad silently corrupts what the shader reads.

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneSphere {
    pub center: [f32; 3],  // vec3, aligned to 12 bytes
    pub radius: f32,       // scalar directly after the vec3 doubles as its pad
    pub color: [f32; 3],   // vec3, aligned to 12 bytes
    pub reflectivity: f32, // f32, aligned to 4 bytes
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ScenePlane {
    pub point: [f32; 3],    // vec3, aligned to 12 bytes
    pub _padding: [u8; 4],  // padding to ensure 16-byte alignment
    pub normal: [f32; 3],   // vec3, aligned to 12 bytes
    pub _padding2: [u8; 4], // padding to ensure 16-byte alignment
    pub color: [f32; 3],    // vec3, aligned to 12 bytes
    pub reflectivity: f32,  // f32, aligned to 4 bytes
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneLight {
    pub position: [f32; 3], // vec3, aligned to 12 bytes
    pub _padding: [u8; 4],  // padding to ensure 16-byte alignment
    pub color: [f32; 3],    // vec3, aligned to 12 bytes
    pub _padding2: [u8; 4], // padding to ensure 16-byte alignment
}

impl ScenePlane {
    pub fn new(point: [f32; 3], normal: [f32; 3], color: [f32; 3], reflectivity: f32) -> ScenePlane {
        ScenePlane {
            point,
            _padding: [0; 4],
            normal,
            _padding2: [0; 4],
            color,
            reflectivity,
        }
    }
}

impl SceneLight {
    pub fn new(position: [f32; 3], color: [f32; 3]) -> SceneLight {
        SceneLight {
            position,
            _padding: [0; 4],
            color,
            _padding2: [0; 4],
        }
    }
}

/// The dynamic scene, rebuilt and re-uploaded every frame.
///
/// Upload order is always spheres, then planes, then lights, back to back.
/// The compute shader locates each sequence purely from the counts it gets
/// through the frame parameters, so there is never padding between the
/// sequences, only inside the records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub spheres: Vec<SceneSphere>,
    pub planes: Vec<ScenePlane>,
    pub lights: Vec<SceneLight>,
}

impl Scene {
    /// Byte offset of the plane sequence inside the packed buffer.
    pub fn plane_offset(&self) -> usize {
        self.spheres.len() * std::mem::size_of::<SceneSphere>()
    }

    /// Byte offset of the light sequence inside the packed buffer.
    pub fn light_offset(&self) -> usize {
        self.plane_offset() + self.planes.len() * std::mem::size_of::<ScenePlane>()
    }

    /// Total packed size in bytes. Zero for an all-empty scene.
    pub fn packed_len(&self) -> usize {
        self.light_offset() + self.lights.len() * std::mem::size_of::<SceneLight>()
    }

    /// Serializes the scene into one contiguous byte buffer, record layouts
    /// exactly as the compute shader expects them. Total over any scene.
    pub fn pack(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.packed_len());
        bytes.extend_from_slice(bytemuck::cast_slice(&self.spheres));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.planes));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.lights));
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    fn sample_sphere(seed: f32) -> SceneSphere {
        SceneSphere {
            center: [seed, seed + 1.0, seed + 2.0],
            radius: seed + 3.0,
            color: [seed + 4.0, seed + 5.0, seed + 6.0],
            reflectivity: seed + 7.0,
        }
    }

    #[test]
    fn record_sizes_match_the_shader_contract() {
        assert_eq!(size_of::<SceneSphere>(), 32);
        assert_eq!(size_of::<ScenePlane>(), 48);
        assert_eq!(size_of::<SceneLight>(), 32);
    }

    #[test]
    fn empty_scene_packs_to_zero_bytes() {
        let scene = Scene::default();
        assert_eq!(scene.packed_len(), 0);
        assert_eq!(scene.pack(), Vec::<u8>::new());
    }

    #[test]
    fn offsets_follow_the_sequence_lengths() {
        for (s, p, l) in [(0, 0, 0), (1, 0, 1), (3, 6, 1), (5, 2, 4)] {
            let scene = Scene {
                spheres: vec![sample_sphere(0.0); s],
                planes: vec![ScenePlane::new([0.0; 3], [0.0; 3], [0.0; 3], 0.0); p],
                lights: vec![SceneLight::new([0.0; 3], [0.0; 3]); l],
            };
            assert_eq!(scene.plane_offset(), s * 32);
            assert_eq!(scene.light_offset(), s * 32 + p * 48);
            assert_eq!(scene.packed_len(), s * 32 + p * 48 + l * 32);
            assert_eq!(scene.pack().len(), scene.packed_len());
        }
    }

    #[test]
    fn packed_records_round_trip_at_their_offsets() {
        let scene = Scene {
            spheres: vec![sample_sphere(0.0), sample_sphere(10.0), sample_sphere(20.0)],
            planes: vec![ScenePlane::new(
                [1.0, 2.0, 3.0],
                [0.0, 1.0, 0.0],
                [0.5, 0.6, 0.7],
                0.25,
            )],
            lights: vec![
                SceneLight::new([7.0, 8.0, 9.0], [1.0, 1.0, 1.0]),
                SceneLight::new([-1.0, -2.0, -3.0], [0.1, 0.2, 0.3]),
            ],
        };

        let bytes = scene.pack();
        assert_eq!(bytes.len(), 3 * 32 + 48 + 2 * 32);

        for (i, sphere) in scene.spheres.iter().enumerate() {
            let read: SceneSphere = bytemuck::pod_read_unaligned(&bytes[i * 32..(i + 1) * 32]);
            assert_eq!(&read, sphere);
        }

        let plane_at = scene.plane_offset();
        let read: ScenePlane = bytemuck::pod_read_unaligned(&bytes[plane_at..plane_at + 48]);
        assert_eq!(read, scene.planes[0]);

        let light_at = scene.light_offset();
        for (i, light) in scene.lights.iter().enumerate() {
            let start = light_at + i * 32;
            let read: SceneLight = bytemuck::pod_read_unaligned(&bytes[start..start + 32]);
            assert_eq!(&read, light);
        }
    }

    #[test]
    fn one_sphere_one_light_scene_packs_tightly() {
        let scene = Scene {
            spheres: vec![SceneSphere {
                center: [0.0, 0.0, -1.0],
                radius: 0.2,
                color: [1.0, 1.0, 1.0],
                reflectivity: 0.0,
            }],
            planes: vec![],
            lights: vec![SceneLight::new([0.0, 1.0, 0.0], [1.0, 1.0, 1.0])],
        };

        let bytes = scene.pack();
        assert_eq!(bytes.len(), size_of::<SceneSphere>() + size_of::<SceneLight>());

        // the light's position starts right where the sphere sequence ends
        let light_at = size_of::<SceneSphere>();
        let position: [f32; 3] = bytemuck::pod_read_unaligned(&bytes[light_at..light_at + 12]);
        assert_eq!(position, [0.0, 1.0, 0.0]);
    }
}
