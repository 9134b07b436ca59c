use super::scene::{Scene, SceneLight, ScenePlane, SceneSphere};

/// Builds the demo scene for the given animation time: three moving spheres
/// inside a colored unit box, lit by a single white light.
pub(crate) fn define_render_scene(time: f32) -> Scene {
    let spheres = vec![
        SceneSphere {
            center: [0.3, 0.4 * time.sin(), -0.5],
            radius: 0.2,
            color: [1.0, 1.0, 1.0],
            reflectivity: 0.0,
        },
        SceneSphere {
            center: [-0.3, -0.15, 0.35],
            radius: 0.15,
            color: [0.0, 1.0, 0.0],
            reflectivity: 0.0,
        },
        SceneSphere {
            center: [0.2 * (3.0 * time).sin(), -0.55, -0.2],
            radius: 0.3,
            color: [0.0, 0.0, 1.0],
            reflectivity: 0.0,
        },
    ];

    // box around the camera, one plane per face
    let box_size = 1.0;
    let planes = vec![
        ScenePlane::new([0.0, 0.0, -box_size], [0.0, 0.0, -1.0], [1.0, 1.0, 0.0], 0.0), // front
        ScenePlane::new([0.0, 0.0, box_size], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0], 0.0),   // back
        ScenePlane::new([-box_size, 0.0, 0.0], [-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.0), // left
        ScenePlane::new([box_size, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.5, 1.0], 0.0),   // right
        ScenePlane::new([0.0, -box_size, 0.0], [0.0, -1.0, 0.0], [0.0, 0.5, 0.5], 0.0), // bottom
        ScenePlane::new([0.0, box_size, 0.0], [0.0, 1.0, 0.0], [0.5, 0.0, 0.5], 0.0),   // top
    ];

    let lights = vec![SceneLight::new([-0.4, 0.6, -0.3], [1.0, 1.0, 1.0])];

    Scene {
        spheres,
        planes,
        lights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_scene_has_the_expected_shape() {
        let scene = define_render_scene(0.0);
        assert_eq!(scene.spheres.len(), 3);
        assert_eq!(scene.planes.len(), 6);
        assert_eq!(scene.lights.len(), 1);
        assert_eq!(scene.packed_len(), 3 * 32 + 6 * 48 + 32);
    }
}
