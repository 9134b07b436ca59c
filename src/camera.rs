use glam::{vec3, Vec3};

/// Keyboard and mouse state for the current tick.
///
/// The event-loop input arms are the only writers; the camera reads it once
/// per frame tick and drains the accumulated mouse delta.
#[derive(Debug, Default)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub focal_in: bool,
    pub focal_out: bool,
    pub mouse_delta: (f32, f32),
}

impl InputState {
    pub fn take_mouse_delta(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.mouse_delta)
    }
}

#[derive(Debug)]
pub struct Camera {
    pub position: Vec3,
    pub focal_length: f32,

    // degrees; -90 yaw looks down -Z
    yaw: f32,
    pitch: f32,

    movement_speed: f32,
    mouse_sensitivity: f32,
    focal_step: f32,
}

impl Camera {
    pub fn new() -> Camera {
        Camera {
            position: Vec3::ZERO,
            focal_length: 1.0,
            yaw: -90.0,
            pitch: 0.0,
            movement_speed: 0.01,
            mouse_sensitivity: 0.1,
            focal_step: 0.01,
        }
    }

    /// Unit view direction derived from the yaw and pitch angles.
    pub fn direction(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        vec3(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    /// Applies one tick of input: mouse look, movement along the view basis
    /// and focal length stepping. The position is clamped to stay inside the
    /// unit box the demo scene encloses the camera in.
    pub fn on_update(&mut self, input: &mut InputState) {
        let (dx, dy) = input.take_mouse_delta();
        self.yaw += dx * self.mouse_sensitivity;
        // pitch is constrained to avoid flipping over the poles
        self.pitch = (self.pitch - dy * self.mouse_sensitivity).clamp(-89.0, 89.0);

        let direction = self.direction();
        let right_direction = direction.cross(Vec3::Y).normalize();

        if input.forward {
            self.position += self.movement_speed * direction;
        }
        if input.back {
            self.position -= self.movement_speed * direction;
        }
        if input.right {
            self.position += self.movement_speed * right_direction;
        }
        if input.left {
            self.position -= self.movement_speed * right_direction;
        }
        if input.up {
            self.position += self.movement_speed * Vec3::Y;
        }
        if input.down {
            self.position -= self.movement_speed * Vec3::Y;
        }

        self.position = self
            .position
            .clamp(Vec3::splat(-0.999), Vec3::splat(0.999));

        if input.focal_in {
            self.focal_length += self.focal_step;
        }
        if input.focal_out {
            self.focal_length -= self.focal_step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_is_clamped_before_the_poles() {
        let mut camera = Camera::new();
        let mut input = InputState {
            mouse_delta: (0.0, -10_000.0),
            ..Default::default()
        };
        camera.on_update(&mut input);
        assert!(camera.direction().y < 1.0);
        assert!((camera.pitch - 89.0).abs() < f32::EPSILON);

        input.mouse_delta = (0.0, 10_000.0);
        camera.on_update(&mut input);
        assert!((camera.pitch + 89.0).abs() < f32::EPSILON);
    }

    #[test]
    fn position_stays_inside_the_unit_box() {
        let mut camera = Camera::new();
        let mut input = InputState {
            back: true,
            ..Default::default()
        };
        // moving backwards from -Z far longer than the box is deep
        for _ in 0..500 {
            camera.on_update(&mut input);
        }
        assert!(camera.position.z <= 0.999);
        assert!(camera.position.abs().max_element() <= 0.999);
    }

    #[test]
    fn focal_length_steps_with_the_arrow_keys() {
        let mut camera = Camera::new();
        let mut input = InputState {
            focal_in: true,
            ..Default::default()
        };
        camera.on_update(&mut input);
        assert!((camera.focal_length - 1.01).abs() < 1e-6);

        input.focal_in = false;
        input.focal_out = true;
        camera.on_update(&mut input);
        camera.on_update(&mut input);
        assert!((camera.focal_length - 0.99).abs() < 1e-6);
    }

    #[test]
    fn mouse_delta_is_drained_once_read() {
        let mut input = InputState {
            mouse_delta: (3.0, -2.0),
            ..Default::default()
        };
        assert_eq!(input.take_mouse_delta(), (3.0, -2.0));
        assert_eq!(input.take_mouse_delta(), (0.0, 0.0));
    }
}
