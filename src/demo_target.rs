/// Moving target for the demo: a Lissajous curve, facing its direction of travel
use glam::{Mat4, Quat, Vec3};

use crate::trail::TransformSource;

const AMPLITUDE: f32 = 100.0;
const FREQUENCIES: Vec3 = Vec3::new(1.0, 1.1, 1.6);
/// Local axis that is turned toward the motion
const BASE_FORWARD: Vec3 = Vec3::NEG_Z;
const MIN_STEP_LENGTH_SQUARED: f32 = 0.001;
const MIN_TURN_ANGLE: f32 = 0.01;

#[derive(Debug, Clone)]
pub struct LissajousTarget {
    position: Vec3,
    rotation: Quat,
    last_direction: Vec3,
}

impl LissajousTarget {
    pub fn new() -> Self {
        Self {
            position: Self::position_at(0.0),
            rotation: Quat::IDENTITY,
            last_direction: BASE_FORWARD,
        }
    }

    pub fn position_at(time: f32) -> Vec3 {
        Vec3::new(
            (time * FREQUENCIES.x).sin(),
            (time * FREQUENCIES.y).sin(),
            (time * FREQUENCIES.z).sin(),
        ) * AMPLITUDE
    }

    /// Move to the curve point for `time` seconds and turn toward the step taken
    pub fn update(&mut self, time: f32) {
        let position = Self::position_at(time);
        let step = position - self.position;
        if step.length_squared() >= MIN_STEP_LENGTH_SQUARED {
            self.last_direction = step.normalize();
        }

        let angle = BASE_FORWARD.angle_between(self.last_direction);
        if angle > MIN_TURN_ANGLE {
            self.rotation = Quat::from_rotation_arc(BASE_FORWARD, self.last_direction);
        }

        self.position = position;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }
}

impl Default for LissajousTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformSource for LissajousTarget {
    fn world_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_stays_in_bounds() {
        for i in 0..1000 {
            let p = LissajousTarget::position_at(i as f32 * 0.1);
            assert!(p.abs().max_element() <= AMPLITUDE + 1e-3);
        }
        assert_eq!(LissajousTarget::position_at(0.0), Vec3::ZERO);
    }

    #[test]
    fn test_faces_direction_of_travel() {
        let mut target = LissajousTarget::new();
        target.update(0.5);
        target.update(0.51);

        let step = LissajousTarget::position_at(0.51) - LissajousTarget::position_at(0.5);
        let forward = target.world_transform().transform_vector3(Vec3::NEG_Z);
        assert!(forward.normalize().dot(step.normalize()) > 0.999);
        assert_eq!(
            target.world_transform().transform_point3(Vec3::ZERO),
            target.position()
        );
    }

    #[test]
    fn test_tiny_step_keeps_heading() {
        let mut target = LissajousTarget::new();
        target.update(1.0);
        target.update(1.01);
        let rotation = target.rotation();

        target.update(1.01);
        assert_eq!(target.rotation(), rotation);
    }
}
