/// Head profile: the local cross-section replicated at every trail node
use glam::Vec3;

/// Upper bound on profile points, keeps per-node mesh size bounded
pub const MAX_HEAD_VERTICES: usize = 128;

/// Ordered local offsets describing the leading edge of a trail.
///
/// Built once and read-only afterwards; every node of the ring buffer is a
/// world-space copy of these points.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadProfile {
    points: Vec<Vec3>,
}

impl HeadProfile {
    /// Two-point line centered on the local origin along X
    pub fn line(width: f32) -> Self {
        let width = if width.is_finite() && width > 0.0 {
            width
        } else {
            1.0
        };
        let half_width = width / 2.0;

        Self {
            points: vec![Vec3::new(-half_width, 0.0, 0.0), Vec3::new(half_width, 0.0, 0.0)],
        }
    }

    /// Explicit points; non-finite points are skipped and at most
    /// [`MAX_HEAD_VERTICES`] are kept
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Vec3>,
    {
        let points = points
            .into_iter()
            .filter(|p| p.is_finite())
            .take(MAX_HEAD_VERTICES)
            .collect::<Vec<_>>();

        if points.len() < 2 {
            log::warn!(
                "Head profile has {} usable point(s); trail will have no faces",
                points.len()
            );
        }

        Self { points }
    }

    /// Points given as loose component lists, e.g. straight from a config file.
    ///
    /// Two components make a 2D point (z = 0), three make a 3D point. Anything
    /// else is skipped without contributing a partial point.
    pub fn from_components<P: AsRef<[f32]>>(components: &[P]) -> Self {
        let points = components.iter().filter_map(|c| match *c.as_ref() {
            [x, y] => Some(Vec3::new(x, y, 0.0)),
            [x, y, z] => Some(Vec3::new(x, y, z)),
            _ => None,
        });
        Self::from_points(points)
    }

    /// Flat three-point ribbon hovering above the target
    pub fn plane() -> Self {
        Self::from_points([
            Vec3::new(-14.0, 4.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
            Vec3::new(14.0, 4.0, 0.0),
        ])
    }

    /// Closed five-pointed star outline
    pub fn star() -> Self {
        const STAR: [[f32; 2]; 11] = [
            [0.0, 16.0],
            [4.0, 4.0],
            [16.0, 4.0],
            [8.0, -4.0],
            [12.0, -16.0],
            [0.0, -8.0],
            [-12.0, -16.0],
            [-8.0, -4.0],
            [-16.0, 4.0],
            [-4.0, 4.0],
            [0.0, 16.0],
        ];
        Self::from_points(STAR.iter().map(|&[x, y]| Vec3::new(x, y, 0.0)))
    }

    /// Circle of radius 10, sampled in 2π/32 steps until one step past a full turn
    pub fn circle() -> Self {
        const SCALE: f32 = 10.0;
        const STEPS: usize = 32;
        let inc = std::f32::consts::TAU / STEPS as f32;

        // The closing samples overlap the first ones so the tube has no seam
        Self::from_points((0..=STEPS + 1).map(|i| {
            let angle = i as f32 * inc;
            Vec3::new(angle.cos() * SCALE, angle.sin() * SCALE, 0.0)
        }))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Two triangles per adjacent pair of points
    pub fn faces_per_node(&self) -> usize {
        self.points.len().saturating_sub(1) * 2
    }
}

impl Default for HeadProfile {
    fn default() -> Self {
        Self::line(1.0)
    }
}
