/// Ring-buffer trail engine
///
/// Node slots are reused in a circle: each advance snapshots the head profile
/// into the slot after the current end, links it to its predecessor and, once
/// the ring is saturated, unlinks the quad strip that led away from the slot
/// being overwritten. Between advances only the newest node is refreshed.
use glam::{Mat4, Quat, Vec3};

use crate::trail::geometry::TrailGeometry;
use crate::trail::head::HeadProfile;
use crate::trail::scene::{MeshId, SceneHandle};
use crate::trail::shading::TrailMaterial;
use crate::trail::target::TransformSource;

pub const DEFAULT_ADVANCE_FREQUENCY: f64 = 60.0;

/// Travel deltas shorter than this (squared) keep the previous heading
const MIN_TRAVEL_LENGTH_SQUARED: f32 = 1e-4;

/// Slots for `requested_length` nodes, bounded so every vertex index fits in a `u32`
fn slot_capacity(requested_length: usize, vertices_per_node: usize) -> usize {
    if requested_length == 0 {
        return 0;
    }
    let max_slots = u32::MAX as usize / vertices_per_node.max(1);
    let capacity = requested_length.saturating_add(1);
    if capacity > max_slots {
        log::warn!(
            "Trail length {} exceeds the index range, clamping to {} slots",
            requested_length,
            max_slots
        );
        return max_slots;
    }
    capacity
}

/// Everything allocated by `initialize`
struct TrailState {
    material: TrailMaterial,
    geometry: TrailGeometry,
    head: HeadProfile,
    source: Box<dyn TransformSource>,
    capacity: usize,
    drag_texture: bool,

    current_length: usize,
    current_end: Option<usize>,
    current_node_id: u32,
    node_ids: Vec<u32>,
    node_centers: Vec<Vec3>,
    last_direction: Option<Vec3>,

    // Reused every frame
    scratch_points: Vec<Vec3>,
}

impl TrailState {
    fn reset(&mut self) {
        self.current_length = 0;
        self.current_end = None;
        self.current_node_id = 0;
        self.node_ids.fill(0);
        self.node_centers.fill(Vec3::ZERO);
        self.last_direction = None;

        self.geometry.form_initial_faces();
        self.geometry.zero_vertices();
        self.geometry.set_draw_range(0);
        self.material.set_node_window(0, 0, 0);
    }

    fn is_live(&self, slot: usize) -> bool {
        match self.current_end {
            Some(end) if slot < self.capacity => {
                (end + self.capacity - slot) % self.capacity < self.current_length
            }
            _ => false,
        }
    }

    /// Slot preceding the current end, when it holds a live node
    fn previous_slot(&self) -> Option<usize> {
        let end = self.current_end?;
        (self.current_length >= 2).then(|| (end + self.capacity - 1) % self.capacity)
    }

    /// Sample the transform and write a world-space copy of the profile into `slot`
    fn place_node(&mut self, slot: usize, predecessor: Option<Vec3>, orient_to_movement: bool) {
        let transform = self.source.world_transform();
        let center = transform.transform_point3(Vec3::ZERO);

        self.scratch_points.clear();
        self.scratch_points.extend(
            self.head
                .points()
                .iter()
                .map(|&p| transform.transform_point3(p)),
        );

        if orient_to_movement {
            if let Some(rotation) = self.travel_rotation(&transform, center, predecessor) {
                for point in &mut self.scratch_points {
                    *point = center + rotation * (*point - center);
                }
            }
        }

        self.geometry.write_node(slot, center, &self.scratch_points);
        self.node_centers[slot] = center;
    }

    /// Shortest arc from the transform's forward axis to the travel direction
    fn travel_rotation(
        &mut self,
        transform: &Mat4,
        center: Vec3,
        predecessor: Option<Vec3>,
    ) -> Option<Quat> {
        let delta = center - predecessor?;
        let direction = if delta.length_squared() > MIN_TRAVEL_LENGTH_SQUARED {
            let direction = delta.normalize();
            self.last_direction = Some(direction);
            direction
        } else {
            self.last_direction?
        };

        let forward = transform.transform_vector3(Vec3::NEG_Z).normalize_or_zero();
        if forward == Vec3::ZERO {
            return None;
        }
        Some(Quat::from_rotation_arc(forward, direction))
    }

    fn advance(&mut self, orient_to_movement: bool) {
        let capacity = self.capacity;
        let next = self.current_end.map_or(0, |end| (end + 1) % capacity);
        // Orientation needs two captured nodes before it applies
        let predecessor = self
            .current_end
            .filter(|_| self.current_length >= 2)
            .map(|end| self.node_centers[end]);

        self.place_node(next, predecessor, orient_to_movement);

        if self.current_length >= 1 {
            if let Some(end) = self.current_end {
                self.geometry.connect(end, next);
            }
            if self.current_length >= capacity {
                self.geometry.disconnect(next);
            }
        }

        if self.current_length < capacity {
            self.current_length += 1;
        }
        self.current_end = Some(next);

        let per_node = self.geometry.face_indices_per_node();
        let drawn_nodes = if self.current_length < capacity {
            self.current_length - 1
        } else {
            self.current_length
        };
        self.geometry.set_draw_range(drawn_nodes * per_node);

        let id = self.current_node_id;
        self.geometry.write_node_id(next, id);
        self.node_ids[next] = id;
        self.current_node_id = self.current_node_id.wrapping_add(1);

        let min_id = if self.current_length < capacity {
            0
        } else {
            self.current_node_id
                .saturating_sub(u32::try_from(capacity).unwrap_or(u32::MAX))
        };
        self.material
            .set_node_window(min_id, self.current_node_id, self.current_length);

        log::debug!(
            "Trail advance: slot {} id {} length {}/{}",
            next,
            id,
            self.current_length,
            capacity
        );
    }

    fn update_head(&mut self, orient_to_movement: bool) {
        let Some(end) = self.current_end else {
            return;
        };
        let predecessor = self.previous_slot().map(|slot| self.node_centers[slot]);
        self.place_node(end, predecessor, orient_to_movement);
        log::trace!("Trail head refreshed in slot {}", end);
    }
}

/// Drives one trail: allocation, cadence and scene membership.
///
/// All mutation happens on the caller's thread inside `update`, `advance` and
/// `update_head`. Time is supplied by the caller as seconds on any monotonic
/// timeline.
pub struct TrailEngine {
    scene: SceneHandle,
    orient_to_movement: bool,
    state: Option<TrailState>,

    advance_frequency: f64,
    last_advance_time: Option<f64>,
    paused: bool,
    elapsed_at_pause: Option<f64>,
}

impl TrailEngine {
    pub fn new(scene: SceneHandle, orient_to_movement: bool) -> Self {
        Self {
            scene,
            orient_to_movement,
            state: None,
            advance_frequency: DEFAULT_ADVANCE_FREQUENCY,
            last_advance_time: None,
            paused: false,
            elapsed_at_pause: None,
        }
    }

    /// Allocate buffers for `requested_length + 1` node slots and reset the ring.
    ///
    /// Any previous mesh is removed from the scene and dropped. The new mesh is
    /// not added until [`activate`](Self::activate) is called.
    pub fn initialize<S>(
        &mut self,
        mut material: TrailMaterial,
        requested_length: usize,
        drag_texture: bool,
        head: HeadProfile,
        source: S,
    ) where
        S: TransformSource + 'static,
    {
        self.deactivate();

        let vertices_per_node = head.len();
        let capacity = slot_capacity(requested_length, vertices_per_node);
        let geometry = TrailGeometry::new(capacity, vertices_per_node);
        material.configure_for_trail(capacity, vertices_per_node, drag_texture);

        log::info!(
            "Initialized trail {:?}: {} slots, {} vertices per node, {:?} shading, drag {}",
            geometry.mesh_id(),
            capacity,
            vertices_per_node,
            material.kind(),
            drag_texture
        );

        let mut state = TrailState {
            material,
            geometry,
            head,
            source: Box::new(source),
            capacity,
            drag_texture,
            current_length: 0,
            current_end: None,
            current_node_id: 0,
            node_ids: vec![0; capacity],
            node_centers: vec![Vec3::ZERO; capacity],
            last_direction: None,
            scratch_points: Vec::with_capacity(vertices_per_node),
        };
        state.reset();
        self.state = Some(state);
    }

    /// Empty the ring without reallocating
    pub fn reset(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.reset();
            log::debug!("Trail {:?} reset", state.geometry.mesh_id());
        }
    }

    /// Capture a new node at the slot after the current end
    pub fn advance(&mut self) {
        let orient = self.orient_to_movement;
        match self.state.as_mut() {
            Some(state) if state.capacity > 0 => state.advance(orient),
            Some(_) => log::trace!("Ignoring advance on a zero-length trail"),
            None => log::warn!("Trail advance called before initialize"),
        }
    }

    /// Move the newest node to the current transform without advancing
    pub fn update_head(&mut self) {
        let orient = self.orient_to_movement;
        match self.state.as_mut() {
            Some(state) => state.update_head(orient),
            None => log::warn!("Trail head update called before initialize"),
        }
    }

    /// Per-frame cadence: advance once the period has elapsed, else refresh the head
    pub fn update(&mut self, time: f64) {
        if self.paused {
            return;
        }

        let last_advance = *self.last_advance_time.get_or_insert(time);
        if time - last_advance > self.advance_period() {
            self.advance();
            self.last_advance_time = Some(time);
        } else {
            self.update_head();
        }
    }

    pub fn pause(&mut self, time: f64) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.elapsed_at_pause = self.last_advance_time.map(|last| time - last);
        log::debug!("Trail paused");
    }

    pub fn resume(&mut self, time: f64) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if let Some(elapsed) = self.elapsed_at_pause.take() {
            self.last_advance_time = Some(time - elapsed);
        }
        log::debug!("Trail resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_advance_frequency(&mut self, frequency: f64) {
        if !(frequency.is_finite() && frequency > 0.0) {
            log::warn!("Ignoring invalid trail advance frequency {}", frequency);
            return;
        }
        self.advance_frequency = frequency;
    }

    pub fn advance_frequency(&self) -> f64 {
        self.advance_frequency
    }

    fn advance_period(&self) -> f64 {
        1.0 / self.advance_frequency
    }

    /// Seconds left before `update` would advance; frozen while paused
    pub fn time_until_next_advance(&self, time: f64) -> f64 {
        let elapsed = if self.paused {
            self.elapsed_at_pause.unwrap_or(0.0)
        } else {
            self.last_advance_time.map_or(0.0, |last| time - last)
        };
        (self.advance_period() - elapsed).max(0.0)
    }

    pub fn activate(&mut self) {
        if let Some(state) = &self.state {
            self.scene.borrow_mut().add(state.geometry.mesh_id());
        }
    }

    pub fn deactivate(&mut self) {
        if let Some(state) = &self.state {
            self.scene.borrow_mut().remove(state.geometry.mesh_id());
        }
    }

    pub fn is_active(&self) -> bool {
        self.mesh_id()
            .is_some_and(|mesh| self.scene.borrow().contains(mesh))
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn mesh_id(&self) -> Option<MeshId> {
        self.state.as_ref().map(|s| s.geometry.mesh_id())
    }

    pub fn orient_to_movement(&self) -> bool {
        self.orient_to_movement
    }

    pub fn set_orient_to_movement(&mut self, orient: bool) {
        self.orient_to_movement = orient;
    }

    pub fn capacity(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.capacity)
    }

    pub fn current_length(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.current_length)
    }

    pub fn current_end(&self) -> Option<usize> {
        self.state.as_ref().and_then(|s| s.current_end)
    }

    pub fn current_node_id(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.current_node_id)
    }

    pub fn drag_texture(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.drag_texture)
    }

    /// Id stamped on a live slot
    pub fn node_id(&self, slot: usize) -> Option<u32> {
        let state = self.state.as_ref()?;
        state.is_live(slot).then(|| state.node_ids[slot])
    }

    /// World-space center captured for a live slot
    pub fn node_center(&self, slot: usize) -> Option<Vec3> {
        let state = self.state.as_ref()?;
        state.is_live(slot).then(|| state.node_centers[slot])
    }

    pub fn geometry(&self) -> Option<&TrailGeometry> {
        self.state.as_ref().map(|s| &s.geometry)
    }

    pub fn geometry_mut(&mut self) -> Option<&mut TrailGeometry> {
        self.state.as_mut().map(|s| &mut s.geometry)
    }

    pub fn material(&self) -> Option<&TrailMaterial> {
        self.state.as_ref().map(|s| &s.material)
    }

    pub fn material_mut(&mut self) -> Option<&mut TrailMaterial> {
        self.state.as_mut().map(|s| &mut s.material)
    }

    pub fn head_profile(&self) -> Option<&HeadProfile> {
        self.state.as_ref().map(|s| &s.head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::scene::Scene;
    use std::cell::RefCell;
    use std::rc::Rc;

    type SharedTransform = Rc<RefCell<Mat4>>;

    fn line_engine(requested_length: usize) -> (TrailEngine, SharedTransform, SceneHandle) {
        let scene = Scene::shared();
        let transform = Rc::new(RefCell::new(Mat4::IDENTITY));
        let mut engine = TrailEngine::new(Rc::clone(&scene), false);
        engine.initialize(
            TrailMaterial::base(),
            requested_length,
            false,
            HeadProfile::line(2.0),
            Rc::clone(&transform),
        );
        (engine, transform, scene)
    }

    fn move_to(transform: &SharedTransform, position: Vec3) {
        *transform.borrow_mut() = Mat4::from_translation(position);
    }

    fn advance_along_x(engine: &mut TrailEngine, transform: &SharedTransform, steps: usize) {
        for _ in 0..steps {
            let x = engine.current_node_id() as f32;
            move_to(transform, Vec3::new(x, 0.0, 0.0));
            engine.advance();
        }
    }

    #[test]
    fn test_capacity_is_request_plus_one() {
        let (engine, _, _) = line_engine(300);
        assert_eq!(engine.capacity(), 301);
        let geometry = engine.geometry().unwrap();
        assert_eq!(geometry.vertices().len(), 301 * 2);
        assert_eq!(geometry.indices().len(), 301 * 2 * 3);
        assert_eq!(engine.material().unwrap().uniforms().max_trail_length, 301.0);
    }

    #[test]
    fn test_length_grows_then_saturates() {
        let (mut engine, transform, _) = line_engine(5);
        let mut previous = 0;
        for _ in 0..20 {
            advance_along_x(&mut engine, &transform, 1);
            let length = engine.current_length();
            assert!(length <= engine.capacity());
            assert!(length >= previous);
            previous = length;
        }
        assert_eq!(engine.current_length(), 6);
        assert_eq!(engine.current_node_id(), 20);
    }

    #[test]
    fn test_first_advance_draws_nothing() {
        let (mut engine, transform, _) = line_engine(3);
        advance_along_x(&mut engine, &transform, 1);
        assert_eq!(engine.current_end(), Some(0));
        assert_eq!(engine.current_length(), 1);
        assert_eq!(engine.geometry().unwrap().draw_index_count(), 0);
    }

    #[test]
    fn test_saturated_ring_with_three_requested() {
        let (mut engine, transform, _) = line_engine(3);
        advance_along_x(&mut engine, &transform, 4);

        assert_eq!(engine.capacity(), 4);
        assert_eq!(engine.current_length(), 4);
        assert_eq!(engine.current_end(), Some(3));

        let geometry = engine.geometry().unwrap();
        assert_eq!(geometry.draw_index_count(), 4 * 6);
        assert_eq!(geometry.visible_quad_count(), 3);
        assert!(!geometry.is_connected(3));

        let uniforms = engine.material().unwrap().uniforms();
        assert_eq!(uniforms.min_id, 0);
        assert_eq!(uniforms.max_id, 4);
        assert_eq!(uniforms.trail_length, 4.0);

        // Fifth advance overwrites slot 0 and retires the strip between the two oldest nodes
        advance_along_x(&mut engine, &transform, 1);
        let geometry = engine.geometry().unwrap();
        assert_eq!(engine.current_end(), Some(0));
        assert!(!geometry.is_connected(0));
        assert!(geometry.is_connected(3));
        assert!(geometry.is_connected(1));
        assert_eq!(geometry.visible_quad_count(), 3);
        assert_eq!(engine.node_id(0), Some(4));

        let uniforms = engine.material().unwrap().uniforms();
        assert_eq!(uniforms.min_id, 1);
        assert_eq!(uniforms.max_id, 5);
    }

    #[test]
    fn test_overwritten_slot_is_disconnected_each_wrap() {
        let (mut engine, transform, _) = line_engine(4);
        advance_along_x(&mut engine, &transform, 5);

        for _ in 0..12 {
            advance_along_x(&mut engine, &transform, 1);
            let end = engine.current_end().unwrap();
            let geometry = engine.geometry().unwrap();
            assert!(!geometry.is_connected(end));
            assert_eq!(geometry.connected_quad_count(), engine.capacity() - 1);
        }
    }

    #[test]
    fn test_node_positions_follow_transform() {
        let (mut engine, transform, _) = line_engine(3);
        move_to(&transform, Vec3::new(5.0, 1.0, 0.0));
        engine.advance();

        assert_eq!(engine.node_center(0), Some(Vec3::new(5.0, 1.0, 0.0)));
        let node = engine.geometry().unwrap().node_vertices(0);
        assert_eq!(node[0].position, [4.0, 1.0, 0.0]);
        assert_eq!(node[1].position, [6.0, 1.0, 0.0]);
        assert_eq!(node[0].node_id, 0);

        assert_eq!(engine.node_center(1), None);
    }

    #[test]
    fn test_update_head_only_moves_newest_node() {
        let (mut engine, transform, _) = line_engine(3);
        advance_along_x(&mut engine, &transform, 2);
        let indices = engine.geometry().unwrap().indices().to_vec();
        let draw = engine.geometry().unwrap().draw_index_count();

        move_to(&transform, Vec3::new(0.0, 9.0, 0.0));
        engine.update_head();

        assert_eq!(engine.node_center(1), Some(Vec3::new(0.0, 9.0, 0.0)));
        assert_eq!(engine.node_center(0), Some(Vec3::ZERO));
        assert_eq!(engine.node_id(1), Some(1));
        assert_eq!(engine.current_node_id(), 2);

        let geometry = engine.geometry().unwrap();
        assert_eq!(geometry.indices(), indices.as_slice());
        assert_eq!(geometry.draw_index_count(), draw);
    }

    #[test]
    fn test_update_head_on_empty_ring_draws_nothing() {
        let (mut engine, transform, _) = line_engine(3);
        advance_along_x(&mut engine, &transform, 3);
        engine.reset();

        for _ in 0..5 {
            engine.update_head();
        }
        assert_eq!(engine.current_end(), None);
        assert_eq!(engine.geometry().unwrap().draw_index_count(), 0);
    }

    #[test]
    fn test_reset_matches_fresh_initialize() {
        let (mut used, transform, _) = line_engine(4);
        advance_along_x(&mut used, &transform, 9);
        used.reset();

        let (fresh, _, _) = line_engine(4);

        assert_eq!(used.current_length(), fresh.current_length());
        assert_eq!(used.current_end(), fresh.current_end());
        assert_eq!(used.current_node_id(), fresh.current_node_id());

        let (a, b) = (used.geometry().unwrap(), fresh.geometry().unwrap());
        assert_eq!(a.vertices(), b.vertices());
        assert_eq!(a.indices(), b.indices());
        assert_eq!(a.draw_index_count(), b.draw_index_count());
        assert_eq!(used.material(), fresh.material());
    }

    #[test]
    fn test_zero_length_trail_is_inert() {
        let (mut engine, _, _) = line_engine(0);
        assert_eq!(engine.capacity(), 0);
        engine.advance();
        engine.update_head();
        engine.update(0.0);
        engine.update(10.0);
        assert_eq!(engine.current_length(), 0);
        assert_eq!(engine.geometry().unwrap().draw_index_count(), 0);
    }

    #[test]
    fn test_calls_before_initialize_are_ignored() {
        let mut engine = TrailEngine::new(Scene::shared(), false);
        engine.advance();
        engine.update_head();
        engine.activate();
        assert!(!engine.is_initialized());
        assert!(!engine.is_active());
        assert_eq!(engine.current_length(), 0);
    }

    #[test]
    fn test_single_point_profile_still_advances() {
        let scene = Scene::shared();
        let mut engine = TrailEngine::new(scene, false);
        engine.initialize(
            TrailMaterial::base(),
            3,
            false,
            HeadProfile::from_points([Vec3::Y]),
            Mat4::IDENTITY,
        );
        for _ in 0..6 {
            engine.advance();
        }
        assert_eq!(engine.current_length(), 4);
        assert_eq!(engine.geometry().unwrap().draw_index_count(), 0);
    }

    #[test]
    fn test_update_cadence() {
        let (mut engine, _, _) = line_engine(10);
        engine.set_advance_frequency(10.0);

        engine.update(1.0);
        assert_eq!(engine.current_length(), 0);

        engine.update(1.05);
        assert_eq!(engine.current_length(), 0);

        engine.update(1.11);
        assert_eq!(engine.current_length(), 1);

        engine.update(1.15);
        assert_eq!(engine.current_length(), 1);

        engine.update(1.25);
        assert_eq!(engine.current_length(), 2);
    }

    #[test]
    fn test_invalid_frequency_ignored() {
        let (mut engine, _, _) = line_engine(1);
        engine.set_advance_frequency(0.0);
        engine.set_advance_frequency(f64::NAN);
        assert_eq!(engine.advance_frequency(), DEFAULT_ADVANCE_FREQUENCY);
    }

    #[test]
    fn test_pause_resume_preserves_time_to_next_advance() {
        let (mut engine, _, _) = line_engine(10);
        engine.set_advance_frequency(4.0);
        engine.update(2.0);
        engine.update(2.1);

        let before = engine.time_until_next_advance(2.1);
        engine.pause(2.1);
        engine.resume(2.1);
        let after = engine.time_until_next_advance(2.1);
        assert!((before - after).abs() < 1e-9);
        assert!((before - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_pause_freezes_cadence() {
        let (mut engine, _, _) = line_engine(10);
        engine.set_advance_frequency(10.0);
        engine.update(0.0);

        engine.pause(0.05);
        engine.pause(0.06);
        engine.update(5.0);
        assert_eq!(engine.current_length(), 0);
        assert!((engine.time_until_next_advance(5.0) - 0.05).abs() < 1e-9);

        engine.resume(10.0);
        engine.resume(10.01);
        engine.update(10.04);
        assert_eq!(engine.current_length(), 0);
        engine.update(10.06);
        assert_eq!(engine.current_length(), 1);
    }

    #[test]
    fn test_activation_is_idempotent() {
        let (mut engine, _, scene) = line_engine(3);
        assert!(!engine.is_active());

        engine.activate();
        engine.activate();
        assert!(engine.is_active());
        assert_eq!(scene.borrow().meshes().len(), 1);

        engine.deactivate();
        engine.deactivate();
        assert!(!engine.is_active());
    }

    #[test]
    fn test_reinitialize_replaces_mesh() {
        let (mut engine, transform, scene) = line_engine(3);
        engine.activate();
        let old_mesh = engine.mesh_id().unwrap();

        engine.initialize(
            TrailMaterial::textured(),
            7,
            true,
            HeadProfile::star(),
            Rc::clone(&transform),
        );
        assert!(!scene.borrow().contains(old_mesh));
        assert_ne!(engine.mesh_id(), Some(old_mesh));
        assert_eq!(engine.capacity(), 8);
        assert!(engine.drag_texture());
        assert!(engine.material().unwrap().drag_texture());
    }

    #[test]
    fn test_orientation_follows_travel() {
        let scene = Scene::shared();
        let transform = Rc::new(RefCell::new(Mat4::IDENTITY));
        let mut engine = TrailEngine::new(scene, true);
        engine.initialize(
            TrailMaterial::base(),
            5,
            false,
            HeadProfile::from_points([Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0)]),
            Rc::clone(&transform),
        );

        engine.advance();
        // No predecessor: profile left as transformed
        let first = engine.geometry().unwrap().node_vertices(0);
        assert_eq!(first[1].position, [0.0, 0.0, -1.0]);

        // One node behind it is not enough to orient the second
        move_to(&transform, Vec3::new(10.0, 0.0, 0.0));
        engine.advance();
        let second = engine.geometry().unwrap().node_vertices(1);
        let tip = Vec3::from_array(second[1].position);
        assert!((tip - Vec3::new(10.0, 0.0, -1.0)).length() < 1e-5);

        move_to(&transform, Vec3::new(20.0, 0.0, 0.0));
        engine.advance();
        let third = engine.geometry().unwrap().node_vertices(2);
        let tip = Vec3::from_array(third[1].position);
        assert!((tip - Vec3::new(21.0, 0.0, 0.0)).length() < 1e-5);

        // Standing still keeps the previous heading
        engine.advance();
        let fourth = engine.geometry().unwrap().node_vertices(3);
        let tip = Vec3::from_array(fourth[1].position);
        assert!((tip - Vec3::new(21.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_slot_capacity_fits_index_range() {
        assert_eq!(slot_capacity(0, 4), 0);
        assert_eq!(slot_capacity(300, 4), 301);
        let clamped = slot_capacity(usize::MAX, 128);
        assert_eq!(clamped, u32::MAX as usize / 128);
        assert!(clamped * 128 <= u32::MAX as usize);
    }

    #[test]
    fn test_scrolled_texture_starts_at_head() {
        let scene = Scene::shared();
        let transform = Rc::new(RefCell::new(Mat4::IDENTITY));
        let mut engine = TrailEngine::new(scene, false);
        engine.initialize(
            TrailMaterial::textured(),
            10,
            false,
            HeadProfile::line(2.0),
            Rc::clone(&transform),
        );
        engine.advance();

        let material = engine.material().unwrap();
        let head = engine.geometry().unwrap().node_vertices(0);
        for vertex in head {
            let coords = material.texture_coords(vertex.node_id, vertex.node_vertex_id);
            assert!(coords.x.abs() < 1e-6);
        }
        assert_eq!(head[1].node_vertex_id, 1);
    }
}
