/// Scene collaborator: tracks which trail meshes are submitted for drawing
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one allocated trail mesh; re-initialization yields a new id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(u64);

impl MeshId {
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Shared, single-threaded handle to the scene
pub type SceneHandle = Rc<RefCell<Scene>>;

#[derive(Debug, Default)]
pub struct Scene {
    meshes: Vec<MeshId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SceneHandle {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn add(&mut self, mesh: MeshId) {
        if !self.contains(mesh) {
            self.meshes.push(mesh);
            log::debug!("Scene: added mesh {:?}", mesh);
        }
    }

    pub fn remove(&mut self, mesh: MeshId) {
        let before = self.meshes.len();
        self.meshes.retain(|&m| m != mesh);
        if self.meshes.len() != before {
            log::debug!("Scene: removed mesh {:?}", mesh);
        }
    }

    pub fn contains(&self, mesh: MeshId) -> bool {
        self.meshes.contains(&mesh)
    }

    pub fn meshes(&self) -> &[MeshId] {
        &self.meshes
    }
}
