/// World-transform providers followed by a trail
use std::cell::RefCell;
use std::rc::Rc;

use glam::Mat4;

/// Anything that can report the current world transform of the followed object.
///
/// Queried once per `advance`/`update_head`, so implementations should
/// recompute on demand rather than cache stale matrices.
pub trait TransformSource {
    fn world_transform(&self) -> Mat4;
}

impl TransformSource for Mat4 {
    fn world_transform(&self) -> Mat4 {
        *self
    }
}

impl<T: TransformSource + ?Sized> TransformSource for Rc<RefCell<T>> {
    fn world_transform(&self) -> Mat4 {
        self.borrow().world_transform()
    }
}

impl<T: TransformSource + ?Sized> TransformSource for Box<T> {
    fn world_transform(&self) -> Mat4 {
        (**self).world_transform()
    }
}
