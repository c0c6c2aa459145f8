//! Host view handles
//!
//! Adapters never render; they hand the framework an opaque container that the
//! network's banner view lives in. The container tracks its child and the parent
//! it is attached to so that invalidation can detach it again.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of a platform view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

impl ViewId {
    /// Allocate a process-unique view id
    pub fn next() -> Self {
        Self(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Layout of a child inside a container, in pixels, centered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildLayout {
    /// Child view
    pub view: ViewId,
    /// Width in pixels
    pub width_px: u32,
    /// Height in pixels
    pub height_px: u32,
}

#[derive(Debug, Default)]
struct ContainerState {
    child: Option<ChildLayout>,
    parent: Option<ViewId>,
}

/// Frame that holds a network banner view
#[derive(Debug)]
pub struct BannerContainer {
    id: ViewId,
    state: Mutex<ContainerState>,
}

impl BannerContainer {
    /// Create an empty, detached container
    pub fn new() -> Self {
        Self {
            id: ViewId::next(),
            state: Mutex::new(ContainerState::default()),
        }
    }

    /// Id of the container itself
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Place `view` in the container, replacing any previous child
    pub fn add_child(&self, view: ViewId, width_px: u32, height_px: u32) {
        self.state.lock().child = Some(ChildLayout {
            view,
            width_px,
            height_px,
        });
    }

    /// Current child layout, if any
    pub fn child(&self) -> Option<ChildLayout> {
        self.state.lock().child
    }

    /// Attach the container to `parent`; the framework calls this when it renders
    pub fn attach_to(&self, parent: ViewId) {
        self.state.lock().parent = Some(parent);
    }

    /// Parent the container is attached to, if any
    pub fn parent(&self) -> Option<ViewId> {
        self.state.lock().parent
    }

    /// Whether the container is currently attached
    pub fn is_attached(&self) -> bool {
        self.parent().is_some()
    }

    /// Detach from the parent. Returns the old parent; a no-op when detached.
    pub fn remove_from_parent(&self) -> Option<ViewId> {
        self.state.lock().parent.take()
    }
}

impl Default for BannerContainer {
    fn default() -> Self {
        Self::new()
    }
}
