//! Opaque host handles.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Host data the copier cannot look inside.
///
/// Native objects are shared as-is unless their type is flagged
/// `SELF_CLONE`, in which case [`duplicate`](NativeData::duplicate) is the
/// only user code the copier ever runs.
pub trait NativeData: fmt::Debug + Send + Sync {
    /// Produce an independent copy. `None` means the handle is shared.
    fn duplicate(&self) -> Option<Arc<dyn NativeData>> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}
