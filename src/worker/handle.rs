/*!
 * Worker Handle
 * Opaque interrupt capability for exactly one worker thread
 */

use crate::core::types::DeadlineId;
use crate::interrupt::{InterruptState, InterruptToken, Interruptible, WakeupSignal};
use std::fmt;
use std::sync::Arc;

/// Handle to the worker running one operation
///
/// Created before the worker thread exists, so an interrupt can be requested
/// at any point of the record's life; requests made before the thread starts
/// are observed as soon as the operation checks its token.
#[derive(Clone)]
pub struct WorkerHandle {
    id: DeadlineId,
    state: Arc<InterruptState>,
}

impl WorkerHandle {
    /// Handle without a wake-up signal
    pub fn new(id: DeadlineId) -> Self {
        Self::with_wakeup(id, None)
    }

    pub(crate) fn with_wakeup(id: DeadlineId, wakeup: Option<WakeupSignal>) -> Self {
        Self {
            id,
            state: Arc::new(InterruptState::new(wakeup)),
        }
    }

    #[inline]
    pub fn id(&self) -> DeadlineId {
        self.id
    }

    /// Worker-side token observing this handle's interrupt requests
    pub fn token(&self) -> InterruptToken {
        InterruptToken::from_state(Arc::clone(&self.state))
    }

    /// Request an interrupt; `true` only for the call that raised it
    #[inline]
    pub fn interrupt(&self) -> bool {
        self.state.request()
    }

    pub(crate) fn state(&self) -> &Arc<InterruptState> {
        &self.state
    }
}

impl Interruptible for WorkerHandle {
    fn request_interrupt(&self) -> bool {
        self.interrupt()
    }

    fn is_interrupted(&self) -> bool {
        self.state.is_requested()
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("id", &self.id)
            .field("interrupted", &self.state.is_requested())
            .finish()
    }
}
