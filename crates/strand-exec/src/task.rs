//! Tagged task: a task body paired with a barrier-issued sequence token.

/// A unit of work submitted to a strand.
pub type TaskBody = Box<dyn FnOnce() + Send + 'static>;

/// A task plus the sequence token assigned to it at submission time.
///
/// The token only matters for barrier bookkeeping; it has no bearing on
/// execution order within a strand, which is governed purely by FIFO queue
/// position.
pub struct TaggedTask {
    pub body: TaskBody,
    pub token: u32,
}

impl TaggedTask {
    pub fn new(body: TaskBody, token: u32) -> Self {
        TaggedTask { body, token }
    }
}
