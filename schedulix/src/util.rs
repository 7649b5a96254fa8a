//! Internal primitives shared by the scheduler implementations.

pub(crate) mod futures;
pub(crate) mod pending_queue;
