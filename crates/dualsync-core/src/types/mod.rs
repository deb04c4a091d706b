//! Core types for DualSync

mod acl;
mod decision;
mod event;
mod policy;
mod snapshot;

pub use acl::*;
pub use decision::*;
pub use event::*;
pub use policy::*;
pub use snapshot::*;
