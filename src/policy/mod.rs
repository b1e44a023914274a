//! Per-cluster component policy: stored state, change requests and the
//! rules that guard them.

pub mod apply;
pub mod model;

pub use apply::{apply_change, ChangeError};
pub use model::{ChangeRequest, ComponentPolicy, VersionEdit};
