//! Authorization errors using the unified error system

pub use rolmanager_core::{ManagerError, Result};
