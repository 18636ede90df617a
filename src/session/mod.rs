//! Session Continuity Core — §4.8.

pub mod atomic;
pub mod bootstrap;
pub mod monitor;
pub mod recovery;

pub use atomic::{state_hash, write_atomic};
pub use bootstrap::BootstrapManager;
pub use monitor::{Pressure, SessionMonitor};
pub use recovery::{recovery_manifest_path, RecoveryAgent};
