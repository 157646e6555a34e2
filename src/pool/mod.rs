//! Live agent pool and team assembly.

pub mod pool;
pub mod team;

pub use self::pool::AgentPool;
pub use self::team::{TeamAssignment, TeamBuilder, TeamConfig};
