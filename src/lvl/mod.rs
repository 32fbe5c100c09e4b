//! Reading of Battlefront II level archives (`*.lvl`).
//!
//! Level files are UCFB containers: a tree of 4-byte-tagged, length-prefixed,
//! 4-byte-aligned chunks.  We only care about the entity class chunks
//! (`entc`, `ordc`, `wpnc`, `expc`) and the `lvl_` sub-level groups that may
//! contain more of them; everything else is skipped without being decoded.

pub mod chunk;
pub mod container;
pub mod entity_class;
pub mod level;
pub mod logger;
#[cfg(test)]
pub(crate) mod test_support;

pub use container::{Container, LevelHandle};
pub use entity_class::{EntityClass, EntityClassKind};
pub use level::Level;
pub use logger::{LogLevel, LoggerEntry};
