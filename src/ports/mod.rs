//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the conversion core and the
//! host system (shortcut reading, filesystem queries, attributes, time, IDs,
//! and the user). Implementations live in `src/adapters/`.

pub mod attributes;
pub mod classifier;
pub mod clock;
pub mod confirm;
pub mod id_gen;
pub mod lister;
pub mod resolver;

pub use attributes::{Attributes, FileAttributes};
pub use classifier::{PathClassifier, TargetKind};
pub use clock::Clock;
pub use confirm::Confirmation;
pub use id_gen::IdGenerator;
pub use lister::ChildLister;
pub use resolver::ShortcutTargetResolver;
