//! Live adapters for real external interactions.

pub mod attributes;
pub mod classifier;
pub mod clock;
pub mod confirm;
pub mod id_gen;
pub mod lister;
pub mod resolver;

pub use attributes::LiveFileAttributes;
pub use classifier::LivePathClassifier;
pub use clock::LiveClock;
pub use confirm::{AlwaysConfirm, PromptConfirmation};
pub use id_gen::LiveIdGenerator;
pub use lister::LiveChildLister;
pub use resolver::LnkResolver;
