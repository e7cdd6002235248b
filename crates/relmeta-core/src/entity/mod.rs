//! Runtime entity values.
//!
//! An [`Attributes`] container holds the values of one relation instance and
//! validates every name against its heading. [`Entity`] wraps the container
//! of a base heading together with the proxies for its child relations.

mod association;
mod attributes;
mod instance;

pub use association::{Associations, ManyProxy, OneProxy, RecordSink, WriteKind};
pub use attributes::Attributes;
pub use instance::Entity;
