//! Torznab XML encoding: search feeds, capabilities and error documents.

mod caps;
mod encoder;
mod item;
mod xml;

pub use caps::{CapabilityDescriptor, CategoryCap, SearchingCap};
pub use encoder::{ProtocolEncoder, TORZNAB_NS};
pub use item::{TorznabAttr, TorznabItem};
pub use xml::EncodeError;
