mod entry;
mod resolve;

pub use entry::RelationshipEntry;
pub use resolve::CrosswalkMapping;
