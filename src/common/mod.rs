mod fs;
mod order;

pub(crate) use fs::*;
pub(crate) use order::*;
