/// A version of the boundary definitions a unit id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vintage {
    Old,    // Source delineation (e.g. 2010 tracts)
    New,    // Target delineation (e.g. 2020 tracts)
}

impl Vintage {
    pub fn to_str(&self) -> &'static str {
        match self {
            Vintage::Old => "old",
            Vintage::New => "new",
        }
    }
}
