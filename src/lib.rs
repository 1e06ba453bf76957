mod container;
mod dataset;
mod errors;
mod geom;
mod mapping;
mod query;
#[cfg(test)]
pub(crate) mod testing;

pub use container::Container;
pub use container::FileMode;
pub use container::MapRow;
pub use container::Metadata;
pub use container::Section;
pub use container::Value;
pub use container::FORMAT_TRACKING;
pub use container::SECTION_TRACKING;

pub use dataset::Dataset;

pub use errors::Error;
pub use errors::Result;

pub use geom::search_window;
pub use geom::Window;

pub use mapping::IdMap;
pub use mapping::Selector;

pub use query::AxisType;
pub use query::PositionData;
pub use query::PositionQuery;
