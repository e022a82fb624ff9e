//! Input shapes, validation and mapping into the storage shape.

pub mod coordinates;
pub mod dataset;
pub mod legacy;
pub mod mapper;
pub mod nullable;
pub mod provided;
pub mod validation;

pub use coordinates::{parse_coordinates, CoordinateParseError};
pub use dataset::{
    find_duplicate_names, load_dataset, parse_dataset, summarize, DatasetFormat, DatasetRecord,
    DatasetSummary,
};
pub use legacy::LegacyArtistData;
pub use mapper::{map_legacy, map_provided, MappedArtist, MappingWarning};
pub use provided::ProvidedArtistData;
pub use validation::{validate_legacy, validate_provided};
