//! Data ingestion, normalization and alignment

pub mod align;
pub mod csv_import;
pub mod normalize;
pub mod resample;
pub mod source;

pub use align::{align_inner, AlignedCloses};
pub use csv_import::{parse_timestamp, read_raw_bars, CsvError};
pub use normalize::{normalize, DuplicatePolicy, NormalizeError};
pub use resample::resample;
pub use source::{BarSource, MemorySource, RawBar, SourceError};
