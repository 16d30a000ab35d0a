//! The seg file format: SegFile -> EdgeGroup -> DataSection.
//!
//! Reads are zero-copy decodings over a borrowed buffer and flow top-down.
//! Writes flow bottom-up through [`EdgeGroupBuilder`] and
//! [`SegFileWriter`], one whole edge group at a time.

mod encode;
mod footer;
mod group;
mod section;
mod segfile;
mod value;
mod writer;

pub use encode::{EdgeGroupBuilder, EncodedGroup, EncodedSection, SectionEncoder};
pub use footer::{Footer, NullState, FOOTER_LEN};
pub use group::{ColumnRange, EdgeGroup};
pub use section::{DataSection, ValueLayout};
pub use segfile::{Groups, SegFile};
pub use value::{ColumnValue, FixedValue};
pub use writer::{GroupExtent, SegFileWriter, SegManifest};
