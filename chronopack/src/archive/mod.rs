//! Extension-filtered archive building.
//!
//! [`select_entries`] decides which files of an [`ArchiveSpec`] qualify;
//! [`pack_archive`] stores them uncompressed and moves the finished archive
//! into the staging directory.
//!
//! [`ArchiveSpec`]: crate::profile::ArchiveSpec

mod builder;
mod filter;

pub use builder::{pack_archive, ArchiveTarget, PackedArchive};
pub use filter::{entry_name, select_entries, ArchiveEntry, SuffixFilter};
