//! lzip container parsing modules.
//!
//! A file is one or more concatenated members, each of them a 6-byte
//! header, an LZMA-coded body and a 20-byte trailer, optionally followed
//! by trailing data.

pub mod member_header;
pub mod member_trailer;

pub use member_header::{MemberHeader, LZIP_MAGIC};
pub use member_trailer::MemberTrailer;
