//! Content probes: header-only parsers that pull one number out of a file.
//!
//! Every probe takes a path and returns `Some(n)` on success or `None` for
//! anything it cannot vouch for (I/O error, truncation, wrong format,
//! exceeded bounds). None of them panic or allocate beyond fixed caps.

mod bmff;
mod bytes;

pub mod audio;
pub mod image;
pub mod pdf;

pub use audio::get_audio_duration;
pub use image::{get_image_megapixels, image_dimensions};
pub use pdf::get_pdf_page_count;
