//! HTML fragment formatting for listing pages.
//!
//! Turns [`Record`](vitrine_records::Record) slices into the HTML strings
//! the page cache publishes: the front-page preview and the paginated
//! listing fragments. Markup lives in embedded [`upon`] templates; record
//! fields are untrusted visitor input and pass through an `escape` formatter
//! on their way in.

mod assets;
pub mod error;
mod formatter;

pub use crate::assets::Templates;
pub use crate::formatter::{Formatter, PageContext};
