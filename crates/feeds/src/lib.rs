//! Product page collection and price extraction.
//!
//! - `source` - `PageSource` trait and the HTTP implementation
//! - `text` - HTML reduced to newline-joined visible text
//! - `extractor` - currency-marker scan producing an `ObservationSet`

pub mod error;
pub mod extractor;
pub mod source;
pub mod text;

pub use error::*;
pub use extractor::*;
pub use source::*;
pub use text::visible_text;
