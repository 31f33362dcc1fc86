//! Bind a styled cover, copyright page, index and back cover around a set
//! of uploaded chapter PDFs, producing one book with a matching table of
//! contents, bookmarks and document metadata.

pub mod assemble;
pub mod binder;
pub mod book_config;
pub mod error;
pub mod intake;
pub mod numerals;
pub mod page_size;
pub mod qr;
pub mod rasterize;
pub mod template;

pub use assemble::{Assembler, UploadedChapter};
pub use book_config::{BookConfig, DocumentInfo, TocEntry};
pub use error::{BindError, Result};
pub use intake::BookRequest;
pub use numerals::NumeralSystem;
pub use page_size::{PageSize, UnitSystem};
pub use rasterize::Rasterizer;
