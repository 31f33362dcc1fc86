//! Book metadata as supplied by the caller, with every field defaulted.
//!
//! A [`BookConfig`] is resolved once per request from a flat key/value
//! mapping (form fields, TOML keys, `--set` overrides). Keys that are not
//! config fields, such as `chapter_count`, are ignored here.

use serde::de::value::{Error as ValueError, MapDeserializer};
use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};
use crate::numerals::NumeralSystem;

/// One row of the index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub title: String,
    /// Starting page, already formatted in the book's numeral system.
    pub page: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    // front cover
    pub publisher_badge: String,
    pub genre_tag: String,
    /// English title; `<br>` marks a line break on the cover.
    pub book_title_en: String,
    pub book_title_bn: String,
    pub subtitle: String,
    pub author_label: String,
    pub author_name: String,
    pub translator_label: String,
    pub translator_name: String,

    // copyright page
    pub cp_title: String,
    pub cp_subtitle: String,
    pub cp_original_author: String,
    pub cp_pub_year: String,
    pub cp_lang: String,
    pub cp_translator: String,
    pub cp_publisher: String,
    pub cp_edition: String,
    pub cp_isbn_13: String,
    pub cp_isbn_10: String,
    pub cp_copyright_text: String,
    pub cp_contact_web: String,
    pub cp_contact_email: String,

    // index page
    pub index_title: String,
    pub index_subtitle: String,

    // back cover
    pub bio_name: String,
    pub bio_title_tag: String,
    pub bio_description: String,
    pub cta_headline: String,
    pub cta_text: String,
    /// Payload of the back-cover QR code.
    pub group_link: String,

    // document engine
    pub producer: String,
    pub creator: String,
    pub numerals: NumeralSystem,

    /// Filled by the assembler after the offset pass.
    #[serde(skip)]
    pub toc_list: Vec<TocEntry>,
    /// PNG bytes of the QR code for `group_link`.
    #[serde(skip)]
    pub qr_code: Vec<u8>,
    /// Uploaded portrait for the back cover; a placeholder is drawn when absent.
    #[serde(skip)]
    pub bio_image: Option<Vec<u8>>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            publisher_badge: "THE HIDDEN SHELF CLASSICS".into(),
            genre_tag: "Political Philosophy".into(),
            book_title_en: "THE<br>PRINCE".into(),
            book_title_bn: "দ্য প্রিন্স".into(),
            subtitle: "A Timeless Manual on Power, Politics, and Leadership".into(),
            author_label: "Original Masterpiece By".into(),
            author_name: "Niccolò Machiavelli".into(),
            translator_label: "Bengali Translation & Analysis By".into(),
            translator_name: "Touhidul Islam".into(),
            cp_title: "THE PRINCE".into(),
            cp_subtitle: "দ্য প্রিন্স".into(),
            cp_original_author: "Niccolò Machiavelli".into(),
            cp_pub_year: "1532 (Posthumous)".into(),
            cp_lang: "Italian".into(),
            cp_translator: "Touhidul Islam".into(),
            cp_publisher: "The Hidden Shelf".into(),
            cp_edition: "February 2026".into(),
            cp_isbn_13: "ISBN-13: 978-0-123456-78-9".into(),
            cp_isbn_10: "ISBN-10: 0-123456-78-X".into(),
            cp_copyright_text: "© 2026 The Hidden Shelf. All rights reserved.".into(),
            cp_contact_web: "thehiddenshelf.com".into(),
            cp_contact_email: "books@thehiddenshelf.com".into(),
            index_title: "Index".into(),
            index_subtitle: "Strategic Breakdown".into(),
            bio_name: "Touhidul Islam".into(),
            bio_title_tag: "FOUNDER, THE HIDDEN SHELF".into(),
            bio_description: "A strategic thinker and content strategist analyzing complex \
                              geopolitical and historical events in contemporary contexts."
                .into(),
            cta_headline: "Join the Discussion".into(),
            cta_text: "Join our exclusive strategic community to discuss this book in depth."
                .into(),
            group_link: "https://facebook.com/groups/hidden-shelf".into(),
            producer: "The Hidden Shelf Publishing Engine".into(),
            creator: concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")).into(),
            numerals: NumeralSystem::default(),
            toc_list: Vec::new(),
            qr_code: Vec::new(),
            bio_image: None,
        }
    }
}

/// The document information dictionary written into the merged book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub producer: String,
    pub creator: String,
    pub keywords: String,
}

impl BookConfig {
    /// Resolve a config from flat key/value pairs; absent keys keep their defaults.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let de = MapDeserializer::<_, ValueError>::new(fields.into_iter());
        BookConfig::deserialize(de).map_err(|e| BindError::invalid("config", e.to_string()))
    }

    /// Cover title lines, split on `<br>`.
    pub fn title_lines(&self) -> Vec<&str> {
        self.book_title_en.split("<br>").map(str::trim).collect()
    }

    pub fn document_info(&self) -> DocumentInfo {
        DocumentInfo {
            title: format!(
                "{} - {}",
                self.book_title_en.replace("<br>", " "),
                self.book_title_bn
            ),
            author: self.author_name.clone(),
            subject: self.subtitle.clone(),
            producer: self.producer.clone(),
            creator: self.creator.clone(),
            keywords: format!(
                "{}, {}, {}",
                self.genre_tag, self.author_name, self.translator_name
            ),
        }
    }
}
