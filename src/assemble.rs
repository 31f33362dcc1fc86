//! Book assembly: chapter offsets, table of contents, rendered matter and
//! the final merge.
//!
//! The merged book is laid out as
//!
//! ```text
//! cover | copyright | index | chapter 0 .. chapter n-1 | back cover
//! ```
//!
//! so chapter `i` starts on page `4 + sum(pages of chapters 0..i)`
//! (1-based), which is exactly what the index page prints and where its
//! bookmark points.

use lopdf::Document;
use tracing::{debug, info, warn};

use crate::binder::{self, Binder};
use crate::book_config::{BookConfig, TocEntry};
use crate::error::{BindError, Result};
use crate::intake::BookRequest;
use crate::numerals::NumeralSystem;
use crate::page_size::PageSize;
use crate::qr;
use crate::rasterize::Rasterizer;
use crate::template;

/// Rendered pages placed before the chapters: cover, copyright, index.
pub const FRONT_MATTER_PAGES: usize = 3;
/// 1-based page on which the first chapter starts.
pub const FIRST_CHAPTER_PAGE: usize = FRONT_MATTER_PAGES + 1;

/// A parsed chapter upload.
#[derive(Debug, Clone)]
pub struct UploadedChapter {
    pub index: usize,
    pub title: String,
    pub document: Document,
}

impl UploadedChapter {
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }
}

/// Parse every present chapter upload, in index order.
///
/// The first unreadable upload fails the whole request.
pub fn load_chapters(request: &BookRequest) -> Result<Vec<UploadedChapter>> {
    request
        .chapter_files
        .iter()
        .enumerate()
        .filter_map(|(index, file)| file.as_deref().map(|bytes| (index, bytes)))
        .map(|(index, bytes)| -> Result<UploadedChapter> {
            let document = Document::load_mem(bytes)
                .map_err(|source| BindError::MalformedUpload { index, source })?;
            let chapter = UploadedChapter {
                index,
                title: request.chapter_title(index),
                document,
            };
            debug!(index, title = %chapter.title, pages = chapter.page_count(), "chapter loaded");
            Ok(chapter)
        })
        .collect()
}

/// 1-based starting page of each chapter, given their page counts in order.
pub fn chapter_offsets(page_counts: impl IntoIterator<Item = usize>) -> Vec<usize> {
    page_counts
        .into_iter()
        .scan(FIRST_CHAPTER_PAGE, |next, count| {
            let start = *next;
            *next += count;
            Some(start)
        })
        .collect()
}

/// Index-page rows for `chapters`, page numbers in `numerals`.
pub fn table_of_contents(chapters: &[UploadedChapter], numerals: NumeralSystem) -> Vec<TocEntry> {
    let offsets = chapter_offsets(chapters.iter().map(UploadedChapter::page_count));
    chapters
        .iter()
        .zip(offsets)
        .map(|(chapter, page)| TocEntry {
            title: chapter.title.clone(),
            page: numerals.format(page as u64),
        })
        .collect()
}

/// Builds books; one instance can serve any number of independent requests.
pub struct Assembler {
    rasterizer: Rasterizer,
    page_size: PageSize,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(Rasterizer::default(), PageSize::default())
    }
}

impl Assembler {
    pub fn new(rasterizer: Rasterizer, page_size: PageSize) -> Self {
        Self {
            rasterizer,
            page_size,
        }
    }

    /// Assemble the complete book and serialize it.
    pub fn assemble(&self, request: BookRequest) -> Result<Vec<u8>> {
        let mut doc = self.assemble_document(request)?;
        let bytes = binder::to_bytes(&mut doc)?;
        info!(bytes = bytes.len(), "book written");
        Ok(bytes)
    }

    /// Assemble the complete book as an in-memory document.
    pub fn assemble_document(&self, request: BookRequest) -> Result<Document> {
        // offset pass
        let chapters = load_chapters(&request)?;
        let BookRequest {
            config,
            author_image,
            ..
        } = request;
        let toc_list = table_of_contents(&chapters, config.numerals);
        info!(chapters = chapters.len(), "offsets computed");

        // render pass
        let qr_code = qr::encode_png(&config.group_link)?;
        let config = BookConfig {
            toc_list,
            qr_code,
            bio_image: author_image,
            ..config
        };
        let markup = template::render(&config, self.page_size);
        let matter = self.rasterizer.rasterize(&markup, self.page_size)?;

        // merge pass
        merge(&config, matter, chapters)
    }
}

/// Front matter, chapters with their bookmarks, then the back cover.
fn merge(config: &BookConfig, matter: Document, chapters: Vec<UploadedChapter>) -> Result<Document> {
    let matter_pages = matter.get_pages().len();
    if matter_pages <= FRONT_MATTER_PAGES {
        warn!(matter_pages, "rendered matter is short; missing pages are skipped");
    }

    let mut binder = Binder::new();
    binder.set_info(&config.document_info());
    binder.append_pages(matter.clone(), 0..FRONT_MATTER_PAGES)?;

    for chapter in chapters {
        binder.add_bookmark(chapter.title.as_str(), binder.page_count());
        let appended = binder.append_document(chapter.document)?;
        if appended == 0 {
            warn!(index = chapter.index, title = %chapter.title, "chapter has no pages");
        }
    }

    if matter_pages > FRONT_MATTER_PAGES {
        binder.append_pages(matter, FRONT_MATTER_PAGES..FRONT_MATTER_PAGES + 1)?;
    }

    info!(pages = binder.page_count(), "book merged");
    binder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Dictionary, Object, Stream, dictionary};

    fn pdf_with_pages(n: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..n)
            .map(|_| {
                let contents_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
                    "Contents" => contents_id,
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => n as i64 }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set(b"Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn matter(pages: usize) -> Document {
        Document::load_mem(&pdf_with_pages(pages)).unwrap()
    }

    fn chapter(index: usize, pages: usize) -> UploadedChapter {
        UploadedChapter {
            index,
            title: format!("Chapter {}", index + 1),
            document: Document::load_mem(&pdf_with_pages(pages)).unwrap(),
        }
    }

    #[test]
    fn offsets_start_after_front_matter() {
        assert_eq!(chapter_offsets([10, 15]), vec![4, 14]);
        assert_eq!(chapter_offsets([1, 1, 1]), vec![4, 5, 6]);
        assert!(chapter_offsets(Vec::new()).is_empty());
    }

    #[test]
    fn zero_page_chapter_shares_next_offset() {
        assert_eq!(chapter_offsets([2, 0, 5]), vec![4, 6, 6]);
    }

    #[test]
    fn toc_uses_numeral_system() {
        let chapters = vec![chapter(0, 10), chapter(1, 15)];
        let toc = table_of_contents(&chapters, NumeralSystem::Bengali);
        assert_eq!(
            toc,
            vec![
                TocEntry { title: "Chapter 1".into(), page: "৪".into() },
                TocEntry { title: "Chapter 2".into(), page: "১৪".into() },
            ]
        );
        let latin = table_of_contents(&chapters, NumeralSystem::Latin);
        assert_eq!(latin[1].page, "14");
    }

    #[test]
    fn load_skips_missing_slots_and_keeps_index_order() {
        let request = BookRequest {
            chapter_files: vec![None, Some(pdf_with_pages(2)), Some(pdf_with_pages(1))],
            chapter_titles: [(2, "Last".to_string())].into_iter().collect(),
            ..BookRequest::default()
        };
        let chapters = load_chapters(&request).unwrap();
        let summary: Vec<(usize, &str, usize)> = chapters
            .iter()
            .map(|c| (c.index, c.title.as_str(), c.page_count()))
            .collect();
        assert_eq!(summary, vec![(1, "Chapter 2", 2), (2, "Last", 1)]);
    }

    #[test]
    fn malformed_upload_names_its_index() {
        let request = BookRequest {
            chapter_files: vec![Some(pdf_with_pages(1)), Some(b"not a pdf".to_vec())],
            ..BookRequest::default()
        };
        let err = load_chapters(&request).unwrap_err();
        assert!(matches!(err, BindError::MalformedUpload { index: 1, .. }));
    }

    #[test]
    fn merge_places_back_cover_last() {
        let chapters = vec![chapter(0, 2), chapter(1, 3)];
        let doc = merge(&BookConfig::default(), matter(4), chapters).unwrap();
        assert_eq!(doc.get_pages().len(), 3 + 2 + 3 + 1);
        assert_eq!(
            binder::read_outline(&doc),
            vec![("Chapter 1".to_string(), 3), ("Chapter 2".to_string(), 5)]
        );
    }

    #[test]
    fn short_matter_appends_what_exists() {
        let doc = merge(&BookConfig::default(), matter(2), vec![chapter(0, 1)]).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
        assert_eq!(binder::read_outline(&doc), vec![("Chapter 1".to_string(), 2)]);
    }

    #[test]
    fn trailing_empty_chapter_without_back_cover_has_no_bookmark() {
        let doc = merge(&BookConfig::default(), matter(3), vec![chapter(0, 1), chapter(1, 0)]).unwrap();
        assert_eq!(doc.get_pages().len(), 4);
        assert_eq!(binder::read_outline(&doc), vec![("Chapter 1".to_string(), 3)]);
    }
}
