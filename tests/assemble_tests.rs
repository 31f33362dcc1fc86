mod common;

use std::collections::BTreeMap;

use book_binder::assemble::{load_chapters, table_of_contents};
use book_binder::binder::{read_info, read_outline};
use book_binder::{Assembler, BindError, BookConfig, BookRequest, NumeralSystem};
use common::{A4_WIDTH, chapter_pdf, page_widths};
use lopdf::Document;

fn form(fields: &[(&str, &str)], files: Vec<(String, Vec<u8>)>) -> BookRequest {
    let fields: BTreeMap<String, String> = fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    BookRequest::from_form(&fields, files.into_iter().collect()).unwrap()
}

fn assemble(request: BookRequest) -> Document {
    let bytes = Assembler::default().assemble(request).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    Document::load_mem(&bytes).unwrap()
}

#[test]
fn two_chapter_book_matches_its_index() {
    let request = form(
        &[
            ("chapter_count", "2"),
            ("chapter_0_title", "Introduction"),
            ("chapter_1_title", "Conclusion"),
        ],
        vec![
            ("chapter_0".into(), chapter_pdf(10, 10)),
            ("chapter_1".into(), chapter_pdf(11, 15)),
        ],
    );

    let toc = table_of_contents(&load_chapters(&request).unwrap(), request.config.numerals);
    assert_eq!(toc[0].title, "Introduction");
    assert_eq!(toc[0].page, "৪");
    assert_eq!(toc[1].title, "Conclusion");
    assert_eq!(toc[1].page, "১৪");

    let doc = assemble(request);
    assert_eq!(doc.get_pages().len(), 29);

    let mut expected = vec![A4_WIDTH; 3];
    expected.extend(1000..1010);
    expected.extend(1100..1115);
    expected.push(A4_WIDTH);
    assert_eq!(page_widths(&doc), expected);

    assert_eq!(
        read_outline(&doc),
        vec![("Introduction".to_string(), 3), ("Conclusion".to_string(), 13)]
    );
}

#[test]
fn bookmarks_land_on_printed_offsets() {
    let counts = [3usize, 1, 7, 2];
    let mut fields = vec![("chapter_count", "4"), ("numerals", "latin")];
    fields.push(("chapter_3_title", "Appendix"));
    let files = counts
        .iter()
        .enumerate()
        .map(|(i, n)| (format!("chapter_{i}"), chapter_pdf(10 + i as i64, *n)))
        .collect();
    let request = form(&fields, files);

    let toc = table_of_contents(&load_chapters(&request).unwrap(), NumeralSystem::Latin);
    let doc = assemble(request);
    let outline = read_outline(&doc);

    assert_eq!(outline.len(), toc.len());
    let widths = page_widths(&doc);
    for (i, ((title, page_index), entry)) in outline.iter().zip(&toc).enumerate() {
        assert_eq!(title, &entry.title);
        let printed: usize = entry.page.parse().unwrap();
        assert_eq!(page_index + 1, printed);
        // the bookmarked page is the first page of chapter i
        assert_eq!(widths[*page_index], (10 + i as i64) * 100);
    }
    assert_eq!(outline[3].0, "Appendix");
    assert_eq!(doc.get_pages().len(), 4 + counts.iter().sum::<usize>());
}

#[test]
fn empty_request_yields_matter_only() {
    let doc = assemble(form(&[], vec![]));
    assert_eq!(page_widths(&doc), vec![A4_WIDTH; 4]);
    assert!(read_outline(&doc).is_empty());

    let info = read_info(&doc).unwrap();
    assert_eq!(info, BookConfig::default().document_info());
}

#[test]
fn chapters_keep_upload_order() {
    let request = form(
        &[
            ("chapter_count", "3"),
            ("chapter_0_title", "Zulu"),
            ("chapter_1_title", "Alpha"),
            ("chapter_2_title", "Mike"),
        ],
        vec![
            ("chapter_2".into(), chapter_pdf(30, 1)),
            ("chapter_0".into(), chapter_pdf(10, 5)),
            ("chapter_1".into(), chapter_pdf(20, 2)),
        ],
    );
    let doc = assemble(request);
    let titles: Vec<String> = read_outline(&doc).into_iter().map(|(t, _)| t).collect();
    assert_eq!(titles, vec!["Zulu", "Alpha", "Mike"]);

    let widths = page_widths(&doc);
    assert_eq!(&widths[3..11], &[1000, 1001, 1002, 1003, 1004, 2000, 2001, 3000]);
}

#[test]
fn missing_slot_is_skipped_and_untitled_chapter_gets_default_title() {
    let request = form(
        &[("chapter_count", "3")],
        vec![
            ("chapter_0".into(), chapter_pdf(10, 2)),
            ("chapter_2".into(), chapter_pdf(30, 2)),
        ],
    );
    let doc = assemble(request);
    assert_eq!(
        read_outline(&doc),
        vec![("Chapter 1".to_string(), 3), ("Chapter 3".to_string(), 5)]
    );
}

#[test]
fn zero_page_chapter_points_at_next_page() {
    let request = form(
        &[("chapter_count", "3"), ("numerals", "latin")],
        vec![
            ("chapter_0".into(), chapter_pdf(10, 2)),
            ("chapter_1".into(), chapter_pdf(20, 0)),
            ("chapter_2".into(), chapter_pdf(30, 4)),
        ],
    );
    let toc = table_of_contents(&load_chapters(&request).unwrap(), NumeralSystem::Latin);
    let pages: Vec<&str> = toc.iter().map(|e| e.page.as_str()).collect();
    assert_eq!(pages, vec!["4", "6", "6"]);

    let doc = assemble(request);
    assert_eq!(doc.get_pages().len(), 3 + 2 + 4 + 1);
    assert_eq!(
        read_outline(&doc),
        vec![
            ("Chapter 1".to_string(), 3),
            ("Chapter 2".to_string(), 5),
            ("Chapter 3".to_string(), 5),
        ]
    );
}

#[test]
fn trailing_zero_page_chapter_points_at_back_cover() {
    let request = form(
        &[("chapter_count", "2")],
        vec![
            ("chapter_0".into(), chapter_pdf(10, 1)),
            ("chapter_1".into(), chapter_pdf(20, 0)),
        ],
    );
    let doc = assemble(request);
    assert_eq!(doc.get_pages().len(), 5);
    assert_eq!(read_outline(&doc)[1], ("Chapter 2".to_string(), 4));
}

#[test]
fn metadata_follows_config() {
    let request = form(
        &[
            ("book_title_en", "THE<br>ART<br>OF WAR"),
            ("book_title_bn", "যুদ্ধের কৌশল"),
            ("author_name", "Sun Tzu"),
            ("subtitle", "Ancient strategy"),
            ("genre_tag", "Military"),
            ("translator_name", "R. Khan"),
            ("producer", "Test Press"),
        ],
        vec![],
    );
    let info = read_info(&assemble(request)).unwrap();
    assert_eq!(info.title, "THE ART OF WAR - যুদ্ধের কৌশল");
    assert_eq!(info.author, "Sun Tzu");
    assert_eq!(info.subject, "Ancient strategy");
    assert_eq!(info.producer, "Test Press");
    assert!(info.creator.starts_with("book_binder"));
    assert_eq!(info.keywords, "Military, Sun Tzu, R. Khan");
}

#[test]
fn uploaded_portrait_is_accepted() {
    let png = book_binder::qr::encode_png("portrait").unwrap();
    let doc = assemble(form(&[], vec![("author_image".into(), png)]));
    assert_eq!(doc.get_pages().len(), 4);
}

#[test]
fn control_character_in_a_field_is_a_render_error() {
    let request = form(&[("cp_copyright_text", "All rights\u{1} reserved")], vec![]);
    let err = Assembler::default().assemble(request).unwrap_err();
    match err {
        BindError::Render(msg) => assert!(msg.starts_with("page 2:"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_chapter_fails_whole_book() {
    let request = form(
        &[("chapter_count", "2")],
        vec![
            ("chapter_0".into(), chapter_pdf(10, 3)),
            ("chapter_1".into(), b"%PDF-1.5 truncated".to_vec()),
        ],
    );
    let err = Assembler::default().assemble(request).unwrap_err();
    assert!(matches!(err, BindError::MalformedUpload { index: 1, .. }));
}

#[test]
fn non_integer_chapter_count_is_rejected_up_front() {
    let fields: BTreeMap<String, String> =
        [("chapter_count".to_string(), "many".to_string())].into_iter().collect();
    let err = BookRequest::from_form(&fields, BTreeMap::new()).unwrap_err();
    assert!(err.to_string().contains("chapter_count"));
}
