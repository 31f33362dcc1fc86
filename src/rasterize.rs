//! SVG pages → PDF, via svg2pdf (vector, text embedded as fonts).

use std::collections::HashMap;
use std::path::Path;

use lopdf::Document;
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref as PdfRef};
use svg2pdf::usvg;
use tracing::{debug, info};

use crate::binder::Binder;
use crate::error::{BindError, Result};
use crate::page_size::PageSize;
use crate::template::Markup;

/// Converts rendered markup into a paginated PDF document.
///
/// Holds the font database so system fonts are scanned once, not per page.
pub struct Rasterizer {
    options: usvg::Options<'static>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Rasterizer {
    /// System fonts plus, optionally, every font found under `fonts_dir`.
    pub fn new(fonts_dir: Option<&Path>) -> Self {
        let mut options = usvg::Options::default();
        let fontdb = options.fontdb_mut();
        fontdb.load_system_fonts();
        if let Some(dir) = fonts_dir {
            fontdb.load_fonts_dir(dir);
        }
        debug!(faces = options.fontdb.len(), "font database loaded");
        Self { options }
    }

    /// One output page per markup page, each sized to `size`.
    pub fn rasterize(&self, markup: &Markup, size: PageSize) -> Result<Document> {
        let mut binder = Binder::new();
        for (i, svg) in markup.pages.iter().enumerate() {
            let bytes = self
                .svg_to_page_pdf_bytes(svg, size)
                .map_err(|e| BindError::Render(format!("page {}: {e}", i + 1)))?;
            binder.append_document(Document::load_mem(&bytes)?)?;
        }
        info!(pages = binder.page_count(), "matter rasterized");
        binder.finish()
    }

    /// SVG → single-page PDF bytes, scaled to fit (aspect kept) and centred.
    fn svg_to_page_pdf_bytes(&self, svg: &str, size: PageSize) -> std::result::Result<Vec<u8>, String> {
        let tree = usvg::Tree::from_str(svg, &self.options).map_err(|e| e.to_string())?;

        let (svg_chunk, svg_root_ref) =
            svg2pdf::to_chunk(&tree, svg2pdf::ConversionOptions::default())
                .map_err(|e| format!("svg2pdf to_chunk failed: {e}"))?;

        let mut alloc = PdfRef::new(1);
        let catalog_id = alloc.bump();
        let page_tree_id = alloc.bump();
        let page_id = alloc.bump();
        let content_id = alloc.bump();
        let svg_name = Name(b"S1");

        // move the chunk into our id space
        let mut map = HashMap::new();
        let svg_chunk = svg_chunk.renumber(|old| *map.entry(old).or_insert_with(|| alloc.bump()));
        let svg_id = *map
            .get(&svg_root_ref)
            .ok_or("svg root ref missing after renumber")?;

        let (w_pt, h_pt) = (size.width, size.height);
        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id).kids([page_id]).count(1);

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, w_pt as f32, h_pt as f32));
        page.parent(page_tree_id);
        page.contents(content_id);
        let mut res = page.resources();
        res.x_objects().pair(svg_name, svg_id);
        res.finish();
        page.finish();

        // The XObject spans a 1x1 unit square; scale it to the SVG's own
        // aspect ratio, fitted inside the page.
        let svg_w = tree.size().width() as f64;
        let svg_h = tree.size().height() as f64;
        let s = (w_pt / svg_w).min(h_pt / svg_h);
        let (draw_w, draw_h) = (svg_w * s, svg_h * s);
        let tx = (w_pt - draw_w) / 2.0;
        let ty = (h_pt - draw_h) / 2.0;

        let mut content = Content::new();
        content
            .transform([draw_w as f32, 0.0, 0.0, draw_h as f32, tx as f32, ty as f32])
            .x_object(svg_name);

        pdf.stream(content_id, &content.finish());
        pdf.extend(&svg_chunk);

        Ok(pdf.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book_config::BookConfig;
    use crate::template;

    fn media_box(doc: &Document, index: usize) -> Vec<f32> {
        let pid = *doc.get_pages().values().nth(index).unwrap();
        let page = doc.get_object(pid).unwrap().as_dict().unwrap();
        page.get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect()
    }

    #[test]
    fn template_rasterizes_to_four_pages() {
        let size = PageSize::a4();
        let markup = template::render(&BookConfig::default(), size);
        let doc = Rasterizer::default().rasterize(&markup, size).unwrap();
        assert_eq!(doc.get_pages().len(), 4);
        let mb = media_box(&doc, 3);
        assert!((mb[2] - size.width as f32).abs() < 0.01);
        assert!((mb[3] - size.height as f32).abs() < 0.01);
    }

    #[test]
    fn page_count_follows_markup() {
        let size = PageSize::new(100.0, 100.0, crate::page_size::UnitSystem::Mm);
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"20\">\
                   <rect width=\"10\" height=\"20\" fill=\"red\"/></svg>";
        let markup = Markup {
            pages: vec![svg.to_string(); 2],
        };
        let doc = Rasterizer::default().rasterize(&markup, size).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn invalid_markup_is_a_render_error() {
        let markup = Markup {
            pages: vec!["<svg><unclosed".to_string()],
        };
        let err = Rasterizer::default()
            .rasterize(&markup, PageSize::a4())
            .unwrap_err();
        assert!(matches!(err, BindError::Render(msg) if msg.starts_with("page 1:")));
    }
}
