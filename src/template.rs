//! SVG markup for the four fixed pages: front cover, copyright, index and
//! back cover.
//!
//! Every page is a standalone SVG document sized to the target page in
//! points, so the rasterizer can place it 1:1. Text is laid out here
//! (SVG has no flow layout); long paragraphs are wrapped greedily by an
//! estimated glyph width.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use tracing::warn;

use crate::book_config::BookConfig;
use crate::page_size::PageSize;

// palette
const PRIMARY: &str = "#1a1a2e";
const ACCENT: &str = "#e94560";
const GOLD: &str = "#d4af37";
const SECONDARY_DARK: &str = "#16213e";
const PAPER: &str = "#fffef9";
const CREAM: &str = "#faf8f3";
const TEXT_PRIMARY: &str = "#1a1a1a";
const TEXT_SECONDARY: &str = "#4a4a4a";
const TEXT_MUTED: &str = "#707070";
const TEXT_LIGHT: &str = "#ffffff";

const FONT_DISPLAY: &str = "'Cormorant Garamond', serif";
const FONT_SERIF: &str = "'Crimson Pro', serif";
const FONT_BENGALI: &str = "'Noto Serif Bengali', serif";
const FONT_SANS: &str = "Inter, sans-serif";

// type scale, pt
const TITLE_XL: f64 = 54.0;
const TITLE_LG: f64 = 36.0;
const TITLE_MD: f64 = 27.0;
const TITLE_SM: f64 = 18.0;
const BODY_LG: f64 = 12.0;
const BODY_MD: f64 = 10.5;
const BODY_SM: f64 = 9.0;
const CAPTION: f64 = 8.25;
const MICRO: f64 = 6.75;

/// 15 mm
const SAFE_MARGIN: f64 = 42.52;
const TOC_ROW_PITCH: f64 = 30.0;
const TOC_MIN_ROW_PITCH: f64 = BODY_MD * 1.2;

/// Star ornament on the front cover, drawn in a 100x100 box.
const STAR_PATH: &str = "M50 10 L60 40 L90 40 L65 60 L75 90 L50 70 L25 90 L35 60 L10 40 L40 40 Z";

/// Rendered front/back matter: one SVG document per page, in print order.
#[derive(Debug, Clone)]
pub struct Markup {
    pub pages: Vec<String>,
}

/// Render every page of the book's fixed matter.
pub fn render(config: &BookConfig, size: PageSize) -> Markup {
    Markup {
        pages: vec![
            front_cover(config, size),
            copyright_page(config, size),
            index_page(config, size),
            back_cover(config, size),
        ],
    }
}

/// `data:` URI for an embedded image, MIME type sniffed from the bytes.
pub fn data_uri(bytes: &[u8]) -> String {
    let mime = match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => "image/png",
    };
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    family: &'static str,
    size: f64,
    weight: u16,
    fill: &'static str,
    italic: bool,
    spacing: f64,
    upper: bool,
}

const fn style(family: &'static str, size: f64, weight: u16, fill: &'static str) -> TextStyle {
    TextStyle {
        family,
        size,
        weight,
        fill,
        italic: false,
        spacing: 0.0,
        upper: false,
    }
}

impl TextStyle {
    const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    const fn spaced(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    const fn upper(mut self) -> Self {
        self.upper = true;
        self
    }

    fn attrs(&self) -> String {
        let mut attrs = format!(
            "font-family=\"{}\" font-size=\"{:.2}\" font-weight=\"{}\" fill=\"{}\"",
            self.family, self.size, self.weight, self.fill
        );
        if self.italic {
            attrs.push_str(" font-style=\"italic\"");
        }
        if self.spacing != 0.0 {
            attrs.push_str(&format!(" letter-spacing=\"{:.2}\"", self.spacing));
        }
        attrs
    }

    /// Rough advance width of `s`, used for wrapping and badge sizing.
    fn estimate_width(&self, s: &str) -> f64 {
        let n = s.chars().count() as f64;
        n * (self.size * 0.55 + self.spacing)
    }

    fn chars_per_line(&self, width: f64) -> usize {
        ((width / (self.size * 0.55 + self.spacing)) as usize).max(1)
    }
}

fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

struct Canvas {
    size: PageSize,
    defs: String,
    body: String,
}

impl Canvas {
    fn new(size: PageSize) -> Self {
        Self {
            size,
            defs: String::new(),
            body: String::new(),
        }
    }

    fn w(&self) -> f64 {
        self.size.width
    }

    fn h(&self) -> f64 {
        self.size.height
    }

    fn def(&mut self, svg: &str) {
        self.defs.push_str(svg);
        self.defs.push('\n');
    }

    fn raw(&mut self, svg: &str) {
        self.body.push_str(svg);
        self.body.push('\n');
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, attrs: &str) {
        self.raw(&format!(
            "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" {attrs}/>"
        ));
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, attrs: &str) {
        self.raw(&format!(
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" {attrs}/>"
        ));
    }

    /// Single line of text. Empty content draws nothing.
    fn text(&mut self, x: f64, y: f64, anchor: Anchor, style: TextStyle, content: &str) {
        if content.trim().is_empty() {
            return;
        }
        let content = if style.upper {
            content.to_uppercase()
        } else {
            content.to_string()
        };
        self.raw(&format!(
            "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{}\" {}>{}</text>",
            anchor.as_str(),
            style.attrs(),
            html_escape::encode_text(&content)
        ));
    }

    /// `label` in bold followed by `value`, as one line.
    fn labeled(&mut self, x: f64, y: f64, style: TextStyle, label: &str, value: &str) {
        if value.trim().is_empty() {
            return;
        }
        self.raw(&format!(
            "<text x=\"{x:.2}\" y=\"{y:.2}\" {}><tspan font-weight=\"700\">{}</tspan> {}</text>",
            style.attrs(),
            html_escape::encode_text(label),
            html_escape::encode_text(value)
        ));
    }

    /// Wrapped paragraph starting with its first baseline at `y`.
    /// Returns the baseline following the last line.
    #[allow(clippy::too_many_arguments)]
    fn paragraph(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        leading: f64,
        anchor: Anchor,
        style: TextStyle,
        content: &str,
    ) -> f64 {
        let mut y = y;
        for line in wrap(content, style.chars_per_line(width)) {
            self.text(x, y, anchor, style, &line);
            y += style.size * leading;
        }
        y
    }

    fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
             width=\"{w:.2}\" height=\"{h:.2}\" viewBox=\"0 0 {w:.2} {h:.2}\">\n<defs>\n{}</defs>\n{}</svg>\n",
            self.defs,
            self.body,
            w = self.size.width,
            h = self.size.height,
        )
    }
}

fn paper_background(canvas: &mut Canvas, from: &str, to: &str) {
    canvas.def(&format!(
        "<linearGradient id=\"paper\" x1=\"0\" y1=\"0\" x2=\"0.27\" y2=\"1\">\
         <stop offset=\"0\" stop-color=\"{from}\"/><stop offset=\"1\" stop-color=\"{to}\"/></linearGradient>"
    ));
    let (w, h) = (canvas.w(), canvas.h());
    canvas.rect(0.0, 0.0, w, h, "fill=\"url(#paper)\"");
}

fn front_cover(c: &BookConfig, size: PageSize) -> String {
    let mut canvas = Canvas::new(size);
    let (w, h) = (canvas.w(), canvas.h());
    let cx = w / 2.0;

    paper_background(&mut canvas, PAPER, CREAM);
    // 3 mm frame with a gold rule just inside it
    canvas.rect(
        4.25,
        4.25,
        w - 8.5,
        h - 8.5,
        &format!("fill=\"none\" stroke=\"{PRIMARY}\" stroke-width=\"8.5\""),
    );
    canvas.rect(
        12.0,
        12.0,
        w - 24.0,
        h - 24.0,
        &format!("fill=\"none\" stroke=\"{GOLD}\" stroke-width=\"1.5\""),
    );

    // header
    let badge = style(FONT_SANS, MICRO, 700, TEXT_LIGHT).spaced(2.25).upper();
    if !c.publisher_badge.trim().is_empty() {
        let badge_w = badge.estimate_width(&c.publisher_badge) + 27.0;
        canvas.rect(
            cx - badge_w / 2.0,
            40.0,
            badge_w,
            18.0,
            &format!("rx=\"1.5\" fill=\"{PRIMARY}\""),
        );
        canvas.text(cx, 51.5, Anchor::Middle, badge, &c.publisher_badge);
    }
    canvas.text(
        cx,
        76.0,
        Anchor::Middle,
        style(FONT_SANS, CAPTION, 600, ACCENT).spaced(1.5).upper(),
        &c.genre_tag,
    );

    // title block
    let mut y = h * 0.26;
    canvas.raw(&format!(
        "<path d=\"{STAR_PATH}\" transform=\"translate({:.2} {y:.2}) scale(0.45)\" \
         fill=\"none\" stroke=\"{GOLD}\" stroke-width=\"2\" opacity=\"0.7\"/>",
        cx - 22.5
    ));
    y += 45.0 + 14.0;

    let title_en = style(FONT_DISPLAY, TITLE_XL, 700, PRIMARY).spaced(-0.75).upper();
    for line in c.title_lines() {
        y += TITLE_XL * 0.85;
        canvas.text(cx, y, Anchor::Middle, title_en, line);
    }

    y += 13.5 + TITLE_MD;
    let title_bn = style(FONT_BENGALI, TITLE_MD, 700, ACCENT);
    if !c.book_title_bn.trim().is_empty() {
        let half = title_bn.estimate_width(&c.book_title_bn) / 2.0 + 18.0;
        let rule_y = y - TITLE_MD * 0.35;
        let rule = format!("stroke=\"{ACCENT}\" stroke-width=\"1.5\"");
        canvas.line(cx - half - 35.0, rule_y, cx - half - 9.0, rule_y, &rule);
        canvas.line(cx + half + 9.0, rule_y, cx + half + 35.0, rule_y, &rule);
        canvas.text(cx, y, Anchor::Middle, title_bn, &c.book_title_bn);
    }

    y += 9.0 + BODY_MD * 1.4;
    y = canvas.paragraph(
        cx,
        y,
        285.0,
        1.4,
        Anchor::Middle,
        style(FONT_SERIF, BODY_MD, 400, TEXT_SECONDARY).italic(),
        &c.subtitle,
    );

    y += 27.0;
    canvas.text(
        cx,
        y,
        Anchor::Middle,
        style(FONT_SANS, CAPTION, 600, TEXT_MUTED).spaced(1.1).upper(),
        &c.author_label,
    );
    y += 6.0 + TITLE_SM;
    canvas.text(
        cx,
        y,
        Anchor::Middle,
        style(FONT_DISPLAY, TITLE_SM, 600, TEXT_PRIMARY),
        &c.author_name,
    );

    // footer
    canvas.line(
        36.0,
        h - 104.0,
        w - 36.0,
        h - 104.0,
        "stroke=\"#d4af37\" stroke-opacity=\"0.2\" stroke-width=\"1.5\"",
    );
    canvas.text(
        cx,
        h - 82.0,
        Anchor::Middle,
        style(FONT_SANS, MICRO, 700, ACCENT).spaced(1.9).upper(),
        &c.translator_label,
    );
    canvas.text(
        cx,
        h - 62.0,
        Anchor::Middle,
        style(FONT_BENGALI, BODY_LG, 700, PRIMARY),
        &c.translator_name,
    );

    canvas.finish()
}

fn copyright_page(c: &BookConfig, size: PageSize) -> String {
    let mut canvas = Canvas::new(size);
    let (w, h) = (canvas.w(), canvas.h());
    let cx = w / 2.0;
    let m = SAFE_MARGIN;
    let inner_w = w - 2.0 * m;
    let divider = "stroke=\"#000000\" stroke-opacity=\"0.1\" stroke-width=\"0.75\"";

    canvas.rect(0.0, 0.0, w, h, &format!("fill=\"{PAPER}\""));

    let mut y = m + TITLE_SM;
    canvas.text(
        cx,
        y,
        Anchor::Middle,
        style(FONT_DISPLAY, TITLE_SM, 600, PRIMARY),
        &c.cp_title,
    );
    y += BODY_MD * 1.8;
    canvas.text(
        cx,
        y,
        Anchor::Middle,
        style(FONT_BENGALI, BODY_MD, 400, TEXT_SECONDARY),
        &c.cp_subtitle,
    );
    y += 13.5;
    canvas.line(m, y, w - m, y, divider);
    y += 13.5;

    let heading = style(FONT_SANS, CAPTION, 700, PRIMARY).upper();
    let body = style(FONT_SANS, BODY_SM, 400, TEXT_SECONDARY);
    let leading = BODY_SM * 1.6;

    // two half-width columns
    let col_w = inner_w * 0.48;
    let right_x = w - m - col_w;
    let top = y + CAPTION;
    canvas.text(m, top, Anchor::Start, heading, "Original Work");
    canvas.text(right_x, top, Anchor::Start, heading, "This Edition");
    let mut row = top + 4.5 + leading;
    for ((l_label, l_value), (r_label, r_value)) in [
        ("Author:", &c.cp_original_author),
        ("Published:", &c.cp_pub_year),
        ("Language:", &c.cp_lang),
    ]
    .into_iter()
    .zip([
        ("Translator:", &c.cp_translator),
        ("Publisher:", &c.cp_publisher),
        ("Edition:", &c.cp_edition),
    ]) {
        canvas.labeled(m, row, body, l_label, l_value);
        canvas.labeled(right_x, row, body, r_label, r_value);
        row += leading;
    }
    y = row + 18.0;

    // ISBN block
    canvas.text(m, y, Anchor::Start, heading, "ISBN Information");
    y += 8.0;
    let block_h = 9.0 * 2.0 + leading * 2.0;
    canvas.rect(m, y, inner_w, block_h, &format!("fill=\"{CREAM}\""));
    canvas.rect(m, y, 2.25, block_h, &format!("fill=\"{ACCENT}\""));
    canvas.text(m + 12.0, y + 9.0 + BODY_SM, Anchor::Start, body, &c.cp_isbn_13);
    canvas.text(
        m + 12.0,
        y + 9.0 + BODY_SM + leading,
        Anchor::Start,
        body,
        &c.cp_isbn_10,
    );
    y += block_h + 18.0 + CAPTION;

    canvas.text(m, y, Anchor::Start, heading, "Copyright Notice");
    y += 4.5 + leading;
    y = canvas.paragraph(m, y, inner_w, 1.6, Anchor::Start, body, &c.cp_copyright_text);
    y += 18.0;

    canvas.text(m, y, Anchor::Start, heading, "Contact");
    y += 4.5 + leading;
    canvas.labeled(m, y, body, "Web:", &c.cp_contact_web);
    canvas.labeled(m, y + leading, body, "Email:", &c.cp_contact_email);

    let footer_y = h - m - 24.0;
    canvas.line(m, footer_y, w - m, footer_y, divider);
    canvas.text(
        cx,
        footer_y + 13.5 + CAPTION,
        Anchor::Middle,
        style(FONT_SANS, CAPTION, 400, TEXT_SECONDARY),
        "Designed & Published in Bangladesh",
    );

    canvas.finish()
}

/// Row spacing for `rows` index rows in `available` points.
///
/// Rows tighten instead of spilling onto a fifth page, but never below a
/// readable line; rows past the bottom margin are cut off.
fn toc_row_pitch(rows: usize, available: f64) -> f64 {
    if rows == 0 {
        return TOC_ROW_PITCH;
    }
    let fitted = TOC_ROW_PITCH.min(available / rows as f64);
    if fitted < TOC_MIN_ROW_PITCH {
        let fits = (available / TOC_MIN_ROW_PITCH).floor() as usize;
        warn!(rows, fits, "index page too small for all rows; overflow is clipped");
        return TOC_MIN_ROW_PITCH;
    }
    fitted
}

fn index_page(c: &BookConfig, size: PageSize) -> String {
    let mut canvas = Canvas::new(size);
    let (w, h) = (canvas.w(), canvas.h());
    let cx = w / 2.0;
    let m = SAFE_MARGIN;

    canvas.rect(0.0, 0.0, w, h, &format!("fill=\"{PAPER}\""));

    let mut y = m + TITLE_LG;
    canvas.text(
        cx,
        y,
        Anchor::Middle,
        style(FONT_DISPLAY, TITLE_LG, 700, PRIMARY).spaced(2.25).upper(),
        &c.index_title,
    );
    y += BODY_SM * 2.0;
    canvas.text(
        cx,
        y,
        Anchor::Middle,
        style(FONT_SANS, BODY_SM, 600, ACCENT).spaced(1.5).upper(),
        &c.index_subtitle,
    );
    y += 36.0;

    let pitch = toc_row_pitch(c.toc_list.len(), h - m - y);

    let chapter = style(FONT_BENGALI, BODY_MD, 600, TEXT_PRIMARY);
    let page = style(FONT_DISPLAY, TITLE_SM, 700, ACCENT);
    let leader_end = w - m - 52.5 - 15.0;
    for entry in &c.toc_list {
        y += pitch;
        canvas.text(m, y, Anchor::Start, chapter, &entry.title);
        canvas.line(
            m,
            y + 3.0,
            leader_end,
            y + 3.0,
            &format!(
                "stroke=\"{TEXT_MUTED}\" stroke-width=\"0.75\" stroke-dasharray=\"2.25 3\" stroke-opacity=\"0.3\""
            ),
        );
        canvas.text(w - m, y, Anchor::End, page, &entry.page);
    }

    canvas.finish()
}

fn back_cover(c: &BookConfig, size: PageSize) -> String {
    let mut canvas = Canvas::new(size);
    let (w, h) = (canvas.w(), canvas.h());
    let cx = w / 2.0;

    paper_background(&mut canvas, CREAM, PAPER);

    let cta_h = 130.0;
    let cta_y = h - cta_h;

    // bio
    let portrait = 105.0;
    let mut y = cta_y / 2.0 - 120.0;
    let (px, py, r) = (cx - portrait / 2.0, y, portrait / 2.0);
    canvas.def(&format!(
        "<clipPath id=\"portrait\"><circle cx=\"{cx:.2}\" cy=\"{:.2}\" r=\"{r:.2}\"/></clipPath>",
        py + r
    ));
    match &c.bio_image {
        Some(bytes) => canvas.raw(&format!(
            "<image x=\"{px:.2}\" y=\"{py:.2}\" width=\"{portrait:.2}\" height=\"{portrait:.2}\" \
             preserveAspectRatio=\"xMidYMid slice\" clip-path=\"url(#portrait)\" xlink:href=\"{}\"/>",
            data_uri(bytes)
        )),
        None => canvas.raw(&format!(
            "<g clip-path=\"url(#portrait)\"><rect x=\"{px:.2}\" y=\"{py:.2}\" width=\"{portrait:.2}\" \
             height=\"{portrait:.2}\" fill=\"#e6e1d6\"/>\
             <circle cx=\"{cx:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"#b9b2a4\"/>\
             <ellipse cx=\"{cx:.2}\" cy=\"{:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" fill=\"#b9b2a4\"/></g>",
            py + portrait * 0.4,
            portrait * 0.18,
            py + portrait * 0.95,
            portrait * 0.34,
            portrait * 0.3
        )),
    }
    canvas.raw(&format!(
        "<circle cx=\"{cx:.2}\" cy=\"{:.2}\" r=\"{r:.2}\" fill=\"none\" stroke=\"{GOLD}\" stroke-width=\"3\"/>",
        py + r
    ));
    y += portrait + 18.0 + TITLE_SM;

    canvas.text(
        cx,
        y,
        Anchor::Middle,
        style(FONT_DISPLAY, TITLE_SM, 700, PRIMARY).upper(),
        &c.bio_name,
    );
    y += 6.0 + CAPTION + 4.0;
    canvas.text(
        cx,
        y,
        Anchor::Middle,
        style(FONT_SANS, CAPTION, 700, ACCENT).spaced(1.9).upper(),
        &c.bio_title_tag,
    );
    y += 13.5 + BODY_MD * 1.7;
    canvas.paragraph(
        cx,
        y,
        315.0,
        1.7,
        Anchor::Middle,
        style(FONT_BENGALI, BODY_MD, 400, TEXT_SECONDARY),
        &c.bio_description,
    );

    // call to action band
    canvas.def(&format!(
        "<linearGradient id=\"cta\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"1\">\
         <stop offset=\"0\" stop-color=\"{PRIMARY}\"/><stop offset=\"1\" stop-color=\"{SECONDARY_DARK}\"/></linearGradient>\
         <linearGradient id=\"stripe\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"0\">\
         <stop offset=\"0\" stop-color=\"{ACCENT}\"/><stop offset=\"0.5\" stop-color=\"{GOLD}\"/>\
         <stop offset=\"1\" stop-color=\"{ACCENT}\"/></linearGradient>"
    ));
    canvas.rect(0.0, cta_y, w, cta_h, "fill=\"url(#cta)\"");
    canvas.rect(0.0, cta_y, w, 3.0, "fill=\"url(#stripe)\"");

    let pad = 27.0;
    let qr_box = 75.0;
    let text_w = (w - 2.0 * pad - qr_box - 18.0).min((w - 2.0 * pad) * 0.65);
    let mut ty = cta_y + pad + TITLE_SM;
    canvas.text(
        pad,
        ty,
        Anchor::Start,
        style(FONT_DISPLAY, TITLE_SM, 700, TEXT_LIGHT),
        &c.cta_headline,
    );
    ty += 9.0 + BODY_MD * 1.6;
    canvas.paragraph(
        pad,
        ty,
        text_w,
        1.6,
        Anchor::Start,
        style(FONT_BENGALI, BODY_MD, 400, "#d9d9dc"),
        &c.cta_text,
    );

    if !c.qr_code.is_empty() {
        let qx = w - pad - qr_box;
        let qy = cta_y + (cta_h - qr_box) / 2.0;
        canvas.rect(
            qx,
            qy,
            qr_box,
            qr_box,
            &format!("rx=\"6\" fill=\"#ffffff\" stroke=\"{GOLD}\" stroke-width=\"1.5\""),
        );
        canvas.raw(&format!(
            "<image x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" xlink:href=\"{}\"/>",
            qx + 7.5,
            qy + 7.5,
            qr_box - 15.0,
            qr_box - 15.0,
            data_uri(&c.qr_code)
        ));
    }

    canvas.finish()
}
