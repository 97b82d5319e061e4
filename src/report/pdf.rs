//! Low-level paginating PDF writer
//!
//! Consumes the immutable block list produced by the renderer and draws it
//! onto A4 pages with printpdf. All cursor and page-break management lives
//! here; the renderer never sees a coordinate.

use crate::{
    output::TrendDirection,
    report::{Block, CalloutTone, Document, Rgb8, Table, BRAND_BLUE, HIGHLIGHT_GOLD},
    ReportError, Result,
};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rect, Rgb,
};

const PAGE_WIDTH: f64 = 210.0;
const PAGE_HEIGHT: f64 = 297.0;
const MARGIN: f64 = 10.0;
const CONTENT_X: f64 = 20.0;
const CONTENT_WIDTH: f64 = 170.0;
/// Body text may not run below this distance from the page top
const BODY_BOTTOM: f64 = PAGE_HEIGHT - 20.0;
/// First body line after the page header
const BODY_TOP: f64 = 38.0;

/// Points to millimeters
const PT_TO_MM: f64 = 0.352_778;
/// Rough average glyph width factor for Helvetica
const GLYPH_WIDTH: f64 = 0.5;

const TABLE_HEADER_FILL: Rgb8 = Rgb8::new(66, 133, 244);
const ROW_FILL_EVEN: Rgb8 = Rgb8::new(240, 240, 240);
const ROW_FILL_ODD: Rgb8 = Rgb8::new(255, 255, 255);
const HEADING_FILL: Rgb8 = Rgb8::new(200, 220, 255);
const RECOMMENDATION_FILL: Rgb8 = Rgb8::new(230, 247, 255);
const BADGE_FILL: Rgb8 = Rgb8::new(245, 245, 245);
const BLACK: Rgb8 = Rgb8::new(0, 0, 0);
const WHITE: Rgb8 = Rgb8::new(255, 255, 255);
const TREND_UP: Rgb8 = Rgb8::new(255, 0, 0);
const TREND_DOWN: Rgb8 = Rgb8::new(0, 128, 0);

/// Write the document to PDF bytes.
pub fn write(document: &Document) -> Result<Vec<u8>> {
    let mut writer = PageWriter::new(document)?;
    for block in &document.blocks {
        writer.draw_block(block);
    }
    writer.finish()
}

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    /// Cursor, measured in millimeters from the page top
    y: f64,
    page_no: usize,
    title: String,
    org_id: String,
    org_name: String,
    generated_at: String,
}

impl PageWriter {
    fn new(document: &Document) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(
            &document.title,
            Mm(PAGE_WIDTH as f32),
            Mm(PAGE_HEIGHT as f32),
            "Layer 1",
        );
        let regular = add_font(&doc, BuiltinFont::Helvetica)?;
        let bold = add_font(&doc, BuiltinFont::HelveticaBold)?;
        let italic = add_font(&doc, BuiltinFont::HelveticaOblique)?;

        let layer = doc.get_page(page).get_layer(layer);
        let mut writer = Self {
            doc,
            layer,
            regular,
            bold,
            italic,
            y: BODY_TOP,
            page_no: 1,
            title: document.title.clone(),
            org_id: document.org.id.clone(),
            org_name: document.org.name.clone(),
            generated_at: document.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        writer.draw_chrome();
        Ok(writer)
    }

    fn finish(self) -> Result<Vec<u8>> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ReportError::document(format!("PDF serialization failed: {}", e)))
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page_no += 1;
        self.y = BODY_TOP;
        self.draw_chrome();
    }

    /// Break the page when fewer than `needed` millimeters remain
    fn ensure_space(&mut self, needed: f64) {
        if self.y + needed > BODY_BOTTOM {
            self.new_page();
        }
    }

    /// Header and footer drawn on every page
    fn draw_chrome(&mut self) {
        // Logo band
        self.fill_rect(MARGIN, 10.0, 30.0, 10.0, BRAND_BLUE);
        self.text_colored("AWS Report", &self.bold.clone(), 10.0, 14.0, 17.0, WHITE);

        // Report title
        self.text(&self.title.clone(), &self.bold.clone(), 16.0, 70.0, 17.0);

        // Generation and organization info, right-aligned
        let info = [
            format!("Generated: {}", self.generated_at),
            format!("Organization ID: {}", self.org_id),
            format!("Name: {}", self.org_name),
        ];
        for (i, line) in info.iter().enumerate() {
            let x = PAGE_WIDTH - MARGIN - text_width(line, 8.0);
            self.text(line, &self.regular.clone(), 8.0, x, 11.0 + i as f64 * 4.0);
        }

        // Footer
        let page_label = format!("Page {}", self.page_no);
        let center_x = (PAGE_WIDTH - text_width(&page_label, 8.0)) / 2.0;
        self.text(&page_label, &self.italic.clone(), 8.0, center_x, PAGE_HEIGHT - 10.0);
        self.text(
            "Confidential - For Internal Use Only",
            &self.italic.clone(),
            8.0,
            MARGIN,
            PAGE_HEIGHT - 10.0,
        );
    }

    fn draw_block(&mut self, block: &Block) {
        match block {
            Block::Banner(text) => self.draw_banner(text),
            Block::CenteredLine(text) => self.draw_centered_line(text),
            Block::Badge(text) => self.draw_badge(text),
            Block::Heading(text) => self.draw_heading(text),
            Block::SubHeading(text) => self.draw_subheading(text),
            Block::TextLine(text) => self.draw_text_line(text),
            Block::TrendLine {
                label,
                pct,
                direction,
            } => self.draw_trend_line(label, *pct, *direction),
            Block::Table(table) => self.draw_table(table),
            Block::Callout(callout) => self.draw_callout(callout),
            Block::StackedBar(segments) => self.draw_stacked_bar(segments),
            Block::Legend(entries) => self.draw_legend(entries),
            Block::Recommendation { title, body } => self.draw_recommendation(title, body),
            Block::Placeholder(text) => self.draw_placeholder(text),
            Block::PageBreak => self.new_page(),
        }
    }

    fn draw_banner(&mut self, text: &str) {
        self.ensure_space(14.0);
        self.fill_rect(MARGIN, self.y, PAGE_WIDTH - 2.0 * MARGIN, 10.0, BRAND_BLUE);
        let x = (PAGE_WIDTH - text_width(text, 14.0)) / 2.0;
        self.text_colored(text, &self.bold.clone(), 14.0, x, self.y + 7.0, WHITE);
        self.y += 14.0;
    }

    fn draw_centered_line(&mut self, text: &str) {
        self.ensure_space(10.0);
        let x = (PAGE_WIDTH - text_width(text, 11.0)) / 2.0;
        self.text(text, &self.bold.clone(), 11.0, x, self.y + 6.0);
        self.y += 10.0;
    }

    fn draw_badge(&mut self, text: &str) {
        self.ensure_space(30.0);
        self.fill_rect(CONTENT_X, self.y, CONTENT_WIDTH, 25.0, BADGE_FILL);
        self.stroke_rect(CONTENT_X, self.y, CONTENT_WIDTH, 25.0, BRAND_BLUE);
        let x = (PAGE_WIDTH - text_width(text, 16.0)) / 2.0;
        self.text(text, &self.bold.clone(), 16.0, x, self.y + 15.0);
        self.y += 32.0;
    }

    fn draw_heading(&mut self, text: &str) {
        self.ensure_space(16.0);
        self.fill_rect(MARGIN, self.y, PAGE_WIDTH - 2.0 * MARGIN, 10.0, HEADING_FILL);
        self.text(text, &self.bold.clone(), 12.0, MARGIN + 2.0, self.y + 7.0);
        self.y += 14.0;
    }

    fn draw_subheading(&mut self, text: &str) {
        self.ensure_space(12.0);
        self.text(text, &self.bold.clone(), 12.0, MARGIN + 2.0, self.y + 6.0);
        self.y += 10.0;
    }

    fn draw_text_line(&mut self, text: &str) {
        self.ensure_space(8.0);
        self.text(text, &self.regular.clone(), 10.0, CONTENT_X, self.y + 5.0);
        self.y += 7.0;
    }

    fn draw_trend_line(&mut self, label: &str, pct: f64, direction: TrendDirection) {
        self.ensure_space(8.0);
        let color = match direction {
            TrendDirection::Up => TREND_UP,
            TrendDirection::Down => TREND_DOWN,
            TrendDirection::Flat => BLACK,
        };
        let text = format!("{}: {} {:.1}%", label, direction.ascii_glyph(), pct.abs());
        self.text_colored(&text, &self.bold.clone(), 12.0, CONTENT_X, self.y + 5.0, color);
        self.y += 8.0;
    }

    fn draw_table(&mut self, table: &Table) {
        let header_height = 8.0;
        let row_height = 7.0;
        self.ensure_space(header_height + row_height);

        // Header row
        let mut x = CONTENT_X;
        for (i, header) in table.headers.iter().enumerate() {
            let width = table.col_widths[i];
            self.fill_rect(x, self.y, width, header_height, TABLE_HEADER_FILL);
            self.stroke_rect(x, self.y, width, header_height, BLACK);
            let cx = x + (width - text_width(header, 10.0)) / 2.0;
            self.text_colored(header, &self.bold.clone(), 10.0, cx, self.y + 5.5, WHITE);
            x += width;
        }
        self.y += header_height;

        for (row_idx, row) in table.rows.iter().enumerate() {
            self.ensure_space(row_height);
            let fill = if row_idx == 0 && table.highlight_top {
                HIGHLIGHT_GOLD
            } else if row_idx % 2 == 0 {
                ROW_FILL_EVEN
            } else {
                ROW_FILL_ODD
            };
            let font = if row_idx == 0 && table.highlight_top {
                self.bold.clone()
            } else {
                self.regular.clone()
            };

            let mut x = CONTENT_X;
            for (col_idx, cell) in row.iter().enumerate() {
                let width = table.col_widths[col_idx];
                self.fill_rect(x, self.y, width, row_height, fill);
                self.stroke_rect(x, self.y, width, row_height, BLACK);
                let text_x = if is_numeric_cell(cell) {
                    x + width - text_width(cell, 10.0) - 2.0
                } else {
                    x + 2.0
                };
                self.text(cell, &font, 10.0, text_x, self.y + 5.0);
                x += width;
            }
            self.y += row_height;
        }
        self.y += 4.0;
    }

    fn draw_callout(&mut self, callout: &crate::report::Callout) {
        let box_height = 25.0;
        self.ensure_space(10.0 + box_height + 5.0);

        let (fill, border) = match callout.tone {
            CalloutTone::Highlight => (Rgb8::new(255, 250, 205), HIGHLIGHT_GOLD),
            CalloutTone::Positive => (Rgb8::new(240, 255, 240), Rgb8::new(46, 139, 87)),
        };

        self.text(&callout.title, &self.bold.clone(), 11.0, MARGIN + 2.0, self.y + 6.0);
        self.y += 10.0;

        self.fill_rect(CONTENT_X, self.y, CONTENT_WIDTH, box_height, fill);
        self.stroke_rect(CONTENT_X, self.y, CONTENT_WIDTH, box_height, border);
        for (i, line) in callout.lines.iter().enumerate() {
            self.text(
                line,
                &self.bold.clone(),
                10.0,
                CONTENT_X + 5.0,
                self.y + 7.0 + i as f64 * 5.0,
            );
        }
        self.y += box_height + 5.0;
    }

    fn draw_stacked_bar(&mut self, segments: &[crate::report::BarSegment]) {
        let bar_width = 160.0;
        let bar_height = 15.0;
        self.ensure_space(bar_height + 8.0);

        // Segments left to right at an explicitly tracked cumulative offset
        let mut cumulative = 0.0;
        for segment in segments {
            let width = segment.fraction * bar_width;
            if width > 0.0 {
                self.fill_rect(
                    CONTENT_X + cumulative * bar_width,
                    self.y,
                    width,
                    bar_height,
                    segment.color,
                );
            }
            cumulative += segment.fraction;
        }

        // Bounding border regardless of whether segments sum to 100%
        self.stroke_rect(CONTENT_X, self.y, bar_width, bar_height, BLACK);
        self.y += bar_height + 5.0;
    }

    fn draw_legend(&mut self, entries: &[crate::report::LegendEntry]) {
        let swatch_width = 10.0;
        let swatch_height = 5.0;
        let row_spacing = 7.0;
        let column_width = 85.0;
        let items_per_column = (entries.len() + 1) / 2;

        self.ensure_space(items_per_column as f64 * row_spacing + 5.0);
        let top = self.y;

        for (i, entry) in entries.iter().enumerate() {
            let column = i / items_per_column;
            let row = i % items_per_column;
            let x = CONTENT_X + column as f64 * column_width;
            let y = top + row as f64 * row_spacing;

            self.fill_rect(x, y, swatch_width, swatch_height, entry.color);
            let label = format!("{} ({:.1}%)", entry.label, entry.pct);
            self.text(&label, &self.regular.clone(), 8.0, x + swatch_width + 3.0, y + 4.0);
        }

        self.y = top + items_per_column as f64 * row_spacing + 5.0;
    }

    fn draw_recommendation(&mut self, title: &str, body: &str) {
        let lines = wrap_text(body, 92);
        self.ensure_space(10.0 + lines.len() as f64 * 6.0 + 5.0);

        self.fill_rect(MARGIN, self.y, PAGE_WIDTH - 2.0 * MARGIN, 8.0, RECOMMENDATION_FILL);
        self.text(title, &self.bold.clone(), 11.0, MARGIN + 2.0, self.y + 6.0);
        self.y += 10.0;

        for line in &lines {
            self.text(line, &self.regular.clone(), 10.0, CONTENT_X, self.y + 4.5);
            self.y += 6.0;
        }
        self.y += 5.0;
    }

    fn draw_placeholder(&mut self, text: &str) {
        self.ensure_space(10.0);
        let x = (PAGE_WIDTH - text_width(text, 10.0)) / 2.0;
        self.text(text, &self.italic.clone(), 10.0, x, self.y + 6.0);
        self.y += 10.0;
    }

    // Drawing primitives. printpdf's origin is the bottom-left corner, so
    // the from-top cursor is flipped here and nowhere else.

    fn text(&self, text: &str, font: &IndirectFontRef, size: f64, x: f64, y_from_top: f64) {
        self.layer
            .use_text(text, size as f32, Mm(x as f32), Mm((PAGE_HEIGHT - y_from_top) as f32), font);
    }

    fn text_colored(
        &self,
        text: &str,
        font: &IndirectFontRef,
        size: f64,
        x: f64,
        y_from_top: f64,
        color: Rgb8,
    ) {
        self.layer.set_fill_color(pdf_color(color));
        self.text(text, font, size, x, y_from_top);
        self.layer.set_fill_color(pdf_color(BLACK));
    }

    fn fill_rect(&self, x: f64, y_from_top: f64, width: f64, height: f64, color: Rgb8) {
        self.layer.set_fill_color(pdf_color(color));
        self.layer.add_rect(
            Rect::new(
                Mm(x as f32),
                Mm((PAGE_HEIGHT - y_from_top - height) as f32),
                Mm((x + width) as f32),
                Mm((PAGE_HEIGHT - y_from_top) as f32),
            )
            .with_mode(PaintMode::Fill),
        );
        self.layer.set_fill_color(pdf_color(BLACK));
    }

    fn stroke_rect(&self, x: f64, y_from_top: f64, width: f64, height: f64, color: Rgb8) {
        self.layer.set_outline_color(pdf_color(color));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_rect(
            Rect::new(
                Mm(x as f32),
                Mm((PAGE_HEIGHT - y_from_top - height) as f32),
                Mm((x + width) as f32),
                Mm((PAGE_HEIGHT - y_from_top) as f32),
            )
            .with_mode(PaintMode::Stroke),
        );
        self.layer.set_outline_color(pdf_color(BLACK));
    }
}

fn add_font(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef> {
    doc.add_builtin_font(font)
        .map_err(|e| ReportError::document(format!("font registration failed: {}", e)))
}

fn pdf_color(color: Rgb8) -> Color {
    Color::Rgb(Rgb::new(
        color.r as f32 / 255.0,
        color.g as f32 / 255.0,
        color.b as f32 / 255.0,
        None,
    ))
}

/// Estimated rendered width of `text` in millimeters
fn text_width(text: &str, size_pt: f64) -> f64 {
    text.chars().count() as f64 * size_pt * GLYPH_WIDTH * PT_TO_MM
}

/// Right-align bare numbers, as tables do for quantity columns
fn is_numeric_cell(cell: &str) -> bool {
    let trimmed = cell.trim();
    !trimmed.is_empty() && trimmed.replacen('.', "", 1).chars().all(|c| c.is_ascii_digit())
}

/// Greedy word wrap to a character budget per line
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{AccountDirectory, BillingSnapshot, CostEntry};
    use crate::period::{current_month_to_date, last_full_month};
    use crate::providers::OrgIdentity;
    use crate::report::renderer;
    use chrono::{NaiveDate, Utc};

    fn sample_document() -> Document {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let snapshot = BillingSnapshot {
            total_cost: 1000.0,
            currency: "USD".to_string(),
            account_breakdown: vec![
                CostEntry::new("111", 600.0, "USD"),
                CostEntry::new("222", 400.0, "USD"),
            ],
            service_breakdown: vec![
                CostEntry::new("Amazon EC2", 700.0, "USD"),
                CostEntry::new("Amazon S3", 300.0, "USD"),
            ],
            forecast_cost: 1100.0,
            forecast_currency: "USD".to_string(),
            month_over_month_pct: 10.0,
            billing_period: last_full_month(today),
            forecast_period: current_month_to_date(today),
        };
        let org = OrgIdentity {
            id: "o-abc123".to_string(),
            name: "Example Org".to_string(),
        };
        renderer::render(&snapshot, &org, &AccountDirectory::new(), Utc::now())
    }

    #[test]
    fn test_write_produces_pdf_bytes() {
        let bytes = write(&sample_document()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn test_page_break_adds_a_page() {
        let document = sample_document();
        let breaks = document.count_blocks(|b| matches!(b, Block::PageBreak));
        assert_eq!(breaks, 1);

        let bytes = write(&document).unwrap();
        // Two /Page objects plus the /Pages tree node
        let needle = b"/Page";
        let count = bytes.windows(needle.len()).filter(|w| w == needle).count();
        assert!(count >= 2, "expected at least two page markers, found {}", count);
    }

    #[test]
    fn test_empty_document_still_writes() {
        let mut document = sample_document();
        document.blocks.clear();
        let bytes = write(&document).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_wrap_text_respects_budget() {
        let body = "Look for idle EC2 instances, unattached EBS volumes, and unused \
                    Elastic IPs which may be generating unnecessary costs";
        let lines = wrap_text(body, 40);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 40));
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, body.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_numeric_cell_detection() {
        assert!(is_numeric_cell("600.00"));
        assert!(is_numeric_cell("42"));
        assert!(!is_numeric_cell("USD 600.00"));
        assert!(!is_numeric_cell("60.0%"));
        assert!(!is_numeric_cell(""));
    }
}
