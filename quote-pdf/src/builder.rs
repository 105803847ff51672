//! PDF page builder
//!
//! Provides a fluent API for drawing onto fixed-size pages. Callers work in
//! a top-left coordinate system (y grows downwards, like a printed page);
//! the builder converts to PDF's bottom-left user space when emitting
//! operators.

use crate::encoding::to_winansi;
use crate::error::{PdfError, PdfResult};
use crate::metrics::{Font, text_width};
use crate::raster::RasterImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use tracing::instrument;

/// Baseline offset below the top of a text line, relative to font size
const ASCENT: f32 = 0.78;

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A4 portrait
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };
}

/// RGB colour with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);

    /// Neutral grey, 0.0 = black, 1.0 = white
    pub const fn gray(level: f32) -> Rgb {
        Rgb(level, level, level)
    }

    /// Colour from 8-bit components
    pub fn from_u8(r: u8, g: u8, b: u8) -> Rgb {
        Rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    fn operands(&self) -> Vec<Object> {
        vec![real(self.0), real(self.1), real(self.2)]
    }
}

/// Handle to an image registered with [`PdfBuilder::add_image`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(usize);

impl ImageId {
    fn resource_name(&self) -> String {
        format!("Im{}", self.0 + 1)
    }
}

/// PDF document builder
///
/// Pages are kept as operator lists until [`PdfBuilder::build`], so a
/// finished page can be revisited (e.g. to stamp "Page X of N" once the
/// page count is known). The document always has at least one page.
pub struct PdfBuilder {
    size: PageSize,
    pages: Vec<Vec<Operation>>,
    current: usize,
    images: Vec<RasterImage>,
}

impl PdfBuilder {
    /// Create a builder with one empty page
    pub fn new(size: PageSize) -> Self {
        Self {
            size,
            pages: vec![Vec::new()],
            current: 0,
            images: Vec::new(),
        }
    }

    pub fn page_size(&self) -> PageSize {
        self.size
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Index of the page currently drawn on
    pub fn current_page(&self) -> usize {
        self.current
    }

    // === Pages ===

    /// Append a page and make it current, returning its index
    pub fn add_page(&mut self) -> usize {
        self.pages.push(Vec::new());
        self.current = self.pages.len() - 1;
        self.current
    }

    /// Make an existing page current
    pub fn switch_to_page(&mut self, index: usize) -> PdfResult<()> {
        if index >= self.pages.len() {
            return Err(PdfError::PageOutOfRange {
                index,
                count: self.pages.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    // === Text ===

    /// Draw a single line of text with its top-left corner at (x, top)
    pub fn text(
        &mut self,
        x: f32,
        top: f32,
        font: Font,
        size: f32,
        color: Rgb,
        s: &str,
    ) -> &mut Self {
        if s.is_empty() {
            return self;
        }
        let baseline = self.size.height - (top + size * ASCENT);
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource_name().into(), real(size)]),
            Operation::new("rg", color.operands()),
            Operation::new("Td", vec![real(x), real(baseline)]),
            Operation::new("Tj", vec![Object::string_literal(to_winansi(s))]),
            Operation::new("ET", vec![]),
        ];
        self.page_ops().extend(ops);
        self
    }

    /// Draw a single line of text ending at `right`
    pub fn text_right(
        &mut self,
        right: f32,
        top: f32,
        font: Font,
        size: f32,
        color: Rgb,
        s: &str,
    ) -> &mut Self {
        let x = right - text_width(font, size, s);
        self.text(x, top, font, size, color, s)
    }

    // === Shapes ===

    /// Filled rectangle
    pub fn fill_rect(&mut self, x: f32, top: f32, width: f32, height: f32, color: Rgb) -> &mut Self {
        let y = self.size.height - top - height;
        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new("rg", color.operands()),
            Operation::new("re", vec![real(x), real(y), real(width), real(height)]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.page_ops().extend(ops);
        self
    }

    /// Rectangle outline
    pub fn stroke_rect(
        &mut self,
        x: f32,
        top: f32,
        width: f32,
        height: f32,
        color: Rgb,
        line_width: f32,
    ) -> &mut Self {
        let y = self.size.height - top - height;
        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new("RG", color.operands()),
            Operation::new("w", vec![real(line_width)]),
            Operation::new("re", vec![real(x), real(y), real(width), real(height)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.page_ops().extend(ops);
        self
    }

    /// Straight rule between two points
    pub fn line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
        line_width: f32,
    ) -> &mut Self {
        let h = self.size.height;
        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new("RG", color.operands()),
            Operation::new("w", vec![real(line_width)]),
            Operation::new("m", vec![real(from.0), real(h - from.1)]),
            Operation::new("l", vec![real(to.0), real(h - to.1)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.page_ops().extend(ops);
        self
    }

    // === Images ===

    /// Register an image; it is embedded once however often it is drawn
    pub fn add_image(&mut self, image: RasterImage) -> ImageId {
        self.images.push(image);
        ImageId(self.images.len() - 1)
    }

    /// Draw a registered image scaled into the given box
    pub fn draw_image(
        &mut self,
        id: ImageId,
        x: f32,
        top: f32,
        width: f32,
        height: f32,
    ) -> PdfResult<&mut Self> {
        if id.0 >= self.images.len() {
            return Err(PdfError::UnknownImage(id.0));
        }
        let y = self.size.height - top - height;
        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(width),
                    real(0.0),
                    real(0.0),
                    real(height),
                    real(x),
                    real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(id.resource_name().into_bytes())]),
            Operation::new("Q", vec![]),
        ];
        self.page_ops().extend(ops);
        Ok(self)
    }

    // === Build ===

    /// Serialize the document
    ///
    /// Output depends only on what was drawn: no creation date, no file
    /// identifier, objects numbered in drawing order.
    #[instrument(skip(self), fields(pages = self.pages.len(), images = self.images.len()))]
    pub fn build(self) -> PdfResult<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for font in [Font::Helvetica, Font::HelveticaBold] {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), font_id);
        }

        let mut xobjects = Dictionary::new();
        for (index, image) in self.images.iter().enumerate() {
            let image_id = doc.add_object(image.to_stream());
            xobjects.set(ImageId(index).resource_name(), image_id);
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
            "XObject" => xobjects,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![
                    real(0.0),
                    real(0.0),
                    real(self.size.width),
                    real(self.size.height),
                ],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf)?;
        Ok(buf)
    }

    fn page_ops(&mut self) -> &mut Vec<Operation> {
        &mut self.pages[self.current]
    }
}

fn real(v: f32) -> Object {
    v.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bytes: &[u8]) -> Document {
        Document::load_mem(bytes).expect("valid pdf")
    }

    #[test]
    fn test_single_page_document() {
        let mut pdf = PdfBuilder::new(PageSize::A4);
        pdf.text(40.0, 40.0, Font::Helvetica, 12.0, Rgb::BLACK, "Hello");
        let bytes = pdf.build().unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(parse(&bytes).get_pages().len(), 1);
    }

    #[test]
    fn test_pages_and_switching() {
        let mut pdf = PdfBuilder::new(PageSize::A4);
        assert_eq!(pdf.add_page(), 1);
        assert_eq!(pdf.add_page(), 2);
        assert_eq!(pdf.page_count(), 3);

        pdf.switch_to_page(0).unwrap();
        assert_eq!(pdf.current_page(), 0);
        assert!(matches!(
            pdf.switch_to_page(3),
            Err(PdfError::PageOutOfRange { index: 3, count: 3 })
        ));

        let bytes = pdf.build().unwrap();
        assert_eq!(parse(&bytes).get_pages().len(), 3);
    }

    #[test]
    fn test_text_lands_on_selected_page() {
        let mut pdf = PdfBuilder::new(PageSize::A4);
        pdf.add_page();
        pdf.switch_to_page(0).unwrap();
        pdf.text(40.0, 800.0, Font::Helvetica, 8.0, Rgb::BLACK, "Page 1 of 2");
        let doc = parse(&pdf.build().unwrap());

        let pages = doc.get_pages();
        let first = doc.get_page_content(pages[&1]).unwrap();
        let second = doc.get_page_content(pages[&2]).unwrap();
        assert!(String::from_utf8_lossy(&first).contains("Page 1 of 2"));
        assert!(!String::from_utf8_lossy(&second).contains("Page 1 of 2"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let draw = || {
            let mut pdf = PdfBuilder::new(PageSize::A4);
            pdf.text(40.0, 40.0, Font::HelveticaBold, 18.0, Rgb::BLACK, "Quote")
                .fill_rect(40.0, 70.0, 100.0, 20.0, Rgb::gray(0.9))
                .stroke_rect(40.0, 70.0, 100.0, 20.0, Rgb::BLACK, 0.5)
                .line((40.0, 100.0), (140.0, 100.0), Rgb::BLACK, 0.5);
            let logo = pdf.add_image(RasterImage::from_rgb(1, 1, vec![255, 0, 0]).unwrap());
            pdf.draw_image(logo, 40.0, 120.0, 20.0, 20.0).unwrap();
            pdf.build().unwrap()
        };
        assert_eq!(draw(), draw());
    }

    #[test]
    fn test_unknown_image_is_an_error() {
        let mut other = PdfBuilder::new(PageSize::A4);
        let id = other.add_image(RasterImage::from_rgb(1, 1, vec![0, 0, 0]).unwrap());

        let mut pdf = PdfBuilder::new(PageSize::A4);
        assert!(matches!(
            pdf.draw_image(id, 0.0, 0.0, 10.0, 10.0),
            Err(PdfError::UnknownImage(0))
        ));
    }

    #[test]
    fn test_rgb_from_u8() {
        assert_eq!(Rgb::from_u8(255, 0, 255), Rgb(1.0, 0.0, 1.0));
        assert_eq!(Rgb::gray(0.5), Rgb(0.5, 0.5, 0.5));
    }
}
