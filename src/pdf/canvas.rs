//! Page model shared by the renderers.
//!
//! Layout happens in millimetres with the origin at the top-left corner of an
//! A4 page; `Layout::to_pdf` converts to PDF user space.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};
use std::io::Write;

use super::RenderError;
use super::fonts::Font;

pub const PT_PER_MM: f32 = 72.0 / 25.4;
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GREY: Rgb = Rgb(100, 100, 100);
    pub const LIGHT_GREY: Rgb = Rgb(240, 240, 240);
    pub const RULE: Rgb = Rgb(180, 180, 180);
    pub const GREEN: Rgb = Rgb(0, 128, 0);
    pub const RED: Rgb = Rgb(200, 0, 0);
    pub const BLUE: Rgb = Rgb(0, 51, 153);

    fn operands(&self) -> Vec<Object> {
        [self.0, self.1, self.2]
            .iter()
            .map(|c| Object::from(*c as f32 / 255.0))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    /// `x` is the right edge.
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        font: Font,
        size: f32,
        color: Rgb,
        align: Align,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
    /// Index into `Layout::images`; `x`, `y` is the top-left corner.
    Image {
        image: usize,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }

    pub fn image_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }
}

/// Decoded RGB pixels, 8 bits per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
    pub images: Vec<RasterImage>,
}

impl Layout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn add_image(&mut self, image: RasterImage) -> usize {
        self.images.push(image);
        self.images.len() - 1
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages.iter().any(|p| p.contains_text(needle))
    }

    pub fn to_pdf(&self) -> Result<Vec<u8>, RenderError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for font in Font::ALL {
            let id = doc.add_object(font.dictionary());
            fonts.set(font.resource_name(), id);
        }

        let mut xobjects = Dictionary::new();
        for (i, image) in self.images.iter().enumerate() {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&image.rgb)?;
            let data = encoder.finish()?;
            let id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                data,
            ));
            xobjects.set(image_name(i), id);
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
            "XObject" => xobjects,
        });

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let content = Content {
                operations: page_operations(page),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::from(PAGE_WIDTH_MM * PT_PER_MM),
                    Object::from(PAGE_HEIGHT_MM * PT_PER_MM),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

fn pt(mm: f32) -> Object {
    Object::from(mm * PT_PER_MM)
}

fn pdf_y(mm_from_top: f32) -> Object {
    pt(PAGE_HEIGHT_MM - mm_from_top)
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut ops = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text { x, y, text, font, size, color, align } => {
                let width = font.text_width_mm(text, *size);
                let left = match align {
                    Align::Left => *x,
                    Align::Center => x - width / 2.0,
                    Align::Right => x - width,
                };
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new("rg", color.operands()));
                ops.push(Operation::new(
                    "Tf",
                    vec![font.resource_name().into(), Object::from(*size)],
                ));
                ops.push(Operation::new("Td", vec![pt(left), pdf_y(*y)]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(font.encode(text), StringFormat::Hexadecimal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Line { x1, y1, x2, y2, width, color } => {
                ops.push(Operation::new("RG", color.operands()));
                ops.push(Operation::new("w", vec![Object::from(*width)]));
                ops.push(Operation::new("m", vec![pt(*x1), pdf_y(*y1)]));
                ops.push(Operation::new("l", vec![pt(*x2), pdf_y(*y2)]));
                ops.push(Operation::new("S", vec![]));
            }
            DrawOp::FillRect { x, y, w, h, color } => {
                ops.push(Operation::new("rg", color.operands()));
                ops.push(Operation::new("re", vec![pt(*x), pdf_y(y + h), pt(*w), pt(*h)]));
                ops.push(Operation::new("f", vec![]));
            }
            DrawOp::Image { image, x, y, w, h } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![pt(*w), Object::Integer(0), Object::Integer(0), pt(*h), pt(*x), pdf_y(y + h)],
                ));
                ops.push(Operation::new("Do", vec![Object::Name(image_name(*image).into_bytes())]));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }
    ops
}

/// Cursor that flows content down the page and opens new pages as needed.
pub struct Flow {
    pub layout: Layout,
    pub y: f32,
    top: f32,
    bottom: f32,
}

impl Flow {
    /// `top` is where content starts on a fresh page, `bottom` the lowest
    /// baseline allowed before breaking.
    pub fn new(top: f32, bottom: f32) -> Self {
        Flow {
            layout: Layout {
                pages: vec![Page::default()],
                images: Vec::new(),
            },
            y: top,
            top,
            bottom,
        }
    }

    pub fn new_page(&mut self) {
        self.layout.pages.push(Page::default());
        self.y = self.top;
    }

    /// Break the page if `needed` millimetres do not fit below the cursor.
    pub fn ensure(&mut self, needed: f32) {
        if self.y + needed > self.bottom {
            self.new_page();
        }
    }

    pub fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.layout.pages.last_mut() {
            page.ops.push(op);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn text_at(&mut self, x: f32, y: f32, text: impl Into<String>, font: Font, size: f32, color: Rgb, align: Align) {
        self.push(DrawOp::Text {
            x,
            y,
            text: text.into(),
            font,
            size,
            color,
            align,
        });
    }

    /// One line at the cursor, then advance by `line_height`.
    pub fn line(&mut self, x: f32, text: impl Into<String>, font: Font, size: f32, color: Rgb, align: Align, line_height: f32) {
        self.ensure(line_height);
        let y = self.y;
        self.text_at(x, y, text, font, size, color, align);
        self.y += line_height;
    }

    pub fn rule(&mut self, x1: f32, x2: f32, color: Rgb) {
        let y = self.y;
        self.push(DrawOp::Line { x1, y1: y, x2, y2: y, width: 0.5, color });
    }

    pub fn finish(self) -> Layout {
        self.layout
    }
}
