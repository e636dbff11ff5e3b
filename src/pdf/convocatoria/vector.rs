use async_trait::async_trait;

use super::{FontSizes, NoticeBackend, NoticeContent};
use crate::pdf::RenderError;
use crate::pdf::canvas::{Align, DrawOp, Flow, Layout, PAGE_WIDTH_MM, Rgb};
use crate::pdf::fonts::Font;
use crate::pdf::text::{line_height, wrap_text};

const MARGIN: f32 = 15.0;
const RIGHT: f32 = PAGE_WIDTH_MM - MARGIN;
const WIDTH: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN;
const BOTTOM: f32 = 285.0;
/// The signature block never starts above this line.
const SIGNATURE_TOP: f32 = 240.0;
const SIGNATURE_HEIGHT: f32 = 30.0;
const SIGNATURE_RULE: f32 = 70.0;

/// Draws the notice directly with Times.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorBackend;

impl VectorBackend {
    fn paragraph(flow: &mut Flow, x: f32, text: &str, font: Font, size: f32, color: Rgb) {
        for line in wrap_text(text, font, size, RIGHT - x) {
            flow.line(x, line, font, size, color, Align::Left, line_height(size));
        }
    }

    fn centered(flow: &mut Flow, text: &str, font: Font, size: f32, color: Rgb) {
        for line in wrap_text(text, font, size, WIDTH) {
            flow.line(PAGE_WIDTH_MM / 2.0, line, font, size, color, Align::Center, line_height(size));
        }
    }

    pub fn draw(&self, notice: &NoticeContent, sizes: &FontSizes) -> Layout {
        let mut flow = Flow::new(20.0, BOTTOM);
        let gap = sizes.spacing;

        flow.line(RIGHT, &notice.building_name, Font::TimesBold, sizes.header, Rgb::BLACK, Align::Right, line_height(sizes.header));
        for line in wrap_text(&notice.address, Font::Times, sizes.header, WIDTH / 2.0) {
            flow.line(RIGHT, line, Font::Times, sizes.header, Rgb::BLACK, Align::Right, line_height(sizes.header));
        }
        flow.y += gap * 2.0;

        Self::centered(&mut flow, &notice.title, Font::TimesBold, sizes.title_main, Rgb::BLACK);
        Self::centered(&mut flow, &notice.subtitle, Font::TimesBold, sizes.title_sub, Rgb::BLACK);
        flow.y += gap * 2.0;

        Self::paragraph(&mut flow, MARGIN, &notice.greeting, Font::Times, sizes.content, Rgb::BLACK);
        flow.y += gap;
        Self::paragraph(&mut flow, MARGIN, &notice.legal_basis, Font::Times, sizes.content, Rgb::BLACK);
        flow.y += gap / 2.0;
        Self::centered(&mut flow, &notice.address, Font::TimesBold, sizes.content, Rgb::BLACK);
        flow.y += gap / 2.0;
        Self::paragraph(&mut flow, MARGIN, &notice.meeting_line, Font::TimesBold, sizes.content, Rgb::BLUE);

        if let Some(second_call) = &notice.second_call {
            flow.y += gap / 2.0;
            Self::paragraph(&mut flow, MARGIN, second_call, Font::Times, sizes.content, Rgb::BLACK);
        }

        flow.y += gap;
        Self::paragraph(&mut flow, MARGIN, &notice.agenda_heading, Font::TimesBold, sizes.content, Rgb::BLACK);
        for item in &notice.agenda {
            Self::paragraph(&mut flow, MARGIN + 5.0, item, Font::TimesBold, sizes.content, Rgb::BLUE);
        }

        for paragraph in &notice.legal_paragraphs {
            flow.y += gap / 2.0;
            Self::paragraph(&mut flow, MARGIN, paragraph, Font::Times, sizes.legal, Rgb::BLACK);
        }

        let mut top = (flow.y + gap * 2.0).max(SIGNATURE_TOP);
        if top + SIGNATURE_HEIGHT > BOTTOM {
            flow.new_page();
            top = flow.y;
        }
        let center = RIGHT - SIGNATURE_RULE / 2.0;
        flow.text_at(RIGHT, top, &notice.date_line, Font::Times, sizes.signature, Rgb::BLACK, Align::Right);
        flow.text_at(center, top + 10.0, &notice.administrator_label, Font::Times, sizes.signature, Rgb::BLACK, Align::Center);
        flow.push(DrawOp::Line {
            x1: RIGHT - SIGNATURE_RULE,
            y1: top + 20.0,
            x2: RIGHT,
            y2: top + 20.0,
            width: 0.4,
            color: Rgb::BLACK,
        });
        flow.text_at(center, top + 26.0, &notice.administrator, Font::TimesBold, sizes.signature, Rgb::BLACK, Align::Center);
        flow.finish()
    }
}

#[async_trait]
impl NoticeBackend for VectorBackend {
    fn name(&self) -> &'static str {
        "vector"
    }

    async fn layout(&self, notice: &NoticeContent, sizes: &FontSizes) -> Result<Layout, RenderError> {
        Ok(self.draw(notice, sizes))
    }
}
