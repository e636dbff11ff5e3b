//! Minutes ("acta") PDF.
//!
//! Fixed section order: header band, I to VIII, then a footer on every page
//! once the page count is known. Every block checks the remaining space
//! before it is drawn.

use chrono::{DateTime, Utc};

use super::canvas::{Align, DrawOp, Flow, Layout, PAGE_WIDTH_MM, Rgb};
use super::fonts::Font;
use super::signature_image::{decode_signature, fit_within};
use super::text::{format_date_pt, format_timestamp, line_height, wrap_text};
use super::{RenderError, RenderMode, RenderedDocument, acta_file_name, deliver};
use crate::integrity::IntegrityRecord;
use crate::models::acta::{ActaDocument, SignatureMark, VoteOutcome};

const MARGIN: f32 = 20.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN;
const TOP: f32 = 20.0;
/// Lowest baseline for body content; the footer lives below.
const BOTTOM: f32 = 272.0;
const BLANK_NAME: &str = "_____________________________";
const LEGAL_BASIS: &str =
    "Acta elaborada nos termos do Código Civil Português (Art. 1430º-1433º)";

const SIGNATURE_BLOCK_WIDTH: f32 = 75.0;
const SIGNATURE_COLUMN_GAP: f32 = 20.0;
const SIGNATURE_IMAGE_HEIGHT: f32 = 20.0;
const MEMBER_IMAGE_HEIGHT: f32 = 15.0;

struct ActaLayout<'a> {
    doc: &'a ActaDocument,
    flow: Flow,
    warnings: Vec<String>,
}

impl<'a> ActaLayout<'a> {
    fn new(doc: &'a ActaDocument) -> Self {
        ActaLayout {
            doc,
            flow: Flow::new(TOP, BOTTOM),
            warnings: Vec::new(),
        }
    }

    fn section(&mut self, title: &str) {
        self.flow.ensure(16.0);
        self.flow.y += 3.0;
        self.flow.rule(MARGIN, MARGIN + CONTENT_WIDTH, Rgb::RULE);
        self.flow.y += 6.0;
        self.flow
            .line(MARGIN, title, Font::HelveticaBold, 12.0, Rgb::BLACK, Align::Left, 7.0);
    }

    fn paragraph(&mut self, x: f32, text: &str, font: Font, size: f32, color: Rgb) {
        let width = MARGIN + CONTENT_WIDTH - x;
        for line in wrap_text(text, font, size, width) {
            self.flow
                .line(x, line, font, size, color, Align::Left, line_height(size));
        }
    }

    /// "Label: value", value wrapped after the bold label.
    fn field(&mut self, label: &str, value: &str) {
        let size = 10.0;
        let label = format!("{label}: ");
        let offset = Font::HelveticaBold.text_width_mm(&label, size);
        let lines = wrap_text(value, Font::Helvetica, size, CONTENT_WIDTH - offset);
        for (i, line) in lines.into_iter().enumerate() {
            self.flow.ensure(line_height(size) + 1.0);
            let y = self.flow.y;
            if i == 0 {
                self.flow
                    .text_at(MARGIN, y, label.clone(), Font::HelveticaBold, size, Rgb::BLACK, Align::Left);
            }
            self.flow
                .text_at(MARGIN + offset, y, line, Font::Helvetica, size, Rgb::BLACK, Align::Left);
            self.flow.y += line_height(size) + 1.0;
        }
    }

    fn header(&mut self) {
        let doc = self.doc;
        let acta = &doc.acta;
        self.flow.push(DrawOp::FillRect {
            x: MARGIN,
            y: 14.0,
            w: CONTENT_WIDTH,
            h: 24.0,
            color: Rgb::LIGHT_GREY,
        });
        let center = PAGE_WIDTH_MM / 2.0;
        self.flow.text_at(
            center,
            24.0,
            "ACTA DA ASSEMBLEIA DE CONDÓMINOS",
            Font::HelveticaBold,
            16.0,
            Rgb::BLACK,
            Align::Center,
        );
        self.flow.text_at(
            center,
            32.0,
            format!("Assembleia {} #{}", acta.assembly_type.label(), acta.minute_number),
            Font::Helvetica,
            12.0,
            Rgb::BLACK,
            Align::Center,
        );
        self.flow.y = 44.0;
    }

    fn assembly_data(&mut self) {
        let doc = self.doc;
        let acta = &doc.acta;
        self.section("I. DADOS DA ASSEMBLEIA");
        self.field("Edifício", &acta.building_name);

        let locality: Vec<&str> = [acta.postal_code.as_deref(), acta.city.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect();
        let address = if locality.is_empty() {
            acta.building_address.clone()
        } else {
            format!("{}, {}", acta.building_address, locality.join(" "))
        };
        if !address.trim().is_empty() {
            self.field("Morada", &address);
        }
        self.field("Tipo", &format!("Assembleia {}", acta.assembly_type.label()));
        self.field("Data", &format_date_pt(acta.meeting_date));

        let start = acta.start_time.as_deref().or(acta.meeting_time.as_deref());
        match (start, acta.end_time.as_deref()) {
            (Some(start), Some(end)) => self.field("Horário", &format!("{start} - {end}")),
            (Some(start), None) => self.field("Hora", start),
            _ => {}
        }
        if let Some(location) = acta.location.as_deref().filter(|l| !l.trim().is_empty()) {
            self.field("Local", location);
        }
    }

    fn presiding_officers(&mut self) {
        let doc = self.doc;
        let acta = &doc.acta;
        self.section("II. MESA DA ASSEMBLEIA");
        let president = name_or_blank(acta.president_name.as_deref());
        let secretary = name_or_blank(acta.secretary_name.as_deref());
        self.field("Presidente", &president);
        self.field("Secretário", &secretary);
    }

    fn quorum(&mut self) {
        let doc = self.doc;
        let acta = &doc.acta;
        self.section("III. VERIFICAÇÃO DE QUÓRUM");
        self.field(
            "Total de condóminos presentes/representados",
            &acta.attendee_total().to_string(),
        );
        self.field(
            "Percentagem representada",
            &format!("{:.2}%", acta.quorum_percentage),
        );

        let (mark, text, color) = if acta.quorum_met() {
            ("✓", "Quórum atingido - A assembleia pode deliberar validamente", Rgb::GREEN)
        } else {
            ("✗", "Quórum não atingido - Necessária segunda convocatória", Rgb::RED)
        };
        self.flow.ensure(7.0);
        let y = self.flow.y + 1.0;
        self.flow
            .text_at(MARGIN, y, mark, Font::Symbols, 11.0, color, Align::Left);
        self.flow
            .text_at(MARGIN + 6.0, y, text, Font::HelveticaBold, 11.0, color, Align::Left);
        self.flow.y += 7.0;
    }

    fn agenda(&mut self) {
        let doc = self.doc;
        let items = &doc.acta.agenda_items;
        if items.is_empty() {
            return;
        }
        self.section("IV. ORDEM DE TRABALHOS");
        for (i, item) in items.iter().enumerate() {
            let number = item.item_number.unwrap_or(i as u32 + 1);
            let title = wrap_text(
                &format!("{number}. {}", item.title),
                Font::HelveticaBold,
                11.0,
                CONTENT_WIDTH,
            );
            // Keep the title lines of an item together.
            self.flow.ensure(title.len() as f32 * line_height(11.0) + 2.0);
            for line in title {
                self.flow
                    .line(MARGIN, line, Font::HelveticaBold, 11.0, Rgb::BLACK, Align::Left, line_height(11.0));
            }
            if let Some(description) = item.description.as_deref().filter(|d| !d.trim().is_empty()) {
                self.paragraph(MARGIN + 5.0, description, Font::Helvetica, 10.0, Rgb::BLACK);
            }
            if let Some(tag) = item.kind.and_then(|k| k.tag()) {
                self.flow.line(
                    MARGIN + 5.0,
                    tag,
                    Font::HelveticaOblique,
                    9.0,
                    Rgb::GREY,
                    Align::Left,
                    line_height(9.0),
                );
            }
            self.flow.y += 2.0;
        }
    }

    fn attendance(&mut self) {
        let doc = self.doc;
        let attendees = &doc.acta.attendees;
        if attendees.is_empty() {
            return;
        }
        self.section("V. LISTA DE PRESENÇAS");
        for (i, attendee) in attendees.iter().enumerate() {
            self.flow.ensure(line_height(10.0));
            let y = self.flow.y;
            self.flow.text_at(
                MARGIN + 5.0,
                y,
                format!("{}. {}", i + 1, attendee.name),
                Font::Helvetica,
                10.0,
                Rgb::BLACK,
                Align::Left,
            );
            self.flow.text_at(
                MARGIN + CONTENT_WIDTH,
                y,
                attendee.attendance_type.tag(),
                Font::HelveticaOblique,
                9.0,
                Rgb::GREY,
                Align::Right,
            );
            self.flow.y += line_height(10.0);
        }
    }

    fn voting(&mut self) {
        let doc = self.doc;
        let results = &doc.acta.voting_results;
        if results.is_empty() {
            return;
        }
        self.section("VI. RESULTADO DAS VOTAÇÕES");
        for result in results {
            let title = wrap_text(&result.title, Font::HelveticaBold, 11.0, CONTENT_WIDTH);
            self.flow
                .ensure(title.len() as f32 * line_height(11.0) + 4.0 * line_height(10.0) + 3.0);
            for line in title {
                self.flow
                    .line(MARGIN, line, Font::HelveticaBold, 11.0, Rgb::BLACK, Align::Left, line_height(11.0));
            }
            if let Some(n) = result.in_favor {
                self.flow.line(MARGIN + 5.0, format!("A favor: {n} votos"), Font::Helvetica, 10.0, Rgb::BLACK, Align::Left, line_height(10.0));
            }
            if let Some(n) = result.against {
                self.flow.line(MARGIN + 5.0, format!("Contra: {n} votos"), Font::Helvetica, 10.0, Rgb::BLACK, Align::Left, line_height(10.0));
            }
            if let Some(n) = result.abstentions {
                self.flow.line(MARGIN + 5.0, format!("Abstenções: {n}"), Font::Helvetica, 10.0, Rgb::BLACK, Align::Left, line_height(10.0));
            }
            if let Some(outcome) = result.result {
                let (text, color) = match outcome {
                    VoteOutcome::Approved => ("Resultado: APROVADO", Rgb::GREEN),
                    VoteOutcome::Rejected => ("Resultado: REJEITADO", Rgb::RED),
                };
                self.flow
                    .line(MARGIN + 5.0, text, Font::HelveticaBold, 10.0, color, Align::Left, line_height(10.0));
            }
            self.flow.y += 3.0;
        }
    }

    fn conclusions(&mut self) {
        let doc = self.doc;
        let Some(text) = doc
            .acta
            .conclusions
            .as_deref()
            .filter(|c| !c.trim().is_empty())
        else {
            return;
        };
        self.section("VII. CONCLUSÕES");
        self.paragraph(MARGIN, text, Font::Helvetica, 10.0, Rgb::BLACK);
    }

    /// Image (or blank space) over a rule, then label, name and timestamp.
    #[allow(clippy::too_many_arguments)]
    fn signature_block(
        &mut self,
        x: f32,
        top: f32,
        image_height: f32,
        label: Option<&str>,
        name: &str,
        mark: Option<&SignatureMark>,
    ) {
        if let Some(data) = mark.and_then(|m| m.image.as_deref()) {
            match decode_signature(data) {
                Ok(image) => {
                    let (w, h) = fit_within(&image, SIGNATURE_BLOCK_WIDTH, image_height);
                    let index = self.flow.layout.add_image(image);
                    self.flow.push(DrawOp::Image {
                        image: index,
                        x: x + (SIGNATURE_BLOCK_WIDTH - w) / 2.0,
                        y: top + (image_height - h),
                        w,
                        h,
                    });
                }
                Err(e) => {
                    log::error!("Unreadable signature image for {name}: {e}");
                    self.warnings.push(format!(
                        "A assinatura de {name} não pôde ser lida; foi deixado espaço em branco"
                    ));
                }
            }
        }

        let center = x + SIGNATURE_BLOCK_WIDTH / 2.0;
        let rule_y = top + image_height + 2.0;
        self.flow.push(DrawOp::Line {
            x1: x,
            y1: rule_y,
            x2: x + SIGNATURE_BLOCK_WIDTH,
            y2: rule_y,
            width: 0.5,
            color: Rgb::BLACK,
        });
        let mut y = rule_y + 5.0;
        if let Some(label) = label {
            self.flow
                .text_at(center, y, label, Font::HelveticaBold, 10.0, Rgb::BLACK, Align::Center);
            y += 5.0;
        }
        self.flow
            .text_at(center, y, name, Font::Helvetica, 10.0, Rgb::BLACK, Align::Center);
        if let Some(at) = mark.and_then(|m| m.signed_at) {
            self.flow.text_at(
                center,
                y + 4.5,
                format!("Assinado em {}", format_timestamp(at)),
                Font::Helvetica,
                8.0,
                Rgb::GREY,
                Align::Center,
            );
        }
    }

    fn signatures(&mut self) {
        let doc = self.doc;
        let acta = &doc.acta;
        let signatures = &doc.signatures;
        self.section("VIII. ASSINATURAS");
        let date = acta.signed_date.unwrap_or(acta.meeting_date);
        self.flow.line(
            MARGIN,
            format!("Lavrada e aprovada em {}", format_date_pt(date)),
            Font::Helvetica,
            10.0,
            Rgb::BLACK,
            Align::Left,
            8.0,
        );

        let president_name = signatures
            .president
            .as_ref()
            .map(|m| m.signer_name.clone())
            .unwrap_or_else(|| name_or_blank(acta.president_name.as_deref()));
        let secretary_name = signatures
            .secretary
            .as_ref()
            .map(|m| m.signer_name.clone())
            .unwrap_or_else(|| name_or_blank(acta.secretary_name.as_deref()));

        let block_height = SIGNATURE_IMAGE_HEIGHT + 20.0;
        self.flow.ensure(block_height);
        let top = self.flow.y;
        let right = MARGIN + SIGNATURE_BLOCK_WIDTH + SIGNATURE_COLUMN_GAP;
        self.signature_block(
            MARGIN,
            top,
            SIGNATURE_IMAGE_HEIGHT,
            Some("O Presidente da Mesa"),
            &president_name,
            signatures.president.as_ref(),
        );
        self.signature_block(
            right,
            top,
            SIGNATURE_IMAGE_HEIGHT,
            Some("O Secretário da Mesa"),
            &secretary_name,
            signatures.secretary.as_ref(),
        );
        self.flow.y = top + block_height + 4.0;

        if signatures.members.is_empty() {
            return;
        }
        self.flow.ensure(8.0 + MEMBER_IMAGE_HEIGHT + 15.0);
        self.flow.line(
            MARGIN,
            "Condóminos presentes",
            Font::HelveticaBold,
            11.0,
            Rgb::BLACK,
            Align::Left,
            8.0,
        );
        let row_height = MEMBER_IMAGE_HEIGHT + 15.0;
        for pair in signatures.members.chunks(2) {
            self.flow.ensure(row_height);
            let top = self.flow.y;
            for (column, mark) in pair.iter().enumerate() {
                let x = if column == 0 { MARGIN } else { right };
                self.signature_block(x, top, MEMBER_IMAGE_HEIGHT, None, &mark.signer_name, Some(mark));
            }
            self.flow.y = top + row_height + 2.0;
        }
    }

    fn footers(&mut self, generated_at: DateTime<Utc>) {
        let total = self.flow.layout.pages.len();
        let doc = self.doc;
        let integrity = doc.integrity.as_ref();
        let code = integrity
            .map(IntegrityRecord::short_code)
            .unwrap_or_else(|| "n/d".to_string());
        let hash = match integrity {
            Some(record) if record.is_degraded() => {
                format!("{} (integridade não criptográfica)", record.document_hash)
            }
            Some(record) => format!("{}...", record.short_hash()),
            None => "não calculado".to_string(),
        };
        let stamp = format!("Hash: {hash} | Gerado em {}", format_timestamp(generated_at));
        let center = PAGE_WIDTH_MM / 2.0;

        for (i, page) in self.flow.layout.pages.iter_mut().enumerate() {
            page.ops.push(DrawOp::Line {
                x1: MARGIN,
                y1: 280.0,
                x2: MARGIN + CONTENT_WIDTH,
                y2: 280.0,
                width: 0.3,
                color: Rgb::RULE,
            });
            page.ops.push(footer_text(center, 284.5, LEGAL_BASIS.to_string(), Align::Center));
            page.ops.push(footer_text(MARGIN, 288.5, format!("Código: {code}"), Align::Left));
            page.ops.push(footer_text(
                MARGIN + CONTENT_WIDTH,
                288.5,
                format!("Página {} de {}", i + 1, total),
                Align::Right,
            ));
            page.ops.push(footer_text(center, 292.5, stamp.clone(), Align::Center));
        }
    }
}

fn footer_text(x: f32, y: f32, text: String, align: Align) -> DrawOp {
    DrawOp::Text {
        x,
        y,
        text,
        font: Font::Helvetica,
        size: 7.5,
        color: Rgb::GREY,
        align,
    }
}

fn name_or_blank(name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => BLANK_NAME.to_string(),
    }
}

/// Lay out the minutes. Returns the pages and the warnings for any signature
/// image that could not be embedded.
pub fn layout_acta(doc: &ActaDocument, generated_at: DateTime<Utc>) -> (Layout, Vec<String>) {
    let mut layout = ActaLayout::new(doc);
    layout.header();
    layout.assembly_data();
    layout.presiding_officers();
    layout.quorum();
    layout.agenda();
    layout.attendance();
    layout.voting();
    layout.conclusions();
    layout.signatures();
    layout.footers(generated_at);
    (layout.flow.finish(), layout.warnings)
}

pub fn render_acta(doc: &ActaDocument, mode: &RenderMode) -> Result<RenderedDocument, RenderError> {
    let generated_at = doc.generated_at.unwrap_or_else(Utc::now);
    let (layout, warnings) = layout_acta(doc, generated_at);
    if let Some(record) = doc.integrity.as_ref().filter(|r| r.is_degraded()) {
        log::warn!(
            "Acta {} rendered with non-cryptographic integrity code {}",
            doc.acta.minute_number,
            record.document_hash
        );
    }
    let bytes = layout.to_pdf()?;
    let file_name = acta_file_name(&doc.acta);
    let page_count = layout.page_count();
    log::info!(
        "Rendered acta {} ({} pages, {} warnings)",
        doc.acta.minute_number,
        page_count,
        warnings.len()
    );
    Ok(RenderedDocument {
        output: deliver(bytes, &file_name, mode)?,
        file_name,
        page_count,
        warnings,
        backend: "vector",
    })
}
