//! Meeting notice ("convocatória").
//!
//! The wording is built once into [`NoticeContent`]; backends only decide how
//! to draw it. The raster backend is preferred when configured and the vector
//! backend takes over whenever it fails.

pub mod html;
pub mod raster;
pub mod sizing;
pub mod vector;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::canvas::Layout;
use super::text::{format_date_pt, format_date_with_weekday, format_time_pt};
use super::{RenderError, RenderMode, RenderedDocument, convocatoria_file_name, deliver};
use crate::config::AppConfig;
use crate::models::convocatoria::{ConvocatoriaData, SecondCall};

pub use html::{RasterBackend, notice_html};
pub use raster::{ChromiumRasterizer, ImagePlacement, Rasterizer, fit_to_a4};
pub use sizing::{FontSizes, content_factor};
pub use vector::VectorBackend;

/// Every sentence of the notice, in print order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoticeContent {
    pub building_name: String,
    pub address: String,
    pub title: String,
    pub subtitle: String,
    pub greeting: String,
    pub legal_basis: String,
    pub meeting_line: String,
    pub second_call: Option<String>,
    pub agenda_heading: String,
    pub agenda: Vec<String>,
    pub legal_paragraphs: [String; 3],
    pub date_line: String,
    pub administrator_label: String,
    pub administrator: String,
}

fn ordinal(number: &str) -> String {
    let number = number.trim();
    if number.ends_with('ª') {
        number.to_string()
    } else {
        format!("{number}ª")
    }
}

impl NoticeContent {
    /// `today` dates the signature block.
    pub fn build(data: &ConvocatoriaData, today: NaiveDate) -> Self {
        let address = data.full_address();
        let time = format_time_pt(&data.meeting_time);

        let second_call = data.second_call().map(|call| match call {
            SecondCall::SameDay { time } => format!(
                "A assembleia terá início à hora marcada em primeira convocatória ou às {} em segunda convocatória.",
                format_time_pt(&time)
            ),
            SecondCall::OtherDay { date, time } => format!(
                "A assembleia terá início à hora marcada em primeira convocatória. Em caso de falta de quórum, \
                 será realizada em segunda convocatória no dia {} pelas {}.",
                format_date_with_weekday(date),
                format_time_pt(&time)
            ),
        });

        let (second_place, second_time) = match data.second_call() {
            Some(SecondCall::OtherDay { date, time }) => (
                format!("e em data posterior ({})", format_date_pt(date)),
                format!("pelas {}", format_time_pt(&time)),
            ),
            Some(SecondCall::SameDay { time }) => {
                ("e data".to_string(), format!("pelas {}", format_time_pt(&time)))
            }
            None => ("e data".to_string(), "meia hora depois".to_string()),
        };

        let agenda = data
            .agenda_items
            .iter()
            .enumerate()
            .map(|(i, item)| match item.description.as_deref().map(str::trim) {
                Some(desc) if !desc.is_empty() => format!("{}. {} - {}", i + 1, item.title, desc),
                _ => format!("{}. {}", i + 1, item.title),
            })
            .collect();

        let date_line = match data.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(city) => format!("{city}, {}", format_date_pt(today)),
            None => format_date_pt(today),
        };

        NoticeContent {
            building_name: data.building_name.clone(),
            address,
            title: "CONVOCATÓRIA".to_string(),
            subtitle: format!(
                "{} ASSEMBLEIA GERAL {} DE CONDÓMINOS",
                ordinal(&data.assembly_number),
                data.assembly_type.label_upper()
            ),
            greeting: "Exmº. Sr. Condómino,".to_string(),
            legal_basis: format!(
                "Nos termos do {}, serve esta para convocar todos os condóminos para a Assembleia {} \
                 de Condóminos do prédio sito na:",
                data.legal_reference(),
                data.assembly_type.label(),
            ),
            meeting_line: format!(
                "A realizar-se no dia {}, pelas {} no {}",
                format_date_with_weekday(data.meeting_date),
                time,
                data.meeting_location.trim()
            ),
            second_call,
            agenda_heading: "Ordem de Trabalhos para esta data:".to_string(),
            agenda,
            legal_paragraphs: [
                "De acordo com o Regulamento do Condomínio deste edifício, está presente em Assembleia de \
                 Condóminos quem, sendo proprietário ou usufrutuário, mandatário ou representante legal dos \
                 mesmos, se encontrar presente à hora marcada para a reunião."
                    .to_string(),
                format!(
                    "Não se verificando comparência de pelo menos metade do valor do prédio, a Assembleia \
                     funcionará em segunda convocatória, no mesmo local {second_place}, {second_time}, com \
                     qualquer número de condóminos."
                ),
                "Qualquer condómino pode fazer-se representar por procurador, bastando para tal apresentar \
                 procuração ou carta mandatária. Conforme determina o parágrafo 2 do artigo 1431° do Código \
                 Civil, o voto do condómino tem de corresponder à sua parte."
                    .to_string(),
            ],
            date_line,
            administrator_label: "O Administrador".to_string(),
            administrator: data.administrator.clone(),
        }
    }
}

/// One way of turning a notice into pages.
#[async_trait]
pub trait NoticeBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn layout(&self, notice: &NoticeContent, sizes: &FontSizes) -> Result<Layout, RenderError>;
}

pub struct ConvocatoriaRenderer {
    primary: Option<Box<dyn NoticeBackend>>,
    fallback: VectorBackend,
}

impl ConvocatoriaRenderer {
    pub fn vector_only() -> Self {
        ConvocatoriaRenderer {
            primary: None,
            fallback: VectorBackend,
        }
    }

    pub fn with_backend(primary: Box<dyn NoticeBackend>) -> Self {
        ConvocatoriaRenderer {
            primary: Some(primary),
            fallback: VectorBackend,
        }
    }

    /// `CHROME_ENABLED` opts in to the raster backend; it is only used when
    /// the browser actually launches.
    pub async fn from_config(config: &AppConfig) -> Self {
        if !config.chrome_enabled {
            return Self::vector_only();
        }
        let rasterizer = ChromiumRasterizer::new(config.chrome_executable.clone());
        Self::detect(Arc::new(rasterizer)).await
    }

    /// Raster backend if `rasterizer` launches, vector otherwise.
    pub async fn detect(rasterizer: Arc<dyn Rasterizer>) -> Self {
        match rasterizer.ensure_available().await {
            Ok(()) => Self::with_backend(Box::new(RasterBackend::new(rasterizer))),
            Err(e) => {
                log::warn!("HTML rasterizer unavailable, using vector backend: {e}");
                Self::vector_only()
            }
        }
    }

    pub fn primary_backend(&self) -> &'static str {
        self.primary
            .as_ref()
            .map(|b| b.name())
            .unwrap_or_else(|| self.fallback.name())
    }

    pub fn preview_html(&self, data: &ConvocatoriaData) -> Result<String, RenderError> {
        let notice = NoticeContent::build(data, Utc::now().date_naive());
        notice_html(&notice, &FontSizes::for_notice(data))
    }

    pub async fn render(&self, data: &ConvocatoriaData, mode: &RenderMode) -> Result<RenderedDocument, RenderError> {
        self.render_on(data, mode, Utc::now().date_naive()).await
    }

    pub async fn render_on(
        &self,
        data: &ConvocatoriaData,
        mode: &RenderMode,
        today: NaiveDate,
    ) -> Result<RenderedDocument, RenderError> {
        let notice = NoticeContent::build(data, today);
        let sizes = FontSizes::for_notice(data);
        let mut warnings = Vec::new();

        let (layout, backend) = match &self.primary {
            Some(primary) => match primary.layout(&notice, &sizes).await {
                Ok(layout) => (layout, primary.name()),
                Err(e) => {
                    log::warn!(
                        "{} backend failed for convocatória {}: {e}; using vector layout",
                        primary.name(),
                        data.assembly_number
                    );
                    warnings.push(format!(
                        "Não foi possível gerar a versão em HTML ({e}); foi usada a versão vetorial"
                    ));
                    (self.fallback.draw(&notice, &sizes), self.fallback.name())
                }
            },
            None => (self.fallback.draw(&notice, &sizes), self.fallback.name()),
        };

        let bytes = layout.to_pdf()?;
        let file_name = convocatoria_file_name(data);
        let page_count = layout.page_count();
        log::info!(
            "Rendered convocatória {} with {backend} backend ({page_count} pages)",
            data.assembly_number
        );
        Ok(RenderedDocument {
            output: deliver(bytes, &file_name, mode)?,
            file_name,
            page_count,
            warnings,
            backend,
        })
    }
}
