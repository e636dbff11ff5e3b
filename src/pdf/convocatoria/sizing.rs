//! Type sizes for the meeting notice, shrunk as the agenda grows.

use serde::Serialize;

use crate::models::convocatoria::ConvocatoriaData;

pub const MAX_CONTENT_FACTOR: f32 = 0.7;

/// Density of the notice in `[0, 0.7]`: agenda length, agenda text and the
/// extra second-call paragraph.
pub fn content_factor(data: &ConvocatoriaData) -> f32 {
    let items = data.agenda_items.len() as f32;
    let text_len: usize = data
        .agenda_items
        .iter()
        .map(|item| item.title.chars().count())
        .sum();

    let mut factor = (items / 15.0).min(0.4) + (text_len as f32 / 800.0).min(0.2);
    if data.second_call_enabled {
        factor += 0.1;
    }
    factor.min(MAX_CONTENT_FACTOR)
}

/// Point sizes per text category; `spacing` is in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FontSizes {
    pub header: f32,
    pub title_main: f32,
    pub title_sub: f32,
    pub content: f32,
    pub legal: f32,
    pub signature: f32,
    pub spacing: f32,
}

/// `max(floor, round(base - factor * weight))`
fn scaled(base: f32, weight: f32, floor: f32, factor: f32) -> f32 {
    (base - factor * weight).round().max(floor)
}

impl FontSizes {
    pub fn for_factor(factor: f32) -> Self {
        let f = factor.clamp(0.0, MAX_CONTENT_FACTOR);
        FontSizes {
            header: scaled(11.0, 2.0, 10.0, f),
            title_main: scaled(18.0, 3.0, 16.0, f),
            title_sub: scaled(14.0, 2.0, 12.0, f),
            content: scaled(12.0, 2.5, 10.0, f),
            legal: scaled(10.0, 1.5, 9.0, f),
            signature: scaled(10.0, 1.0, 9.0, f),
            spacing: scaled(6.0, 2.0, 4.0, f),
        }
    }

    pub fn for_notice(data: &ConvocatoriaData) -> Self {
        Self::for_factor(content_factor(data))
    }

    fn as_array(&self) -> [f32; 7] {
        [
            self.header,
            self.title_main,
            self.title_sub,
            self.content,
            self.legal,
            self.signature,
            self.spacing,
        ]
    }

    /// True when no category is larger than in `other`.
    pub fn none_larger_than(&self, other: &FontSizes) -> bool {
        self.as_array()
            .iter()
            .zip(other.as_array())
            .all(|(a, b)| *a <= b)
    }
}
