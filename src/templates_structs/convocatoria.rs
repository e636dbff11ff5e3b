use askama::Template;

use crate::pdf::convocatoria::{FontSizes, NoticeContent};

/// Printable meeting notice, rasterized by the HTML backend and served as preview.
#[derive(Template)]
#[template(path = "convocatoria/notice.html")]
pub struct NoticeTemplate<'a> {
    pub notice: &'a NoticeContent,
    pub sizes: &'a FontSizes,
}
