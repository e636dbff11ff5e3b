use askama::Template;
use async_trait::async_trait;
use std::sync::Arc;

use super::raster::{Rasterizer, fit_to_a4};
use super::{FontSizes, NoticeBackend, NoticeContent};
use crate::pdf::RenderError;
use crate::pdf::canvas::{DrawOp, Layout, Page};
use crate::pdf::signature_image::decode_raster;
use crate::templates_structs::NoticeTemplate;

/// The styled HTML document for a notice.
pub fn notice_html(notice: &NoticeContent, sizes: &FontSizes) -> Result<String, RenderError> {
    Ok(NoticeTemplate { notice, sizes }.render()?)
}

/// Renders the HTML notice off-screen and places the screenshot on one A4 page.
pub struct RasterBackend {
    rasterizer: Arc<dyn Rasterizer>,
}

impl RasterBackend {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        RasterBackend { rasterizer }
    }
}

#[async_trait]
impl NoticeBackend for RasterBackend {
    fn name(&self) -> &'static str {
        "html"
    }

    async fn layout(&self, notice: &NoticeContent, sizes: &FontSizes) -> Result<Layout, RenderError> {
        let html = notice_html(notice, sizes)?;
        let png = self.rasterizer.rasterize(&html).await?;
        let image = decode_raster(&png)?;
        let placement = fit_to_a4(image.width, image.height);

        let mut layout = Layout::default();
        let index = layout.add_image(image);
        layout.pages.push(Page {
            ops: vec![DrawOp::Image {
                image: index,
                x: placement.x,
                y: placement.y,
                w: placement.w,
                h: placement.h,
            }],
        });
        Ok(layout)
    }
}
