use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::PathBuf;

use crate::pdf::RenderError;
use crate::pdf::canvas::PAGE_WIDTH_MM;

/// A4 width at 96 dpi.
pub const VIEWPORT_WIDTH_PX: u32 = 794;
pub const VIEWPORT_HEIGHT_PX: u32 = 1123;

const FIT_MAX_WIDTH: f32 = 190.0;
const FIT_MAX_HEIGHT: f32 = 277.0;
const FIT_TOP: f32 = 10.0;

/// Turns a complete HTML document into PNG bytes.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, html: &str) -> Result<Vec<u8>, RenderError>;

    /// Checked once before the raster backend is chosen.
    async fn ensure_available(&self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Where the rasterized notice goes on the A4 page, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Fit an image of `width` x `height` pixels into the printable area keeping
/// its aspect ratio, centred horizontally, 10 mm from the top.
pub fn fit_to_a4(width: u32, height: u32) -> ImagePlacement {
    let ratio = height.max(1) as f32 / width.max(1) as f32;
    let (w, h) = if FIT_MAX_WIDTH * ratio > FIT_MAX_HEIGHT {
        (FIT_MAX_HEIGHT / ratio, FIT_MAX_HEIGHT)
    } else {
        (FIT_MAX_WIDTH, FIT_MAX_WIDTH * ratio)
    };
    ImagePlacement {
        x: (PAGE_WIDTH_MM - w) / 2.0,
        y: FIT_TOP,
        w,
        h,
    }
}

/// Headless Chromium, launched per document.
pub struct ChromiumRasterizer {
    executable: Option<PathBuf>,
}

impl ChromiumRasterizer {
    pub fn new(executable: Option<PathBuf>) -> Self {
        ChromiumRasterizer { executable }
    }

    fn config(&self) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder().window_size(VIEWPORT_WIDTH_PX, VIEWPORT_HEIGHT_PX);
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(RenderError::Raster)
    }
}

fn raster_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Raster(e.to_string())
}

#[async_trait]
impl Rasterizer for ChromiumRasterizer {
    async fn rasterize(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let (mut browser, mut handler) = Browser::launch(self.config()?).await.map_err(raster_err)?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let shot = async {
            let page = browser.new_page("about:blank").await.map_err(raster_err)?;
            page.set_content(html).await.map_err(raster_err)?;
            page.screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(raster_err)
        }
        .await;

        if let Err(e) = browser.close().await {
            log::warn!("Failed to close headless browser: {e}");
        }
        events.abort();
        shot
    }

    async fn ensure_available(&self) -> Result<(), RenderError> {
        let (mut browser, mut handler) = Browser::launch(self.config()?).await.map_err(raster_err)?;
        let events = tokio::spawn(async move { while handler.next().await.is_some() {} });
        let closed = browser.close().await.map(|_| ()).map_err(raster_err);
        events.abort();
        closed
    }
}
