//! Sticker conversion: `!sticker` on (or replying to) an image.
//!
//! The image is fit into a transparent 512×512 canvas and encoded as
//! lossless WebP, the sticker format the transport expects.

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{ColorType, Rgba, RgbaImage};

use crate::gateway::{Command, CommandContext, Reply};

const STICKER_SIDE: u32 = 512;

pub struct StickerCommand;

#[async_trait]
impl Command for StickerCommand {
    fn name(&self) -> &'static str {
        "!sticker"
    }

    fn usage(&self) -> &'static str {
        "!sticker (send or reply to an image)"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply> {
        let bytes = match ctx.image {
            Some(bytes) => bytes.to_vec(),
            None => {
                return Ok(Reply::Text(
                    "⚠️ Send or reply to an image to make a sticker.".to_string(),
                ))
            }
        };

        // Transcoding is CPU work; keep it off the async executor.
        let webp = tokio::task::spawn_blocking(move || to_sticker_webp(&bytes))
            .await
            .context("sticker conversion task failed")??;
        Ok(Reply::Sticker(webp))
    }
}

/// Decode, contain-fit onto a transparent square canvas, encode WebP.
fn to_sticker_webp(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("could not decode image")?;
    let resized = img.resize(STICKER_SIDE, STICKER_SIDE, FilterType::Lanczos3);

    let mut canvas = RgbaImage::from_pixel(STICKER_SIDE, STICKER_SIDE, Rgba([0, 0, 0, 0]));
    let x = i64::from((STICKER_SIDE - resized.width()) / 2);
    let y = i64::from((STICKER_SIDE - resized.height()) / 2);
    image::imageops::overlay(&mut canvas, &resized.to_rgba8(), x, y);

    let mut out = Vec::new();
    WebPEncoder::new_lossless(&mut out)
        .encode(canvas.as_raw(), STICKER_SIDE, STICKER_SIDE, ColorType::Rgba8)
        .context("could not encode webp")?;
    Ok(out)
}
