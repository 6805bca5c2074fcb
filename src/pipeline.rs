//! # Tile Transcoding Pipeline
//!
//! The device asks for map tiles over loopback HTTP in its own grid: small
//! tiles of `tileSize` pixels carved out of larger source tiles fetched at
//! `scaledTileSize`. This module serves one such request end to end —
//! fetch the covering source raster, resample it, slice it into the
//! sub-tile grid, pull out the requested slice's pixels and colour-encode
//! them.
//!
//! ## Failure policy
//!
//! The device HTTP client cannot cope with absent or truncated bodies, so
//! no error escapes [`transcode`]: any fetch, decode or consistency
//! failure collapses into a well-formed all-white "error tile" of the
//! requested size and the active encoding. The device renders a blank tile
//! and retries later; it never sees a half payload.
//!
//! ## Concurrency
//!
//! Each call is independent — no ordering between concurrent requests, no
//! shared mutable state beyond the fetcher's endpoint configuration, and
//! no cache requirement: re-fetching the same source tile per request is
//! slower but correct. The fetch is bounded by the HTTP client timeout so
//! an abandoned request cannot leak in-flight work indefinitely.

use crate::colour::{Colour, ColourPalette};
use crate::tile::{encode_tile, TileEncoding};
use image::imageops::FilterType;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Errors inside the pipeline. These never reach the device — [`transcode`]
/// resolves every variant to an error tile — but they are logged and
/// surfaced to tests.
#[derive(Error, Debug)]
pub enum TileError {
    /// HTTP fetch failed: network, timeout, or a non-success status
    #[error("tile fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The fetched bytes are not a decodable raster
    #[error("tile decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// Request geometry violates `scaledTileSize ≥ tileSize > 0`
    #[error("invalid tile geometry: tile size {tile_size}, scaled {scaled_tile_size}")]
    InvalidGeometry { tile_size: u32, scaled_tile_size: u32 },

    /// The computed sub-tile offset missed the slice grid; an internal
    /// consistency failure, never an index fault
    #[error("sub-tile offset {offset} outside slice grid of {count}")]
    OffsetOutOfRange { offset: usize, count: usize },
}

/// A device tile request as carried by the loopback HTTP endpoint.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileRequest {
    /// Device-space tile column
    pub x: u32,
    /// Device-space tile row
    pub y: u32,
    /// Zoom level
    pub z: u8,
    /// Requested tile edge length in pixels
    pub tile_size: u32,
    /// Source tile edge length in pixels; always ≥ `tile_size`
    pub scaled_tile_size: u32,
}

/// The `{type, data}` body answered to the device.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileResponse {
    /// Echo of the tile encoding tag
    #[serde(rename = "type")]
    pub encoding: u8,
    /// Colour-encoded pixel string
    pub data: String,
}

/// Where source rasters come from. The HTTP fetcher implements this; tests
/// substitute canned bytes. Cache/dedup layers, when present, also live
/// behind this seam.
pub trait TileSource: Send + Sync {
    /// Fetch the raw raster bytes for source tile (x, y) at zoom z.
    fn fetch_raster(
        &self,
        x: u32,
        y: u32,
        z: u8,
    ) -> impl Future<Output = Result<Vec<u8>, TileError>> + Send;

    /// Swap the upstream endpoint at runtime. Sources without a
    /// configurable endpoint ignore the call.
    fn replace_endpoint(&self, _endpoint: String) {}

    /// Swap the bearer token forwarded upstream. Sources without one
    /// ignore the call.
    fn replace_token(&self, _token: Option<String>) {}
}

/// Tile source backed by a slippy-map HTTP endpoint.
///
/// The URL template carries `{x}`, `{y}`, `{z}` placeholders. Endpoint and
/// bearer token are swappable at runtime (the device can push a new tile
/// server without restarting the bridge); the locks are held only long
/// enough to read the configuration, never across I/O.
pub struct HttpTileSource {
    client: reqwest::Client,
    endpoint: Mutex<String>,
    token: Mutex<Option<String>>,
}

impl HttpTileSource {
    /// Build a source with a bounded per-request timeout. The timeout is
    /// the pipeline's cancellation bound: an abandoned device request can
    /// hold an in-flight fetch no longer than this.
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TileError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpTileSource {
            client,
            endpoint: Mutex::new(endpoint.into()),
            token: Mutex::new(token),
        })
    }

    fn request_parts(&self, x: u32, y: u32, z: u8) -> (String, Option<String>) {
        let template = self.endpoint.lock().expect("endpoint lock poisoned").clone();
        let token = self.token.lock().expect("token lock poisoned").clone();
        let url = template
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{z}", &z.to_string());
        (url, token)
    }
}

impl TileSource for HttpTileSource {
    async fn fetch_raster(&self, x: u32, y: u32, z: u8) -> Result<Vec<u8>, TileError> {
        let (url, token) = self.request_parts(x, y, z);
        let mut request = self.client.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let bytes = request.send().await?.error_for_status()?.bytes().await?;
        Ok(bytes.to_vec())
    }

    fn replace_endpoint(&self, endpoint: String) {
        *self.endpoint.lock().expect("endpoint lock poisoned") = endpoint;
    }

    fn replace_token(&self, token: Option<String>) {
        *self.token.lock().expect("token lock poisoned") = token;
    }
}

/// The sub-tile grid implied by a request's geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceGrid {
    /// How many device tiles subdivide one source tile per axis
    pub small_tiles_per_scaled_tile: u32,
    /// Edge length the source raster is resampled to before slicing
    pub full_source_tile_size: u32,
}

/// Compute the slice grid for a request.
///
/// `smallTilesPerScaledTile = ceil(scaled / tile)` — a fractional ratio
/// rounds up, and the raster is resampled to a whole multiple of the tile
/// size so the slices divide it exactly.
pub fn slice_grid(request: &TileRequest) -> Result<SliceGrid, TileError> {
    if request.tile_size == 0 || request.scaled_tile_size < request.tile_size {
        return Err(TileError::InvalidGeometry {
            tile_size: request.tile_size,
            scaled_tile_size: request.scaled_tile_size,
        });
    }
    let small_tiles = request.scaled_tile_size.div_ceil(request.tile_size);
    Ok(SliceGrid {
        small_tiles_per_scaled_tile: small_tiles,
        full_source_tile_size: small_tiles * request.tile_size,
    })
}

/// The slice index for a device tile within its source tile's grid.
///
/// `offset = (x % n)·n + (y % n)` — note the x-major order. The firmware's
/// unpacking loop indexes the grid the same way, so this stays as deployed
/// even though the slices themselves are cut row-major.
pub fn slice_offset(request: &TileRequest, grid: &SliceGrid) -> usize {
    let n = grid.small_tiles_per_scaled_tile;
    ((request.x % n) * n + (request.y % n)) as usize
}

/// Serve one device tile request, never failing.
///
/// On any pipeline error the response degrades to an all-white tile of the
/// requested size so the device always receives a decodable body.
pub async fn transcode<S: TileSource>(
    source: &S,
    request: &TileRequest,
    encoding: TileEncoding,
    palette: &ColourPalette,
) -> TileResponse {
    match try_transcode(source, request, encoding, palette).await {
        Ok(response) => response,
        Err(error) => {
            warn!(
                x = request.x,
                y = request.y,
                z = request.z,
                %error,
                "tile transcode failed, serving error tile"
            );
            error_tile(request.tile_size, encoding, palette)
        }
    }
}

async fn try_transcode<S: TileSource>(
    source: &S,
    request: &TileRequest,
    encoding: TileEncoding,
    palette: &ColourPalette,
) -> Result<TileResponse, TileError> {
    let grid = slice_grid(request)?;
    let n = grid.small_tiles_per_scaled_tile;

    // Integer division: the coarse source tile covering this device tile.
    let source_x = request.x / n;
    let source_y = request.y / n;

    let raw = source.fetch_raster(source_x, source_y, request.z).await?;
    let raster = image::load_from_memory(&raw)?;
    let resized = raster
        .resize_exact(
            grid.full_source_tile_size,
            grid.full_source_tile_size,
            FilterType::Triangle,
        )
        .to_rgb8();

    let slices = cut_slices(&resized, n, request.tile_size);
    let offset = slice_offset(request, &grid);
    if offset >= slices.len() {
        return Err(TileError::OffsetOutOfRange {
            offset,
            count: slices.len(),
        });
    }

    let pixels = extract_pixels(&slices[offset]);
    let (tag, data) = encode_tile(&pixels, encoding, palette);
    Ok(TileResponse {
        encoding: tag,
        data,
    })
}

/// Cut the resampled raster into n×n sub-tiles, row-major.
fn cut_slices(raster: &RgbImage, n: u32, tile_size: u32) -> Vec<RgbImage> {
    let mut slices = Vec::with_capacity((n * n) as usize);
    for row in 0..n {
        for col in 0..n {
            let slice =
                image::imageops::crop_imm(raster, col * tile_size, row * tile_size, tile_size, tile_size)
                    .to_image();
            slices.push(slice);
        }
    }
    slices
}

/// Pixel colours in row-major order, the order the firmware unpacks in.
fn extract_pixels(slice: &RgbImage) -> Vec<Colour> {
    slice
        .pixels()
        .map(|pixel| Colour::new(pixel.0[0], pixel.0[1], pixel.0[2]))
        .collect()
}

/// The well-formed degraded response served on any pipeline failure: an
/// all-white tile of the requested size in the active encoding.
pub fn error_tile(tile_size: u32, encoding: TileEncoding, palette: &ColourPalette) -> TileResponse {
    let pixels = vec![Colour::WHITE; (tile_size as usize) * (tile_size as usize)];
    let (tag, data) = encode_tile(&pixels, encoding, palette);
    TileResponse {
        encoding: tag,
        data,
    }
}
