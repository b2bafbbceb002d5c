//! Condition icon cache.
//!
//! Icons are keyed by the provider's icon id (e.g. `10d`). A miss fetches and
//! decodes the image through an injected [`IconFetcher`]; a hit never touches
//! the network. Entries live as long as the cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use image::RgbaImage;

use crate::provider::WeatherProvider;
use crate::types::WeatherError;

/// Decoded icon bitmap, cheap to clone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pixels: Arc<RgbaImage>,
}

impl IconImage {
    /// Decode encoded image bytes (PNG) into an RGBA bitmap.
    pub fn decode(bytes: &[u8]) -> Result<Self, WeatherError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| WeatherError::Render(e.to_string()))?;
        Ok(Self {
            pixels: Arc::new(decoded.to_rgba8()),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Mean colour of the visible (non-transparent) pixels.
    pub fn average_color(&self) -> Option<[u8; 3]> {
        let mut sum = [0u64; 3];
        let mut count = 0u64;
        for px in self.pixels.pixels() {
            let [r, g, b, a] = px.0;
            if a == 0 {
                continue;
            }
            sum[0] += u64::from(r);
            sum[1] += u64::from(g);
            sum[2] += u64::from(b);
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(sum.map(|c| (c / count) as u8))
    }
}

/// Source of raw icon bytes
pub trait IconFetcher: Send + Sync {
    fn fetch_icon(
        &self,
        icon_id: &str,
    ) -> impl Future<Output = Result<Vec<u8>, WeatherError>> + Send;
}

impl IconFetcher for WeatherProvider {
    async fn fetch_icon(&self, icon_id: &str) -> Result<Vec<u8>, WeatherError> {
        self.download_icon(icon_id).await
    }
}

impl<T: IconFetcher> IconFetcher for Arc<T> {
    async fn fetch_icon(&self, icon_id: &str) -> Result<Vec<u8>, WeatherError> {
        (**self).fetch_icon(icon_id).await
    }
}

#[derive(Debug)]
pub struct IconCache<F> {
    fetcher: F,
    icons: HashMap<String, IconImage>,
}

impl<F: IconFetcher> IconCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            icons: HashMap::new(),
        }
    }

    /// Return the cached icon, fetching and decoding it on first use.
    ///
    /// Failed fetches or decodes are not cached.
    pub async fn get_or_fetch(&mut self, icon_id: &str) -> Result<IconImage, WeatherError> {
        if let Some(icon) = self.icons.get(icon_id) {
            tracing::trace!("Icon cache hit: {}", icon_id);
            return Ok(icon.clone());
        }

        tracing::debug!("Icon cache miss: {}", icon_id);
        let bytes = self.fetcher.fetch_icon(icon_id).await?;
        let icon = IconImage::decode(&bytes)?;
        self.icons.insert(icon_id.to_string(), icon.clone());
        Ok(icon)
    }

    pub fn get(&self, icon_id: &str) -> Option<IconImage> {
        self.icons.get(icon_id).cloned()
    }

    pub fn contains(&self, icon_id: &str) -> bool {
        self.icons.contains_key(icon_id)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}
