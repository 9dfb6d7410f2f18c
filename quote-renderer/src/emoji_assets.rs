//! Emoji image lookup.
//!
//! Images come from a JSON table of inline encoded images, falling back to
//! `<key>.png` or `<key>.svg` files in an asset directory. The table is read
//! once, on first use. Decoded images are memoized; misses are not, since
//! their keys come from message text and are unbounded.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tiny_skia::Pixmap;

use crate::error::{RenderError, RenderResult};
use crate::image::{decode_base64, decode_data_uri, decode_pixmap, rasterize_svg};

/// Edge length SVG emoji are rasterized at.
const SVG_EMOJI_SIZE: u32 = 128;

/// Source of emoji images by asset key.
pub trait EmojiLookup: Send + Sync {
    /// The image for `key`, or `None` on a miss.
    fn lookup(&self, key: &str) -> Option<Arc<Pixmap>>;
}

impl EmojiLookup for HashMap<String, Arc<Pixmap>> {
    fn lookup(&self, key: &str) -> Option<Arc<Pixmap>> {
        self.get(key).cloned()
    }
}

/// Where emoji images are stored.
#[derive(Debug, Clone, Default)]
pub struct EmojiAssetConfig {
    /// JSON object mapping asset keys to base64 images or data URIs.
    pub table_path: Option<PathBuf>,
    /// Directory of `<key>.png` / `<key>.svg` files.
    pub asset_dir: Option<PathBuf>,
}

/// Emoji lookup backed by a table file and an asset directory.
#[derive(Debug)]
pub struct EmojiAssetStore {
    config: EmojiAssetConfig,
    table: OnceLock<HashMap<String, String>>,
    decoded: RwLock<HashMap<String, Arc<Pixmap>>>,
}

impl EmojiAssetStore {
    /// Create a store; nothing is read until the first lookup.
    #[must_use]
    pub fn new(config: EmojiAssetConfig) -> Self {
        Self {
            config,
            table: OnceLock::new(),
            decoded: RwLock::new(HashMap::new()),
        }
    }

    /// The lookup table, loaded on first call.
    #[must_use]
    pub fn table(&self) -> &HashMap<String, String> {
        self.table.get_or_init(|| {
            let Some(path) = &self.config.table_path else {
                return HashMap::new();
            };
            match load_table(path) {
                Ok(table) => {
                    tracing::debug!(path = %path.display(), entries = table.len(), "Loaded emoji table");
                    table
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Unable to read emoji table");
                    HashMap::new()
                }
            }
        })
    }

    fn load(&self, key: &str) -> RenderResult<Option<Pixmap>> {
        if let Some(encoded) = self.table().get(key) {
            let bytes = if encoded.starts_with("data:") {
                decode_data_uri(encoded)?
            } else {
                decode_base64(encoded)?
            };
            return decode_pixmap(&bytes).map(Some);
        }

        let Some(dir) = &self.config.asset_dir else {
            return Ok(None);
        };
        let png = dir.join(format!("{key}.png"));
        if png.is_file() {
            let bytes = std::fs::read(&png)
                .map_err(|e| RenderError::Resource(format!("{}: {e}", png.display())))?;
            return decode_pixmap(&bytes).map(Some);
        }
        let svg = dir.join(format!("{key}.svg"));
        if svg.is_file() {
            let bytes = std::fs::read(&svg)
                .map_err(|e| RenderError::Resource(format!("{}: {e}", svg.display())))?;
            return rasterize_svg(&bytes, Some(SVG_EMOJI_SIZE)).map(Some);
        }
        Ok(None)
    }
}

fn load_table(path: &std::path::Path) -> RenderResult<HashMap<String, String>> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&json)
        .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))
}

impl EmojiLookup for EmojiAssetStore {
    fn lookup(&self, key: &str) -> Option<Arc<Pixmap>> {
        if let Some(hit) = self
            .decoded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Some(Arc::clone(hit));
        }

        let image = match self.load(key) {
            Ok(Some(pixmap)) => Arc::new(pixmap),
            Ok(None) => {
                tracing::warn!(key, "No emoji image available");
                return None;
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Unable to load emoji image");
                return None;
            }
        };

        let mut decoded = self.decoded.write().unwrap_or_else(PoisonError::into_inner);
        Some(Arc::clone(decoded.entry(key.to_string()).or_insert(image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_table_entry_wins_over_directory() {
        let dir = tempfile::tempdir().unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes([0, 0, 255, 255]));
        let table_path = dir.path().join("emoji-image.json");
        std::fs::write(&table_path, format!(r#"{{"1f600": "{encoded}"}}"#)).unwrap();
        std::fs::write(dir.path().join("1f600.png"), png_bytes([255, 0, 0, 255])).unwrap();

        let store = EmojiAssetStore::new(EmojiAssetConfig {
            table_path: Some(table_path),
            asset_dir: Some(dir.path().to_path_buf()),
        });
        let image = store.lookup("1f600").unwrap();
        let p = image.pixel(0, 0).unwrap();
        assert_eq!((p.red(), p.blue()), (0, 255));
    }

    #[test]
    fn test_data_uri_table_entry() {
        let dir = tempfile::tempdir().unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes([0, 255, 0, 255]));
        let table_path = dir.path().join("table.json");
        std::fs::write(
            &table_path,
            format!(r#"{{"2764": "data:image/png;base64,{encoded}"}}"#),
        )
        .unwrap();

        let store = EmojiAssetStore::new(EmojiAssetConfig {
            table_path: Some(table_path),
            asset_dir: None,
        });
        assert!(store.lookup("2764").is_some());
        assert!(store.lookup("1f600").is_none());
    }

    #[test]
    fn test_directory_png_and_svg() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1f44d.png"), png_bytes([9, 9, 9, 255])).unwrap();
        std::fs::write(
            dir.path().join("1f438.svg"),
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="36" height="36"><circle cx="18" cy="18" r="18" fill="#77b255"/></svg>"##,
        )
        .unwrap();

        let store = EmojiAssetStore::new(EmojiAssetConfig {
            table_path: None,
            asset_dir: Some(dir.path().to_path_buf()),
        });
        let png = store.lookup("1f44d").unwrap();
        assert_eq!(png.width(), 4);
        let svg = store.lookup("1f438").unwrap();
        assert_eq!((svg.width(), svg.height()), (SVG_EMOJI_SIZE, SVG_EMOJI_SIZE));
    }

    #[test]
    fn test_hits_are_memoized() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1f44d.png"), png_bytes([9, 9, 9, 255])).unwrap();
        let store = EmojiAssetStore::new(EmojiAssetConfig {
            table_path: None,
            asset_dir: Some(dir.path().to_path_buf()),
        });
        let first = store.lookup("1f44d").unwrap();

        // Served from memory once decoded.
        std::fs::remove_file(dir.path().join("1f44d.png")).unwrap();
        assert!(Arc::ptr_eq(&first, &store.lookup("1f44d").unwrap()));
    }

    #[test]
    fn test_misses_are_not_retained() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmojiAssetStore::new(EmojiAssetConfig {
            table_path: None,
            asset_dir: Some(dir.path().to_path_buf()),
        });
        for n in 0..64 {
            assert!(store.lookup(&format!("1f468-200d-{n:x}")).is_none());
        }
        assert!(store.decoded.read().unwrap().is_empty());

        // An asset added later is picked up.
        std::fs::write(dir.path().join("1f600.png"), png_bytes([1, 1, 1, 255])).unwrap();
        assert!(store.lookup("1f600").is_some());
        assert_eq!(store.decoded.read().unwrap().len(), 1);
    }

    #[test]
    fn test_broken_table_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table_path = dir.path().join("table.json");
        std::fs::write(&table_path, "{ not json").unwrap();

        let store = EmojiAssetStore::new(EmojiAssetConfig {
            table_path: Some(table_path),
            asset_dir: None,
        });
        assert!(store.table().is_empty());
        assert!(store.lookup("1f600").is_none());
    }

    #[test]
    fn test_table_loads_once_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        let table_path = dir.path().join("table.json");
        std::fs::write(&table_path, r#"{"1f600": "AAAA"}"#).unwrap();
        let store = Arc::new(EmojiAssetStore::new(EmojiAssetConfig {
            table_path: Some(table_path),
            asset_dir: None,
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || std::ptr::from_ref(store.table()) as usize)
            })
            .collect();
        let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(store.table().len(), 1);
    }
}
