//! Uploaded files: storage keys and the local media root.

use anyhow::{Context, Result, bail};
use std::path::{Component, Path, PathBuf};

use crate::config::ServerConfig;

const DEFAULT_EXTENSION: &str = "jpeg";

/// Lowercase extension of `filename`, without the dot.
#[must_use]
pub fn get_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}

/// Where an upload lands relative to the media root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaPath<'a> {
    AnimePreview(i32),
    AnimeBackground(i32),
    AnimeCard(i32),
    EpisodePreview(i32),
    Poster(i32),
    Avatar(&'a str),
}

impl MediaPath<'_> {
    /// Builds the storage key for an uploaded file name.
    #[must_use]
    pub fn key(self, filename: &str) -> String {
        let base = Path::new(filename)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let name = base.split('.').next().unwrap_or_default();
        let name = if name.is_empty() {
            uuid::Uuid::new_v4().simple().to_string()
        } else {
            name.to_string()
        };
        let ext = get_extension(base).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        match self {
            Self::AnimePreview(id) => format!("release/{id}/preview/{name}.{ext}"),
            Self::AnimeBackground(id) => format!("release/{id}/background/{name}.{ext}"),
            Self::AnimeCard(id) => format!("release/{id}/card/{name}.{ext}"),
            Self::EpisodePreview(id) => format!("release/{id}/preview/{name}.{ext}"),
            Self::Poster(id) => format!("poster/{id}/{name}.{ext}"),
            Self::Avatar(username) => {
                let username = path_segment(username);
                format!("users/{username}/avatar/{name}.{ext}")
            }
        }
    }
}

/// A single path segment: separators and other unsafe characters become `_`,
/// and the dot-only names `.`/`..` are replaced.
fn path_segment(value: &str) -> String {
    let segment: String = value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if segment.chars().all(|c| c == '.') {
        "_".repeat(segment.len().max(1))
    } else {
        segment
    }
}

/// True when the file name maps to an image MIME type (or has no extension).
#[must_use]
pub fn is_image(filename: &str) -> bool {
    get_extension(filename).is_none_or(|ext| {
        mime_guess::from_ext(&ext)
            .first()
            .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE)
    })
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStorage {
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        let mut url_prefix = config.media_url.clone();
        if !url_prefix.ends_with('/') {
            url_prefix.push('/');
        }
        Self {
            root: PathBuf::from(&config.media_root),
            url_prefix,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the bytes under the key, replacing an existing file.
    pub async fn save(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let relative = Path::new(key);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            bail!("Refusing to write outside the media root: {key}");
        }
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    #[must_use]
    pub fn url(&self, key: &str) -> String {
        format!("{}{key}", self.url_prefix)
    }

    pub fn url_opt(&self, key: Option<&str>) -> Option<String> {
        key.map(|k| self.url(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(get_extension("Cover.PNG").as_deref(), Some("png"));
        assert_eq!(get_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(get_extension("noext"), None);
    }

    #[test]
    fn keys_follow_layout() {
        assert_eq!(
            MediaPath::AnimeCard(4).key("cover.PNG"),
            "release/4/card/cover.png"
        );
        assert_eq!(
            MediaPath::Poster(9).key("banner"),
            "poster/9/banner.jpeg"
        );
        assert_eq!(
            MediaPath::Avatar("mira").key("../../me.final.webp"),
            "users/mira/avatar/me.webp"
        );
        assert_eq!(
            MediaPath::EpisodePreview(2).key("shot.jpg"),
            "release/2/preview/shot.jpg"
        );
    }

    #[test]
    fn avatar_key_stays_inside_users() {
        assert_eq!(
            MediaPath::Avatar("../../escape").key("a.png"),
            "users/.._.._escape/avatar/a.png"
        );
        assert_eq!(MediaPath::Avatar("..").key("a.png"), "users/__/avatar/a.png");
        assert_eq!(
            MediaPath::Avatar("kei.s@mail+x").key("a.png"),
            "users/kei.s@mail+x/avatar/a.png"
        );
    }

    #[tokio::test]
    async fn save_refuses_parent_components() {
        let dir = std::env::temp_dir().join(format!("animeon-media-{}", uuid::Uuid::new_v4()));
        let storage = MediaStorage::new(&ServerConfig {
            media_root: dir.to_string_lossy().into_owned(),
            ..ServerConfig::default()
        });

        assert!(storage.save("users/../../x/a.png", b"img").await.is_err());
        assert!(storage.save("/etc/a.png", b"img").await.is_err());
        assert!(!dir.join("../x/a.png").exists());
    }

    #[test]
    fn image_detection() {
        assert!(is_image("a.png"));
        assert!(is_image("blob"));
        assert!(!is_image("script.sh"));
    }

    #[tokio::test]
    async fn save_writes_under_root() {
        let dir = std::env::temp_dir().join(format!("animeon-media-{}", uuid::Uuid::new_v4()));
        let storage = MediaStorage::new(&ServerConfig {
            media_root: dir.to_string_lossy().into_owned(),
            media_url: "/media".into(),
            ..ServerConfig::default()
        });

        storage.save("poster/1/a.jpeg", b"img").await.unwrap();
        let written = tokio::fs::read(dir.join("poster/1/a.jpeg")).await.unwrap();
        assert_eq!(written, b"img");
        assert_eq!(storage.url("poster/1/a.jpeg"), "/media/poster/1/a.jpeg");

        tokio::fs::remove_dir_all(dir).await.ok();
    }
}
