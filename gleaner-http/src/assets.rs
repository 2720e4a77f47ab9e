//! Image download into a local assets directory.
//!
//! Both page facades collect `img` sources and hand them here. Downloads run
//! with bounded concurrency and the returned paths follow the input order.

use std::collections::HashSet;
use std::path::PathBuf;

use futures::stream::{self, StreamExt, TryStreamExt};
use gleaner_common::files::{cutout_filename, cutout_filename_replace_appendix};
use url::Url;

use crate::{HttpClient, HttpError, RequestOpts};

/// How a downloaded image is named on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageNaming {
    /// Keep the remote file name as is.
    KeepName,
    /// Keep the stem, swap the extension.
    ReplaceAppendix(String),
}

impl ImageNaming {
    /// Local file name for `url`; `None` when the URL has no usable name.
    pub fn file_name(&self, url: &Url) -> Option<String> {
        let base = cutout_filename(url.as_str());
        if base.is_empty() {
            return None;
        }
        Some(match self {
            ImageNaming::KeepName => base,
            ImageNaming::ReplaceAppendix(appendix) => {
                cutout_filename_replace_appendix(url.as_str(), appendix)
            }
        })
    }
}

pub struct ImageDownloader<'a> {
    http: &'a HttpClient,
    dir: PathBuf,
    naming: ImageNaming,
    concurrency: usize,
}

impl<'a> ImageDownloader<'a> {
    pub fn new(http: &'a HttpClient, dir: impl Into<PathBuf>, naming: ImageNaming) -> Self {
        Self {
            http,
            dir: dir.into(),
            naming,
            concurrency: 4,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Download every URL and write it under the assets directory.
    ///
    /// URLs without a file name (`https://host/images/`) fall back to
    /// `image-<index>`. Names are fixed before any download starts; when two
    /// URLs map to the same name the later one gets a `-<n>` suffix
    /// (`logo.png`, `logo-1.png`), so every returned path is distinct.
    pub async fn download_all(&self, urls: &[Url]) -> Result<Vec<PathBuf>, HttpError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let names = unique_names(
            urls.iter()
                .enumerate()
                .map(|(idx, url)| self.local_name(idx, url)),
        );

        stream::iter(urls.iter().zip(names))
            .map(|(url, name)| self.download_one(url, self.dir.join(name)))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }

    fn local_name(&self, idx: usize, url: &Url) -> String {
        self.naming.file_name(url).unwrap_or_else(|| match &self.naming {
            ImageNaming::KeepName => format!("image-{idx}"),
            ImageNaming::ReplaceAppendix(appendix) => format!("image-{idx}.{appendix}"),
        })
    }

    async fn download_one(&self, url: &Url, path: PathBuf) -> Result<PathBuf, HttpError> {
        let bytes = self.http.get_bytes(url.as_str(), RequestOpts::default()).await?;
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(
            target: "assets",
            url = %url,
            path = %path.display(),
            bytes = bytes.len(),
            "image saved"
        );
        Ok(path)
    }
}

/// Suffix repeated names with `-1`, `-2`, ... before the extension.
fn unique_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut taken = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            if taken.insert(name.clone()) {
                return name;
            }
            let (stem, ext) = match name.rsplit_once('.') {
                Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
                _ => (name.as_str(), None),
            };
            let mut n = 1;
            loop {
                let candidate = match ext {
                    Some(ext) => format!("{stem}-{n}.{ext}"),
                    None => format!("{stem}-{n}"),
                };
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_keeps_or_replaces_extension() {
        let url = Url::parse("https://cdn.example.com/img/hero.jpg?w=100").unwrap();
        assert_eq!(ImageNaming::KeepName.file_name(&url).as_deref(), Some("hero.jpg"));
        assert_eq!(
            ImageNaming::ReplaceAppendix("png".into())
                .file_name(&url)
                .as_deref(),
            Some("hero.png")
        );
    }

    #[test]
    fn directory_urls_have_no_name() {
        let url = Url::parse("https://cdn.example.com/img/").unwrap();
        assert_eq!(ImageNaming::KeepName.file_name(&url), None);
    }

    #[test]
    fn repeated_names_get_numbered() {
        let names = unique_names(
            ["logo.png", "logo.png", "hero.png", "logo.png", "logo-1.png", "image", "image"]
                .map(String::from),
        );
        assert_eq!(
            names,
            vec!["logo.png", "logo-1.png", "hero.png", "logo-2.png", "logo-1-1.png", "image", "image-1"]
        );
    }

    #[test]
    fn dot_files_keep_their_name_when_numbered() {
        let names = unique_names([".hidden", ".hidden"].map(String::from));
        assert_eq!(names, vec![".hidden", ".hidden-1"]);
    }
}
