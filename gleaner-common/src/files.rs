//! Local file names for downloaded assets.
//!
//! Both facades save images under an assets directory, either keeping the
//! remote name or swapping its extension. Inputs may be plain paths or
//! absolute URLs; a URL's query string and fragment never reach the name.

use url::Url;

/// Default extension used when replacing an image's own.
pub const DEFAULT_APPENDIX: &str = "png";

/// Last segment of a path or URL, empty when it ends with `/`.
pub fn cutout_filename(path: &str) -> String {
    let path_part = match Url::parse(path) {
        Ok(url) => url.path().to_string(),
        Err(_) => path.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path_part.rsplit('/').next().unwrap_or_default().to_string()
}

/// File name without its final extension. Leading dots are part of the name.
pub fn cutout_filename_without_appendix(path: &str) -> String {
    let name = cutout_filename(path);
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(idx) => name[..leading + idx].to_string(),
        None => name,
    }
}

/// File name with its extension replaced by `appendix`.
pub fn cutout_filename_replace_appendix(path: &str, appendix: &str) -> String {
    format!("{}.{}", cutout_filename_without_appendix(path), appendix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_of_plain_path() {
        assert_eq!(cutout_filename("static/img/logo.jpg"), "logo.jpg");
        assert_eq!(cutout_filename("logo.jpg"), "logo.jpg");
    }

    #[test]
    fn filename_of_url_ignores_query_and_fragment() {
        assert_eq!(
            cutout_filename("https://cdn.example.com/a/b/photo.webp?w=640#top"),
            "photo.webp"
        );
        assert_eq!(cutout_filename("img/photo.gif?v=2"), "photo.gif");
    }

    #[test]
    fn trailing_slash_gives_empty_name() {
        assert_eq!(cutout_filename("https://example.com/images/"), "");
    }

    #[test]
    fn stem_drops_only_last_extension() {
        assert_eq!(cutout_filename_without_appendix("/x/archive.tar.gz"), "archive.tar");
        assert_eq!(cutout_filename_without_appendix("/x/README"), "README");
    }

    #[test]
    fn dot_files_keep_their_name() {
        assert_eq!(cutout_filename_without_appendix("/x/.hidden"), ".hidden");
        assert_eq!(cutout_filename_without_appendix("/x/.hidden.png"), ".hidden");
    }

    #[test]
    fn appendix_is_replaced() {
        assert_eq!(
            cutout_filename_replace_appendix("https://example.com/a/banner.jpeg", DEFAULT_APPENDIX),
            "banner.png"
        );
        assert_eq!(cutout_filename_replace_appendix("icon", "svg"), "icon.svg");
    }
}
