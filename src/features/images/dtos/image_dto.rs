use utoipa::ToSchema;

use crate::shared::constants::MAX_IMAGE_NAME_LEN;

/// Upload form for OpenAPI documentation only; the handler reads the
/// multipart body directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadImageDto {
    /// JPEG or PNG file (by filename extension)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image_file: String,
    /// Optional display name; defaults to a truncated form of the filename
    pub name: Option<String>,
}

/// Derive a display name from a filename, keeping it within the 50-character
/// cap: names over the cap become "..." plus the last 47 characters.
pub fn cut_image_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= MAX_IMAGE_NAME_LEN {
        return name.to_string();
    }
    let tail: String = chars[chars.len() - (MAX_IMAGE_NAME_LEN - 3)..]
        .iter()
        .collect();
    format!("...{}", tail)
}

/// Strip any client-supplied directory components from an uploaded filename
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_pass_through() {
        assert_eq!(cut_image_name("macara.jpg"), "macara.jpg");
        assert_eq!(cut_image_name(""), "");
    }

    #[test]
    fn exactly_fifty_chars_is_untouched() {
        let name = "a".repeat(50);
        assert_eq!(cut_image_name(&name), name);
    }

    #[test]
    fn long_names_keep_ellipsis_plus_last_47() {
        let name = format!("{}{}", "x".repeat(10), "y".repeat(41)); // 51 chars
        let cut = cut_image_name(&name);

        assert_eq!(cut.chars().count(), 50);
        assert!(cut.starts_with("..."));
        assert!(cut.ends_with(&"y".repeat(41)));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let name = "ż".repeat(60);
        let cut = cut_image_name(&name);

        assert_eq!(cut.chars().count(), 50);
        assert!(cut.starts_with("..."));
    }

    #[test]
    fn filenames_lose_directory_components() {
        assert_eq!(sanitize_filename("evil/../../x.jpg"), "x.jpg");
        assert_eq!(sanitize_filename(r"C:\photos\x.jpg"), "x.jpg");
        assert_eq!(sanitize_filename("plain.png"), "plain.png");
    }
}
