use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationErrors;

/// Extensions accepted for uploads. Matching is by filename suffix, mirroring
/// the upload contract (content sniffing is not part of it).
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// Rejection message for a filename outside the whitelist (wording is part of
/// the API)
pub const EXTENSION_MESSAGE: &str = "image extension has to be one of .jpg and .png";

lazy_static! {
    /// Matches thumbnail paths of the form `<stem>.<width>x<height>.<ext>`,
    /// e.g. `user_test/macara.50x0.jpg`
    pub static ref THUMBNAIL_PATH_REGEX: Regex =
        Regex::new(r"^(?P<stem>.+)\.(?P<w>\d+)x(?P<h>\d+)\.(?P<ext>jpe?g|png)$").unwrap();
}

/// Check an uploaded filename against the extension whitelist
pub fn has_allowed_extension(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Flatten `validator` derive output to the first field-level message, falling
/// back to the library rendering when no explicit message was attached.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    for field_errors in errors.field_errors().values() {
        for error in field_errors.iter() {
            if let Some(message) = &error.message {
                return message.to_string();
            }
        }
    }
    errors.to_string()
}
