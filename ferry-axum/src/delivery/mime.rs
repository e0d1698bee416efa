/// Looks up a mimetype from a file extension.
pub trait MimeGuesser: Send + Sync {
    fn guess(&self, extension: &str) -> Option<String>;
}

/// [`MimeGuesser`] backed by the `mime_guess` extension table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionGuesser;

impl MimeGuesser for ExtensionGuesser {
    fn guess(&self, extension: &str) -> Option<String> {
        mime_guess::from_ext(extension)
            .first()
            .map(|mime| mime.essence_str().to_string())
    }
}

/// Extension of the last path segment, without the dot.
pub fn extension_of(name: &str) -> Option<&str> {
    let file = name.rsplit('/').next().unwrap_or(name);
    let (_, ext) = file.rsplit_once('.')?;
    (!ext.is_empty()).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions() {
        assert_eq!(extension_of("photo.large.JPG"), Some("JPG"));
        assert_eq!(extension_of("dir.d/readme"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn guesses_common_types() {
        let guesser = ExtensionGuesser;
        assert_eq!(guesser.guess("txt").as_deref(), Some("text/plain"));
        assert_eq!(guesser.guess("png").as_deref(), Some("image/png"));
        assert_eq!(guesser.guess("definitely-not-an-extension"), None);
    }
}
