use crate::configuration::types::RemoteConfig;

/// `{prefix}{sequence}.{extension}` with the sequence zero-padded to `digits`.
///
/// Sequences past the padding width simply grow longer, so `screenshot_1000.png`
/// follows `screenshot_999.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNaming {
    prefix: String,
    digits: usize,
    extension: String,
}

impl ArtifactNaming {
    pub fn new(prefix: &str, digits: usize, extension: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            digits,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(config: &RemoteConfig) -> Self {
        Self::new(&config.name_prefix, config.sequence_digits, &config.extension)
    }

    pub fn name_for(&self, sequence: u64) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            sequence,
            self.extension,
            width = self.digits
        )
    }

    /// Sequence number of a canonical artifact name, `None` for anything else.
    pub fn parse(&self, name: &str) -> Option<u64> {
        let digits = name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        if digits.len() < self.digits || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let sequence: u64 = digits.parse().ok()?;
        // rejects over-padded forms such as 0001 when the width is 3
        (self.name_for(sequence) == name).then_some(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming() -> ArtifactNaming {
        ArtifactNaming::new("screenshot_", 3, "png")
    }

    #[test]
    fn test_name_for_pads_sequence() {
        let naming = naming();
        assert_eq!(naming.name_for(1), "screenshot_001.png");
        assert_eq!(naming.name_for(42), "screenshot_042.png");
        assert_eq!(naming.name_for(1000), "screenshot_1000.png");
    }

    #[test]
    fn test_parse_accepts_canonical_names() {
        let naming = naming();
        assert_eq!(naming.parse("screenshot_001.png"), Some(1));
        assert_eq!(naming.parse("screenshot_999.png"), Some(999));
        assert_eq!(naming.parse("screenshot_1000.png"), Some(1000));
    }

    #[test]
    fn test_parse_skips_malformed_names() {
        let naming = naming();
        for name in [
            "README.md",
            "screenshot_01.png",
            "screenshot_0001.png",
            "screenshot_abc.png",
            "screenshot_001.jpg",
            "screenshot_001png",
            "shot_001.png",
            "screenshot_-01.png",
        ] {
            assert_eq!(naming.parse(name), None, "{} should not parse", name);
        }
    }

    #[test]
    fn test_extension_leading_dot_is_ignored() {
        let naming = ArtifactNaming::new("img-", 2, ".jpg");
        assert_eq!(naming.name_for(7), "img-07.jpg");
        assert_eq!(naming.parse("img-07.jpg"), Some(7));
    }
}
