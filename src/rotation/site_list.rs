use crate::error_handling::types::ConfigError;
use log::info;
use reqwest::Url;
use std::fs;
use std::path::Path;

/// Ordered, non-empty list of sites captured in rotation.
///
/// Loaded once at startup and immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteList {
    sites: Vec<String>,
}

impl SiteList {
    pub fn new(sites: Vec<String>) -> Result<Self, ConfigError> {
        if sites.is_empty() {
            return Err(ConfigError::SitesEmpty(String::from(
                "at least one site is required",
            )));
        }
        for site in &sites {
            let url = Url::parse(site)
                .map_err(|e| ConfigError::InvalidSite(format!("{}: {}", site, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::InvalidSite(format!(
                    "{}: only http and https are supported",
                    site
                )));
            }
        }
        Ok(Self { sites })
    }

    /// Parses one URL per line; blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let sites = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
        Self::new(sites)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::SitesMissing(format!(
                "{} does not exist, create it with one site per line",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        let list = Self::parse(&content).map_err(|e| match e {
            ConfigError::SitesEmpty(_) => ConfigError::SitesEmpty(format!(
                "{} is empty or only contains comments",
                path.display()
            )),
            other => other,
        })?;
        info!("Loaded {} site(s) from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Never true for a constructed list.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Site at `index`, reduced modulo the list length.
    pub fn get(&self, index: usize) -> &str {
        &self.sites[index % self.sites.len()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let list = SiteList::parse(
            "# news\nhttps://a.example\n\n   \nhttps://b.example  \n# https://c.example\n",
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0), "https://a.example");
        assert_eq!(list.get(1), "https://b.example");
    }

    #[test]
    fn test_only_comments_is_empty() {
        let err = SiteList::parse("# nothing here\n\n").unwrap_err();
        assert!(matches!(err, ConfigError::SitesEmpty(_)));
    }

    #[test]
    fn test_rejects_non_http_entries() {
        assert!(matches!(
            SiteList::parse("ftp://files.example"),
            Err(ConfigError::InvalidSite(_))
        ));
        assert!(matches!(
            SiteList::parse("not a url"),
            Err(ConfigError::InvalidSite(_))
        ));
    }

    #[test]
    fn test_get_wraps() {
        let list = SiteList::parse("https://a.example\nhttps://b.example").unwrap();
        assert_eq!(list.get(2), "https://a.example");
        assert_eq!(list.get(5), "https://b.example");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = SiteList::from_file(&dir.path().join("sites.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::SitesMissing(_)));
    }

    #[test]
    fn test_empty_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sites.txt");
        fs::write(&path, "# only a comment\n").unwrap();
        match SiteList::from_file(&path) {
            Err(ConfigError::SitesEmpty(msg)) => assert!(msg.contains("sites.txt")),
            other => panic!("expected SitesEmpty, got {:?}", other),
        }
    }
}
