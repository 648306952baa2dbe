//! Tests for key resolution from flags and JSON config

#[cfg(test)]
mod tests {
    use fcpipe::catalog::config::{CatalogConfig, resolve_key};
    use std::path::{Path, PathBuf};

    // Tests config files with and without a key field
    // Verified by requiring the key field
    #[test]
    fn test_read_config() {
        let dir = tempfile::tempdir().unwrap();
        let with_key = dir.path().join("with.json");
        let without = dir.path().join("without.json");
        std::fs::write(&with_key, r#"{"key": "/atlas/key.txt"}"#).unwrap();
        std::fs::write(&without, "{}").unwrap();

        assert_eq!(
            CatalogConfig::read(&with_key).unwrap().key,
            Some(PathBuf::from("/atlas/key.txt"))
        );
        assert_eq!(CatalogConfig::read(&without).unwrap(), CatalogConfig::default());
    }

    // Tests the explicit flag wins over the config file
    // Verified by preferring the config
    #[test]
    fn test_resolve_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{"key": "from_config.txt"}"#).unwrap();

        let explicit = resolve_key(Some(Path::new("flag.txt")), Some(&config)).unwrap();
        assert_eq!(explicit, PathBuf::from("flag.txt"));

        let configured = resolve_key(None, Some(&config)).unwrap();
        assert_eq!(configured, PathBuf::from("from_config.txt"));
    }

    // Tests missing sources and unreadable configs are errors
    // Verified by defaulting to an empty key path
    #[test]
    fn test_resolve_failures() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.json");
        let broken = dir.path().join("broken.json");
        std::fs::write(&empty, "{}").unwrap();
        std::fs::write(&broken, "{ key").unwrap();

        assert!(resolve_key(None, None).is_err());
        assert!(resolve_key(None, Some(&empty)).is_err());
        let error = resolve_key(None, Some(&broken)).unwrap_err();
        assert!(error.to_string().contains("broken.json"));
        assert!(resolve_key(None, Some(&dir.path().join("absent.json"))).is_err());
    }
}
