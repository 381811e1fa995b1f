//! Manifest loading
//!
//! A manifest is a TOML file with one `[provider]` table and any number
//! of `[[remote_schema]]` entries:
//!
//! ```toml
//! [provider]
//! host = "hasura.example.com"
//!
//! [[remote_schema]]
//! name = "github"
//! url = "https://api.github.com/graphql"
//! forward_headers = true
//!
//! [remote_schema.additional_headers]
//! Authorization = "Bearer ..."
//! ```
//!
//! Values are kept as untyped attributes here; the provider and the
//! resource handler validate them against their schemas.

use anyhow::{Context, Result, bail};
use declarative::{Attributes, Value};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default manifest file name, looked up in the working directory
pub const DEFAULT_MANIFEST: &str = "hasura.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: Attributes,
    #[serde(default)]
    pub remote_schema: Vec<Attributes>,
}

impl Manifest {
    /// Load a manifest from disk (`~` is expanded)
    pub fn load(path: &Path) -> Result<Self> {
        let path = expand(path);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read manifest {}", path.display()))?;
        let manifest = Self::parse(&content)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;
        log::debug!(
            "Loaded {} remote schema(s) from {}",
            manifest.remote_schema.len(),
            path.display()
        );
        Ok(manifest)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Desired remote schemas keyed by name
    pub fn remote_schemas(&self) -> Result<BTreeMap<String, Attributes>> {
        let mut desired = BTreeMap::new();
        for (index, attrs) in self.remote_schema.iter().enumerate() {
            let name = match attrs.get("name") {
                Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
                _ => bail!("remote_schema #{} has no name", index + 1),
            };
            if desired.insert(name.clone(), attrs.clone()).is_some() {
                bail!("remote_schema \"{name}\" is declared more than once");
            }
        }
        Ok(desired)
    }
}

/// Expand `~` in a user-supplied path
pub fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MANIFEST: &str = r#"
[provider]
host = "hasura.example.com"

[[remote_schema]]
name = "github"
url = "https://api.github.com/graphql"
forward_headers = true

[remote_schema.additional_headers]
Authorization = "Bearer t"

[[remote_schema]]
name = "countries"
url = "https://countries.trevorblades.com"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.provider["host"], Value::from("hasura.example.com"));

        let desired = manifest.remote_schemas().unwrap();
        assert_eq!(desired.len(), 2);
        let github = &desired["github"];
        assert_eq!(github["forward_headers"], Value::from(true));
        assert_eq!(
            github["additional_headers"],
            Value::string_map([("Authorization", "Bearer t")])
        );
        assert!(!desired["countries"].contains_key("forward_headers"));
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::parse("").unwrap();
        assert!(manifest.provider.is_empty());
        assert!(manifest.remote_schemas().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_names() {
        let manifest = Manifest::parse(
            r#"
[[remote_schema]]
name = "a"
url = "https://a.io"

[[remote_schema]]
name = "a"
url = "https://b.io"
"#,
        )
        .unwrap();
        let err = manifest.remote_schemas().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_missing_name() {
        let manifest = Manifest::parse("[[remote_schema]]\nurl = \"https://a.io\"\n").unwrap();
        assert!(manifest.remote_schemas().is_err());
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(Manifest::parse("[remote_schemas]\nname = \"a\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.remote_schema.len(), 2);

        let err = Manifest::load(Path::new("/nonexistent/hasura.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read manifest"));
    }
}
