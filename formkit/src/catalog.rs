//! Manifest and per-region schema loading.
//!
//! A catalog directory holds a manifest (`Manifest.json` by default) and one
//! document per region. Loading problems never abort the caller: a broken
//! manifest yields an empty region list and a broken region document yields
//! `None`, both with a warning in the log.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::schema::{FormSchema, RegionInfo, SchemaError};

/// Default manifest file name.
pub const DEFAULT_MANIFEST: &str = "Manifest.json";

/// Region list plus access to the per-region documents.
#[derive(Debug, Clone)]
pub struct Catalog {
    dir: PathBuf,
    regions: Vec<RegionInfo>,
}

impl Catalog {
    /// Open a catalog directory using the default manifest name.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self::with_manifest(dir, DEFAULT_MANIFEST)
    }

    /// Open a catalog directory with a custom manifest file name.
    pub fn with_manifest(dir: impl AsRef<Path>, manifest: &str) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let regions = match read_manifest(&dir.join(manifest)) {
            Ok(regions) => {
                debug!("Loaded {} region(s) from {}", regions.len(), dir.display());
                regions
            }
            Err(e) => {
                warn!("Failed to load the region list: {e}");
                Vec::new()
            }
        };
        Self { dir, regions }
    }

    /// Regions listed in the manifest, in manifest order.
    pub fn regions(&self) -> &[RegionInfo] {
        &self.regions
    }

    /// Manifest entry for a region code.
    pub fn region(&self, code: &str) -> Option<&RegionInfo> {
        self.regions.iter().find(|r| r.code == code)
    }

    /// Load and check the document for a region, or `None` on any failure.
    pub fn load_schema(&self, code: &str) -> Option<FormSchema> {
        match self.read_schema(code) {
            Ok(schema) => Some(schema),
            Err(e) => {
                warn!("Failed to load the form for {code}: {e}");
                None
            }
        }
    }

    /// Load and check the document for a region, reporting why it failed.
    pub fn read_schema(&self, code: &str) -> Result<FormSchema, SchemaError> {
        let info = self.region(code).ok_or_else(|| SchemaError::UnknownRegion {
            code: code.to_string(),
        })?;
        let path = self.dir.join(&info.config_file);
        let content = read_file(&path)?;
        let schema = FormSchema::from_json(&content)?;
        debug!(
            "Loaded {} field(s) for {code} from {}",
            schema.fields.len(),
            path.display()
        );
        Ok(schema)
    }
}

fn read_manifest(path: &Path) -> Result<Vec<RegionInfo>, SchemaError> {
    let content = read_file(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn read_file(path: &Path) -> Result<String, SchemaError> {
    fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"[
        {"code": "NL", "name": "Netherlands", "configFile": "NL.json"},
        {"code": "DE", "name": "Germany", "configFile": "DE.json"},
        {"code": "XX", "name": "Broken", "configFile": "XX.json"}
    ]"#;

    const NL: &str = r#"{"country": "Netherlands", "fields": [
        {"id": "first_name", "label": "First Name", "type": "text", "required": true},
        {"id": "bsn", "label": "BSN", "type": "text", "required": true,
         "validation": {"regex": "^[0-9]{9}$", "message": "BSN must be 9 digits."}}
    ]}"#;

    fn catalog_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_MANIFEST), MANIFEST).unwrap();
        fs::write(dir.path().join("NL.json"), NL).unwrap();
        fs::write(dir.path().join("XX.json"), "{ not json").unwrap();
        dir
    }

    #[test]
    fn test_regions_listed_in_manifest_order() {
        let dir = catalog_dir();
        let catalog = Catalog::open(dir.path());
        let codes: Vec<_> = catalog.regions().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["NL", "DE", "XX"]);
        assert_eq!(catalog.region("DE").unwrap().name, "Germany");
    }

    #[test]
    fn test_load_schema() {
        let dir = catalog_dir();
        let catalog = Catalog::open(dir.path());
        let schema = catalog.load_schema("NL").unwrap();
        assert_eq!(schema.country, "Netherlands");
        assert_eq!(schema.fields[1].id, "bsn");
    }

    #[test]
    fn test_missing_or_corrupt_documents() {
        let dir = catalog_dir();
        let catalog = Catalog::open(dir.path());

        assert!(catalog.load_schema("DE").is_none());
        assert!(matches!(catalog.read_schema("DE"), Err(SchemaError::Io { .. })));

        assert!(catalog.load_schema("XX").is_none());
        assert!(matches!(catalog.read_schema("XX"), Err(SchemaError::Json(_))));

        assert!(matches!(
            catalog.read_schema("FR"),
            Err(SchemaError::UnknownRegion { code }) if code == "FR"
        ));
    }

    #[test]
    fn test_missing_manifest_gives_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::open(dir.path());
        assert!(catalog.regions().is_empty());
        assert!(catalog.load_schema("NL").is_none());
    }

    #[test]
    fn test_corrupt_manifest_gives_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("regions.json"), r#"{"code": "NL"}"#).unwrap();
        let catalog = Catalog::with_manifest(dir.path(), "regions.json");
        assert!(catalog.regions().is_empty());
    }
}
