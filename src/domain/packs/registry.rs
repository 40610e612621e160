//! Read-only registry of topic packs.
//!
//! The built-in packs ship as embedded YAML. Deployments may append packs
//! from a file; appending never replaces or mutates a registered pack.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::pack_config::{PackConfig, PackDefinition, PackError};

const BUILTIN_PACKS: &str = include_str!("builtin_packs.yaml");

/// Identifiers of the packs shipped with the engine.
pub mod pack_ids {
    pub const LE_APPS: &str = "PACK_LE_APPS";
    pub const PRIOR_LE_APPS_STANDARD: &str = "PACK_PRIOR_LE_APPS_STANDARD";
    pub const INTEGRITY_APPS: &str = "PACK_INTEGRITY_APPS";
    pub const DOMESTIC_VIOLENCE_STANDARD: &str = "PACK_DOMESTIC_VIOLENCE_STANDARD";
}

#[derive(Debug, Deserialize)]
struct PacksDocument {
    #[serde(default)]
    packs: Vec<PackDefinition>,
}

/// Immutable lookup of pack configuration by pack id.
#[derive(Debug, Clone, Default)]
pub struct PackRegistry {
    packs: BTreeMap<String, PackConfig>,
}

impl PackRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the built-in packs.
    pub fn builtin() -> Result<Self, PackError> {
        Self::new().with_yaml(BUILTIN_PACKS)
    }

    /// Appends every pack defined in a YAML document.
    pub fn with_yaml(mut self, yaml: &str) -> Result<Self, PackError> {
        let document: PacksDocument = serde_yaml::from_str(yaml)?;
        for definition in document.packs {
            self.register(PackConfig::try_from(definition)?)?;
        }
        Ok(self)
    }

    /// Appends every pack defined in a YAML file.
    pub fn with_pack_file(self, path: &Path) -> Result<Self, PackError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| PackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = self.with_yaml(&yaml)?;
        tracing::info!(path = %path.display(), packs = registry.len(), "Loaded pack file");
        Ok(registry)
    }

    /// Registers one pack, refusing to replace an existing id.
    pub fn register(&mut self, config: PackConfig) -> Result<(), PackError> {
        if self.packs.contains_key(config.pack_id()) {
            return Err(PackError::Duplicate(config.pack_id().to_string()));
        }
        self.packs.insert(config.pack_id().to_string(), config);
        Ok(())
    }

    /// Returns the pack's configuration, or `None` if it is not supported.
    pub fn get_config(&self, pack_id: &str) -> Option<&PackConfig> {
        self.packs.get(pack_id)
    }

    pub fn is_supported(&self, pack_id: &str) -> bool {
        self.packs.contains_key(pack_id)
    }

    /// Registered pack ids in sorted order.
    pub fn pack_ids(&self) -> impl Iterator<Item = &str> {
        self.packs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXTRA_PACK: &str = r#"
packs:
  - pack_id: PACK_DRUG_USE_STANDARD
    topic: illegal drug use
    required_fields: [substance, last_use, frequency]
    max_probes: 2
"#;

    mod builtin {
        use super::*;

        #[test]
        fn builtin_packs_parse_and_validate() {
            let registry = PackRegistry::builtin().unwrap();
            assert_eq!(registry.len(), 4);
            for id in [
                pack_ids::LE_APPS,
                pack_ids::PRIOR_LE_APPS_STANDARD,
                pack_ids::INTEGRITY_APPS,
                pack_ids::DOMESTIC_VIOLENCE_STANDARD,
            ] {
                assert!(registry.is_supported(id), "missing {}", id);
            }
        }

        #[test]
        fn le_apps_pack_has_expected_shape() {
            let registry = PackRegistry::builtin().unwrap();
            let pack = registry.get_config(pack_ids::LE_APPS).unwrap();
            assert_eq!(pack.max_probes(), 3);
            assert_eq!(pack.issues_field(), Some("issues"));
            assert_eq!(pack.resolve_field("month_year"), Some("monthYear"));
            assert_eq!(pack.resolve_field("PACK_LE_APPS_Q3"), Some("monthYear"));
        }

        #[test]
        fn every_builtin_field_has_a_template() {
            let registry = PackRegistry::builtin().unwrap();
            for id in registry.pack_ids() {
                let pack = registry.get_config(id).unwrap();
                for field in pack.required_fields() {
                    assert!(
                        pack.template_for(field).is_some(),
                        "{} has no template for {}",
                        id,
                        field
                    );
                }
            }
        }

        #[test]
        fn unknown_pack_is_not_supported() {
            let registry = PackRegistry::builtin().unwrap();
            assert!(registry.get_config("PACK_NOPE").is_none());
            assert!(!registry.is_supported("PACK_NOPE"));
        }
    }

    mod appending {
        use super::*;

        #[test]
        fn appending_a_pack_leaves_existing_packs_untouched() {
            let before = PackRegistry::builtin().unwrap();
            let after = PackRegistry::builtin().unwrap().with_yaml(EXTRA_PACK).unwrap();

            assert_eq!(after.len(), before.len() + 1);
            for id in before.pack_ids() {
                assert_eq!(before.get_config(id), after.get_config(id));
            }
        }

        #[test]
        fn duplicate_pack_id_is_rejected() {
            let yaml = r#"
packs:
  - pack_id: PACK_LE_APPS
    required_fields: [x]
    max_probes: 1
"#;
            let result = PackRegistry::builtin().unwrap().with_yaml(yaml);
            assert!(matches!(result, Err(PackError::Duplicate(id)) if id == "PACK_LE_APPS"));
        }

        #[test]
        fn malformed_yaml_is_a_parse_error() {
            let result = PackRegistry::new().with_yaml("packs: [ { pack_id: ");
            assert!(matches!(result, Err(PackError::Parse(_))));
        }

        #[test]
        fn loads_packs_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(EXTRA_PACK.as_bytes()).unwrap();

            let registry = PackRegistry::new().with_pack_file(file.path()).unwrap();
            let pack = registry.get_config("PACK_DRUG_USE_STANDARD").unwrap();
            assert_eq!(pack.priority_order(), &["substance", "last_use", "frequency"]);
        }

        #[test]
        fn missing_file_is_an_io_error() {
            let result = PackRegistry::new().with_pack_file(Path::new("/nonexistent/packs.yaml"));
            assert!(matches!(result, Err(PackError::Io { .. })));
        }
    }
}
