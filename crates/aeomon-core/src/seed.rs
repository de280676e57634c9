//! YAML seed file for brands, competitors, and tracked prompts.
//!
//! The CLI `seed` command loads this file and upserts its contents; the
//! pipeline itself only ever reads brands from the database.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorSeed {
    pub name: String,
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandSeed {
    pub name: String,
    pub domain: Option<String>,
    #[serde(default)]
    pub competitors: Vec<CompetitorSeed>,
    #[serde(default)]
    pub prompts: Vec<String>,
}

impl BrandSeed {
    /// Generate a URL-safe slug from the brand name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub brands: Vec<BrandSeed>,
}

/// Load and validate the seed file from a YAML path.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_seed(path: &Path) -> Result<SeedFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let seed: SeedFile = serde_yaml::from_str(&content)?;
    validate_seed(&seed)?;
    Ok(seed)
}

fn validate_seed(seed: &SeedFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for brand in &seed.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        let slug = brand.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand slug: '{}' (from brand '{}')",
                slug, brand.name
            )));
        }

        let mut seen_competitors = HashSet::new();
        for competitor in &brand.competitors {
            if competitor.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has a competitor with an empty name",
                    brand.name
                )));
            }
            if !seen_competitors.insert(competitor.name.to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' lists competitor '{}' twice",
                    brand.name, competitor.name
                )));
            }
        }

        for prompt in &brand.prompts {
            if prompt.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has an empty prompt",
                    brand.name
                )));
            }
        }
    }

    Ok(())
}
