use std::{collections::HashSet, path::Path};

use anyhow::{bail, Context, Result};
use config::{Config, File, FileFormat};
use tracing::{info, warn};

use crate::error::{GameError, GameResult};

use super::models::Universe;

/// Reads galaxy definition files.
pub struct UniverseLoader;

impl UniverseLoader {
    /// Load and validate a universe from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> GameResult<Universe> {
        let path = path.as_ref();
        let universe = read_universe(path).map_err(|err| GameError::ConfigLoadFailure {
            path: path.to_path_buf(),
            reason: format!("{err:#}"),
        })?;
        info!(
            path = %path.display(),
            planets = universe.planets.len(),
            templates = universe.ship_templates.len(),
            "Universe loaded"
        );
        Ok(universe)
    }

    /// Load a universe, continuing with the built-in galaxy when the file is
    /// missing or broken.
    pub fn load_or_fallback(path: impl AsRef<Path>) -> Universe {
        match Self::load(path) {
            Ok(universe) => universe,
            Err(err) => {
                warn!(error = %err, "Starting with built-in universe");
                Universe::fallback()
            }
        }
    }

    /// Parse a universe from YAML text.
    pub fn parse(yaml: &str) -> Result<Universe> {
        let universe = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .context("failed to parse universe definition")?
            .try_deserialize::<Universe>()
            .context("universe definition has an unexpected shape")?;
        validate(&universe)?;
        Ok(universe)
    }
}

fn read_universe(path: &Path) -> Result<Universe> {
    if !path.is_file() {
        bail!("file not found");
    }
    let universe = Config::builder()
        .add_source(File::from(path).format(FileFormat::Yaml))
        .build()
        .with_context(|| format!("failed to parse {}", path.display()))?
        .try_deserialize::<Universe>()
        .with_context(|| format!("unexpected universe layout in {}", path.display()))?;
    validate(&universe)?;
    Ok(universe)
}

fn validate(universe: &Universe) -> Result<()> {
    if universe.planets.is_empty() {
        bail!("universe defines no planets");
    }
    if universe.ship_templates.is_empty() {
        bail!("universe defines no ship templates");
    }

    ensure_unique("planet", universe.planets.iter().map(|p| p.key.as_str()))?;
    ensure_unique("ship template", universe.ship_templates.iter().map(|t| t.key.as_str()))?;
    ensure_unique("ship module", universe.ship_modules.iter().map(|m| m.key.as_str()))?;
    ensure_unique("commodity", universe.commodities.iter().map(|c| c.key.as_str()))?;

    for planet in &universe.planets {
        for key in planet.production.iter().chain(planet.demand.iter()) {
            if universe.commodity(key).is_none() {
                warn!(planet = %planet.key, commodity = %key, "Unknown commodity referenced");
            }
        }
    }

    for module in &universe.ship_modules {
        if !module.stat_modifier.is_known() {
            warn!(
                module = %module.key,
                tag = %module.stat_modifier,
                "Module modifies an unknown stat and will have no effect"
            );
        }
    }

    Ok(())
}

/// Lookups take the first match, so a repeated key would shadow silently.
fn ensure_unique<'a>(kind: &str, keys: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            bail!("duplicate {kind} key: {key}");
        }
    }
    Ok(())
}
