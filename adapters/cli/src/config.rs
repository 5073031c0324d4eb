//! World configuration assembled from an optional TOML file and command-line flags.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::Args;
use geocache_core::{LatLng, SnapshotPolicy, WorldConfig};

/// Command-line flags that override values read from the configuration file.
#[derive(Args, Clone, Debug, Default, PartialEq)]
pub(crate) struct ConfigOverrides {
    /// Chebyshev radius of the visible window, in cells.
    #[arg(long = "radius", value_name = "CELLS")]
    pub(crate) visibility_radius: Option<u32>,

    /// Angular size of a grid cell, in degrees.
    #[arg(long = "tile-size", value_name = "DEGREES")]
    pub(crate) tile_degrees: Option<f64>,

    /// Probability that a newly discovered cell holds items.
    #[arg(long, value_name = "P")]
    pub(crate) spawn_probability: Option<f64>,

    /// Upper bound of items created in a populated cell.
    #[arg(long, value_name = "COUNT")]
    pub(crate) max_items: Option<u32>,

    /// Starting position of the player.
    #[arg(long, value_name = "LAT,LNG", value_parser = parse_origin, allow_hyphen_values = true)]
    pub(crate) origin: Option<LatLng>,

    /// Keep only the first snapshot taken for each cell.
    #[arg(long)]
    pub(crate) first_write_wins: bool,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut WorldConfig) {
        if let Some(radius) = self.visibility_radius {
            config.visibility_radius = radius;
        }
        if let Some(tile_degrees) = self.tile_degrees {
            config.tile_degrees = tile_degrees;
        }
        if let Some(probability) = self.spawn_probability {
            config.spawn_probability = probability;
        }
        if let Some(max_items) = self.max_items {
            config.max_items = max_items;
        }
        if let Some(origin) = self.origin {
            config.origin = origin;
        }
        if self.first_write_wins {
            config.snapshot_policy = SnapshotPolicy::FirstWriteWins;
        }
    }
}

/// Builds the validated world configuration for a session.
pub(crate) fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<WorldConfig> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => WorldConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate().context("invalid world configuration")?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<WorldConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read world configuration at {}", path.display()))?;
    parse(&contents)
        .with_context(|| format!("failed to parse world configuration at {}", path.display()))
}

fn parse(contents: &str) -> Result<WorldConfig> {
    let config = toml::from_str(contents).context("invalid world configuration toml")?;
    Ok(config)
}

fn parse_origin(value: &str) -> Result<LatLng, String> {
    let invalid = || format!("expected 'LAT,LNG', received '{value}'");
    let (lat, lng) = value.split_once(',').ok_or_else(invalid)?;
    let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
    let lng = lng.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok(LatLng::new(lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load(None, &ConfigOverrides::default()).expect("defaults are valid");
        assert_eq!(config, WorldConfig::default());
    }

    #[test]
    fn file_values_fill_in_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let contents = r#"
visibility_radius = 3
snapshot_policy = "first_write_wins"

[origin]
lat = 36.98949
lng = -122.06277
"#;
        file.write_all(contents.as_bytes()).expect("write config");

        let config = load(Some(file.path()), &ConfigOverrides::default()).expect("valid file");

        assert_eq!(config.visibility_radius, 3);
        assert_eq!(config.snapshot_policy, SnapshotPolicy::FirstWriteWins);
        assert_eq!(config.origin, LatLng::new(36.98949, -122.06277));
        assert_eq!(config.max_items, WorldConfig::default().max_items);
    }

    #[test]
    fn flags_override_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "visibility_radius = 3\nspawn_probability = 0.5").expect("write config");
        let overrides = ConfigOverrides {
            visibility_radius: Some(5),
            first_write_wins: true,
            ..ConfigOverrides::default()
        };

        let config = load(Some(file.path()), &overrides).expect("valid config");

        assert_eq!(config.visibility_radius, 5);
        assert_eq!(config.spawn_probability, 0.5);
        assert_eq!(config.snapshot_policy, SnapshotPolicy::FirstWriteWins);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("radius = 3").is_err());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let overrides = ConfigOverrides {
            spawn_probability: Some(1.5),
            ..ConfigOverrides::default()
        };
        let error = load(None, &overrides).expect_err("probability out of range");
        assert!(format!("{error:#}").contains("spawn probability"));
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing.toml");
        let error = load(Some(&path), &ConfigOverrides::default()).expect_err("missing file");
        assert!(error.to_string().contains("missing.toml"));
    }

    #[test]
    fn origin_flag_parses_signed_pairs() {
        assert_eq!(
            parse_origin("36.98949,-122.06277"),
            Ok(LatLng::new(36.98949, -122.06277))
        );
        assert!(parse_origin("36.98949").is_err());
    }
}
