use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{bail, Context, Result};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub canvas: CanvasConfig,
    pub hexbin: HexbinConfig,
    pub color: ColorConfig,
    pub legend: LegendConfig,
    pub text: TextConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub points_csv: PathBuf,
    pub boundaries: PathBuf, // .geojson/.json or .shp
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            points_csv: PathBuf::from("data/lau_points_values.csv"),
            boundaries: PathBuf::from("data/lau_boundaries.geojson"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub svg: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { svg: PathBuf::from("map.svg") }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    /// Vertical shift applied to the boundary and hexagon layers.
    pub map_offset: f64,
    /// Extra room below the footnote.
    pub footer_padding: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 700.0,
            margin: 50.0,
            map_offset: 150.0,
            footer_padding: 40.0,
        }
    }
}

impl CanvasConfig {
    /// Height of the emitted document, tall enough for the offset map and the footnote.
    pub fn document_height(&self) -> f64 {
        self.height + self.map_offset + self.footer_padding
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HexbinConfig {
    pub radius: f64,
}

impl Default for HexbinConfig {
    fn default() -> Self {
        Self { radius: 4.5 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColorConfig {
    pub domain: [f64; 2],
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self { domain: [0.013, 0.225] }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LegendConfig {
    pub width: f64,
    pub height: f64,
    pub top: f64,
    /// Upper end of the gradient bar and its axis; the lower end is always 0.
    pub domain_max: f64,
    pub stops: usize,
    pub ticks: usize,
    pub label: String,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            width: 230.0,
            height: 15.0,
            top: 150.0,
            domain_max: 0.225,
            stops: 10,
            ticks: 5,
            label: "15-29 age group as % of total population".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TextConfig {
    pub title: String,
    pub subtitle: String,
    pub source: String,
    pub source_url: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            title: "Greek youth have left Epirus".to_string(),
            subtitle: "Moving to urban, tourist or military locations".to_string(),
            source: "Source: ELSTAT - Permanent population by age group and marital status. Municipal communities, 2021".to_string(),
            source_url: "https://www.statistics.gr/el/statistics/-/publication/SAM03/-".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML configuration: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for a run. An explicit path must exist; otherwise
    /// `config.toml` is used when present and the built-in defaults when not.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load_from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.canvas.width > 0.0 && self.canvas.height > 0.0) {
            bail!("Canvas size must be positive, got {}x{}", self.canvas.width, self.canvas.height);
        }
        if !(self.hexbin.radius > 0.0) {
            bail!("Hexbin radius must be positive, got {}", self.hexbin.radius);
        }
        let [lo, hi] = self.color.domain;
        if !lo.is_finite() || !hi.is_finite() || lo == hi {
            bail!("Color domain must be two distinct finite numbers, got [{}, {}]", lo, hi);
        }
        if self.legend.stops == 0 {
            bail!("Legend needs at least one gradient step");
        }
        if !(self.legend.domain_max.is_finite() && self.legend.domain_max > 0.0) {
            bail!("Legend domain_max must be positive, got {}", self.legend.domain_max);
        }
        Ok(())
    }
}
