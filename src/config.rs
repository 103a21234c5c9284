use std::path::Path;

use serde::{Deserialize, Serialize};

use super::*;

pub const MAX_ALLOWED_ORB: f64 = 20.0;

/// Maximum orb, in degrees, for each aspect kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbTable {
    pub conjunction: f64,
    pub semi_sextile: f64,
    pub sextile: f64,
    pub square: f64,
    pub trine: f64,
    pub quincunx: f64,
    pub opposition: f64,
}

impl Default for OrbTable {
    fn default() -> Self {
        OrbTable {
            conjunction: 8.0,
            semi_sextile: 2.0,
            sextile: 6.0,
            square: 6.0,
            trine: 6.0,
            quincunx: 2.0,
            opposition: 8.0,
        }
    }
}

impl OrbTable {
    pub fn max_orb(&self, kind: AspectKind) -> f64 {
        match kind {
            AspectKind::Conjunction => self.conjunction,
            AspectKind::SemiSextile => self.semi_sextile,
            AspectKind::Sextile => self.sextile,
            AspectKind::Square => self.square,
            AspectKind::Trine => self.trine,
            AspectKind::Quincunx => self.quincunx,
            AspectKind::Opposition => self.opposition,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynastryConfig {
    pub orbs: OrbTable,
    /// Detect quincunx and semi-sextile in addition to the five major aspects.
    pub include_minor_aspects: bool,
}

impl Default for SynastryConfig {
    fn default() -> Self {
        SynastryConfig {
            orbs: OrbTable::default(),
            include_minor_aspects: true,
        }
    }
}

impl SynastryConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SynastryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded synastry config");
        Ok(config)
    }

    /// Aspect kinds the detector looks for, in angle order.
    pub fn enabled_kinds(&self) -> impl Iterator<Item = AspectKind> + '_ {
        AspectKind::ALL
            .iter()
            .copied()
            .filter(move |kind| self.include_minor_aspects || !kind.is_minor())
    }

    pub fn max_orb(&self, kind: AspectKind) -> f64 {
        self.orbs.max_orb(kind)
    }

    /// Every orb must be positive and bounded, and neighbouring enabled kinds
    /// may not overlap, so a separation matches at most one window.
    pub fn validate(&self) -> Result<()> {
        for kind in AspectKind::ALL {
            let orb = self.max_orb(kind);
            if !orb.is_finite() || orb <= 0.0 || orb > MAX_ALLOWED_ORB {
                return Err(AstrologyError::Config(format!(
                    "{} orb must be in (0, {}], got {}",
                    kind, MAX_ALLOWED_ORB, orb
                )));
            }
        }

        let kinds: Vec<AspectKind> = self.enabled_kinds().collect();
        for pair in kinds.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let gap = b.angle() - a.angle();
            if self.max_orb(a) + self.max_orb(b) > gap {
                return Err(AstrologyError::Config(format!(
                    "{} and {} orbs overlap ({} + {} > {})",
                    a,
                    b,
                    self.max_orb(a),
                    self.max_orb(b),
                    gap
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = SynastryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.enabled_kinds().count(), 7);
        assert_eq!(config.max_orb(AspectKind::Opposition), 8.0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SynastryConfig::from_toml_str(
            r#"
            include_minor_aspects = false

            [orbs]
            conjunction = 10.0
            "#,
        )
        .unwrap();
        assert_eq!(config.orbs.conjunction, 10.0);
        assert_eq!(config.orbs.trine, 6.0);
        let kinds: Vec<_> = config.enabled_kinds().collect();
        assert_eq!(
            kinds,
            vec![
                AspectKind::Conjunction,
                AspectKind::Sextile,
                AspectKind::Square,
                AspectKind::Trine,
                AspectKind::Opposition
            ]
        );
    }

    #[test]
    fn overlapping_orbs_are_rejected() {
        let err = SynastryConfig::from_toml_str("[orbs]\nsquare = 16.0\ntrine = 16.0")
            .unwrap_err();
        assert!(matches!(err, AstrologyError::Config(_)), "{err}");
    }

    #[test]
    fn non_positive_orb_is_rejected() {
        let err = SynastryConfig::from_toml_str("[orbs]\nsextile = 0.0").unwrap_err();
        assert!(matches!(err, AstrologyError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_a_toml_error() {
        let err = SynastryConfig::from_toml_str("orbs = 3").unwrap_err();
        assert!(matches!(err, AstrologyError::Toml(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[orbs]\nopposition = 7.5").unwrap();
        let config = SynastryConfig::from_file(file.path()).unwrap();
        assert_eq!(config.orbs.opposition, 7.5);
        assert!(config.include_minor_aspects);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SynastryConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, AstrologyError::Io(_)));
    }
}
