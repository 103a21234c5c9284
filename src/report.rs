use super::*;
use crate::aspects::{detect_aspects, detect_natal_aspects};
use crate::compatibility::score_with;

impl SynastryReport {
    /// Partitions `aspects` into the six category lists. Every aspect lands
    /// in exactly one list and keeps its detection order.
    pub fn from_aspects(
        user_planets: Vec<PlanetPlacement>,
        partner_planets: Vec<PlanetPlacement>,
        aspects: Vec<SynastryAspect>,
    ) -> Self {
        let mut report = SynastryReport {
            user_planets,
            partner_planets,
            ..Default::default()
        };
        for aspect in &aspects {
            report.category_mut(aspect.category).push(aspect.clone());
        }
        report.aspects = aspects;
        report
    }

    pub fn category(&self, category: AspectCategory) -> &[SynastryAspect] {
        match category {
            AspectCategory::Chemistry => &self.chemistry,
            AspectCategory::Emotional => &self.emotional,
            AspectCategory::Friction => &self.friction,
            AspectCategory::Growth => &self.growth,
            AspectCategory::Karmic => &self.karmic,
            AspectCategory::Communication => &self.communication,
        }
    }

    fn category_mut(&mut self, category: AspectCategory) -> &mut Vec<SynastryAspect> {
        match category {
            AspectCategory::Chemistry => &mut self.chemistry,
            AspectCategory::Emotional => &mut self.emotional,
            AspectCategory::Friction => &mut self.friction,
            AspectCategory::Growth => &mut self.growth,
            AspectCategory::Karmic => &mut self.karmic,
            AspectCategory::Communication => &mut self.communication,
        }
    }
}

/// One person's chart together with the aspects inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatalReport {
    pub chart: Chart,
    pub aspects: Vec<SynastryAspect>,
}

/// Chart calculation, aspect detection and scoring wired together. Holds no
/// mutable state, so one engine can serve any number of requests.
#[derive(Debug, Clone, Default)]
pub struct SynastryEngine {
    ephemeris: Ephemeris,
    config: SynastryConfig,
}

impl SynastryEngine {
    /// Fails with `Config` when the orb table is invalid, whether it came
    /// from TOML or was built in code.
    pub fn new(config: SynastryConfig) -> Result<Self> {
        config.validate()?;
        Ok(SynastryEngine {
            ephemeris: Ephemeris::new(),
            config,
        })
    }

    pub fn config(&self) -> &SynastryConfig {
        &self.config
    }

    pub fn build_report(
        &self,
        user: &BirthData,
        partner: &BirthData,
        user_label: &str,
        partner_label: &str,
    ) -> Result<SynastryBundle> {
        // Reject bad input before any chart is computed.
        user.parse_birthday()?;
        partner.parse_birthday()?;

        let user_chart = self.ephemeris.calculate_chart(user)?;
        let partner_chart = self.ephemeris.calculate_chart(partner)?;

        let aspects = detect_aspects(
            &user_chart.planets,
            &partner_chart.planets,
            &self.config,
            user_label,
            partner_label,
        );
        let compatibility = score_with(&user_chart.triad, &partner_chart.triad, &aspects, &self.config.orbs);

        tracing::debug!(
            user = user_label,
            partner = partner_label,
            aspects = aspects.len(),
            score = compatibility.overall_score,
            "built synastry report"
        );

        let couple_report = compatibility.into_couple_report(user_chart.triad, partner_chart.triad);
        let synastry_report = SynastryReport::from_aspects(user_chart.planets, partner_chart.planets, aspects);

        Ok(SynastryBundle {
            couple_report,
            synastry_report,
            user_accuracy: user_chart.accuracy,
            partner_accuracy: partner_chart.accuracy,
        })
    }

    pub fn natal_report(&self, birth: &BirthData, label: &str) -> Result<NatalReport> {
        let chart = self.ephemeris.calculate_chart(birth)?;
        let aspects = detect_natal_aspects(&chart.planets, &self.config, label);
        tracing::debug!(label, aspects = aspects.len(), "built natal report");
        Ok(NatalReport { chart, aspects })
    }
}

/// Builds a report with the default configuration.
pub fn build_report(
    user: &BirthData,
    partner: &BirthData,
    user_label: &str,
    partner_label: &str,
) -> Result<SynastryBundle> {
    SynastryEngine::default().build_report(user, partner, user_label, partner_label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BirthData {
        BirthData::new("1991-06-18")
            .with_time("07:10")
            .with_coordinates(10.522, 76.172)
            .with_utc_offset(5.5)
    }

    #[test]
    fn partition_covers_every_aspect_once() {
        let partner = BirthData::new("1988-11-02").with_time("22:45").with_coordinates(51.5, -0.12);
        let bundle = build_report(&sample(), &partner, "Me", "Them").unwrap();
        let report = &bundle.synastry_report;

        let total: usize = AspectCategory::ALL.iter().map(|c| report.category(*c).len()).sum();
        assert_eq!(total, report.aspects.len());
        for category in AspectCategory::ALL {
            assert!(report.category(category).iter().all(|a| a.category == category));
        }
        for aspect in &report.aspects {
            assert_eq!(report.category(aspect.category).iter().filter(|a| *a == aspect).count(), 1);
        }
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SynastryEngine>();
    }

    #[test]
    fn invalid_partner_fails_before_computing() {
        let err = build_report(&sample(), &BirthData::new(""), "Me", "Them").unwrap_err();
        assert!(matches!(err, AstrologyError::InvalidInput(_)));
    }

    #[test]
    fn natal_report_pairs_are_unique() {
        let natal = SynastryEngine::default().natal_report(&sample(), "Me").unwrap();
        assert_eq!(natal.chart.planets.len(), CelestialBody::ALL.len());
        for aspect in &natal.aspects {
            assert!(aspect.planet1.id < aspect.planet2.id);
            assert_eq!(aspect.person1_label, "Me");
        }
    }

    #[test]
    fn majors_only_config_drops_minor_aspects() {
        let engine = SynastryEngine::new(SynastryConfig {
            include_minor_aspects: false,
            ..SynastryConfig::default()
        })
        .unwrap();
        let partner = BirthData::new("1993-02-14").with_time("03:30");
        let bundle = engine.build_report(&sample(), &partner, "Me", "Them").unwrap();
        assert!(bundle.synastry_report.aspects.iter().all(|a| !a.kind.is_minor()));
    }

    #[test]
    fn engine_rejects_invalid_programmatic_config() {
        let mut overlapping = SynastryConfig::default();
        overlapping.orbs.square = 16.0;
        overlapping.orbs.trine = 16.0;
        assert!(matches!(SynastryEngine::new(overlapping), Err(AstrologyError::Config(_))));

        let mut negative = SynastryConfig::default();
        negative.orbs.conjunction = -1.0;
        assert!(matches!(SynastryEngine::new(negative), Err(AstrologyError::Config(_))));
    }
}
