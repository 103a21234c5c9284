use approx::assert_abs_diff_eq;
use aztro_synastry::*;

fn calicut() -> BirthData {
    BirthData::new("1991-06-18")
        .with_time("07:10")
        .with_coordinates(10.522, 76.172)
        .with_utc_offset(5.5)
}

fn london() -> BirthData {
    BirthData::new("1988-11-02")
        .with_time("22:45")
        .with_coordinates(51.507, -0.128)
}

#[test]
fn reports_are_byte_identical() {
    let first = build_report(&calicut(), &london(), "Asha", "Sam").unwrap();
    let second = build_report(&calicut(), &london(), "Asha", "Sam").unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn every_orb_is_within_its_limit() {
    let config = SynastryConfig::default();
    let partners = [
        london(),
        BirthData::new("1975-01-30"),
        BirthData::new("2001-08-12").with_time("04:05"),
        BirthData::new("1964-03-03").with_time("13:00").with_coordinates(-33.87, 151.21).with_utc_offset(10.0),
    ];
    for partner in &partners {
        let bundle = build_report(&calicut(), partner, "A", "B").unwrap();
        for aspect in &bundle.synastry_report.aspects {
            assert!(aspect.orb <= config.max_orb(aspect.kind), "{:?}", aspect);
            assert!(aspect.orb >= 0.0);
        }
    }
}

#[test]
fn categories_partition_the_aspects() {
    let bundle = build_report(&calicut(), &london(), "A", "B").unwrap();
    let report = &bundle.synastry_report;
    let mut from_categories: Vec<&SynastryAspect> = AspectCategory::ALL
        .iter()
        .flat_map(|c| report.category(*c).iter())
        .collect();
    assert_eq!(from_categories.len(), report.aspects.len());
    for aspect in &report.aspects {
        let position = from_categories.iter().position(|a| *a == aspect).unwrap();
        from_categories.remove(position);
    }
    assert!(from_categories.is_empty());
}

#[test]
fn couple_report_invariants() {
    let bundle = build_report(&calicut(), &london(), "A", "B").unwrap();
    let couple = &bundle.couple_report;
    assert!(couple.overall_score <= 100);
    assert_eq!(couple.tier, Tier::from_score(couple.overall_score));
    assert_eq!(couple.element_balance.total(), 6);
    assert!(!couple.strengths.is_empty());
    assert!(!couple.growth_edges.is_empty());
}

#[test]
fn identical_births_are_a_soulmate_bond() {
    let bundle = build_report(&calicut(), &calicut(), "A", "B").unwrap();
    let couple = &bundle.couple_report;
    assert_eq!(couple.sun_match.quality, MatchQuality::Perfect);
    assert_eq!(couple.moon_match.quality, MatchQuality::Perfect);
    assert_eq!(couple.rising_match.quality, MatchQuality::Perfect);
    assert!(couple.overall_score >= 85, "{}", couple.overall_score);
    assert_eq!(couple.tier, Tier::SoulmateBond);

    let sun_sun = bundle
        .synastry_report
        .aspects
        .iter()
        .find(|a| a.planet1.id == CelestialBody::Sun && a.planet2.id == CelestialBody::Sun)
        .unwrap();
    assert_eq!(sun_sun.kind, AspectKind::Conjunction);
    assert_abs_diff_eq!(sun_sun.orb, 0.0);
}

#[test]
fn missing_birth_time_is_flagged() {
    let bundle = build_report(&BirthData::new("1991-06-18"), &london(), "A", "B").unwrap();
    let accuracy = bundle.user_accuracy;
    assert!(!accuracy.has_birth_time);
    assert_eq!(accuracy.moon, Accuracy::Approximate);
    assert_eq!(accuracy.rising, Accuracy::Approximate);
    assert!(bundle.partner_accuracy.is_precise());
    assert_eq!(bundle.couple_report.user_triad.sun, ZodiacSign::Gemini);
}

#[test]
fn antipodal_suns_are_in_opposition() {
    let aries = BirthData::new("1990-04-05");
    let libra = BirthData::new("1990-10-08");
    let bundle = build_report(&aries, &libra, "A", "B").unwrap();
    assert_eq!(bundle.couple_report.user_triad.sun, ZodiacSign::Aries);
    assert_eq!(bundle.couple_report.partner_triad.sun, ZodiacSign::Libra);

    let opposition = bundle
        .synastry_report
        .aspects
        .iter()
        .find(|a| a.planet1.id == CelestialBody::Sun && a.planet2.id == CelestialBody::Sun)
        .unwrap();
    assert_eq!(opposition.kind, AspectKind::Opposition);
    assert!(opposition.orb <= 1.0, "{}", opposition.orb);
    assert_eq!(opposition.nature, AspectNature::Challenging);
    assert_eq!(opposition.category, AspectCategory::Growth);
}

#[test]
fn malformed_birthday_is_rejected() {
    for bad in ["", "18/06/1991", "1991-02-30"] {
        let err = build_report(&calicut(), &BirthData::new(bad), "A", "B").unwrap_err();
        assert!(matches!(err, AstrologyError::InvalidInput(_)), "{bad}: {err}");
    }
}

#[test]
fn absurd_utc_offset_degrades_instead_of_failing() {
    for offset in [1e16, -1e16, 500.0, f64::NAN] {
        let wild = BirthData::new("1991-06-18").with_time("07:10").with_utc_offset(offset);
        let bundle = build_report(&wild, &london(), "A", "B").unwrap();
        let at_greenwich = build_report(&BirthData::new("1991-06-18").with_time("07:10"), &london(), "A", "B").unwrap();
        assert_eq!(bundle, at_greenwich, "{offset}");
        assert_eq!(bundle.couple_report.user_triad.sun, ZodiacSign::Gemini);
    }
}

#[test]
fn report_serializes_with_camel_case_fields() {
    let bundle = build_report(&calicut(), &london(), "A", "B").unwrap();
    let value = serde_json::to_value(&bundle).unwrap();
    assert!(value["coupleReport"]["overallScore"].is_u64());
    assert!(value["coupleReport"]["tier"].is_string());
    assert!(value["synastryReport"]["userPlanets"].is_array());
    if let Some(first) = value["synastryReport"]["aspects"].get(0) {
        assert!(first["type"].is_string());
        assert!(first["person1Label"].is_string());
        assert!(first["planet1"]["degreeInSign"].is_number());
    }
}

#[test]
fn request_json_round_trips_into_birth_data() {
    let birth: BirthData = serde_json::from_str(
        r#"{"birthday": "1991-06-18", "birthTime": "07:10", "latitude": 10.522, "longitude": 76.172, "utcOffset": 5.5}"#,
    )
    .unwrap();
    assert_eq!(birth, calicut());
}

#[test]
fn cached_reports_match_fresh_ones() {
    let engine = SynastryEngine::default();
    let mut cache = MemoryReportCache::new();
    let fresh = engine.build_report(&calicut(), &london(), "A", "B").unwrap();
    let cached = cached_report(&engine, &mut cache, &calicut(), &london(), "A", "B").unwrap();
    let again = cached_report(&engine, &mut cache, &calicut(), &london(), "A", "B").unwrap();
    assert_eq!(fresh, cached);
    assert_eq!(cached, again);
    assert_eq!(cache.len(), 1);
}

struct Offline;

impl NarrativeService for Offline {
    fn generate_narrative(&self, _prompt: &str) -> std::result::Result<String, NarrativeError> {
        Err(NarrativeError::Rejected("quota exceeded".to_string()))
    }
}

#[test]
fn narrative_outage_never_blocks_the_report() {
    let bundle = build_report(&calicut(), &london(), "A", "B").unwrap();
    let narrative = narrate(&Offline, &bundle, "A", "B");
    assert_eq!(narrative.source, NarrativeSource::Fallback);
    assert!(!narrative.text.is_empty());
}
