//! Synastry and compatibility engine.
//!
//! Takes two people's birth data, computes approximate natal charts, finds the
//! aspects between them and folds everything into a scored, explainable
//! compatibility report. Pure computation: no I/O, no clock reads.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod aspects;
pub mod cache;
pub mod compatibility;
pub mod config;
pub mod ephemeris;
pub mod narrative;
pub mod report;

pub use aspects::{classify, detect_aspects, detect_natal_aspects, Classification};
pub use cache::{cached_report, CacheKey, MemoryReportCache, ReportCache};
pub use compatibility::{score, Compatibility};
pub use config::{OrbTable, SynastryConfig};
pub use ephemeris::{compute_chart, Ephemeris};
pub use narrative::{compose_prompt, narrate, Narrative, NarrativeError, NarrativeService, NarrativeSource};
pub use report::{build_report, NatalReport, SynastryEngine};

// ---------------------------
// ## Enumerations
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

impl Element {
    pub const ALL: [Element; 4] = [Element::Fire, Element::Earth, Element::Air, Element::Water];

    pub fn name(self) -> &'static str {
        match self {
            Element::Fire => "Fire",
            Element::Earth => "Earth",
            Element::Air => "Air",
            Element::Water => "Water",
        }
    }

    /// Fire feeds Air and Earth holds Water.
    pub fn is_complementary(self, other: Element) -> bool {
        matches!(
            (self, other),
            (Element::Fire, Element::Air)
                | (Element::Air, Element::Fire)
                | (Element::Earth, Element::Water)
                | (Element::Water, Element::Earth)
        )
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Cardinal,
    Fixed,
    Mutable,
}

impl Modality {
    pub fn name(self) -> &'static str {
        match self {
            Modality::Cardinal => "Cardinal",
            Modality::Fixed => "Fixed",
            Modality::Mutable => "Mutable",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZodiacSign {
    Aries = 0,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn from_longitude(longitude: f64) -> Self {
        let normalized_longitude = longitude.rem_euclid(360.0);
        let sign_index = (normalized_longitude / 30.0).floor() as usize;
        Self::from_index(sign_index)
    }

    /// Index wraps modulo 12.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// Sun sign for a calendar date, using the conventional tropical date ranges.
    pub fn from_date(month: u32, day: u32) -> Self {
        // Latest sign whose start date is on or before the given day. Early
        // January falls through to Capricorn, which starts in December.
        SIGNS
            .iter()
            .filter(|info| (info.start.0, info.start.1) <= (month, day))
            .max_by_key(|info| info.start)
            .map(|info| info.sign)
            .unwrap_or(ZodiacSign::Capricorn)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn info(self) -> &'static SignInfo {
        &SIGNS[self.index()]
    }

    pub fn element(self) -> Element {
        self.info().element
    }

    pub fn modality(self) -> Modality {
        self.info().modality
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn glyph(self) -> &'static str {
        self.info().glyph
    }

    /// Shortest distance around the wheel, in signs (0..=6).
    pub fn distance(self, other: ZodiacSign) -> usize {
        let d = (self.index() + 12 - other.index()) % 12;
        d.min(12 - d)
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CelestialBody {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    NorthNode,
}

impl CelestialBody {
    /// Canonical chart order. Detection iterates in this order.
    pub const ALL: [CelestialBody; 11] = [
        CelestialBody::Sun,
        CelestialBody::Moon,
        CelestialBody::Mercury,
        CelestialBody::Venus,
        CelestialBody::Mars,
        CelestialBody::Jupiter,
        CelestialBody::Saturn,
        CelestialBody::Uranus,
        CelestialBody::Neptune,
        CelestialBody::Pluto,
        CelestialBody::NorthNode,
    ];

    pub fn iter() -> impl Iterator<Item = CelestialBody> {
        Self::ALL.iter().copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            CelestialBody::Sun => "Sun",
            CelestialBody::Moon => "Moon",
            CelestialBody::Mercury => "Mercury",
            CelestialBody::Venus => "Venus",
            CelestialBody::Mars => "Mars",
            CelestialBody::Jupiter => "Jupiter",
            CelestialBody::Saturn => "Saturn",
            CelestialBody::Uranus => "Uranus",
            CelestialBody::Neptune => "Neptune",
            CelestialBody::Pluto => "Pluto",
            CelestialBody::NorthNode => "North Node",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            CelestialBody::Sun => "☉",
            CelestialBody::Moon => "☽",
            CelestialBody::Mercury => "☿",
            CelestialBody::Venus => "♀",
            CelestialBody::Mars => "♂",
            CelestialBody::Jupiter => "♃",
            CelestialBody::Saturn => "♄",
            CelestialBody::Uranus => "♅",
            CelestialBody::Neptune => "♆",
            CelestialBody::Pluto => "♇",
            CelestialBody::NorthNode => "☊",
        }
    }
}

impl fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AspectKind {
    Conjunction,
    SemiSextile,
    Sextile,
    Square,
    Trine,
    Quincunx,
    Opposition,
}

impl AspectKind {
    /// Ordered by exact angle. Equal-orb ties resolve to the earlier entry.
    pub const ALL: [AspectKind; 7] = [
        AspectKind::Conjunction,
        AspectKind::SemiSextile,
        AspectKind::Sextile,
        AspectKind::Square,
        AspectKind::Trine,
        AspectKind::Quincunx,
        AspectKind::Opposition,
    ];

    pub fn angle(self) -> f64 {
        match self {
            AspectKind::Conjunction => 0.0,
            AspectKind::SemiSextile => 30.0,
            AspectKind::Sextile => 60.0,
            AspectKind::Square => 90.0,
            AspectKind::Trine => 120.0,
            AspectKind::Quincunx => 150.0,
            AspectKind::Opposition => 180.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AspectKind::Conjunction => "conjunction",
            AspectKind::SemiSextile => "semi-sextile",
            AspectKind::Sextile => "sextile",
            AspectKind::Square => "square",
            AspectKind::Trine => "trine",
            AspectKind::Quincunx => "quincunx",
            AspectKind::Opposition => "opposition",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AspectKind::Conjunction => "☌",
            AspectKind::SemiSextile => "⚺",
            AspectKind::Sextile => "⚹",
            AspectKind::Square => "□",
            AspectKind::Trine => "△",
            AspectKind::Quincunx => "⚻",
            AspectKind::Opposition => "☍",
        }
    }

    pub fn is_minor(self) -> bool {
        matches!(self, AspectKind::SemiSextile | AspectKind::Quincunx)
    }
}

impl fmt::Display for AspectKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectNature {
    Harmonious,
    Challenging,
    Neutral,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectCategory {
    Chemistry,
    Emotional,
    Friction,
    Growth,
    Karmic,
    Communication,
}

impl AspectCategory {
    pub const ALL: [AspectCategory; 6] = [
        AspectCategory::Chemistry,
        AspectCategory::Emotional,
        AspectCategory::Friction,
        AspectCategory::Growth,
        AspectCategory::Karmic,
        AspectCategory::Communication,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AspectCategory::Chemistry => "chemistry",
            AspectCategory::Emotional => "emotional",
            AspectCategory::Friction => "friction",
            AspectCategory::Growth => "growth",
            AspectCategory::Karmic => "karmic",
            AspectCategory::Communication => "communication",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchQuality {
    Perfect,
    Great,
    Good,
    Neutral,
    Challenging,
}

impl MatchQuality {
    pub fn points(self) -> f64 {
        match self {
            MatchQuality::Perfect => 10.0,
            MatchQuality::Great => 8.0,
            MatchQuality::Good => 6.0,
            MatchQuality::Neutral => 4.0,
            MatchQuality::Challenging => 2.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    Precise,
    Approximate,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "Soulmate Bond")]
    SoulmateBond,
    #[serde(rename = "Great Match")]
    GreatMatch,
    #[serde(rename = "Good Match")]
    GoodMatch,
    #[serde(rename = "Growth Partnership")]
    GrowthPartnership,
    #[serde(rename = "Karmic Challenge")]
    KarmicChallenge,
}

impl Tier {
    /// Bands are contiguous: every score in 0..=100 lands in exactly one tier.
    pub fn from_score(score: u8) -> Tier {
        match score {
            85..=u8::MAX => Tier::SoulmateBond,
            72..=84 => Tier::GreatMatch,
            60..=71 => Tier::GoodMatch,
            45..=59 => Tier::GrowthPartnership,
            0..=44 => Tier::KarmicChallenge,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::SoulmateBond => "Soulmate Bond",
            Tier::GreatMatch => "Great Match",
            Tier::GoodMatch => "Good Match",
            Tier::GrowthPartnership => "Growth Partnership",
            Tier::KarmicChallenge => "Karmic Challenge",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------
// ## Reference Tables
// ---------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignInfo {
    pub sign: ZodiacSign,
    pub name: &'static str,
    pub glyph: &'static str,
    pub element: Element,
    pub modality: Modality,
    pub ruling: CelestialBody,
    /// (month, day) of the first day of the sign.
    pub start: (u32, u32),
    /// (month, day) of the last day of the sign.
    pub end: (u32, u32),
}

pub const SIGNS: [SignInfo; 12] = [
    SignInfo { sign: ZodiacSign::Aries, name: "Aries", glyph: "♈", element: Element::Fire, modality: Modality::Cardinal, ruling: CelestialBody::Mars, start: (3, 21), end: (4, 19) },
    SignInfo { sign: ZodiacSign::Taurus, name: "Taurus", glyph: "♉", element: Element::Earth, modality: Modality::Fixed, ruling: CelestialBody::Venus, start: (4, 20), end: (5, 20) },
    SignInfo { sign: ZodiacSign::Gemini, name: "Gemini", glyph: "♊", element: Element::Air, modality: Modality::Mutable, ruling: CelestialBody::Mercury, start: (5, 21), end: (6, 20) },
    SignInfo { sign: ZodiacSign::Cancer, name: "Cancer", glyph: "♋", element: Element::Water, modality: Modality::Cardinal, ruling: CelestialBody::Moon, start: (6, 21), end: (7, 22) },
    SignInfo { sign: ZodiacSign::Leo, name: "Leo", glyph: "♌", element: Element::Fire, modality: Modality::Fixed, ruling: CelestialBody::Sun, start: (7, 23), end: (8, 22) },
    SignInfo { sign: ZodiacSign::Virgo, name: "Virgo", glyph: "♍", element: Element::Earth, modality: Modality::Mutable, ruling: CelestialBody::Mercury, start: (8, 23), end: (9, 22) },
    SignInfo { sign: ZodiacSign::Libra, name: "Libra", glyph: "♎", element: Element::Air, modality: Modality::Cardinal, ruling: CelestialBody::Venus, start: (9, 23), end: (10, 22) },
    SignInfo { sign: ZodiacSign::Scorpio, name: "Scorpio", glyph: "♏", element: Element::Water, modality: Modality::Fixed, ruling: CelestialBody::Pluto, start: (10, 23), end: (11, 21) },
    SignInfo { sign: ZodiacSign::Sagittarius, name: "Sagittarius", glyph: "♐", element: Element::Fire, modality: Modality::Mutable, ruling: CelestialBody::Jupiter, start: (11, 22), end: (12, 21) },
    SignInfo { sign: ZodiacSign::Capricorn, name: "Capricorn", glyph: "♑", element: Element::Earth, modality: Modality::Cardinal, ruling: CelestialBody::Saturn, start: (12, 22), end: (1, 19) },
    SignInfo { sign: ZodiacSign::Aquarius, name: "Aquarius", glyph: "♒", element: Element::Air, modality: Modality::Fixed, ruling: CelestialBody::Uranus, start: (1, 20), end: (2, 18) },
    SignInfo { sign: ZodiacSign::Pisces, name: "Pisces", glyph: "♓", element: Element::Water, modality: Modality::Mutable, ruling: CelestialBody::Neptune, start: (2, 19), end: (3, 20) },
];

// ---------------------------
// ## Structures
// ---------------------------

/// Widest offset in use by any time zone (UTC+14, Line Islands).
pub const MAX_UTC_OFFSET_HOURS: f64 = 14.0;

/// Birth details as entered by the user. Optional fields only reduce accuracy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthData {
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub birthday: String,
    /// Local clock time, `HH:MM` or `HH:MM:SS`.
    #[serde(default)]
    pub birth_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Hours east of UTC at the birth place.
    #[serde(default)]
    pub utc_offset: f64,
}

impl BirthData {
    pub fn new(birthday: impl Into<String>) -> Self {
        BirthData {
            birthday: birthday.into(),
            ..Default::default()
        }
    }

    pub fn with_time(mut self, birth_time: impl Into<String>) -> Self {
        self.birth_time = Some(birth_time.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_utc_offset(mut self, hours: f64) -> Self {
        self.utc_offset = hours;
        self
    }

    /// Parses the birthday. This is the only hard validation on birth data.
    pub fn parse_birthday(&self) -> Result<NaiveDate> {
        let raw = self.birthday.trim();
        if raw.is_empty() {
            return Err(AstrologyError::InvalidInput("birthday is required".to_string()));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| AstrologyError::InvalidInput(format!("malformed birthday {:?}: {}", raw, e)))
    }

    /// Birth time if present and well formed.
    pub fn parse_birth_time(&self) -> Option<NaiveTime> {
        let raw = self.birth_time.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"));
        match parsed {
            Ok(time) => Some(time),
            Err(_) => {
                tracing::warn!(birth_time = raw, "ignoring malformed birth time");
                None
            }
        }
    }

    /// `(latitude, longitude)` if both are present and on the globe.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let (lat, lon) = (self.latitude?, self.longitude?);
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            tracing::warn!(lat, lon, "ignoring out-of-range coordinates");
            return None;
        }
        Some((lat, lon))
    }

    /// UTC offset in hours if it is a real time-zone offset, otherwise 0.
    pub fn utc_offset_hours(&self) -> f64 {
        let hours = self.utc_offset;
        if !hours.is_finite() || !(-MAX_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS).contains(&hours) {
            tracing::warn!(utc_offset = hours, "ignoring out-of-range utc offset");
            return 0.0;
        }
        hours
    }

    /// Birth instant in UT. Without a birth time, local noon is used.
    pub fn birth_moment(&self) -> Result<(DateTime<Utc>, bool)> {
        let date = self.parse_birthday()?;
        let time = self.parse_birth_time();
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
        let local = date.and_time(time.unwrap_or(noon));
        let offset_seconds = (self.utc_offset_hours() * 3600.0).round() as i64;
        let utc = TimeDelta::try_seconds(offset_seconds)
            .and_then(|offset| Utc.from_utc_datetime(&local).checked_sub_signed(offset))
            .ok_or_else(|| AstrologyError::InvalidInput(format!("birth moment out of range for {}", date)))?;
        Ok((utc, time.is_some()))
    }
}

/// A body's position at the birth moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetPlacement {
    pub id: CelestialBody,
    pub name: String,
    pub glyph: String,
    pub sign_id: ZodiacSign,
    /// Degrees past the sign cusp, in `[0, 30)`.
    pub degree_in_sign: f32,
    pub element: Element,
}

impl PlanetPlacement {
    pub fn new(body: CelestialBody, longitude: f64) -> Self {
        let (sign, degree_in_sign) = split_longitude(longitude);
        PlanetPlacement {
            id: body,
            name: body.name().to_string(),
            glyph: body.glyph().to_string(),
            sign_id: sign,
            degree_in_sign,
            element: sign.element(),
        }
    }

    /// Absolute ecliptic longitude, `signIndex * 30 + degreeInSign`.
    pub fn longitude(&self) -> f64 {
        self.sign_id.index() as f64 * 30.0 + self.degree_in_sign as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatalTriad {
    pub sun: ZodiacSign,
    pub moon: ZodiacSign,
    pub rising: ZodiacSign,
}

impl NatalTriad {
    pub fn signs(&self) -> [ZodiacSign; 3] {
        [self.sun, self.moon, self.rising]
    }
}

/// Which optional inputs fed the chart, and how far to trust Moon and Rising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartAccuracy {
    pub has_birth_time: bool,
    pub has_coordinates: bool,
    pub moon: Accuracy,
    pub rising: Accuracy,
}

impl ChartAccuracy {
    pub fn is_precise(&self) -> bool {
        self.moon == Accuracy::Precise && self.rising == Accuracy::Precise
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub triad: NatalTriad,
    pub planets: Vec<PlanetPlacement>,
    pub accuracy: ChartAccuracy,
    /// Ecliptic longitude of the ascendant used for the rising sign.
    pub ascendant: f64,
    pub julian_day: JulianDay,
}

impl Chart {
    pub fn planet(&self, body: CelestialBody) -> Option<&PlanetPlacement> {
        self.planets.iter().find(|p| p.id == body)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynastryAspect {
    pub planet1: PlanetPlacement,
    pub planet2: PlanetPlacement,
    #[serde(rename = "type")]
    pub kind: AspectKind,
    pub symbol: String,
    /// Degrees from exact, one decimal.
    pub orb: f64,
    pub nature: AspectNature,
    pub category: AspectCategory,
    pub person1_label: String,
    pub person2_label: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynastryReport {
    pub user_planets: Vec<PlanetPlacement>,
    pub partner_planets: Vec<PlanetPlacement>,
    pub aspects: Vec<SynastryAspect>,
    pub chemistry: Vec<SynastryAspect>,
    pub emotional: Vec<SynastryAspect>,
    pub friction: Vec<SynastryAspect>,
    pub growth: Vec<SynastryAspect>,
    pub karmic: Vec<SynastryAspect>,
    pub communication: Vec<SynastryAspect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignMatch {
    pub user_sign: ZodiacSign,
    pub partner_sign: ZodiacSign,
    pub quality: MatchQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementBalance {
    pub fire: u8,
    pub earth: u8,
    pub air: u8,
    pub water: u8,
}

impl ElementBalance {
    pub fn add(&mut self, element: Element) {
        match element {
            Element::Fire => self.fire += 1,
            Element::Earth => self.earth += 1,
            Element::Air => self.air += 1,
            Element::Water => self.water += 1,
        }
    }

    pub fn count(&self, element: Element) -> u8 {
        match element {
            Element::Fire => self.fire,
            Element::Earth => self.earth,
            Element::Air => self.air,
            Element::Water => self.water,
        }
    }

    pub fn total(&self) -> u8 {
        self.fire + self.earth + self.air + self.water
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleReport {
    pub user_triad: NatalTriad,
    pub partner_triad: NatalTriad,
    pub sun_match: SignMatch,
    pub moon_match: SignMatch,
    pub rising_match: SignMatch,
    pub overall_score: u8,
    pub tier: Tier,
    pub element_balance: ElementBalance,
    pub strengths: Vec<String>,
    pub growth_edges: Vec<String>,
}

/// Everything a compatibility request produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynastryBundle {
    pub couple_report: CoupleReport,
    pub synastry_report: SynastryReport,
    pub user_accuracy: ChartAccuracy,
    pub partner_accuracy: ChartAccuracy,
}

// ---------------------------
// ## Error Handling
// ---------------------------

#[derive(Debug, Error)]
pub enum AstrologyError {
    #[error("Invalid Input: {0}")]
    InvalidInput(String),
    #[error("Configuration Error: {0}")]
    Config(String),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML Error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AstrologyError>;

// ---------------------------
// ## Utility Functions
// ---------------------------

pub type JulianDay = f64;

/// Julian Day of the J2000.0 epoch (2000-01-01 12:00 TT).
pub const J2000: JulianDay = 2_451_545.0;

const UNIX_EPOCH_JD: JulianDay = 2_440_587.5;

pub fn date_to_julian_day(date_time: DateTime<Utc>) -> JulianDay {
    let seconds = date_time.timestamp() as f64 + date_time.timestamp_subsec_nanos() as f64 / 1_000_000_000.0;
    UNIX_EPOCH_JD + seconds / 86_400.0
}

/// Julian centuries since J2000.0.
pub fn julian_centuries(julian_day: JulianDay) -> f64 {
    (julian_day - J2000) / 36_525.0
}

pub fn normalize_degrees(degrees: f64) -> f64 {
    degrees.rem_euclid(360.0)
}

/// Shortest arc between two longitudes, in `[0, 180]`.
pub fn angular_separation(a: f64, b: f64) -> f64 {
    let diff = (normalize_degrees(a) - normalize_degrees(b)).abs();
    diff.min(360.0 - diff)
}

/// Splits a longitude into its sign and an f32 offset guaranteed to stay below 30.
pub fn split_longitude(longitude: f64) -> (ZodiacSign, f32) {
    let lon = normalize_degrees(longitude);
    let sign = ZodiacSign::from_longitude(lon);
    let mut degree = (lon - sign.index() as f64 * 30.0) as f32;
    if degree >= 30.0 {
        // f32 rounding can land exactly on the next cusp.
        degree = f32::from_bits(30.0f32.to_bits() - 1);
    }
    (sign, degree.max(0.0))
}
