use std::collections::BTreeMap;

use super::*;

const SUN_WEIGHT: f64 = 1.0;
const MOON_WEIGHT: f64 = 1.2;
const RISING_WEIGHT: f64 = 0.8;

/// Midpoint and half-range of the aspect component, which stays in (0, 40).
const ASPECT_BASE: f64 = 20.0;
/// Damps the aspect balance when only a handful of aspects are present.
const ASPECT_DAMPING: f64 = 4.0;

const MAX_LINES: usize = 3;

const FALLBACK_STRENGTH: &str =
    "Your charts meet on steady, uncomplicated ground: there is room to build the bond at your own pace.";
const FALLBACK_GROWTH_EDGE: &str =
    "No sharp edges stand out between your charts; keep talking openly so small differences never pile up.";

/// Scored view of a pair of charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compatibility {
    pub overall_score: u8,
    pub tier: Tier,
    pub element_balance: ElementBalance,
    pub strengths: Vec<String>,
    pub growth_edges: Vec<String>,
    pub sun_match: SignMatch,
    pub moon_match: SignMatch,
    pub rising_match: SignMatch,
}

impl Compatibility {
    pub fn into_couple_report(self, user_triad: NatalTriad, partner_triad: NatalTriad) -> CoupleReport {
        CoupleReport {
            user_triad,
            partner_triad,
            sun_match: self.sun_match,
            moon_match: self.moon_match,
            rising_match: self.rising_match,
            overall_score: self.overall_score,
            tier: self.tier,
            element_balance: self.element_balance,
            strengths: self.strengths,
            growth_edges: self.growth_edges,
        }
    }
}

pub fn match_quality(a: ZodiacSign, b: ZodiacSign) -> MatchQuality {
    if a == b {
        MatchQuality::Perfect
    } else if a.element() == b.element() {
        MatchQuality::Great
    } else if a.element().is_complementary(b.element()) {
        MatchQuality::Good
    } else if a.distance(b) == 3 {
        MatchQuality::Challenging
    } else {
        MatchQuality::Neutral
    }
}

pub fn sign_match(user_sign: ZodiacSign, partner_sign: ZodiacSign) -> SignMatch {
    SignMatch {
        user_sign,
        partner_sign,
        quality: match_quality(user_sign, partner_sign),
    }
}

/// Score with the default orb table.
pub fn score(user: &NatalTriad, partner: &NatalTriad, aspects: &[SynastryAspect]) -> Compatibility {
    score_with(user, partner, aspects, &OrbTable::default())
}

/// Score against the orb table the aspects were detected with, so tightness
/// is measured relative to the limits that were actually applied.
pub fn score_with(
    user: &NatalTriad,
    partner: &NatalTriad,
    aspects: &[SynastryAspect],
    orbs: &OrbTable,
) -> Compatibility {
    let sun_match = sign_match(user.sun, partner.sun);
    let moon_match = sign_match(user.moon, partner.moon);
    let rising_match = sign_match(user.rising, partner.rising);

    let signs = sign_component(&sun_match, &moon_match, &rising_match);
    let (harmonious, challenging) = aspect_weights(aspects, orbs);
    let balance = aspect_component(harmonious, challenging);
    let overall_score = (signs + balance).clamp(0.0, 100.0).round() as u8;
    let tier = Tier::from_score(overall_score);

    let element_balance = element_balance(user, partner);
    let strengths = strengths(aspects, [&sun_match, &moon_match, &rising_match]);
    let growth_edges = growth_edges(aspects, &element_balance, &sun_match);

    tracing::debug!(
        signs,
        balance,
        overall_score,
        tier = %tier,
        aspects = aspects.len(),
        "scored compatibility"
    );

    Compatibility {
        overall_score,
        tier,
        element_balance,
        strengths,
        growth_edges,
        sun_match,
        moon_match,
        rising_match,
    }
}

fn sign_component(sun: &SignMatch, moon: &SignMatch, rising: &SignMatch) -> f64 {
    2.0 * (SUN_WEIGHT * sun.quality.points()
        + MOON_WEIGHT * moon.quality.points()
        + RISING_WEIGHT * rising.quality.points())
}

/// Tighter aspects count more: exact is 1.0, at the orb limit 0.5.
pub fn tightness(orb: f64, max_orb: f64) -> f64 {
    if max_orb <= 0.0 {
        return 1.0;
    }
    (1.0 - 0.5 * orb / max_orb).clamp(0.5, 1.0)
}

fn aspect_weights(aspects: &[SynastryAspect], orbs: &OrbTable) -> (f64, f64) {
    aspects.iter().fold((0.0, 0.0), |(h, c), aspect| {
        let weight = tightness(aspect.orb, orbs.max_orb(aspect.kind));
        match aspect.nature {
            AspectNature::Harmonious => (h + weight, c),
            AspectNature::Challenging => (h, c + weight),
            AspectNature::Neutral => (h, c),
        }
    })
}

/// Strictly increasing in `harmonious`, strictly decreasing in `challenging`.
pub fn aspect_component(harmonious: f64, challenging: f64) -> f64 {
    ASPECT_BASE + ASPECT_BASE * (harmonious - challenging) / (harmonious + challenging + ASPECT_DAMPING)
}

pub fn element_balance(user: &NatalTriad, partner: &NatalTriad) -> ElementBalance {
    let mut balance = ElementBalance::default();
    for sign in user.signs().into_iter().chain(partner.signs()) {
        balance.add(sign.element());
    }
    balance
}

/// Category counts among aspects of one nature, most populous first. Equal
/// counts keep canonical category order.
fn ranked_categories(aspects: &[SynastryAspect], nature: AspectNature) -> Vec<AspectCategory> {
    let mut counts: BTreeMap<AspectCategory, usize> = BTreeMap::new();
    for aspect in aspects.iter().filter(|a| a.nature == nature) {
        *counts.entry(aspect.category).or_default() += 1;
    }
    let mut ranked: Vec<(AspectCategory, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().map(|(category, _)| category).collect()
}

fn strengths(aspects: &[SynastryAspect], matches: [&SignMatch; 3]) -> Vec<String> {
    let mut lines: Vec<String> = ranked_categories(aspects, AspectNature::Harmonious)
        .into_iter()
        .take(MAX_LINES)
        .map(|category| strength_line(category).to_string())
        .collect();

    if let Some(line) = best_sign_match_line(matches) {
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(FALLBACK_STRENGTH.to_string());
    }
    lines
}

fn growth_edges(aspects: &[SynastryAspect], balance: &ElementBalance, sun_match: &SignMatch) -> Vec<String> {
    let mut lines: Vec<String> = ranked_categories(aspects, AspectNature::Challenging)
        .into_iter()
        .take(MAX_LINES)
        .map(|category| growth_line(category).to_string())
        .collect();

    if let Some(line) = shared_modality_line(sun_match) {
        lines.push(line);
    }

    if let Some(missing) = Element::ALL.into_iter().find(|e| balance.count(*e) == 0) {
        lines.push(missing_element_line(missing).to_string());
    }
    if lines.is_empty() {
        lines.push(FALLBACK_GROWTH_EDGE.to_string());
    }
    lines
}

fn best_sign_match_line(matches: [&SignMatch; 3]) -> Option<String> {
    const POSITIONS: [&str; 3] = ["Sun", "Moon", "Rising"];

    let pick = |quality: MatchQuality| {
        matches
            .iter()
            .zip(POSITIONS)
            .find(|(m, _)| m.quality == quality)
            .map(|(m, position)| (**m, position))
    };

    if let Some((m, position)) = pick(MatchQuality::Perfect) {
        return Some(format!(
            "You share a {} {} sign, so you recognise yourselves in each other.",
            m.user_sign, position
        ));
    }
    pick(MatchQuality::Great).map(|(m, position)| {
        format!(
            "Your {} signs ({} and {}) share the {} element and move at the same rhythm.",
            position,
            m.user_sign,
            m.partner_sign,
            m.user_sign.element()
        )
    })
}

/// Different Sun signs of the same modality sit square or opposite and
/// tend to pull the same way at once.
fn shared_modality_line(sun_match: &SignMatch) -> Option<String> {
    let (a, b) = (sun_match.user_sign, sun_match.partner_sign);
    if a == b || a.modality() != b.modality() {
        return None;
    }
    let habit = match a.modality() {
        Modality::Cardinal => "both want to lead; take turns setting the direction",
        Modality::Fixed => "both dig in; decide ahead of time who yields on what",
        Modality::Mutable => "both adapt; make sure someone actually commits to the plan",
    };
    Some(format!(
        "Your Suns ({} and {}) are both {} signs: you {}.",
        a,
        b,
        a.modality(),
        habit
    ))
}

fn strength_line(category: AspectCategory) -> &'static str {
    match category {
        AspectCategory::Chemistry => "Easy physical chemistry: attraction flows without having to be chased.",
        AspectCategory::Emotional => "Deep emotional attunement: you feel understood without long explanations.",
        AspectCategory::Friction => "Even your sparks are productive: disagreements tend to clear the air.",
        AspectCategory::Growth => "You bring out each other's best and grow steadier together over time.",
        AspectCategory::Karmic => "A strong sense of purpose: this connection feels meant to teach you both.",
        AspectCategory::Communication => "Conversation comes naturally and ideas bounce easily between you.",
    }
}

fn growth_line(category: AspectCategory) -> &'static str {
    match category {
        AspectCategory::Chemistry => "Desire can turn into push and pull; name what you want instead of testing each other.",
        AspectCategory::Emotional => "Your emotional needs differ; check in before assuming how the other feels.",
        AspectCategory::Friction => "Tempers can clash quickly; agree on how to pause a heated moment.",
        AspectCategory::Growth => "One of you may feel held back; make room for each other's ambitions.",
        AspectCategory::Karmic => "Old patterns resurface here; notice when a reaction belongs to the past.",
        AspectCategory::Communication => "You can talk past each other; slow down and repeat back what you heard.",
    }
}

fn missing_element_line(element: Element) -> &'static str {
    match element {
        Element::Fire => "Neither of you has Fire in your big three; plan spontaneity so routine doesn't dim the spark.",
        Element::Earth => "Neither of you has Earth in your big three; shared routines and practical plans will ground you.",
        Element::Air => "Neither of you has Air in your big three; make time to talk things through out loud.",
        Element::Water => "Neither of you has Water in your big three; say your feelings plainly rather than expecting them to be read.",
    }
}
