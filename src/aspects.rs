use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    pub nature: AspectNature,
    pub category: AspectCategory,
}

pub fn nature_of(kind: AspectKind) -> AspectNature {
    match kind {
        AspectKind::Conjunction | AspectKind::Trine | AspectKind::Sextile => AspectNature::Harmonious,
        AspectKind::Square | AspectKind::Opposition => AspectNature::Challenging,
        AspectKind::Quincunx | AspectKind::SemiSextile => AspectNature::Neutral,
    }
}

/// Nature comes from the aspect kind, category from the planet pair. The two
/// are independent: a Venus-Mars square is challenging chemistry.
pub fn classify(kind: AspectKind, body1: CelestialBody, body2: CelestialBody) -> Classification {
    let nature = nature_of(kind);
    Classification {
        nature,
        category: category_of(body1, body2, nature),
    }
}

fn category_of(body1: CelestialBody, body2: CelestialBody, nature: AspectNature) -> AspectCategory {
    use AspectCategory::*;
    use CelestialBody::*;

    // Order-independent: look the pair up in canonical order.
    let pair = if body1 <= body2 { (body1, body2) } else { (body2, body1) };
    let hard = nature == AspectNature::Challenging;

    match pair {
        (_, NorthNode) => Karmic,
        (Venus, Mars) | (Mars, Mars) | (Sun, Venus) | (Venus, Pluto) | (Mars, Pluto) => Chemistry,
        (Moon, Moon) | (Moon, Venus) | (Sun, Moon) | (Moon, Neptune) | (Venus, Venus) => Emotional,
        (Sun, Saturn) | (Moon, Saturn) | (Mars, Saturn) => {
            if hard {
                Friction
            } else {
                Growth
            }
        }
        (Sun, Mars) | (Moon, Mars) | (Mars, Uranus) => {
            if hard {
                Friction
            } else {
                Chemistry
            }
        }
        (Sun, Sun) | (Sun, Jupiter) | (Moon, Jupiter) | (Venus, Jupiter) | (Jupiter, Jupiter) | (Jupiter, Saturn) => {
            Growth
        }
        (Sun, Pluto) | (Moon, Pluto) | (Venus, Saturn) => Karmic,
        (Mercury, _) | (_, Mercury) => Communication,
        _ => Communication,
    }
}

/// Closest aspect within orb for two longitudes, as `(kind, raw orb)`.
/// Equal orbs resolve to the kind listed first in `AspectKind::ALL`.
pub fn find_aspect(lon1: f64, lon2: f64, config: &SynastryConfig) -> Option<(AspectKind, f64)> {
    let delta = angular_separation(lon1, lon2);
    config
        .enabled_kinds()
        .filter_map(|kind| {
            let orb = (delta - kind.angle()).abs();
            (orb <= config.max_orb(kind)).then_some((kind, orb))
        })
        .fold(None, |best, candidate| match best {
            Some((_, best_orb)) if best_orb <= candidate.1 => best,
            _ => Some(candidate),
        })
}

/// One decimal, never past the kind's limit.
fn recorded_orb(raw_orb: f64, max_orb: f64) -> f64 {
    ((raw_orb * 10.0).round() / 10.0).min(max_orb)
}

fn aspect_between(
    planet1: &PlanetPlacement,
    planet2: &PlanetPlacement,
    config: &SynastryConfig,
    person1_label: &str,
    person2_label: &str,
) -> Option<SynastryAspect> {
    let (kind, raw_orb) = find_aspect(planet1.longitude(), planet2.longitude(), config)?;
    let Classification { nature, category } = classify(kind, planet1.id, planet2.id);
    let orb = recorded_orb(raw_orb, config.max_orb(kind));

    tracing::trace!(
        planet1 = %planet1.id,
        planet2 = %planet2.id,
        kind = %kind,
        orb,
        category = category.name(),
        "aspect"
    );

    Some(SynastryAspect {
        planet1: planet1.clone(),
        planet2: planet2.clone(),
        kind,
        symbol: kind.symbol().to_string(),
        orb,
        nature,
        category,
        person1_label: person1_label.to_string(),
        person2_label: person2_label.to_string(),
    })
}

fn canonical(planets: &[PlanetPlacement]) -> Vec<&PlanetPlacement> {
    let mut sorted: Vec<&PlanetPlacement> = planets.iter().collect();
    sorted.sort_by_key(|p| p.id);
    sorted
}

/// Cross-chart aspects: every planet of the first chart against every planet
/// of the second, iterated in canonical body order.
pub fn detect_aspects(
    planets1: &[PlanetPlacement],
    planets2: &[PlanetPlacement],
    config: &SynastryConfig,
    person1_label: &str,
    person2_label: &str,
) -> Vec<SynastryAspect> {
    let second = canonical(planets2);
    canonical(planets1)
        .into_iter()
        .flat_map(|p1| {
            second
                .iter()
                .filter_map(move |p2| aspect_between(p1, p2, config, person1_label, person2_label))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Aspects within a single chart. Each unordered pair once, no self-pairs.
pub fn detect_natal_aspects(planets: &[PlanetPlacement], config: &SynastryConfig, label: &str) -> Vec<SynastryAspect> {
    let sorted = canonical(planets);
    let mut aspects = Vec::new();
    for (i, p1) in sorted.iter().enumerate() {
        for p2 in sorted.iter().skip(i + 1) {
            if p1.id == p2.id {
                continue;
            }
            if let Some(aspect) = aspect_between(p1, p2, config, label, label) {
                aspects.push(aspect);
            }
        }
    }
    aspects
}
