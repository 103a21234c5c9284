use super::*;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NarrativeError {
    #[error("Narrative service unavailable: {0}")]
    Unavailable(String),
    #[error("Narrative request rejected: {0}")]
    Rejected(String),
}

/// Something that turns a prompt into prose, usually a remote language model.
pub trait NarrativeService {
    fn generate_narrative(&self, prompt: &str) -> std::result::Result<String, NarrativeError>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
}

/// Prompt built only from the structured report, one fact per line.
pub fn compose_prompt(bundle: &SynastryBundle, user_label: &str, partner_label: &str) -> String {
    let couple = &bundle.couple_report;
    let balance = &couple.element_balance;

    let mut lines = vec![
        format!("Write a warm, honest compatibility reading for {} and {}.", user_label, partner_label),
        format!("Score: {}/100 ({}).", couple.overall_score, couple.tier),
    ];
    for (label, triad) in [(user_label, &couple.user_triad), (partner_label, &couple.partner_triad)] {
        lines.push(format!(
            "{}: Sun {}, Moon {}, Rising {}.",
            label, triad.sun, triad.moon, triad.rising
        ));
    }
    lines.push(format!(
        "Elements: fire {}, earth {}, air {}, water {}.",
        balance.fire, balance.earth, balance.air, balance.water
    ));

    for category in AspectCategory::ALL {
        let aspects = bundle.synastry_report.category(category);
        if aspects.is_empty() {
            continue;
        }
        let listed: Vec<String> = aspects
            .iter()
            .map(|a| format!("{} {} {} ({:.1}°)", a.planet1.name, a.kind, a.planet2.name, a.orb))
            .collect();
        lines.push(format!("{}: {}.", category.name(), listed.join(", ")));
    }

    if !bundle.user_accuracy.is_precise() || !bundle.partner_accuracy.is_precise() {
        lines.push("Some Moon or Rising placements are approximate; hedge accordingly.".to_string());
    }
    lines.join("\n")
}

/// Deterministic text from the report's own bullets.
pub fn fallback_text(bundle: &SynastryBundle) -> String {
    let couple = &bundle.couple_report;
    format!(
        "{} ({}/100). Strengths: {} Growth edges: {}",
        couple.tier,
        couple.overall_score,
        couple.strengths.join(" "),
        couple.growth_edges.join(" ")
    )
}

/// Asks `service` for prose. Any failure or empty reply falls back to the
/// structured text, so callers always get something to show.
pub fn narrate<S: NarrativeService + ?Sized>(
    service: &S,
    bundle: &SynastryBundle,
    user_label: &str,
    partner_label: &str,
) -> Narrative {
    let prompt = compose_prompt(bundle, user_label, partner_label);
    match service.generate_narrative(&prompt) {
        Ok(text) if !text.trim().is_empty() => Narrative {
            text,
            source: NarrativeSource::Generated,
        },
        Ok(_) => {
            tracing::warn!("narrative service returned empty text, using fallback");
            Narrative {
                text: fallback_text(bundle),
                source: NarrativeSource::Fallback,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "narrative generation failed, using fallback");
            Narrative {
                text: fallback_text(bundle),
                source: NarrativeSource::Fallback,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl NarrativeService for Echo {
        fn generate_narrative(&self, prompt: &str) -> std::result::Result<String, NarrativeError> {
            Ok(format!("reading: {}", prompt.lines().next().unwrap_or_default()))
        }
    }

    struct Down;

    impl NarrativeService for Down {
        fn generate_narrative(&self, _prompt: &str) -> std::result::Result<String, NarrativeError> {
            Err(NarrativeError::Unavailable("timeout".to_string()))
        }
    }

    fn bundle() -> SynastryBundle {
        let user = BirthData::new("1991-06-18").with_time("07:10").with_utc_offset(5.5);
        let partner = BirthData::new("1990-04-05");
        build_report(&user, &partner, "Asha", "Ravi").unwrap()
    }

    #[test]
    fn prompt_mentions_both_people_and_score() {
        let bundle = bundle();
        let prompt = compose_prompt(&bundle, "Asha", "Ravi");
        assert!(prompt.contains("Asha and Ravi"));
        assert!(prompt.contains(&format!("{}/100", bundle.couple_report.overall_score)));
        assert!(prompt.contains("approximate"));
    }

    #[test]
    fn prompt_lists_each_populated_category_once() {
        let bundle = bundle();
        let prompt = compose_prompt(&bundle, "Asha", "Ravi");
        assert!(prompt.lines().next().unwrap().starts_with("Write a warm"));
        assert!(!prompt.ends_with('\n'));
        for category in AspectCategory::ALL {
            let header = format!("{}: ", category.name());
            let expected = usize::from(!bundle.synastry_report.category(category).is_empty());
            assert_eq!(prompt.lines().filter(|l| l.starts_with(&header)).count(), expected, "{header}");
        }
    }

    #[test]
    fn generated_text_is_used() {
        let narrative = narrate(&Echo, &bundle(), "Asha", "Ravi");
        assert_eq!(narrative.source, NarrativeSource::Generated);
        assert!(narrative.text.starts_with("reading: "));
    }

    #[test]
    fn service_failure_falls_back() {
        let bundle = bundle();
        let narrative = narrate(&Down, &bundle, "Asha", "Ravi");
        assert_eq!(narrative.source, NarrativeSource::Fallback);
        assert!(narrative.text.contains(&bundle.couple_report.strengths[0]));
    }
}
