use std::path::Path;

use aztro_synastry::{AstrologyError, BirthData, SynastryBundle, SynastryConfig, SynastryEngine};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CONFIG_ENV: &str = "AZTRO_SYNASTRY_CONFIG";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynastryRequest {
    user: BirthData,
    partner: BirthData,
    #[serde(default = "default_user_label")]
    user_label: String,
    #[serde(default = "default_partner_label")]
    partner_label: String,
}

fn default_user_label() -> String {
    "You".to_string()
}

fn default_partner_label() -> String {
    "Partner".to_string()
}

impl Default for SynastryRequest {
    fn default() -> Self {
        // Two births on the Kerala coast, local time UTC+5:30.
        let user = BirthData::new("1991-06-18")
            .with_time("07:10")
            .with_location("Calicut, Kerala, India")
            .with_coordinates(10.522, 76.172)
            .with_utc_offset(5.5);
        let partner = BirthData::new("1992-11-24")
            .with_time("18:30")
            .with_location("Kochi, Kerala, India")
            .with_coordinates(9.931, 76.267)
            .with_utc_offset(5.5);
        SynastryRequest {
            user,
            partner,
            user_label: default_user_label(),
            partner_label: default_partner_label(),
        }
    }
}

fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("aztro_synastry=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn load_config() -> Result<SynastryConfig, AstrologyError> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => SynastryConfig::from_file(path.trim()),
        _ => Ok(SynastryConfig::default()),
    }
}

fn load_request(path: Option<&Path>) -> Result<SynastryRequest, AstrologyError> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => {
            tracing::info!("no request file given, using the built-in pair");
            Ok(SynastryRequest::default())
        }
    }
}

fn run() -> Result<SynastryBundle, AstrologyError> {
    let config = load_config()?;
    let request_path = std::env::args().nth(1);
    let request = load_request(request_path.as_deref().map(Path::new))?;

    let engine = SynastryEngine::new(config)?;
    let bundle = engine.build_report(&request.user, &request.partner, &request.user_label, &request.partner_label)?;
    tracing::info!(
        score = bundle.couple_report.overall_score,
        tier = %bundle.couple_report.tier,
        aspects = bundle.synastry_report.aspects.len(),
        "synastry report ready"
    );
    Ok(bundle)
}

fn main() {
    init_logger();

    match run().and_then(|bundle| Ok(serde_json::to_string_pretty(&bundle)?)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::error!(error = %e, "failed to build synastry report");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
