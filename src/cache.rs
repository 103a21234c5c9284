use std::collections::HashMap;
use std::fmt;

use serde_json::json;
use sha2::{Digest, Sha256};

use super::*;

/// Stable identity of a compatibility request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// SHA-256 of the normalized request. Whitespace around text fields and
    /// coordinate noise past four decimals do not change the key.
    pub fn for_pair(user: &BirthData, partner: &BirthData, user_label: &str, partner_label: &str) -> Self {
        let normalized = json!({
            "user": normalize(user),
            "partner": normalize(partner),
            "userLabel": user_label.trim(),
            "partnerLabel": partner_label.trim(),
        });
        let mut hasher = Sha256::new();
        hasher.update(normalized.to_string().as_bytes());
        CacheKey(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn normalize(birth: &BirthData) -> serde_json::Value {
    let trimmed = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let rounded = |value: Option<f64>| value.map(|v| (v * 10_000.0).round() / 10_000.0);

    json!({
        "birthday": birth.birthday.trim(),
        "birthTime": trimmed(&birth.birth_time),
        "location": trimmed(&birth.location),
        "latitude": rounded(birth.latitude),
        "longitude": rounded(birth.longitude),
        "utcOffset": birth.utc_offset,
    })
}

/// Storage for finished reports, owned by the caller.
pub trait ReportCache {
    fn get(&self, key: &CacheKey) -> Option<SynastryBundle>;
    fn put(&mut self, key: CacheKey, bundle: SynastryBundle);
}

#[derive(Debug, Default)]
pub struct MemoryReportCache {
    entries: HashMap<CacheKey, SynastryBundle>,
}

impl MemoryReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReportCache for MemoryReportCache {
    fn get(&self, key: &CacheKey) -> Option<SynastryBundle> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: CacheKey, bundle: SynastryBundle) {
        self.entries.insert(key, bundle);
    }
}

/// Returns the cached bundle for this request, building and storing it on a miss.
pub fn cached_report<C: ReportCache + ?Sized>(
    engine: &SynastryEngine,
    cache: &mut C,
    user: &BirthData,
    partner: &BirthData,
    user_label: &str,
    partner_label: &str,
) -> Result<SynastryBundle> {
    let key = CacheKey::for_pair(user, partner, user_label, partner_label);
    if let Some(bundle) = cache.get(&key) {
        tracing::debug!(%key, "report cache hit");
        return Ok(bundle);
    }

    let bundle = engine.build_report(user, partner, user_label, partner_label)?;
    tracing::debug!(%key, "report cache miss");
    cache.put(key, bundle.clone());
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> BirthData {
        BirthData::new("1991-06-18")
            .with_time("07:10")
            .with_coordinates(10.522, 76.172)
            .with_utc_offset(5.5)
    }

    #[test]
    fn key_is_stable_hex() {
        let partner = BirthData::new("1990-10-08");
        let a = CacheKey::for_pair(&user(), &partner, "Me", "Them");
        let b = CacheKey::for_pair(&user(), &partner, "Me", "Them");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn key_ignores_noise_but_not_content() {
        let partner = BirthData::new("1990-10-08");
        let base = CacheKey::for_pair(&user(), &partner, "Me", "Them");

        let mut noisy = user();
        noisy.birthday = " 1991-06-18 ".to_string();
        noisy.latitude = Some(10.522_000_01);
        assert_eq!(CacheKey::for_pair(&noisy, &partner, " Me", "Them "), base);

        assert_ne!(CacheKey::for_pair(&partner, &user(), "Me", "Them"), base);
        assert_ne!(CacheKey::for_pair(&user(), &partner, "Me", "Partner"), base);
        assert_ne!(CacheKey::for_pair(&user().with_time("07:11"), &partner, "Me", "Them"), base);
    }

    #[test]
    fn second_request_is_served_from_cache() {
        let engine = SynastryEngine::default();
        let mut cache = MemoryReportCache::new();
        let partner = BirthData::new("1990-10-08");

        let first = cached_report(&engine, &mut cache, &user(), &partner, "Me", "Them").unwrap();
        assert_eq!(cache.len(), 1);
        let second = cached_report(&engine, &mut cache, &user(), &partner, "Me", "Them").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn failures_are_not_cached() {
        let engine = SynastryEngine::default();
        let mut cache = MemoryReportCache::new();
        assert!(cached_report(&engine, &mut cache, &user(), &BirthData::new("soon"), "Me", "Them").is_err());
        assert!(cache.is_empty());
    }
}
