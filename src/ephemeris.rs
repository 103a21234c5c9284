//! Approximate geocentric ecliptic longitudes for natal charts.
//!
//! Low-precision analytic models, good to a fraction of a degree for the Sun,
//! Moon and planets over the 1800-2050 range:
//! - Sun: Meeus, "Astronomical Algorithms", low-precision solar coordinates.
//! - Moon: the six largest terms of the lunar longitude series.
//! - Mercury..Pluto: Keplerian mean elements (Standish, JPL "Approximate
//!   Positions of the Planets", table 1), heliocentric minus Earth.
//! - North Node: mean ascending node.

use std::f64::consts::PI;

use chrono::Datelike;

use super::*;

/// Mean orbital elements at J2000 and their rates per Julian century:
/// semi-major axis (au), eccentricity, inclination, mean longitude,
/// longitude of perihelion, longitude of ascending node (degrees).
#[derive(Debug, Clone, Copy)]
struct OrbitalElements {
    base: [f64; 6],
    rate: [f64; 6],
}

const EARTH_MOON_BARYCENTRE: OrbitalElements = OrbitalElements {
    base: [1.00000261, 0.01671123, -0.00001531, 100.46457166, 102.93768193, 0.0],
    rate: [0.00000562, -0.00004392, -0.01294668, 35999.37244981, 0.32327364, 0.0],
};

const MERCURY: OrbitalElements = OrbitalElements {
    base: [0.38709927, 0.20563593, 7.00497902, 252.25032350, 77.45779628, 48.33076593],
    rate: [0.00000037, 0.00001906, -0.00594749, 149472.67411175, 0.16047689, -0.12534081],
};

const VENUS: OrbitalElements = OrbitalElements {
    base: [0.72333566, 0.00677672, 3.39467605, 181.97909950, 131.60246718, 76.67984255],
    rate: [0.00000390, -0.00004107, -0.00078890, 58517.81538729, 0.00268329, -0.27769418],
};

const MARS: OrbitalElements = OrbitalElements {
    base: [1.52371034, 0.09339410, 1.84969142, -4.55343205, -23.94362959, 49.55953891],
    rate: [0.00001847, 0.00007882, -0.00813131, 19140.30268499, 0.44441088, -0.29257343],
};

const JUPITER: OrbitalElements = OrbitalElements {
    base: [5.20288700, 0.04838624, 1.30439695, 34.39644051, 14.72847983, 100.47390909],
    rate: [-0.00011607, -0.00013253, -0.00183714, 3034.74612775, 0.21252668, 0.20469106],
};

const SATURN: OrbitalElements = OrbitalElements {
    base: [9.53667594, 0.05386179, 2.48599187, 49.95424423, 92.59887831, 113.66242448],
    rate: [-0.00125060, -0.00050991, 0.00193609, 1222.49362201, -0.41897216, -0.28867794],
};

const URANUS: OrbitalElements = OrbitalElements {
    base: [19.18916464, 0.04725744, 0.77263783, 313.23810451, 170.95427630, 74.01692503],
    rate: [-0.00196176, -0.00004397, -0.00242939, 428.48202785, 0.40805281, 0.04240589],
};

const NEPTUNE: OrbitalElements = OrbitalElements {
    base: [30.06992276, 0.00859048, 1.77004347, -55.12002969, 44.96476227, 131.78422574],
    rate: [0.00026291, 0.00005105, 0.00035372, 218.45945325, -0.32241464, -0.00508664],
};

const PLUTO: OrbitalElements = OrbitalElements {
    base: [39.48211675, 0.24882730, 17.14001206, 238.92903833, 224.06891629, 110.30393684],
    rate: [-0.00031596, 0.00005170, 0.00004818, 145.20780515, -0.04062942, -0.01183482],
};

impl OrbitalElements {
    /// Heliocentric ecliptic (x, y) in au at `t` Julian centuries from J2000.
    fn heliocentric_xy(&self, t: f64) -> (f64, f64) {
        let el: [f64; 6] = std::array::from_fn(|i| self.base[i] + self.rate[i] * t);
        let (a, e, incl, mean_lon, peri, node) = (el[0], el[1], el[2], el[3], el[4], el[5]);

        let arg_peri = (peri - node).to_radians();
        let mean_anomaly = normalize_degrees(mean_lon - peri).to_radians();
        let ecc_anomaly = solve_kepler(mean_anomaly, e);

        let x_orb = a * (ecc_anomaly.cos() - e);
        let y_orb = a * (1.0 - e * e).sqrt() * ecc_anomaly.sin();

        let (sw, cw) = arg_peri.sin_cos();
        let (sn, cn) = node.to_radians().sin_cos();
        let ci = incl.to_radians().cos();

        let x = (cw * cn - sw * sn * ci) * x_orb + (-sw * cn - cw * sn * ci) * y_orb;
        let y = (cw * sn + sw * cn * ci) * x_orb + (-sw * sn + cw * cn * ci) * y_orb;
        (x, y)
    }
}

/// Newton iteration on Kepler's equation `E - e sin E = M` (radians).
fn solve_kepler(mean_anomaly: f64, e: f64) -> f64 {
    let mut ecc = mean_anomaly + e * mean_anomaly.sin();
    for _ in 0..12 {
        let delta = (ecc - e * ecc.sin() - mean_anomaly) / (1.0 - e * ecc.cos());
        ecc -= delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    ecc
}

/// Chart calculator. Stateless; holds no tables beyond the constants above.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ephemeris;

impl Ephemeris {
    pub fn new() -> Self {
        Ephemeris
    }

    pub fn calculate_chart(&self, birth: &BirthData) -> Result<Chart> {
        let date = birth.parse_birthday()?;
        let (moment, has_birth_time) = birth.birth_moment()?;
        let coordinates = birth.coordinates();
        let julian_day = date_to_julian_day(moment);

        let planets: Vec<PlanetPlacement> = CelestialBody::iter()
            .map(|body| PlanetPlacement::new(body, self.body_longitude(body, julian_day)))
            .collect();

        let sun = ZodiacSign::from_date(date.month(), date.day());
        // `planets` follows canonical body order.
        let moon = planets[CelestialBody::Moon as usize].sign_id;

        let (ascendant, rising_accuracy) = match (has_birth_time, coordinates) {
            (true, Some((lat, lon))) => (self.ascendant(julian_day, lat, lon), Accuracy::Precise),
            // Time-zone meridian stands in for the birth longitude.
            (true, None) => (
                self.ascendant(julian_day, 0.0, birth.utc_offset_hours() * 15.0),
                Accuracy::Approximate,
            ),
            // Solar chart: the Sun's own degree rises.
            (false, _) => (self.sun_longitude(julian_day), Accuracy::Approximate),
        };
        let rising = if has_birth_time {
            ZodiacSign::from_longitude(ascendant)
        } else {
            sun
        };

        let accuracy = ChartAccuracy {
            has_birth_time,
            has_coordinates: coordinates.is_some(),
            moon: if has_birth_time { Accuracy::Precise } else { Accuracy::Approximate },
            rising: rising_accuracy,
        };

        tracing::debug!(
            birthday = %date,
            sun = %sun,
            moon = %moon,
            rising = %rising,
            precise = accuracy.is_precise(),
            "calculated chart"
        );

        Ok(Chart {
            triad: NatalTriad { sun, moon, rising },
            planets,
            accuracy,
            ascendant,
            julian_day,
        })
    }

    pub fn body_longitude(&self, body: CelestialBody, julian_day: JulianDay) -> f64 {
        match body {
            CelestialBody::Sun => self.sun_longitude(julian_day),
            CelestialBody::Moon => self.moon_longitude(julian_day),
            CelestialBody::NorthNode => self.mean_node_longitude(julian_day),
            CelestialBody::Mercury => self.geocentric_longitude(&MERCURY, julian_day),
            CelestialBody::Venus => self.geocentric_longitude(&VENUS, julian_day),
            CelestialBody::Mars => self.geocentric_longitude(&MARS, julian_day),
            CelestialBody::Jupiter => self.geocentric_longitude(&JUPITER, julian_day),
            CelestialBody::Saturn => self.geocentric_longitude(&SATURN, julian_day),
            CelestialBody::Uranus => self.geocentric_longitude(&URANUS, julian_day),
            CelestialBody::Neptune => self.geocentric_longitude(&NEPTUNE, julian_day),
            CelestialBody::Pluto => self.geocentric_longitude(&PLUTO, julian_day),
        }
    }

    pub fn sun_longitude(&self, julian_day: JulianDay) -> f64 {
        let n = julian_day - J2000;
        let mean_lon = 280.460 + 0.9856474 * n;
        let g = (357.528 + 0.9856003 * n).to_radians();
        normalize_degrees(mean_lon + 1.915 * g.sin() + 0.020 * (2.0 * g).sin())
    }

    pub fn moon_longitude(&self, julian_day: JulianDay) -> f64 {
        let n = julian_day - J2000;
        let mean_lon = 218.316 + 13.176396 * n;
        let moon_anomaly = (134.963 + 13.064993 * n).to_radians();
        let latitude_arg = (93.272 + 13.229350 * n).to_radians();
        let elongation = (297.850 + 12.190749 * n).to_radians();
        let sun_anomaly = (357.528 + 0.9856003 * n).to_radians();

        normalize_degrees(
            mean_lon + 6.289 * moon_anomaly.sin() - 1.274 * (moon_anomaly - 2.0 * elongation).sin()
                + 0.658 * (2.0 * elongation).sin()
                + 0.214 * (2.0 * moon_anomaly).sin()
                - 0.186 * sun_anomaly.sin()
                - 0.114 * (2.0 * latitude_arg).sin(),
        )
    }

    pub fn mean_node_longitude(&self, julian_day: JulianDay) -> f64 {
        let t = julian_centuries(julian_day);
        normalize_degrees(125.04452 - 1934.136261 * t)
    }

    fn geocentric_longitude(&self, elements: &OrbitalElements, julian_day: JulianDay) -> f64 {
        let t = julian_centuries(julian_day);
        let (px, py) = elements.heliocentric_xy(t);
        let (ex, ey) = EARTH_MOON_BARYCENTRE.heliocentric_xy(t);
        normalize_degrees((py - ey).atan2(px - ex).to_degrees())
    }

    /// Mean obliquity of the ecliptic, degrees.
    pub fn obliquity(&self, julian_day: JulianDay) -> f64 {
        23.439291 - 0.0130042 * julian_centuries(julian_day)
    }

    /// Greenwich mean sidereal time, degrees.
    pub fn gmst(&self, julian_day: JulianDay) -> f64 {
        let n = julian_day - J2000;
        let t = julian_centuries(julian_day);
        normalize_degrees(280.46061837 + 360.98564736629 * n + 0.000387933 * t * t)
    }

    /// Ecliptic longitude rising on the eastern horizon.
    /// `longitude` is degrees east of Greenwich.
    pub fn ascendant(&self, julian_day: JulianDay, latitude: f64, longitude: f64) -> f64 {
        let lst = normalize_degrees(self.gmst(julian_day) + longitude).to_radians();
        let eps = self.obliquity(julian_day).to_radians();
        // Keep clear of the pole, where the ascendant is undefined.
        let phi = latitude.clamp(-89.9, 89.9).to_radians();
        let asc = lst.cos().atan2(-(lst.sin() * eps.cos() + phi.tan() * eps.sin()));
        normalize_degrees(asc * 180.0 / PI)
    }
}

/// Chart with the default calculator.
pub fn compute_chart(birth: &BirthData) -> Result<Chart> {
    Ephemeris::new().calculate_chart(birth)
}
