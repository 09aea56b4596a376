use chrono::{DateTime, FixedOffset, Utc};

pub const NUM_MINUTELY: usize = 60;
pub const NUM_HOURLY: usize = 48;
pub const NUM_DAILY: usize = 7;

// Byte capacities including the terminator slot of the device firmware, so at
// most `capacity - 1` bytes are stored.
pub const TIMEZONE_CAPACITY: usize = 32;
pub const CONDITION_MAIN_CAPACITY: usize = 32;
pub const CONDITION_DESCRIPTION_CAPACITY: usize = 64;
pub const CONDITION_ICON_CAPACITY: usize = 8;

/// Location of the station as resolved by geocoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    /// Offset from UTC in seconds.
    pub timezone_offset: i32,
}

impl Coordinates {
    /// (0, 0) is what a failed lookup produces.
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    pub fn local_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.timezone_offset)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherCondition {
    pub id: i32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindForecast {
    /// m/s
    pub speed: f32,
    pub degree: i32,
    pub gust: f32,
}

impl WindForecast {
    /// 16-point compass direction the wind blows from.
    pub fn cardinal(&self) -> &'static str {
        const POINTS: [&str; 16] = [
            "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
            "NW", "NNW",
        ];
        let degrees = self.degree.rem_euclid(360) as f32;
        POINTS[((degrees + 11.25) / 22.5) as usize % POINTS.len()]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AtmosphericForecast {
    /// hPa
    pub pressure: i32,
    /// %
    pub humidity: i32,
    pub dew_point: f32,
    pub uvi: f32,
    /// %
    pub clouds: i32,
    /// metres
    pub visibility: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentWeather {
    pub timestamp: i64,
    pub sunrise: i64,
    pub sunset: i64,
    pub temperature: f32,
    pub feels_like: f32,
    pub atmospheric: AtmosphericForecast,
    pub wind: WindForecast,
    pub weather: WeatherCondition,
}

impl CurrentWeather {
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.timestamp)
    }

    pub fn sunrise_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sunrise)
    }

    pub fn sunset_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.sunset)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MinutelyForecast {
    pub timestamp: i64,
    /// mm per minute as reported by the API.
    pub precipitation: f32,
}

impl MinutelyForecast {
    /// Precipitation converted to mm/h, truncated toward zero.
    pub fn scaled_precipitation(&self) -> i32 {
        (self.precipitation * 60.0) as i32
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlyForecast {
    pub timestamp: i64,
    pub temperature: f32,
    pub feels_like: f32,
    pub atmospheric: AtmosphericForecast,
    pub wind: WindForecast,
    pub weather: WeatherCondition,
    /// Probability of precipitation, 0.0 ..= 1.0.
    pub pop: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemperatureForecast {
    pub day: f32,
    pub min: f32,
    pub max: f32,
    pub night: f32,
    pub eve: f32,
    pub morn: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyForecast {
    pub timestamp: i64,
    pub temperature: TemperatureForecast,
    pub feels_like: TemperatureForecast,
    pub atmospheric: AtmosphericForecast,
    pub wind: WindForecast,
    pub weather: WeatherCondition,
    pub pop: f32,
    /// mm
    pub rain: f32,
    /// mm
    pub snow: f32,
}

/// Everything the station knows about the weather, stored as one unit.
///
/// The forecast arrays have fixed lengths. Slots the source did not fill hold
/// zero values.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub coord: Coordinates,
    pub current: CurrentWeather,
    pub minutely: [MinutelyForecast; NUM_MINUTELY],
    pub hourly: [HourlyForecast; NUM_HOURLY],
    pub daily: [DailyForecast; NUM_DAILY],
}

impl Default for WeatherSnapshot {
    fn default() -> Self {
        Self {
            coord: Coordinates::default(),
            current: CurrentWeather::default(),
            minutely: [MinutelyForecast::default(); NUM_MINUTELY],
            hourly: std::array::from_fn(|_| HourlyForecast::default()),
            daily: std::array::from_fn(|_| DailyForecast::default()),
        }
    }
}

impl WeatherSnapshot {
    pub fn scaled_minutely_precipitation(&self) -> [i32; NUM_MINUTELY] {
        self.minutely.map(|m| m.scaled_precipitation())
    }
}

/// Rain intensity bands for a minutely value already scaled to mm/h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrecipitationIntensity {
    None,
    Light,
    Moderate,
    Heavy,
    Extreme,
}

impl PrecipitationIntensity {
    pub const LIGHT_MAX_MM_H: i32 = 10;
    pub const MODERATE_MAX_MM_H: i32 = 30;
    pub const HEAVY_MAX_MM_H: i32 = 60;

    pub fn from_scaled(mm_per_hour: i32) -> Self {
        if mm_per_hour <= 0 {
            Self::None
        } else if mm_per_hour <= Self::LIGHT_MAX_MM_H {
            Self::Light
        } else if mm_per_hour <= Self::MODERATE_MAX_MM_H {
            Self::Moderate
        } else if mm_per_hour <= Self::HEAVY_MAX_MM_H {
            Self::Heavy
        } else {
            Self::Extreme
        }
    }
}

pub fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    if ts == 0 {
        return None;
    }
    DateTime::from_timestamp(ts, 0)
}

/// Replace `dest` with at most `capacity - 1` bytes of `src`, cut on a char
/// boundary. Reuses the existing allocation.
pub(crate) fn assign_bounded(dest: &mut String, src: &str, capacity: usize) {
    dest.clear();
    let max = capacity.saturating_sub(1);
    if src.len() <= max {
        dest.push_str(src);
        return;
    }
    let mut end = max;
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    dest.push_str(&src[..end]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_all_zero() {
        let snapshot = WeatherSnapshot::default();
        assert!(snapshot.coord.is_unset());
        assert_eq!(snapshot.current, CurrentWeather::default());
        assert!(snapshot.minutely.iter().all(|m| *m == MinutelyForecast::default()));
        assert!(snapshot.hourly.iter().all(|h| *h == HourlyForecast::default()));
        assert!(snapshot.daily.iter().all(|d| *d == DailyForecast::default()));
    }

    #[test]
    fn scaled_precipitation_converts_to_mm_per_hour() {
        let m = MinutelyForecast { timestamp: 1, precipitation: 0.5 };
        assert_eq!(m.scaled_precipitation(), 30);

        let m = MinutelyForecast { timestamp: 1, precipitation: 0.0199 };
        assert_eq!(m.scaled_precipitation(), 1);
    }

    #[test]
    fn intensity_bands() {
        assert_eq!(PrecipitationIntensity::from_scaled(0), PrecipitationIntensity::None);
        assert_eq!(PrecipitationIntensity::from_scaled(10), PrecipitationIntensity::Light);
        assert_eq!(PrecipitationIntensity::from_scaled(11), PrecipitationIntensity::Moderate);
        assert_eq!(PrecipitationIntensity::from_scaled(60), PrecipitationIntensity::Heavy);
        assert_eq!(PrecipitationIntensity::from_scaled(61), PrecipitationIntensity::Extreme);
    }

    #[test]
    fn assign_bounded_cuts_on_char_boundary() {
        let mut dest = String::from("stale");
        assign_bounded(&mut dest, "ãããã", 6);
        // Each 'ã' is two bytes; five allowed bytes fit two of them.
        assert_eq!(dest, "ãã");

        assign_bounded(&mut dest, "01d", CONDITION_ICON_CAPACITY);
        assert_eq!(dest, "01d");
    }

    #[test]
    fn unset_timestamps_have_no_datetime() {
        let current = CurrentWeather::default();
        assert!(current.observed_at().is_none());

        let current = CurrentWeather { timestamp: 1_700_000_000, ..Default::default() };
        assert_eq!(current.observed_at().map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn wind_cardinal_points() {
        let wind = |degree| WindForecast { degree, ..Default::default() };
        assert_eq!(wind(0).cardinal(), "N");
        assert_eq!(wind(11).cardinal(), "N");
        assert_eq!(wind(12).cardinal(), "NNE");
        assert_eq!(wind(140).cardinal(), "SE");
        assert_eq!(wind(350).cardinal(), "N");
        assert_eq!(wind(-90).cardinal(), "W");
    }

    #[test]
    fn local_offset_from_coordinates() {
        let coord = Coordinates { timezone_offset: -10800, ..Default::default() };
        assert_eq!(coord.local_offset().map(|o| o.local_minus_utc()), Some(-10800));
    }
}
