//! Maps a One Call JSON document onto a [`WeatherSnapshot`].
//!
//! The API response is treated as untrusted: a missing key or a value of the
//! wrong type becomes zero (or an empty string) instead of an error. Only a
//! document that is not JSON at all is rejected.

use serde_json::Value;
use tracing::error;

use crate::model::{
    AtmosphericForecast, CONDITION_DESCRIPTION_CAPACITY, CONDITION_ICON_CAPACITY,
    CONDITION_MAIN_CAPACITY, Coordinates, CurrentWeather, DailyForecast, HourlyForecast,
    MinutelyForecast, TIMEZONE_CAPACITY, TemperatureForecast, WeatherCondition, WeatherSnapshot,
    WindForecast, assign_bounded,
};

/// Parse `raw` and map it into `out`. Returns `false` only on a JSON syntax
/// error, in which case `out` is left untouched.
pub fn parse(raw: &[u8], out: &mut WeatherSnapshot) -> bool {
    match parse_document(raw) {
        Ok(doc) => {
            apply(&doc, out);
            true
        }
        Err(e) => {
            error!(error = %e, "error parsing forecast JSON");
            false
        }
    }
}

/// Syntax check only; nothing is mapped.
pub fn parse_document(raw: &[u8]) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(raw)
}

/// Overwrite every field of `out` from `doc`.
pub fn apply(doc: &Value, out: &mut WeatherSnapshot) {
    parse_coordinates(doc, &mut out.coord);
    parse_current(doc, &mut out.current);
    parse_minutely(doc, &mut out.minutely);
    parse_hourly(doc, &mut out.hourly);
    parse_daily(doc, &mut out.daily);
}

fn float(node: &Value, key: &str) -> f32 {
    double(node, key) as f32
}

fn double(node: &Value, key: &str) -> f64 {
    node.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn int(node: &Value, key: &str) -> i32 {
    long(node, key).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

fn long(node: &Value, key: &str) -> i64 {
    match node.get(key) {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        None => 0,
    }
}

fn string_into(node: &Value, key: &str, dest: &mut String, capacity: usize) {
    let src = node.get(key).and_then(Value::as_str).unwrap_or("");
    assign_bounded(dest, src, capacity);
}

/// Fills `coord` from the `lat`/`lon`/`timezone`/`timezone_offset` keys of
/// `node`. Used for both the one-call root and a geocoding entry.
pub fn parse_coordinates(node: &Value, coord: &mut Coordinates) {
    coord.latitude = double(node, "lat");
    coord.longitude = double(node, "lon");
    coord.timezone_offset = int(node, "timezone_offset");
    string_into(node, "timezone", &mut coord.timezone, TIMEZONE_CAPACITY);
}

fn parse_wind(node: &Value, wind: &mut WindForecast) {
    wind.speed = float(node, "wind_speed");
    wind.degree = int(node, "wind_deg");
    wind.gust = float(node, "wind_gust");
}

fn parse_atmospheric(node: &Value, atmospheric: &mut AtmosphericForecast) {
    atmospheric.pressure = int(node, "pressure");
    atmospheric.humidity = int(node, "humidity");
    atmospheric.dew_point = float(node, "dew_point");
    atmospheric.uvi = float(node, "uvi");
    atmospheric.clouds = int(node, "clouds");
    atmospheric.visibility = int(node, "visibility");
}

fn parse_condition(node: &Value, weather: &mut WeatherCondition) {
    let first = node
        .get("weather")
        .and_then(Value::as_array)
        .and_then(|entries| entries.first());

    match first {
        Some(entry) => {
            weather.id = int(entry, "id");
            string_into(entry, "main", &mut weather.main, CONDITION_MAIN_CAPACITY);
            string_into(entry, "description", &mut weather.description, CONDITION_DESCRIPTION_CAPACITY);
            string_into(entry, "icon", &mut weather.icon, CONDITION_ICON_CAPACITY);
        }
        None => *weather = WeatherCondition::default(),
    }
}

fn parse_temperature(node: Option<&Value>, temperature: &mut TemperatureForecast) {
    match node.filter(|v| v.is_object()) {
        Some(node) => {
            temperature.day = float(node, "day");
            temperature.min = float(node, "min");
            temperature.max = float(node, "max");
            temperature.night = float(node, "night");
            temperature.eve = float(node, "eve");
            temperature.morn = float(node, "morn");
        }
        None => *temperature = TemperatureForecast::default(),
    }
}

fn parse_current(root: &Value, current: &mut CurrentWeather) {
    let Some(node) = root.get("current").filter(|v| v.is_object()) else {
        *current = CurrentWeather::default();
        return;
    };

    current.timestamp = long(node, "dt");
    current.sunrise = long(node, "sunrise");
    current.sunset = long(node, "sunset");
    current.temperature = float(node, "temp");
    current.feels_like = float(node, "feels_like");
    parse_wind(node, &mut current.wind);
    parse_atmospheric(node, &mut current.atmospheric);
    parse_condition(node, &mut current.weather);
}

/// Zero every slot, then return the source entries of `root[key]`. Callers
/// zip them with `slots`, which drops whatever does not fit.
fn entries<'a, T: Default>(root: &'a Value, key: &str, slots: &mut [T]) -> &'a [Value] {
    slots.iter_mut().for_each(|slot| *slot = T::default());

    root.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn parse_minutely(root: &Value, minutely: &mut [MinutelyForecast]) {
    let items = entries(root, "minutely", minutely);
    for (slot, item) in minutely.iter_mut().zip(items) {
        slot.timestamp = long(item, "dt");
        slot.precipitation = float(item, "precipitation");
    }
}

fn parse_hourly(root: &Value, hourly: &mut [HourlyForecast]) {
    let items = entries(root, "hourly", hourly);
    for (slot, item) in hourly.iter_mut().zip(items) {
        slot.timestamp = long(item, "dt");
        slot.temperature = float(item, "temp");
        slot.feels_like = float(item, "feels_like");
        parse_atmospheric(item, &mut slot.atmospheric);
        parse_wind(item, &mut slot.wind);
        parse_condition(item, &mut slot.weather);
        slot.pop = float(item, "pop");
    }
}

fn parse_daily(root: &Value, daily: &mut [DailyForecast]) {
    let items = entries(root, "daily", daily);
    for (slot, item) in daily.iter_mut().zip(items) {
        slot.timestamp = long(item, "dt");
        parse_temperature(item.get("temp"), &mut slot.temperature);
        parse_temperature(item.get("feels_like"), &mut slot.feels_like);
        parse_atmospheric(item, &mut slot.atmospheric);
        parse_wind(item, &mut slot.wind);
        parse_condition(item, &mut slot.weather);
        slot.pop = float(item, "pop");
        slot.rain = float(item, "rain");
        slot.snow = float(item, "snow");
    }
}
