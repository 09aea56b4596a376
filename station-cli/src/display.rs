//! Plain-text rendering of weather data for the terminal.

use chrono::{DateTime, FixedOffset};
use station_core::model::unix_to_utc;
use station_core::{
    Coordinates, CurrentWeather, DailyForecast, HourlyForecast, PrecipitationIntensity,
    WeatherSnapshot,
};

const HOURS_SHOWN: usize = 12;

fn local_time(timestamp: i64, coord: &Coordinates) -> Option<DateTime<FixedOffset>> {
    let offset = coord.local_offset()?;
    unix_to_utc(timestamp).map(|t| t.with_timezone(&offset))
}

fn clock(timestamp: i64, coord: &Coordinates) -> String {
    local_time(timestamp, coord)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// One line describing current conditions, printed on each display refresh.
pub fn summary_line(coord: &Coordinates, current: &CurrentWeather) -> String {
    let description = if current.weather.description.is_empty() {
        "no data"
    } else {
        current.weather.description.as_str()
    };

    format!(
        "{} {:.1}°C (feels like {:.1}°C), {}, wind {:.1} m/s {}, humidity {}%",
        clock(current.timestamp, coord),
        current.temperature,
        current.feels_like,
        description,
        current.wind.speed,
        current.wind.cardinal(),
        current.atmospheric.humidity,
    )
}

fn intensity_symbol(intensity: PrecipitationIntensity) -> char {
    match intensity {
        PrecipitationIntensity::None => '_',
        PrecipitationIntensity::Light => '.',
        PrecipitationIntensity::Moderate => ':',
        PrecipitationIntensity::Heavy => '|',
        PrecipitationIntensity::Extreme => '#',
    }
}

/// Next-hour rain as one symbol per minute.
pub fn precipitation_strip(scaled: &[i32]) -> String {
    let strip: String = scaled
        .iter()
        .map(|mm| intensity_symbol(PrecipitationIntensity::from_scaled(*mm)))
        .collect();
    let peak = scaled.iter().copied().max().unwrap_or(0);

    format!("rain [{strip}] peak {peak} mm/h")
}

fn hourly_line(coord: &Coordinates, hour: &HourlyForecast) -> String {
    format!(
        "  {}  {:>5.1}°C  {:>3.0}%  {:>4.1} m/s {:<3}  {}",
        clock(hour.timestamp, coord),
        hour.temperature,
        hour.pop * 100.0,
        hour.wind.speed,
        hour.wind.cardinal(),
        hour.weather.description,
    )
}

fn daily_line(coord: &Coordinates, day: &DailyForecast) -> String {
    let date = local_time(day.timestamp, coord)
        .map(|t| t.format("%a %d").to_string())
        .unwrap_or_else(|| "------".to_string());

    format!(
        "  {}  {:>5.1} / {:>5.1}°C  {:>3.0}%  {:>5.1} mm  {}",
        date,
        day.temperature.min,
        day.temperature.max,
        day.pop * 100.0,
        day.rain + day.snow,
        day.weather.description,
    )
}

/// Multi-line report of the full snapshot. Empty forecast slots are skipped.
pub fn render_snapshot(snapshot: &WeatherSnapshot) -> String {
    let coord = &snapshot.coord;
    let mut lines = vec![
        format!(
            "Weather at {:.4}, {:.4} ({})",
            coord.latitude, coord.longitude, coord.timezone
        ),
        summary_line(coord, &snapshot.current),
    ];

    if let (Some(sunrise), Some(sunset)) = (
        local_time(snapshot.current.sunrise, coord),
        local_time(snapshot.current.sunset, coord),
    ) {
        lines.push(format!(
            "sunrise {} / sunset {}",
            sunrise.format("%H:%M"),
            sunset.format("%H:%M")
        ));
    }

    lines.push(precipitation_strip(&snapshot.scaled_minutely_precipitation()));

    lines.push("Next hours:".to_string());
    lines.extend(
        snapshot
            .hourly
            .iter()
            .filter(|h| h.timestamp != 0)
            .take(HOURS_SHOWN)
            .map(|h| hourly_line(coord, h)),
    );

    lines.push("Next days:".to_string());
    lines.extend(
        snapshot
            .daily
            .iter()
            .filter(|d| d.timestamp != 0)
            .map(|d| daily_line(coord, d)),
    );

    lines.join("\n")
}
