use crate::model::Coordinates;
use crate::url_encode;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const GEOCODING_API_PATH: &str = "geo/1.0/direct";
const ONE_CALL_API_PATH: &str = "data/3.0/onecall";

// Matches the 384 byte location buffer of the station firmware.
const ENCODED_CITY_CAPACITY: usize = 384;

/// URL builder for the OpenWeather APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn geocoding(&self, city: &str, api_key: &str) -> String {
        let city = url_encode::encode_bounded(city, ENCODED_CITY_CAPACITY);
        let api_key = url_encode::encode(api_key);
        format!(
            "{}/{GEOCODING_API_PATH}?q={city}&limit=1&appid={api_key}",
            self.base_url
        )
    }

    pub fn one_call(&self, coord: &Coordinates, api_key: &str) -> String {
        let api_key = url_encode::encode(api_key);
        format!(
            "{}/{ONE_CALL_API_PATH}?lat={:.8}&lon={:.8}&exclude=alerts&units=metric&appid={api_key}",
            self.base_url, coord.latitude, coord.longitude
        )
    }
}

/// Replace the value of the `appid` query parameter so URLs can be logged.
pub fn redact_api_key(url: &str) -> String {
    let Some(start) = url.find("appid=").map(|i| i + "appid=".len()) else {
        return url.to_string();
    };
    let end = url[start..].find('&').map_or(url.len(), |i| start + i);
    format!("{}***{}", &url[..start], &url[end..])
}
