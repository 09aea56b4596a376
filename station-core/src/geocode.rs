//! City name to coordinates lookup through the OpenWeather geocoding API.

use serde_json::Value;
use tracing::{error, info};

use crate::download::{Downloader, scratch_buffer};
use crate::endpoint::Endpoints;
use crate::error::GeocodeError;
use crate::model::Coordinates;
use crate::parser;

pub const DEFAULT_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone)]
pub struct GeocodingResolver {
    downloader: Downloader,
    endpoints: Endpoints,
    buffer_size: usize,
}

impl GeocodingResolver {
    pub fn new(downloader: Downloader, endpoints: Endpoints) -> Self {
        Self::with_buffer_size(downloader, endpoints, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(downloader: Downloader, endpoints: Endpoints, buffer_size: usize) -> Self {
        Self {
            downloader,
            endpoints,
            buffer_size,
        }
    }

    /// Look up `city`. Any failure yields zero-valued [`Coordinates`].
    pub async fn resolve(&self, city: &str, api_key: &str) -> Coordinates {
        match self.try_resolve(city, api_key).await {
            Ok(coord) => coord,
            Err(e) => {
                error!(%city, error = %e, "geocoding failed");
                Coordinates::default()
            }
        }
    }

    /// Look up `city`, reporting why it failed. A (0, 0) result counts as a
    /// failure, same as [`resolve`](Self::resolve).
    pub async fn try_resolve(&self, city: &str, api_key: &str) -> Result<Coordinates, GeocodeError> {
        let url = self.endpoints.geocoding(city, api_key);

        let doc = {
            let mut buffer = scratch_buffer(self.buffer_size)
                .ok_or(GeocodeError::Allocation { bytes: self.buffer_size })?;
            let written = self.downloader.download(&url, &mut buffer).await?;
            parser::parse_document(&buffer[..written])?
        };

        let first = match &doc {
            Value::Array(entries) => entries
                .first()
                .ok_or_else(|| GeocodeError::Empty(city.to_string()))?,
            _ => return Err(GeocodeError::NotAnArray),
        };

        let mut coord = Coordinates::default();
        parser::parse_coordinates(first, &mut coord);

        if coord.is_unset() {
            return Err(GeocodeError::UnsetCoordinates);
        }

        info!(
            %city,
            lat = coord.latitude,
            lon = coord.longitude,
            timezone = %coord.timezone,
            "resolved coordinates"
        );
        Ok(coord)
    }
}
