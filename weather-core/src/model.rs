use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// A validated city lookup. The name is stored trimmed and is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    city: String,
}

impl WeatherQuery {
    /// Rejects empty or whitespace-only names with `CITY_NOT_FOUND`.
    pub fn new(city: &str) -> Result<Self, ServiceError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(ServiceError::city_not_found("City name cannot be empty"));
        }

        Ok(Self {
            city: city.to_string(),
        })
    }

    pub fn city(&self) -> &str {
        &self.city
    }
}

/// Normalized current conditions, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Percent.
    pub humidity: u8,
    /// hPa.
    pub pressure: u32,
    pub description: String,
    /// Metres per second.
    pub wind_speed: f64,
    /// City name as resolved upstream; may differ from the query.
    pub city: String,
    /// ISO 3166 alpha-2 country code.
    pub country: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn query_trims_city() {
        let q = WeatherQuery::new("  London ").unwrap();
        assert_eq!(q.city(), "London");
    }

    #[test]
    fn query_rejects_blank_input() {
        for input in ["", " ", "\t\n", "   "] {
            let err = WeatherQuery::new(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CityNotFound, "input {input:?}");
        }
    }

    #[test]
    fn result_serializes_with_public_field_names() {
        let result = WeatherResult {
            temperature: 20.5,
            humidity: 65,
            pressure: 1015,
            description: "clear sky".into(),
            wind_speed: 5.2,
            city: "London".into(),
            country: "GB".into(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "temperature": 20.5,
                "humidity": 65,
                "pressure": 1015,
                "description": "clear sky",
                "wind_speed": 5.2,
                "city": "London",
                "country": "GB",
            })
        );
    }
}
