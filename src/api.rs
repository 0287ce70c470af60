use crate::error::NetworkError;
use crate::models::{Coordinates, GeoSearchResponse, Place};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

/// Search radius around the fix, in metres.
pub const SEARCH_RADIUS_M: u32 = 10_000;
/// Maximum number of pages the API returns in one response.
pub const RESULT_LIMIT: u32 = 10;
/// Requested thumbnail width in pixels.
pub const THUMBNAIL_SIZE: u32 = 144;

/// Anything that can list the places near a fix.
#[async_trait]
pub trait PlaceSource: Send + Sync {
    async fn nearby(&self, at: Coordinates, locale: &str) -> Result<Vec<Place>, NetworkError>;
}

/// Wikipedia geosearch client.
pub struct WikiPlaceProvider {
    client: Client,
}

impl WikiPlaceProvider {
    /// Without a timeout the client's defaults apply.
    pub fn new(timeout: Option<Duration>) -> Result<Self, NetworkError> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

pub fn endpoint(locale: &str) -> String {
    format!("https://{}.wikipedia.org/w/api.php", locale)
}

/// Query string for a geosearch around `at`, in the order the API documents it.
pub fn query_params(at: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("action", "query".to_string()),
        ("format", "json".to_string()),
        ("prop", "coordinates|pageimages|description|info".to_string()),
        ("pithumbsize", THUMBNAIL_SIZE.to_string()),
        ("generator", "geosearch".to_string()),
        ("ggsradius", SEARCH_RADIUS_M.to_string()),
        ("ggslimit", RESULT_LIMIT.to_string()),
        ("ggscoord", format!("{}|{}", at.lat, at.lon)),
        ("origin", "*".to_string()),
    ]
}

/// Decodes a geosearch response body. Anything but the expected JSON shape
/// is a [`NetworkError::Decode`].
pub fn parse_places(body: &str) -> Result<Vec<Place>, NetworkError> {
    serde_json::from_str::<GeoSearchResponse>(body)?.into_places()
}

/// Maps a non-2xx response to [`NetworkError::Status`].
pub fn check_status(status: StatusCode) -> Result<(), NetworkError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(NetworkError::Status(status.as_u16()))
    }
}

#[async_trait]
impl PlaceSource for WikiPlaceProvider {
    async fn nearby(&self, at: Coordinates, locale: &str) -> Result<Vec<Place>, NetworkError> {
        let url = endpoint(locale);
        debug!("Querying {} around ({}, {})", url, at.lat, at.lon);

        let res = self.client.get(&url).query(&query_params(at)).send().await?;
        check_status(res.status())?;

        // Decode errors here are a bad body, not a failed transfer.
        let body = res.text().await?;
        let places = parse_places(&body)?;

        info!("Found {} places near ({}, {})", places.len(), at.lat, at.lon);
        Ok(places)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_uses_locale_subdomain() {
        assert_eq!(endpoint("en"), "https://en.wikipedia.org/w/api.php");
        assert_eq!(endpoint("de"), "https://de.wikipedia.org/w/api.php");
    }

    #[test]
    fn query_carries_fixed_search_parameters() {
        let at = Coordinates::new(51.5, -0.12).unwrap();
        let params = query_params(at);
        let get = |k: &str| {
            params
                .iter()
                .find(|(name, _)| *name == k)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("action"), Some("query"));
        assert_eq!(get("format"), Some("json"));
        assert_eq!(get("prop"), Some("coordinates|pageimages|description|info"));
        assert_eq!(get("pithumbsize"), Some("144"));
        assert_eq!(get("generator"), Some("geosearch"));
        assert_eq!(get("ggsradius"), Some("10000"));
        assert_eq!(get("ggslimit"), Some("10"));
        assert_eq!(get("ggscoord"), Some("51.5|-0.12"));
        assert_eq!(get("origin"), Some("*"));
    }

    #[test]
    fn builds_request_url() {
        let at = Coordinates::new(1.5, 2.25).unwrap();
        let req = Client::new()
            .get(endpoint("en"))
            .query(&query_params(at))
            .build()
            .unwrap();
        let url = req.url().as_str();
        assert!(url.starts_with("https://en.wikipedia.org/w/api.php?action=query&format=json"));
        assert!(url.contains("ggscoord=1.5%7C2.25"));
        assert!(url.ends_with("origin=*"));
    }

    #[test]
    fn html_error_page_is_a_decode_error() {
        let body = "<html><body>Wikimedia Error</body></html>";
        assert!(matches!(parse_places(body), Err(NetworkError::Decode(_))));
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        assert!(matches!(
            parse_places(r#"{"query":{"pages":[]}}"#),
            Err(NetworkError::Decode(_))
        ));
    }

    #[test]
    fn well_formed_body_parses() {
        let places = parse_places(
            r#"{"query":{"pages":{"8":{"pageid":8,"title":"Pier","coordinates":[{"lat":50.8,"lon":-0.13}]}}}}"#,
        )
        .unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].title, "Pier");
    }

    #[test]
    fn non_success_status_is_reported() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(NetworkError::Status(503))
        ));
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND),
            Err(NetworkError::Status(404))
        ));
    }
}
