use crate::error::{LocationError, NetworkError};
use serde::Deserialize;

/// A position fix in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, LocationError> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lon_ok = lon.is_finite() && (-180.0..=180.0).contains(&lon);
        if lat_ok && lon_ok {
            Ok(Self { lat, lon })
        } else {
            Err(LocationError::InvalidCoordinates { lat, lon })
        }
    }
}

/// A point of interest built from one API page object.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: u64,
    pub title: String,
    pub coordinates: Coordinates,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

impl Place {
    /// OpenStreetMap view centred on the place.
    pub fn map_url(&self) -> String {
        format!(
            "https://www.openstreetmap.org/#map=19/{}/{}",
            self.coordinates.lat, self.coordinates.lon
        )
    }

    /// Article link on the given locale's wiki.
    pub fn article_url(&self, locale: &str) -> String {
        format!("https://{}.wikipedia.org/?curid={}", locale, self.id)
    }
}

#[derive(Deserialize)]
pub struct GeoSearchResponse {
    pub query: Option<GeoSearchQuery>,
}

#[derive(Deserialize)]
pub struct GeoSearchQuery {
    // Map rather than a struct so key order from the wire survives.
    #[serde(default)]
    pub pages: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
pub struct WikiPage {
    pub pageid: u64,
    pub title: String,
    #[serde(default)]
    pub coordinates: Vec<WikiCoordinate>,
    pub description: Option<String>,
    pub thumbnail: Option<WikiThumbnail>,
}

#[derive(Deserialize)]
pub struct WikiCoordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
pub struct WikiThumbnail {
    pub source: String,
}

impl GeoSearchResponse {
    /// Turns the raw `query.pages` mapping into places, keeping response order.
    ///
    /// A response without a `query` object is the API's way of saying
    /// "nothing nearby" and yields an empty list. A page without coordinates
    /// cannot become a place, so it fails the whole response.
    pub fn into_places(self) -> Result<Vec<Place>, NetworkError> {
        let Some(query) = self.query else {
            return Ok(Vec::new());
        };

        let mut places = Vec::with_capacity(query.pages.len());
        for (key, value) in query.pages {
            let page: WikiPage = serde_json::from_value(value)?;
            let place = Place::from_page(page)
                .ok_or_else(|| NetworkError::Decode(format!("page {} has no coordinates", key)))?;
            places.push(place);
        }
        Ok(places)
    }
}

impl Place {
    /// `None` when the page has no coordinate entry.
    fn from_page(page: WikiPage) -> Option<Self> {
        let first = page.coordinates.first()?;
        Some(Self {
            id: page.pageid,
            title: page.title,
            coordinates: Coordinates {
                lat: first.lat,
                lon: first.lon,
            },
            description: page
                .description
                .filter(|d| !d.is_empty())
                .map(|d| sentence_case(&d)),
            thumbnail: page.thumbnail.map(|t| t.source),
        })
    }
}

/// Upper-cases the first character and leaves the rest untouched.
pub fn sentence_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
