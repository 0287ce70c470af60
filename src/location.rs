//! User location resolution for the nearby-places screen.
//!
//! The screen talks to a [`LocationProvider`]: it first asks for permission
//! and then for a single position fix. Two providers ship with the app:
//! [`IpLocationProvider`] geolocates via IpApi, and [`ManualLocationProvider`]
//! always reports the coordinates from `config.toml`.

use crate::config::{LocationConfig, ProviderKind};
use crate::error::LocationError;
use crate::models::Coordinates;
use async_trait::async_trait;
use ipgeolocate::{Locator, Service};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Requested fix quality. Providers without a notion of accuracy ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accuracy {
    Low,
    #[default]
    High,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn request_permission(&self) -> Permission;

    /// One position fix. [`LocationError::Unavailable`] is worth retrying,
    /// the other variants are not.
    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinates, LocationError>;
}

/// Approximate location from the public IP address.
pub struct IpLocationProvider {
    allowed: bool,
    lookup_ip: String,
}

impl IpLocationProvider {
    pub fn new(allowed: bool, lookup_ip: impl Into<String>) -> Self {
        Self {
            allowed,
            lookup_ip: lookup_ip.into(),
        }
    }
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    async fn request_permission(&self) -> Permission {
        if self.allowed {
            Permission::Granted
        } else {
            info!("IP geolocation disabled in config.toml");
            Permission::Denied
        }
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<Coordinates, LocationError> {
        if !self.allowed {
            return Err(LocationError::PermissionDenied);
        }

        // An empty address makes IpApi locate the caller.
        match Locator::get(&self.lookup_ip, Service::IpApi).await {
            Ok(loc) => {
                let lat = loc.latitude.parse::<f64>();
                let lon = loc.longitude.parse::<f64>();
                match (lat, lon) {
                    (Ok(lat), Ok(lon)) => {
                        info!("Geolocation successful - ({}, {})", lat, lon);
                        Coordinates::new(lat, lon)
                    }
                    _ => Err(LocationError::Unavailable(format!(
                        "unparseable coordinates ({}, {})",
                        loc.latitude, loc.longitude
                    ))),
                }
            }
            Err(e) => {
                error!("Error using geolocation service: {}", e);
                Err(LocationError::Unavailable(e.to_string()))
            }
        }
    }
}

/// Fixed coordinates, for machines where IP lookup is wrong or unwanted.
pub struct ManualLocationProvider {
    at: Coordinates,
}

impl ManualLocationProvider {
    pub fn new(at: Coordinates) -> Self {
        Self { at }
    }
}

#[async_trait]
impl LocationProvider for ManualLocationProvider {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<Coordinates, LocationError> {
        Ok(self.at)
    }
}

/// Builds the provider selected in `config.toml`.
pub fn from_config(cfg: &LocationConfig) -> Result<Box<dyn LocationProvider>, LocationError> {
    match cfg.provider {
        ProviderKind::Ip => Ok(Box::new(IpLocationProvider::new(
            cfg.allow_geolocation,
            cfg.lookup_ip.clone(),
        ))),
        ProviderKind::Manual => {
            let at = Coordinates::new(cfg.manual_lat, cfg.manual_lon)?;
            Ok(Box::new(ManualLocationProvider::new(at)))
        }
    }
}
