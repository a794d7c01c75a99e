//! Core library for the `wardrobe` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather lookup and the location resolver that feeds it
//! - Rule-driven form validation for item forms
//! - The clothing item REST client and local catalog
//!
//! It is used by `wardrobe-cli`, but can also be reused by other front ends.

pub mod config;
pub mod form;
pub mod geolocation;
pub mod items;
pub mod model;
pub mod provider;
pub mod resolver;

pub use config::Config;
pub use form::{FormState, FormValidation, ValidationRule};
pub use geolocation::{Environment, Geolocation, PermissionQuery};
pub use items::{ClothingItem, ItemCatalog, ItemClient, ItemError, NewItem};
pub use model::{Classification, Coordinates, Temperature, TemperatureUnit, WeatherSnapshot};
pub use provider::WeatherProvider;
pub use resolver::{Failure, FailureReason, LocationResolver, ResolutionOutcome, WeatherView};
