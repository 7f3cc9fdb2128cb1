//! Data models and structures
//!
//! Defines the product record, its image references, write-path inputs, and
//! the environment-driven application configuration.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// A hosted image owned by exactly one product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageRef {
    pub url: String,
    /// Handle used to ask the image store to delete the object.
    #[serde(rename = "imagePublicId")]
    pub provider_id: String,
}

impl ImageRef {
    pub fn new(url: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            provider_id: provider_id.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    pub images: Vec<ImageRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated product that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
    pub images: Vec<ImageRef>,
}

/// Caller-supplied field values for create and update.
///
/// Every field is optional: create requires all of them, update applies only
/// the ones present. Numbers may arrive as JSON numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProductFields {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub quantity: Option<i64>,
}

impl ProductFields {
    /// Name, if supplied and not blank.
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    /// Description, if supplied and not blank.
    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parses a textual price. Blank means "not supplied"; NaN and infinities
/// are rejected.
pub fn parse_price(raw: &str) -> Result<Option<f64>, String> {
    parse_number::<f64>("price", raw)?
        .map(finite_price)
        .transpose()
}

/// Parses a textual quantity. Blank means "not supplied".
pub fn parse_quantity(raw: &str) -> Result<Option<i64>, String> {
    parse_number("quantity", raw)
}

fn parse_number<T: FromStr>(field: &str, raw: &str) -> Result<Option<T>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| format!("{} must be a number", field))
}

fn finite_price(price: f64) -> Result<f64, String> {
    if price.is_finite() {
        Ok(price)
    } else {
        Err("price must be a number".to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

fn deserialize_price<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    match Option::<NumberOrText<f64>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(price)) => {
            finite_price(price).map(Some).map_err(D::Error::custom)
        }
        Some(NumberOrText::Text(raw)) => parse_price(&raw).map_err(D::Error::custom),
    }
}

fn deserialize_quantity<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    match Option::<NumberOrText<i64>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(quantity)) => Ok(Some(quantity)),
        Some(NumberOrText::Text(raw)) => parse_quantity(&raw).map_err(D::Error::custom),
    }
}

/// One raw image submitted with a create or update call.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            file_name: None,
            content_type: None,
            data,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub storage_access_key_id: Option<String>,
    pub storage_secret_access_key: Option<String>,
    pub storage_endpoint: String,
    pub storage_region: String,
    pub storage_bucket: String,
    pub storage_base_url: String,
    pub max_upload_bytes: usize,
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let dry_run = std::env::var("DRY_RUN")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 8080)?,
            database_url: non_empty_env("DATABASE_URL"),
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            storage_access_key_id: non_empty_env("STORAGE_ACCESS_KEY_ID"),
            storage_secret_access_key: non_empty_env("STORAGE_SECRET_ACCESS_KEY"),
            storage_endpoint: std::env::var("STORAGE_ENDPOINT")
                .unwrap_or_else(|_| "https://s3.amazonaws.com".to_string()),
            storage_region: std::env::var("STORAGE_REGION")
                .unwrap_or_else(|_| "us-east-1".to_string()),
            storage_bucket: std::env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "product-images".to_string()),
            storage_base_url: std::env::var("STORAGE_BASE_URL")
                .unwrap_or_else(|_| "https://product-images.s3.amazonaws.com".to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            dry_run,
        })
    }

    /// Fails when a live deployment is missing its database or storage credentials.
    pub fn validate(&self) -> crate::Result<()> {
        if self.dry_run {
            return Ok(());
        }
        if self.database_url.is_none() {
            return Err(crate::Error::Config("DATABASE_URL not set".to_string()));
        }
        if self.storage_access_key_id.is_none() {
            return Err(crate::Error::Config(
                "STORAGE_ACCESS_KEY_ID not set".to_string(),
            ));
        }
        if self.storage_secret_access_key.is_none() {
            return Err(crate::Error::Config(
                "STORAGE_SECRET_ACCESS_KEY not set".to_string(),
            ));
        }
        Ok(())
    }
}

/// `NAME=` with nothing after it counts as unset.
fn non_empty_env(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> crate::Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| crate::Error::Config(format!("Invalid {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
