//! Clothing items: REST client for the item-storage service and the local catalog.

use reqwest::{Client, Response, Url};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::{
    form::{FormState, ValidationRule},
    model::Classification,
};

pub const NAME_FIELD: &str = "name";
pub const IMAGE_URL_FIELD: &str = "imageUrl";
pub const WEATHER_FIELD: &str = "weather";

#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    /// The service answered with a non-2xx status.
    #[error("Error: {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode item response: {0}")]
    Decode(reqwest::Error),

    #[error("Invalid item: {0}")]
    Invalid(String),
}

impl ItemError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ItemError::Status(status) => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingItem {
    #[serde(rename = "_id", alias = "id", deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(alias = "link")]
    pub image_url: String,
    pub weather: Classification,
}

impl fmt::Display for ClothingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({}) {}", self.id, self.name, self.weather, self.image_url)
    }
}

/// Request body for creating an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub image_url: String,
    pub weather: Classification,
}

impl NewItem {
    /// Build the request body from a validated add-garment form.
    pub fn from_form(form: &FormState) -> Result<Self, ItemError> {
        if !form.is_valid() {
            return Err(ItemError::Invalid("form has validation errors".into()));
        }

        let field = |name: &str| form.value(name).unwrap_or_default().trim().to_string();
        let weather = Classification::try_from(field(WEATHER_FIELD).as_str())
            .map_err(|e| ItemError::Invalid(e.to_string()))?;

        Ok(Self {
            name: field(NAME_FIELD),
            image_url: field(IMAGE_URL_FIELD),
            weather,
        })
    }
}

/// The add-garment form: name, image URL and weather type, in that order.
pub fn add_item_form() -> FormState {
    FormState::new(
        [(NAME_FIELD, ""), (IMAGE_URL_FIELD, ""), (WEATHER_FIELD, "")],
        [
            (NAME_FIELD, ValidationRule::required().min_length(1).max_length(30)),
            (IMAGE_URL_FIELD, ValidationRule::required().url()),
            (WEATHER_FIELD, ValidationRule::required()),
        ],
    )
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct ItemClient {
    base_url: String,
    http: Client,
}

impl ItemClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub async fn get_items(&self) -> Result<Vec<ClothingItem>, ItemError> {
        let res = self.http.get(self.items_url(None)?).send().await?;
        check_response(res)?.json().await.map_err(ItemError::Decode)
    }

    pub async fn add_item(&self, item: &NewItem) -> Result<ClothingItem, ItemError> {
        let res = self
            .http
            .post(self.items_url(None)?)
            .json(item)
            .send()
            .await?;
        check_response(res)?.json().await.map_err(ItemError::Decode)
    }

    pub async fn delete_item(&self, id: &str) -> Result<(), ItemError> {
        let res = self.http.delete(self.items_url(Some(id))?).send().await?;
        check_response(res)?;
        Ok(())
    }

    /// `{base}/items` or `{base}/items/{id}`, with the id encoded as a single path segment.
    fn items_url(&self, id: Option<&str>) -> Result<Url, ItemError> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            ItemError::Invalid(format!("bad service URL '{}': {err}", self.base_url))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ItemError::Invalid(format!("service URL '{}' cannot have a path", self.base_url))
            })?;
            segments.pop_if_empty().push("items");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

fn check_response(res: Response) -> Result<Response, ItemError> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        tracing::warn!("Item service responded with {}", status);
        Err(ItemError::Status(status.as_u16()))
    }
}

/// Locally held item list. Mutations apply only after the service accepts them.
#[derive(Debug, Clone)]
pub struct ItemCatalog {
    client: ItemClient,
    items: Vec<ClothingItem>,
}

impl ItemCatalog {
    pub fn new(client: ItemClient) -> Self {
        Self {
            client,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[ClothingItem] {
        &self.items
    }

    /// Replace the local list with the service's current list.
    pub async fn load(&mut self) -> Result<&[ClothingItem], ItemError> {
        self.items = self.client.get_items().await?;
        tracing::debug!("Loaded {} items", self.items.len());
        Ok(&self.items)
    }

    pub async fn add(&mut self, item: &NewItem) -> Result<ClothingItem, ItemError> {
        let created = self.client.add_item(item).await?;
        tracing::info!("Created item {} ({})", created.id, created.name);
        self.items.push(created.clone());
        Ok(created)
    }

    pub async fn remove(&mut self, id: &str) -> Result<(), ItemError> {
        self.client.delete_item(id).await?;
        self.items.retain(|item| item.id != id);
        tracing::info!("Deleted item {}", id);
        Ok(())
    }

    /// Items suited to the given weather.
    pub fn for_weather(&self, classification: Classification) -> Vec<&ClothingItem> {
        self.items.iter().filter(|item| item.weather == classification).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_accepts_numeric_or_string_ids_and_link_alias() {
        let item: ClothingItem = serde_json::from_str(
            r#"{"_id": 7, "name": "Cap", "imageUrl": "https://x/cap.png", "weather": "hot"}"#,
        )
        .unwrap();
        assert_eq!(item.id, "7");
        assert_eq!(item.weather, Classification::Hot);

        let item: ClothingItem = serde_json::from_str(
            r#"{"id": "abc", "name": "Coat", "link": "https://x/coat.png", "weather": "cold"}"#,
        )
        .unwrap();
        assert_eq!(item.id, "abc");
        assert_eq!(item.image_url, "https://x/coat.png");
    }

    #[test]
    fn new_item_body_uses_wire_keys() {
        let body = NewItem {
            name: "Boots".into(),
            image_url: "https://x/boots.png".into(),
            weather: Classification::Cold,
        };

        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"name":"Boots","imageUrl":"https://x/boots.png","weather":"cold"}"#
        );
    }

    #[test]
    fn add_item_form_builds_request_when_valid() {
        let mut form = add_item_form();
        form.on_field_change(NAME_FIELD, " Sunglasses ");
        form.on_field_change(IMAGE_URL_FIELD, "https://example.com/sun.png");
        form.on_field_change(WEATHER_FIELD, "hot");

        assert!(form.validate_form().valid);
        let item = NewItem::from_form(&form).unwrap();
        assert_eq!(item.name, "Sunglasses");
        assert_eq!(item.weather, Classification::Hot);
    }

    #[test]
    fn add_item_form_reports_first_invalid_field() {
        let mut form = add_item_form();
        form.on_field_change(NAME_FIELD, "Gloves");
        form.on_field_change(IMAGE_URL_FIELD, "gloves.png");

        let result = form.validate_form();
        assert!(!result.valid);
        assert_eq!(form.first_invalid_field(&result.errors), Some(IMAGE_URL_FIELD));
        assert!(matches!(NewItem::from_form(&form), Err(ItemError::Invalid(_))));
    }

    #[test]
    fn unknown_weather_type_is_invalid() {
        let mut form = add_item_form();
        form.on_field_change(NAME_FIELD, "Poncho");
        form.on_field_change(IMAGE_URL_FIELD, "https://example.com/poncho.png");
        form.on_field_change(WEATHER_FIELD, "rainy");
        assert!(form.validate_form().valid);

        let err = NewItem::from_form(&form).unwrap_err();
        assert!(err.to_string().contains("Unknown weather type"));
    }

    #[test]
    fn status_error_carries_code() {
        let err = ItemError::Status(500);
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Error: 500");
    }
}
