use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Card data as delivered by the card database.
///
/// Only `type_line` is interpreted by the deck logic; everything else is display metadata that
/// is carried along untouched.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub type_line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub cmc: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toughness: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub color_identity: Vec<String>,
    #[serde(default)]
    pub set: String,
    #[serde(default)]
    pub set_name: String,
    #[serde(default)]
    pub rarity: String,
    /// Release date of the printing's set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uris: Option<ImageUris>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub card_faces: Vec<CardFace>,
}

/// One face of a multi-faced card.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CardFace {
    pub name: String,
    #[serde(default)]
    pub type_line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uris: Option<ImageUris>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ImageUris {
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub normal: String,
    #[serde(default)]
    pub large: String,
    #[serde(default)]
    pub png: String,
    #[serde(default)]
    pub art_crop: String,
    #[serde(default)]
    pub border_crop: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Small,
    Normal,
    Large,
}

impl ImageUris {
    fn get(&self, size: ImageSize) -> Option<&str> {
        let url = match size {
            ImageSize::Small => &self.small,
            ImageSize::Normal => &self.normal,
            ImageSize::Large => &self.large,
        };

        [url, &self.normal]
            .into_iter()
            .find(|url| !url.is_empty())
            .map(String::as_str)
    }
}

impl Card {
    /// Image for the card, using the front face for double-faced cards.
    #[must_use]
    pub fn image_url(&self, size: ImageSize) -> Option<&str> {
        if let Some(uris) = &self.image_uris {
            return uris.get(size);
        }

        self.card_faces
            .first()
            .and_then(|face| face.image_uris.as_ref())
            .and_then(|uris| uris.get(size))
    }
}

pub mod test_util {
    use super::*;

    pub fn make_card(id: &str, name: &str, type_line: &str) -> Card {
        Card {
            id: id.to_owned(),
            name: name.to_owned(),
            type_line: type_line.to_owned(),
            oracle_id: Some(format!("oracle-{id}")),
            mana_cost: None,
            cmc: 0.0,
            oracle_text: None,
            power: None,
            toughness: None,
            colors: Vec::new(),
            color_identity: Vec::new(),
            set: String::new(),
            set_name: String::new(),
            rarity: String::new(),
            released_at: None,
            image_uris: None,
            card_faces: Vec::new(),
        }
    }
}
