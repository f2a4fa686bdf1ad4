//! The product as the storefront API returns it, and the media part of the
//! payload sent back on save.
//!
//! Fields the editor does not own are ignored on read. Everything here is
//! validated once, at deserialization, so the editor never sees an
//! out-of-range hover index or a missing list.

use crate::editor::{ProductMediaState, SpecificationList};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Media-related fields of a product response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Option<Vec<String>>,
    /// Signed because the API has been seen to send `-1` for "none".
    #[serde(default)]
    pub hover_image_index: Option<i64>,
    #[serde(default)]
    pub specifications: Option<BTreeMap<String, String>>,
}

impl ProductRecord {
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// The hover index if it points at one of `images`.
    pub fn valid_hover_index(&self) -> Option<usize> {
        self.hover_image_index
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < self.images.len())
    }

    /// Open an edit session on this product's media.
    pub fn media_state(&self) -> ProductMediaState {
        ProductMediaState::from_parts(
            self.images.clone(),
            self.videos.clone().unwrap_or_default(),
            self.valid_hover_index(),
        )
    }

    pub fn specification_list(&self) -> SpecificationList {
        self.specifications
            .as_ref()
            .map(SpecificationList::from_map)
            .unwrap_or_default()
    }
}

/// Media fields of the save request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMediaPayload {
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub hover_image_index: Option<usize>,
    pub specifications: BTreeMap<String, String>,
}

impl ProductMediaPayload {
    pub fn from_state(state: &ProductMediaState, specs: &SpecificationList) -> Self {
        Self {
            images: state.images().to_vec(),
            videos: state.videos().to_vec(),
            hover_image_index: state.hover_image_index(),
            specifications: specs.collapse(),
        }
    }
}
