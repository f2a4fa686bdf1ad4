//! In-memory media state for one product edit session.
//!
//! [`ProductMediaState`] owns the image list, video list, and hover index
//! together. Its fields are private; every mutation goes through a method
//! that keeps `hover_image_index` either `None` or a valid index into
//! `images`.
//!
//! [`SpecificationList`] is the free-form key/value attribute editor. It is
//! an ordered list, not a map, so duplicate and half-typed keys can exist
//! while the admin is editing. [`SpecificationList::collapse`] produces the
//! map that gets submitted.

use crate::media::MediaAsset;
use std::collections::BTreeMap;

/// Images, videos and hover selection for the product being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductMediaState {
    images: Vec<String>,
    videos: Vec<String>,
    hover_image_index: Option<usize>,
}

impl ProductMediaState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored lists. A hover index outside `images` is dropped.
    pub fn from_parts(images: Vec<String>, videos: Vec<String>, hover: Option<usize>) -> Self {
        let hover_image_index = hover.filter(|&i| i < images.len());
        Self {
            images,
            videos,
            hover_image_index,
        }
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn videos(&self) -> &[String] {
        &self.videos
    }

    pub fn hover_image_index(&self) -> Option<usize> {
        self.hover_image_index
    }

    /// Index 0 is the primary display image.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn hover_image(&self) -> Option<&str> {
        self.hover_image_index
            .and_then(|i| self.images.get(i))
            .map(String::as_str)
    }

    /// Images followed by videos, each tagged with its inferred kind.
    pub fn assets(&self) -> Vec<MediaAsset> {
        self.images
            .iter()
            .chain(&self.videos)
            .map(|url| MediaAsset::new(url.clone()))
            .collect()
    }

    pub fn add_image(&mut self, url: impl Into<String>) {
        self.images.push(url.into());
    }

    /// Remove the image at `index` and return its URL.
    ///
    /// The hover index is cleared if it pointed at the removed image and
    /// shifted down if it pointed past it. Out of range is a no-op.
    pub fn remove_image(&mut self, index: usize) -> Option<String> {
        if index >= self.images.len() {
            return None;
        }
        let removed = self.images.remove(index);
        self.hover_image_index = match self.hover_image_index {
            Some(h) if h == index => None,
            Some(h) if h > index => Some(h - 1),
            other => other,
        };
        Some(removed)
    }

    /// Select `index` as the hover image, or clear it if already selected.
    ///
    /// Indices outside `images` are ignored.
    pub fn toggle_hover_image(&mut self, index: usize) {
        if index >= self.images.len() {
            return;
        }
        self.hover_image_index = if self.hover_image_index == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    /// Move an image to a new position. The hover selection follows the
    /// image it was on.
    pub fn move_image(&mut self, from: usize, to: usize) {
        let len = self.images.len();
        if from >= len || to >= len || from == to {
            return;
        }
        let url = self.images.remove(from);
        self.images.insert(to, url);

        self.hover_image_index = self.hover_image_index.map(|h| {
            if h == from {
                to
            } else if from < h && h <= to {
                h - 1
            } else if to <= h && h < from {
                h + 1
            } else {
                h
            }
        });
    }

    pub fn add_video(&mut self, url: impl Into<String>) {
        self.videos.push(url.into());
    }

    pub fn remove_video(&mut self, index: usize) -> Option<String> {
        (index < self.videos.len()).then(|| self.videos.remove(index))
    }
}

/// One row of the specification editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecEntry {
    pub key: String,
    pub value: String,
}

impl SpecEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered key/value rows; duplicates and blanks allowed until [`collapse`](Self::collapse).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecificationList {
    entries: Vec<SpecEntry>,
}

impl SpecificationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows from a stored map, in key order.
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self {
            entries: map
                .iter()
                .map(|(k, v)| SpecEntry::new(k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn entries(&self) -> &[SpecEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a blank row for the admin to fill in.
    pub fn add_empty(&mut self) {
        self.entries.push(SpecEntry::default());
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(SpecEntry::new(key, value));
    }

    pub fn update_key(&mut self, index: usize, key: impl Into<String>) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.key = key.into();
        }
    }

    pub fn update_value(&mut self, index: usize, value: impl Into<String>) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.value = value.into();
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<SpecEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn move_entry(&mut self, from: usize, to: usize) {
        if from < self.entries.len() && to < self.entries.len() && from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
        }
    }

    /// The submitted map: trimmed keys and values, rows with either side
    /// blank dropped, later duplicates overwrite earlier ones.
    pub fn collapse(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for entry in &self.entries {
            let key = entry.key.trim();
            let value = entry.value.trim();
            if !key.is_empty() && !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
        map
    }
}
