//! Pre/post-disaster image references.
//!
//! Images are never decoded; an asset is only metadata plus a locator.

use std::path::Path;

use serde::Serialize;

use crate::pipeline::{Stage, UnmetPrecondition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    Pre,
    Post,
}

impl ImageRole {
    pub fn label(self) -> &'static str {
        match self {
            ImageRole::Pre => "pre-disaster",
            ImageRole::Post => "post-disaster",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAsset {
    pub id: String,
    pub name: String,
    /// Capture date, `YYYY-MM-DD`
    pub date: String,
    pub location: String,
    pub url: String,
    pub role: ImageRole,
}

impl ImageAsset {
    /// Describe a local file. The file itself is never opened.
    pub fn from_path(id: impl Into<String>, path: &Path, role: ImageRole) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: id.into(),
            name,
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            location: "Unknown location".to_string(),
            url: format!("file://{}", path.display()),
            role,
        }
    }
}

/// The bundled Haiti earthquake pair.
pub fn sample_assets() -> Vec<ImageAsset> {
    vec![
        ImageAsset {
            id: "1".to_string(),
            name: "Haiti Earthquake - Pre Disaster".to_string(),
            date: "2023-08-15".to_string(),
            location: "Port-au-Prince, Haiti".to_string(),
            url: "https://images.pexels.com/photos/87611/earth-blue-planet-globe-planet-87611.jpeg?auto=compress&cs=tinysrgb&w=800".to_string(),
            role: ImageRole::Pre,
        },
        ImageAsset {
            id: "2".to_string(),
            name: "Haiti Earthquake - Post Disaster".to_string(),
            date: "2023-08-20".to_string(),
            location: "Port-au-Prince, Haiti".to_string(),
            url: "https://images.pexels.com/photos/2246476/pexels-photo-2246476.jpeg?auto=compress&cs=tinysrgb&w=800".to_string(),
            role: ImageRole::Post,
        },
    ]
}

/// The current image list. Every update replaces it wholesale.
#[derive(Debug, Clone, Default)]
pub struct AssetLibrary {
    images: Vec<ImageAsset>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, images: Vec<ImageAsset>) {
        tracing::info!(count = images.len(), "Image set replaced");
        self.images = images;
    }

    pub fn use_samples(&mut self) {
        self.replace(sample_assets());
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn images(&self) -> &[ImageAsset] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The image list, or why there is nothing to work on.
    pub fn require_images(&self) -> Result<&[ImageAsset], UnmetPrecondition> {
        if self.images.is_empty() {
            Err(UnmetPrecondition::NoImages)
        } else {
            Ok(&self.images)
        }
    }

    /// Images a stage works on; stages that need none always get `Ok`.
    pub fn images_for(&self, stage: Stage) -> Result<&[ImageAsset], UnmetPrecondition> {
        if stage.requires_images() {
            self.require_images()
        } else {
            Ok(&self.images)
        }
    }

    pub fn by_role(&self, role: ImageRole) -> Option<&ImageAsset> {
        self.images.iter().find(|i| i.role == role)
    }
}
