//! Job categories
//!
//! The closed set of generation work types. Each category selects one backend
//! in the dispatch table and one admission gate capacity. Wire names are the
//! ones clients submit.

use crate::error::QueueError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Texto3D")]
    TextTo3d,
    #[serde(rename = "Imagen3D")]
    ImageTo3d,
    #[serde(rename = "TextoImagen2D")]
    TextToImage2d,
    #[serde(rename = "TextImg3D")]
    TextImageTo3d,
    #[serde(rename = "Unico3D")]
    Unico3d,
    #[serde(rename = "MultiImagen3D")]
    MultiImageTo3d,
    #[serde(rename = "Boceto3D")]
    SketchTo3d,
    #[serde(rename = "Retexturize3D")]
    Retexture3d,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::TextTo3d,
        Category::ImageTo3d,
        Category::TextToImage2d,
        Category::TextImageTo3d,
        Category::Unico3d,
        Category::MultiImageTo3d,
        Category::SketchTo3d,
        Category::Retexture3d,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::TextTo3d => "Texto3D",
            Category::ImageTo3d => "Imagen3D",
            Category::TextToImage2d => "TextoImagen2D",
            Category::TextImageTo3d => "TextImg3D",
            Category::Unico3d => "Unico3D",
            Category::MultiImageTo3d => "MultiImagen3D",
            Category::SketchTo3d => "Boceto3D",
            Category::Retexture3d => "Retexturize3D",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| QueueError::UnknownCategory(s.to_string()))
    }
}
