//! 評価用テスト画像カタログ
//!
//! NEU-DET validation セットから欠陥クラスごとに3枚ずつ選んだ画像。
//! 実体はバックエンドの `/test-images/{filename}` から取得する。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 画像区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCategory {
    Defect,
    Normal,
}

impl std::str::FromStr for ImageCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "defect" => Ok(ImageCategory::Defect),
            "normal" => Ok(ImageCategory::Normal),
            _ => Err(Error::Parse(format!("Unknown category: {}. Use defect or normal", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestImage {
    pub id: &'static str,
    pub name: &'static str,
    pub defect_type: &'static str,
    pub description: &'static str,
    pub filename: &'static str,
    pub category: ImageCategory,
}

const fn defect(
    id: &'static str,
    name: &'static str,
    defect_type: &'static str,
    description: &'static str,
    filename: &'static str,
) -> TestImage {
    TestImage { id, name, defect_type, description, filename, category: ImageCategory::Defect }
}

pub const TEST_IMAGES: &[TestImage] = &[
    defect("crazing_1", "Surface Crazing #1", "crazing", "Fine surface cracks forming a network pattern", "crazing_241.jpg"),
    defect("crazing_2", "Surface Crazing #2", "crazing", "Heavy crazing with visible crack patterns", "crazing_250.jpg"),
    defect("crazing_3", "Surface Crazing #3", "crazing", "Light surface crazing pattern", "crazing_275.jpg"),
    defect("inclusion_1", "Material Inclusion #1", "inclusion", "Foreign material embedded in surface", "inclusion_241.jpg"),
    defect("inclusion_2", "Material Inclusion #2", "inclusion", "Large inclusion defect", "inclusion_260.jpg"),
    defect("inclusion_3", "Material Inclusion #3", "inclusion", "Small inclusion spot", "inclusion_290.jpg"),
    defect("patches_1", "Surface Patches #1", "patches", "Irregular surface patches", "patches_241.jpg"),
    defect("patches_2", "Surface Patches #2", "patches", "Multiple patch defects", "patches_270.jpg"),
    defect("patches_3", "Surface Patches #3", "patches", "Large patch area", "patches_295.jpg"),
    defect("pitted_1", "Pitted Surface #1", "pitted_surface", "Surface pitting and corrosion", "pitted_surface_241.jpg"),
    defect("pitted_2", "Pitted Surface #2", "pitted_surface", "Heavy pitting damage", "pitted_surface_265.jpg"),
    defect("pitted_3", "Pitted Surface #3", "pitted_surface", "Light surface pitting", "pitted_surface_285.jpg"),
    defect("scale_1", "Rolled-in Scale #1", "rolled-in_scale", "Scale layer rolled into surface", "rolled-in_scale_241.jpg"),
    defect("scale_2", "Rolled-in Scale #2", "rolled-in_scale", "Heavy scale inclusion", "rolled-in_scale_255.jpg"),
    defect("scale_3", "Rolled-in Scale #3", "rolled-in_scale", "Multiple scale defects", "rolled-in_scale_280.jpg"),
    defect("scratches_1", "Surface Scratches #1", "scratches", "Deep surface scratches", "scratches_241.jpg"),
    defect("scratches_2", "Surface Scratches #2", "scratches", "Multiple scratch lines", "scratches_260.jpg"),
    defect("scratches_3", "Surface Scratches #3", "scratches", "Light surface abrasions", "scratches_290.jpg"),
];

/// 欠陥クラスで絞り込み（"all" は全件）
pub fn by_defect_type(defect_type: &str) -> Vec<&'static TestImage> {
    TEST_IMAGES
        .iter()
        .filter(|img| defect_type == "all" || img.defect_type == defect_type)
        .collect()
}

pub fn by_category(category: ImageCategory) -> Vec<&'static TestImage> {
    TEST_IMAGES.iter().filter(|img| img.category == category).collect()
}

/// 一様乱数 `draw`（[0, 1)）で1枚選ぶ
pub fn pick(draw: f64) -> &'static TestImage {
    let idx = ((draw * TEST_IMAGES.len() as f64) as usize).min(TEST_IMAGES.len() - 1);
    &TEST_IMAGES[idx]
}

/// カタログに含まれる欠陥クラス（登場順、重複なし）
pub fn defect_types() -> Vec<&'static str> {
    let mut types: Vec<&'static str> = Vec::new();
    for img in TEST_IMAGES {
        if !types.contains(&img.defect_type) {
            types.push(img.defect_type);
        }
    }
    types
}

pub fn find(filename: &str) -> Option<&'static TestImage> {
    TEST_IMAGES.iter().find(|img| img.filename == filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFECT_CLASSES;

    #[test]
    fn test_catalog_covers_every_class() {
        assert_eq!(TEST_IMAGES.len(), 18);
        assert_eq!(defect_types(), DEFECT_CLASSES.to_vec());
        for class in DEFECT_CLASSES {
            assert_eq!(by_defect_type(class).len(), 3, "{}", class);
        }
    }

    #[test]
    fn test_filter_all() {
        assert_eq!(by_defect_type("all").len(), TEST_IMAGES.len());
        assert!(by_defect_type("rust").is_empty());
    }

    #[test]
    fn test_filter_category() {
        assert_eq!(by_category(ImageCategory::Defect).len(), 18);
        assert!(by_category(ImageCategory::Normal).is_empty());
    }

    #[test]
    fn test_pick_bounds() {
        assert_eq!(pick(0.0).id, "crazing_1");
        assert_eq!(pick(0.999_999).id, "scratches_3");
        assert_eq!(pick(1.0).id, "scratches_3");
    }

    #[test]
    fn test_filenames_are_backend_safe() {
        for img in TEST_IMAGES {
            assert!(img.filename.ends_with(".jpg"));
            assert!(!img.filename.contains('/'));
            assert!(img.filename.starts_with(img.defect_type));
        }
    }

    #[test]
    fn test_find() {
        assert_eq!(find("patches_270.jpg").map(|i| i.id), Some("patches_2"));
        assert!(find("missing.jpg").is_none());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Defect".parse::<ImageCategory>().unwrap(), ImageCategory::Defect);
        assert!("broken".parse::<ImageCategory>().is_err());
    }
}
