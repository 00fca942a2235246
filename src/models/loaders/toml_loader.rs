use crate::error::{AppResult, ConfigError, FileError};
use crate::models::plate::Plate;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// 色板目录文件结构
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    plates: Vec<Plate>,
}

/// 从 TOML 文件加载色板目录
pub async fn load_catalog(catalog_path: &Path) -> AppResult<Vec<Plate>> {
    let content = fs::read_to_string(catalog_path)
        .await
        .map_err(|source| FileError::ReadFailed {
            path: catalog_path.display().to_string(),
            source,
        })?;

    let plates = parse_catalog(&content, &catalog_path.display().to_string())?;
    tracing::info!(
        "成功加载 {} 张色板: {}",
        plates.len(),
        catalog_path.display()
    );

    Ok(plates)
}

/// 解析并校验色板目录内容
///
/// `path` 仅用于错误信息
pub fn parse_catalog(content: &str, path: &str) -> AppResult<Vec<Plate>> {
    let catalog: CatalogFile = toml::from_str(content).map_err(|source| {
        FileError::TomlParseFailed {
            path: path.to_string(),
            source,
        }
    })?;

    validate_catalog(&catalog.plates)?;

    Ok(catalog.plates)
}

/// 校验色板目录
///
/// - 目录不能为空
/// - 色板编号不能重复
/// - 必填类别的期望答案不能为空白
pub fn validate_catalog(plates: &[Plate]) -> Result<(), ConfigError> {
    if plates.is_empty() {
        return Err(ConfigError::EmptyCatalog);
    }

    let mut seen = HashSet::new();
    for plate in plates {
        if !seen.insert(plate.plate_number) {
            return Err(ConfigError::DuplicatePlate {
                plate_number: plate.plate_number,
            });
        }

        let required = [
            ("normal", &plate.answers.normal),
            ("protanopia", &plate.answers.protanopia),
            ("deuteranopia", &plate.answers.deuteranopia),
        ];
        for (category, answer) in required {
            if answer.trim().is_empty() {
                return Err(ConfigError::BlankExpectedAnswer {
                    plate_number: plate.plate_number,
                    category,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    const SAMPLE: &str = r#"
[[plates]]
plate_number = 1
question = "What number do you see?"
image = "plates/plate_01.png"

[plates.answers]
normal = "12"
protanopia = "12"
deuteranopia = "12"
total_color_blindness = "12"

[[plates]]
plate_number = 22
question = "What number do you see?"
image = "plates/plate_22.png"

[plates.answers]
normal = "26"
protanopia = "6"
deuteranopia = "2"
protanomaly = "26 (2 faint)"
"#;

    #[test]
    fn test_parse_catalog() {
        let plates = parse_catalog(SAMPLE, "sample.toml").unwrap();
        assert_eq!(plates.len(), 2);
        assert_eq!(plates[1].plate_number, 22);
        assert_eq!(plates[1].answers.protanomaly.as_deref(), Some("26 (2 faint)"));
        assert_eq!(plates[1].answers.deuteranomaly, None);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let err = parse_catalog("plates = []", "empty.toml").unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::EmptyCatalog)));
    }

    #[test]
    fn test_duplicate_plate_rejected() {
        let mut plates = parse_catalog(SAMPLE, "sample.toml").unwrap();
        plates[1].plate_number = 1;
        assert!(matches!(
            validate_catalog(&plates),
            Err(ConfigError::DuplicatePlate { plate_number: 1 })
        ));
    }

    #[test]
    fn test_blank_expected_answer_rejected() {
        let mut plates = parse_catalog(SAMPLE, "sample.toml").unwrap();
        plates[0].answers.deuteranopia = "  ".to_string();
        assert!(matches!(
            validate_catalog(&plates),
            Err(ConfigError::BlankExpectedAnswer {
                plate_number: 1,
                category: "deuteranopia"
            })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let err = parse_catalog("[[plates]]\nplate_number = \"x\"", "bad.toml").unwrap_err();
        assert!(matches!(err, AppError::File(FileError::TomlParseFailed { .. })));
    }

    #[tokio::test]
    async fn test_load_shipped_catalog() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/plates.toml");
        let plates = load_catalog(&path).await.unwrap();
        assert!(plates.len() >= 10);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = load_catalog(Path::new("does/not/exist.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::File(FileError::ReadFailed { .. })));
    }
}
