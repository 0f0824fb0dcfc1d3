//! 矿工配置文件的结构校验
//!
//! 只检查两个顶层字段：`pools`（数组，每项需要非空的 `url` 和 `user`）
//! 和 `cpu`（对象，内容不限）。其余字段原样交给 XMRig。

use crate::error::ConfigError;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// 必需的顶层字段及其容器类型，按检查顺序排列
const REQUIRED_FIELDS: [(&str, FieldKind); 2] = [("pools", FieldKind::Array), ("cpu", FieldKind::Object)];

/// 每个矿池条目必需的非空字符串字段
const POOL_FIELDS: [&str; 2] = ["url", "user"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Array,
    Object,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldKind::Array => "array",
            FieldKind::Object => "object",
        }
    }
}

/// 矿工配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 读取并验证配置文件
    pub fn validate_file(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::validate_str(&content)
    }

    pub fn validate_str(content: &str) -> Result<(), ConfigError> {
        let document: Value = serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
            error: e.to_string(),
        })?;

        Self::validate_value(&document)
    }

    pub fn validate_value(document: &Value) -> Result<(), ConfigError> {
        let root = document.as_object().ok_or_else(|| ConfigError::ParseError {
            error: "top-level value must be a JSON object".to_string(),
        })?;

        for (field, kind) in REQUIRED_FIELDS {
            let value = root.get(field).ok_or_else(|| ConfigError::MissingField {
                field: field.to_string(),
            })?;

            if !kind.matches(value) {
                return Err(ConfigError::InvalidType {
                    field: field.to_string(),
                    expected: kind.name(),
                });
            }
        }

        let pools = root
            .get("pools")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for (i, pool) in pools.iter().enumerate() {
            Self::validate_pool(i + 1, pool)?;
        }

        debug!("Validated {} pool(s)", pools.len());
        Ok(())
    }

    /// `index` 从 1 开始
    fn validate_pool(index: usize, pool: &Value) -> Result<(), ConfigError> {
        for field in POOL_FIELDS {
            let present = pool
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty());

            if !present {
                return Err(ConfigError::PoolMissingField { index, field });
            }
        }

        Ok(())
    }
}
