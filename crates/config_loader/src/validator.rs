//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (frequency_hz > 0, capture_timeout_ms > 0, poll_interval_ms > 0, window.depth >= 1)
//!   由 `validator` derive 完成
//! - 至少一个相机
//! - 相机 id 非空且唯一
//! - 显示分辨率 > 0
//! - sink 名称非空且唯一

use std::collections::HashSet;

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{ContractError, RigBlueprint};

/// 校验 RigBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RigBlueprint) -> Result<(), ContractError> {
    validate_sources_present(blueprint)?;
    validate_field_ranges(blueprint)?;
    validate_source_ids(blueprint)?;
    validate_display(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// 至少需要一个相机
fn validate_sources_present(blueprint: &RigBlueprint) -> Result<(), ContractError> {
    if blueprint.sources.is_empty() {
        return Err(ContractError::config_validation(
            "sources",
            "at least one source is required",
        ));
    }
    Ok(())
}

/// derive 字段范围校验
fn validate_field_ranges(blueprint: &RigBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_error(&errors, String::new())
            .unwrap_or_else(|| ("blueprint".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// 按字段名排序取第一个错误 (保证错误信息稳定)
fn first_error(errors: &ValidationErrors, prefix: String) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in fields {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };

        let found = match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                (path.clone(), message)
            }),
            ValidationErrorsKind::Struct(inner) => first_error(inner, path.clone()),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_error(inner, format!("{path}[{idx}]"))),
        };

        if found.is_some() {
            return found;
        }
    }

    None
}

/// 校验相机 id 非空且唯一
fn validate_source_ids(blueprint: &RigBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, source) in blueprint.sources.iter().enumerate() {
        if source.id.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sources[{idx}].id"),
                "source id cannot be empty",
            ));
        }
        if !seen.insert(source.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("sources[id={}]", source.id),
                "duplicate source id",
            ));
        }
    }
    Ok(())
}

/// 校验显示格式
fn validate_display(blueprint: &RigBlueprint) -> Result<(), ContractError> {
    let display = &blueprint.rig.display;
    if display.width == 0 || display.height == 0 {
        return Err(ContractError::config_validation(
            "rig.display",
            format!(
                "display dimensions must be > 0, got {}x{}",
                display.width, display.height
            ),
        ));
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &RigBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}
