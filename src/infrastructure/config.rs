use crate::domain::day_codes::DAY_ORDER;
use crate::infrastructure::error::InfraError;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const DEFAULT_API_BASE_URL: &str = "https://api.fieldcrew.app/v1/";
const DEFAULT_TASKS_PER_PAGE: u32 = 15;

fn default_app_config() -> serde_json::Value {
    serde_json::json!({
        "schema": 1,
        "appName": "FieldCrew",
        "apiBaseUrl": DEFAULT_API_BASE_URL,
        "tasksPerPage": DEFAULT_TASKS_PER_PAGE,
        "defaultWorkingDays": ["monday", "tuesday", "wednesday", "thursday", "friday"]
    })
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(APP_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&default_app_config())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn read_api_base_url(config_dir: &Path) -> Result<String, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    Ok(app
        .get("apiBaseUrl")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_API_BASE_URL)
        .to_string())
}

pub fn read_tasks_per_page(config_dir: &Path) -> Result<u32, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    Ok(app
        .get("tasksPerPage")
        .and_then(serde_json::Value::as_u64)
        .filter(|value| *value > 0 && *value <= 100)
        .map(|value| value as u32)
        .unwrap_or(DEFAULT_TASKS_PER_PAGE))
}

/// The screen's prior default day selection, shown when the server reports
/// zero working days. Unknown names are dropped so a typo in the config file
/// cannot introduce an eighth day.
pub fn read_default_working_days(config_dir: &Path) -> Result<Vec<String>, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let configured = app
        .get("defaultWorkingDays")
        .and_then(serde_json::Value::as_array)
        .map(|days| {
            days.iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|day| DAY_ORDER.contains(day))
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if configured.is_empty() {
        return Ok(DAY_ORDER[..5].iter().map(|day| day.to_string()).collect());
    }
    Ok(configured)
}
