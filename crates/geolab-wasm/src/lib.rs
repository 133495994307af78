use anyhow::{bail, Context};
use serde_json::Value;
use wasm_bindgen::prelude::*;

use geolab_core::render::{build_scene, svg::to_svg};
use geolab_core::{process_batch, BatchResult, FieldScheme, PipelineConfig, RawRow};

/// Rows arrive as a JSON array of objects; every cell becomes text so the
/// core parser sees exactly what a CSV reader would hand it.
fn parse_rows(rows_json: &str) -> anyhow::Result<Vec<RawRow>> {
    let value: Value = serde_json::from_str(rows_json).context("rows must be valid JSON")?;
    let Value::Array(items) = value else {
        bail!("rows must be a JSON array of objects");
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(RawRow::from_pairs(map.into_iter().map(|(k, v)| {
                let text = match v {
                    Value::Null => String::new(),
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            }))),
            _ => bail!("row {} is not a JSON object", i + 1),
        })
        .collect()
}

fn parse_config(config_json: &str) -> anyhow::Result<PipelineConfig> {
    let config: PipelineConfig = if config_json.trim().is_empty() {
        PipelineConfig::default()
    } else {
        serde_json::from_str(config_json).context("invalid config JSON")?
    };
    config.validate()?;
    Ok(config)
}

fn run(rows_json: &str, config_json: &str) -> anyhow::Result<(BatchResult, PipelineConfig)> {
    let rows = parse_rows(rows_json)?;
    let config = parse_config(config_json)?;
    let table = config.field_table()?;
    let result = process_batch(&rows, &table, &config.batch_options())?;
    Ok((result, config))
}

fn js_err(e: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{e:#}"))
}

/// Run a batch and return the full `BatchResult`.
#[wasm_bindgen]
pub fn run_batch(rows_json: &str, config_json: &str) -> Result<JsValue, JsValue> {
    let (result, _) = run(rows_json, config_json).map_err(js_err)?;
    serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Run a batch and return the labelled ternary plot as SVG text.
#[wasm_bindgen]
pub fn render_svg(rows_json: &str, config_json: &str) -> Result<String, JsValue> {
    let (result, config) = run(rows_json, config_json).map_err(js_err)?;
    let table = config.field_table().map_err(|e| js_err(e.into()))?;
    let scene = build_scene(&result.samples, &table, &config.render);
    Ok(to_svg(&scene, &config.render))
}

/// Names of the fields in a built-in scheme (`"dickinson"` or `"pettijohn"`).
#[wasm_bindgen]
pub fn field_names(scheme: &str) -> Result<JsValue, JsValue> {
    let scheme: FieldScheme =
        serde_json::from_value(Value::String(scheme.to_string())).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let names: Vec<&str> = scheme.table().names().collect();
    serde_wasm_bindgen::to_value(&names).map_err(|e| JsValue::from_str(&e.to_string()))
}
