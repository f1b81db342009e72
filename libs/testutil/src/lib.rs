use anyhow::{Context, Result, anyhow, bail};
use jsonschema::{Validator, validator_for};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

fn workspace_root() -> PathBuf {
    // workspace root is two levels up from this crate's manifest (libs/testutil)
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("workspace root")
        .to_path_buf()
}

/// Resolves `relative` under the workspace root, refusing `..` escapes.
fn resolve(relative: &Path) -> Result<PathBuf> {
    if relative.is_absolute() {
        bail!("expected a workspace-relative path: {}", relative.display());
    }
    let mut out = workspace_root();
    for component in relative.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            other => bail!(
                "path component {:?} not allowed in {}",
                other,
                relative.display()
            ),
        }
    }
    Ok(out)
}

/// Path of a platform payload fixture: `libs/testutil/fixtures/<platform>/<name>.json`.
pub fn fixture_path(platform: &str, name: &str) -> PathBuf {
    Path::new("libs/testutil/fixtures")
        .join(platform)
        .join(format!("{name}.json"))
}

pub fn load_json(path: impl AsRef<Path>) -> Result<Value> {
    let absolute = resolve(path.as_ref())?;
    let content = fs::read_to_string(&absolute)
        .with_context(|| format!("failed to read {}", absolute.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse json {}", absolute.display()))
}

/// Loads a platform fixture, panicking with the path on failure.
pub fn load_fixture(platform: &str, name: &str) -> Value {
    let path = fixture_path(platform, name);
    load_json(&path).unwrap_or_else(|err| panic!("fixture {}: {err:#}", path.display()))
}

pub fn assert_matches_schema<P>(schema_path: P, value: &Value) -> Result<()>
where
    P: AsRef<Path>,
{
    let compiled = load_compiled_schema(schema_path.as_ref())?;

    let messages: Vec<String> = compiled.iter_errors(value).map(|e| e.to_string()).collect();
    if !messages.is_empty() {
        return Err(anyhow!("schema validation failed: {}", messages.join("; ")));
    }

    Ok(())
}

fn load_compiled_schema(path: &Path) -> Result<Arc<Validator>> {
    static CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<Validator>>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));

    let absolute = resolve(path)?;

    {
        let cache = CACHE.lock().map_err(|_| anyhow!("schema cache poisoned"))?;
        if let Some(schema) = cache.get(&absolute) {
            return Ok(schema.clone());
        }
    }

    let schema_value = load_json(path)?;
    let compiled = validator_for(&schema_value)
        .map_err(|err| anyhow!("failed to compile json schema: {err}"))?;
    let compiled = Arc::new(compiled);

    let mut cache = CACHE.lock().map_err(|_| anyhow!("schema cache poisoned"))?;
    let entry = cache.entry(absolute).or_insert_with(|| compiled.clone());
    Ok(entry.clone())
}

pub fn to_json_value<T>(value: &T) -> Result<Value>
where
    T: Serialize,
{
    serde_json::to_value(value).context("failed to convert to json value")
}

/// Compares two JSON values, printing both sides pretty-printed on mismatch.
/// Object key order is irrelevant; array order is significant.
pub fn assert_json_eq_stable(left: &Value, right: &Value) {
    if left != right {
        panic!(
            "json mismatch\nleft:\n{}\nright:\n{}",
            serde_json::to_string_pretty(left).unwrap_or_default(),
            serde_json::to_string_pretty(right).unwrap_or_default()
        );
    }
}

#[macro_export]
macro_rules! fixture {
    ($platform:expr, $name:expr $(,)?) => {{ $crate::load_fixture($platform, $name) }};
}
