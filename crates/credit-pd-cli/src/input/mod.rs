pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Deserialize command input from `--input <file>` or, failing that, piped stdin.
pub fn load<T: DeserializeOwned>(path: Option<&str>) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_structured(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("--input <file.json|file.yaml> or stdin required".into())
    }
}
