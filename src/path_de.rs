use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::LoadError;

/// Deserialize with JSON-path context in error messages.
///
/// Shape errors (wrong kind, missing field) become [`LoadError::Malformed`]
/// carrying the JSON path; anything else is a plain syntax error.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str, origin: &str) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        match inner.classify() {
            Category::Data => LoadError::malformed(format!("{origin}:{path}"), inner.to_string()),
            _ => LoadError::Syntax {
                origin: origin.to_string(),
                message: format!("at JSON path {path} → {inner}"),
            },
        }
    })
}

/// Same as [`from_str_with_path`] for an already-parsed value (e.g. a JSON pointer target).
pub fn from_value_with_path<T: DeserializeOwned>(
    value: serde_json::Value,
    origin: &str,
) -> Result<T, LoadError> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        LoadError::malformed(format!("{origin}:{path}"), err.into_inner().to_string())
    })
}
