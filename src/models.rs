pub mod audit;
pub mod auth;
pub mod billing;
pub mod inventory;
pub mod rbac;

use serde::{de::DeserializeOwned, Deserialize, Deserializer};

/// Valor de tipo errado vira `None`; o `#[validate(required)]` do campo reporta
/// junto com os demais erros do payload.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}
