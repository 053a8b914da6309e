//! Configuration provider trait.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{ConfigError, ConfigResult};

/// A read-only source of configuration values keyed by dotted names.
#[async_trait::async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Raw value for `key`, if this provider has one.
    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>>;
}

/// Typed access on top of [`ConfigProvider::get_raw`].
pub trait ConfigProviderExt: ConfigProvider {
    /// Parse the raw value as JSON into `T`. Text that is not valid JSON is
    /// tried once more as a JSON string, so `HUB_X=abc` works for string
    /// settings without quoting.
    fn get<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<T>>> + Send
    where
        Self: Sync,
    {
        async move {
            let Some(raw) = self.get_raw(key).await? else {
                return Ok(None);
            };
            let parsed = serde_json::from_str::<T>(&raw)
                .or_else(|_| serde_json::from_value::<T>(Value::String(raw)));
            parsed.map(Some).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        }
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProviderExt for P {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait::async_trait]
    impl ConfigProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn get_raw(&self, _key: &str) -> ConfigResult<Option<String>> {
            Ok(Some(self.0.to_string()))
        }
    }

    #[tokio::test]
    async fn test_typed_get() {
        let n: Option<u64> = Fixed("45").get("n").await.unwrap();
        assert_eq!(n, Some(45));

        let s: Option<String> = Fixed("plain text").get("s").await.unwrap();
        assert_eq!(s.as_deref(), Some("plain text"));
    }

    #[tokio::test]
    async fn test_invalid_value_names_key() {
        let err = Fixed("soon").get::<u64>("request_timeout_secs").await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid value for request_timeout_secs"));
    }
}
