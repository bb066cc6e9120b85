use serde::Deserialize;

use crate::shared::ValidationError;

/// JSONPaths file mapping event log fields onto the `staging_events` columns.
pub const DEFAULT_LOG_JSONPATH: &str = "s3://udacity-dend/log_json_path.json";

/// Region of the source bucket.
pub const DEFAULT_REGION: &str = "us-west-2";

const S3_SCHEME: &str = "s3://";

/// The `[S3]` section: where the raw datasets live.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// Prefix holding the event log JSON files.
    pub log_data: String,
    /// Prefix holding the song catalog JSON files.
    pub song_data: String,
    #[serde(default = "default_log_jsonpath")]
    pub log_jsonpath: String,
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_log_jsonpath() -> String {
    DEFAULT_LOG_JSONPATH.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl S3Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (key, value) in [
            ("log_data", &self.log_data),
            ("song_data", &self.song_data),
            ("log_jsonpath", &self.log_jsonpath),
        ] {
            let bucket_and_key = value.strip_prefix(S3_SCHEME).unwrap_or_default();
            if bucket_and_key.is_empty() || bucket_and_key.starts_with('/') {
                return Err(ValidationError::InvalidS3Uri {
                    key,
                    value: value.clone(),
                });
            }
        }

        if self.region.trim().is_empty() {
            return Err(ValidationError::EmptyValue("region"));
        }

        Ok(())
    }
}
