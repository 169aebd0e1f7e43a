use anyhow::Result;
use serde_json::Value;

use super::ApiClient;
use crate::cache::CodeSource;
use crate::models::{parse_code_envelope, ReferenceCodeItem};

/// Children of a system code, looked up by parent id.
pub const SYSCODE_BY_PARENT_PATH: &str = "/systemmanage/syscode/by_parent/";

impl ApiClient {
    /// Fetch and normalise the child codes of `parent_id`.
    ///
    /// Unknown envelopes yield an empty list; transport and HTTP failures
    /// are errors.
    pub async fn fetch_sys_codes_by_parent(&self, parent_id: &str) -> Result<Vec<ReferenceCodeItem>> {
        let body: Value = self
            .get_json(SYSCODE_BY_PARENT_PATH, &[("parent_id", parent_id)])
            .await?;
        Ok(parse_code_envelope(&body))
    }
}

impl CodeSource for ApiClient {
    async fn fetch_by_parent(&self, parent_id: &str) -> Result<Vec<ReferenceCodeItem>> {
        self.fetch_sys_codes_by_parent(parent_id).await
    }
}
