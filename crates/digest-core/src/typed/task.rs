//! Task trait - 型付き Job payload の定義
//!
//! A task type ties a job name to the payload its handler receives.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::RunId;

/// Payload type bound to a job name.
///
/// # 命名規約
/// - `{namespace}.{domain}.{action}.v{major}`
/// - 例: `digests.daily.send.v1`
pub trait Task: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TYPE: &'static str;
}

/// Payload every scheduled run receives: which run is executing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPayload {
    pub run_id: RunId,
}

/// Daily digest job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendDigest {
    pub run_id: RunId,
}

impl Task for SendDigest {
    const TYPE: &'static str = "digests.daily.send.v1";
}
