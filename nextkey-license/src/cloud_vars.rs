//! Per-project remote variables.

use crate::error::{LicenseError, LicenseResult};
use crate::service::LicenseService;
use nextkey_types::{CloudVar, SessionToken};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCloudVarRequest {
    pub project_id: i64,
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl LicenseService {
    /// Inserts or overwrites a variable.
    pub fn set_cloud_var(&self, request: &SetCloudVarRequest) -> LicenseResult<CloudVar> {
        if request.key.is_empty() {
            return Err(LicenseError::InvalidInput("key is required".into()));
        }
        self.active_project(request.project_id)?;
        let var = self.cloud_vars.set_cloud_var(
            request.project_id,
            &request.key,
            &request.value,
            self.now(),
        )?;
        tracing::debug!(project_id = request.project_id, key = %request.key, "cloud var set");
        Ok(var)
    }

    pub fn list_cloud_vars(&self, project_id: Option<i64>) -> LicenseResult<Vec<CloudVar>> {
        Ok(self.cloud_vars.list_cloud_vars(project_id)?)
    }

    pub fn delete_cloud_var(&self, id: i64) -> LicenseResult<()> {
        if !self.cloud_vars.delete_cloud_var(id)? {
            return Err(LicenseError::NotFound(format!("cloud variable {id}")));
        }
        Ok(())
    }

    /// Reads a variable of the session's project.
    pub fn cloud_var_for_session(
        &self,
        session: &SessionToken,
        key: &str,
    ) -> LicenseResult<CloudVar> {
        self.cloud_vars
            .get_cloud_var(session.project_id, key)?
            .ok_or_else(|| LicenseError::NotFound(format!("cloud variable {key}")))
    }
}
