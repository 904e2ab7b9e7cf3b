//! Project administration and client-facing project data.

use crate::error::{LicenseError, LicenseResult};
use crate::service::{LicenseService, check_seconds};
use nextkey_types::{NewProject, Project, ProjectMode, SessionToken};
use serde::{Deserialize, Serialize};

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_cooldown() -> i64 {
    86_400
}

fn yes() -> bool {
    true
}

/// Admin request to create a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub mode: ProjectMode,
    #[serde(default)]
    pub enable_hwid: bool,
    #[serde(default)]
    pub enable_ip: bool,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub update_url: String,
    /// Session lifetime in seconds; the configured default when unset.
    #[serde(default)]
    pub token_ttl_seconds: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enable_unbind: bool,
    #[serde(default = "yes")]
    pub unbind_verify_hwid: bool,
    #[serde(default)]
    pub unbind_deduct_seconds: i64,
    #[serde(default = "default_cooldown")]
    pub unbind_cooldown_seconds: i64,
    /// Scheme id; the configured default when unset.
    #[serde(default)]
    pub cipher_scheme: Option<String>,
    /// Must be set to choose an insecure or deprecated scheme.
    #[serde(default)]
    pub allow_insecure_cipher: bool,
}

impl CreateProjectRequest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: ProjectMode::default(),
            enable_hwid: false,
            enable_ip: false,
            version: default_version(),
            update_url: String::new(),
            token_ttl_seconds: None,
            description: String::new(),
            enable_unbind: false,
            unbind_verify_hwid: true,
            unbind_deduct_seconds: 0,
            unbind_cooldown_seconds: default_cooldown(),
            cipher_scheme: None,
            allow_insecure_cipher: false,
        }
    }
}

/// Partial project edit. Unset fields are left alone; the uuid and cipher
/// change only through their own operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub mode: Option<ProjectMode>,
    pub enable_hwid: Option<bool>,
    pub enable_ip: Option<bool>,
    pub version: Option<String>,
    pub update_url: Option<String>,
    pub token_ttl_seconds: Option<i64>,
    pub description: Option<String>,
    pub enable_unbind: Option<bool>,
    pub unbind_verify_hwid: Option<bool>,
    pub unbind_deduct_seconds: Option<i64>,
    pub unbind_cooldown_seconds: Option<i64>,
}

impl UpdateProjectRequest {
    fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name.clone_from(name);
        }
        if let Some(mode) = self.mode {
            project.mode = mode;
        }
        if let Some(on) = self.enable_hwid {
            project.enable_hwid = on;
        }
        if let Some(on) = self.enable_ip {
            project.enable_ip = on;
        }
        if let Some(version) = &self.version {
            project.version.clone_from(version);
        }
        if let Some(url) = &self.update_url {
            project.update_url.clone_from(url);
        }
        if let Some(ttl) = self.token_ttl_seconds {
            project.token_ttl_seconds = ttl;
        }
        if let Some(description) = &self.description {
            project.description.clone_from(description);
        }
        if let Some(on) = self.enable_unbind {
            project.enable_unbind = on;
        }
        if let Some(on) = self.unbind_verify_hwid {
            project.unbind_verify_hwid = on;
        }
        if let Some(seconds) = self.unbind_deduct_seconds {
            project.unbind_deduct_seconds = seconds;
        }
        if let Some(seconds) = self.unbind_cooldown_seconds {
            project.unbind_cooldown_seconds = seconds;
        }
    }
}

/// Admin request to move a project to another scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotateCipherRequest {
    pub cipher_scheme: String,
    #[serde(default)]
    pub allow_insecure_cipher: bool,
}

/// What a logged-in client may learn about its project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub uuid: String,
    pub name: String,
    pub version: String,
    pub update_url: String,
}

impl LicenseService {
    pub fn create_project(&self, request: &CreateProjectRequest) -> LicenseResult<Project> {
        let token_ttl_seconds = request
            .token_ttl_seconds
            .unwrap_or(self.config.default_token_ttl_secs);
        validate_settings(
            &request.name,
            token_ttl_seconds,
            request.unbind_deduct_seconds,
            request.unbind_cooldown_seconds,
        )?;

        let scheme = request
            .cipher_scheme
            .clone()
            .unwrap_or_else(|| self.config.default_cipher_scheme.clone());
        let cipher_key = self.checked_key(&scheme, request.allow_insecure_cipher)?;

        let project = self.projects.create_project(
            &NewProject {
                uuid: uuid::Uuid::new_v4().to_string(),
                name: request.name.clone(),
                mode: request.mode,
                enable_hwid: request.enable_hwid,
                enable_ip: request.enable_ip,
                token_ttl_seconds,
                cipher_scheme: scheme,
                cipher_key,
                version: request.version.clone(),
                update_url: request.update_url.clone(),
                description: request.description.clone(),
                enable_unbind: request.enable_unbind,
                unbind_verify_hwid: request.unbind_verify_hwid,
                unbind_deduct_seconds: request.unbind_deduct_seconds,
                unbind_cooldown_seconds: request.unbind_cooldown_seconds,
            },
            self.now(),
        )?;
        tracing::info!(
            project_id = project.id,
            scheme = %project.cipher_scheme,
            mode = %project.mode,
            "project created"
        );
        Ok(project)
    }

    /// Applies a settings edit to an active project.
    pub fn update_project(&self, id: i64, request: &UpdateProjectRequest) -> LicenseResult<Project> {
        let mut project = self.active_project(id)?;
        request.apply(&mut project);
        validate_settings(
            &project.name,
            project.token_ttl_seconds,
            project.unbind_deduct_seconds,
            project.unbind_cooldown_seconds,
        )?;
        if !self.projects.update_project(&project)? {
            return Err(LicenseError::project(id));
        }
        tracing::info!(project_id = id, mode = %project.mode, "project updated");
        Ok(project)
    }

    pub fn list_projects(&self) -> LicenseResult<Vec<Project>> {
        Ok(self.projects.list_active_projects()?)
    }

    /// Soft-deletes a project; its clients can no longer log in.
    pub fn delete_project(&self, id: i64) -> LicenseResult<()> {
        if !self.projects.soft_delete_project(id, self.now())? {
            return Err(LicenseError::project(id));
        }
        tracing::info!(project_id = id, "project deleted");
        Ok(())
    }

    /// Switches a project to `request.cipher_scheme` with a fresh key.
    pub fn rotate_cipher(&self, id: i64, request: &RotateCipherRequest) -> LicenseResult<Project> {
        let mut project = self.active_project(id)?;
        let key = self.checked_key(&request.cipher_scheme, request.allow_insecure_cipher)?;
        if !self
            .projects
            .update_project_cipher(id, &request.cipher_scheme, &key)?
        {
            return Err(LicenseError::project(id));
        }
        tracing::info!(
            project_id = id,
            from = %project.cipher_scheme,
            to = %request.cipher_scheme,
            "project cipher rotated"
        );
        project.cipher_scheme.clone_from(&request.cipher_scheme);
        project.cipher_key = key;
        Ok(project)
    }

    /// Number of unexpired sessions in a project.
    pub fn online_count(&self, project_id: i64) -> LicenseResult<i64> {
        self.active_project(project_id)?;
        Ok(self
            .sessions
            .count_active_sessions(project_id, self.now())?)
    }

    pub fn project_info(&self, session: &SessionToken) -> LicenseResult<ProjectInfo> {
        let project = self.active_project(session.project_id)?;
        Ok(ProjectInfo {
            uuid: project.uuid,
            name: project.name,
            version: project.version,
            update_url: project.update_url,
        })
    }

    // Generates a key for `scheme`, enforcing the insecure-scheme opt-in.
    fn checked_key(&self, scheme: &str, allow_insecure: bool) -> LicenseResult<String> {
        let meta = self.registry.meta(scheme)?;
        if !meta.is_secure() && !allow_insecure {
            return Err(LicenseError::InsecureCipherRequiresOptIn(scheme.to_string()));
        }
        if !meta.is_secure() {
            tracing::warn!(scheme, "insecure cipher scheme selected");
        }
        Ok(self.registry.generate_key(scheme)?)
    }
}

fn validate_settings(name: &str, ttl: i64, deduct: i64, cooldown: i64) -> LicenseResult<()> {
    if name.trim().is_empty() {
        return Err(LicenseError::InvalidInput("project name is required".into()));
    }
    if ttl == 0 {
        return Err(LicenseError::InvalidInput("token ttl must be positive".into()));
    }
    check_seconds("token_ttl_seconds", ttl)?;
    check_seconds("unbind_deduct_seconds", deduct)?;
    check_seconds("unbind_cooldown_seconds", cooldown)
}
