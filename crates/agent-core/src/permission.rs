//! Permission gate for tool actions.
//!
//! Tools that need user consent build a [`PermissionRequest`] and await a
//! [`PermissionGate`]. [`PermissionService`] is the stock gate: it honours
//! configured pre-approvals and per-session grants, and otherwise asks a
//! [`PermissionPrompter`], one prompt at a time.

use crate::config::PermissionsConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Everything the user needs to decide on one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub session_id: String,
    pub tool_call_id: String,
    pub tool_name: String,
    pub action: String,
    pub description: String,
    /// Directory the action applies to.
    pub path: PathBuf,
    /// Tool-specific parameters, shown to the user.
    pub params: serde_json::Value,
}

#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Returns `true` when the action may proceed.
    async fn request(&self, request: PermissionRequest) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Allow,
    /// Allow, and remember for the rest of the session.
    AllowForSession,
    Deny,
}

/// Something that can put a permission request in front of a human.
#[async_trait]
pub trait PermissionPrompter: Send + Sync {
    async fn ask(&self, request: &PermissionRequest) -> PermissionDecision;
}

/// Prompter for non-interactive hosts.
pub struct DenyAll;

#[async_trait]
impl PermissionPrompter for DenyAll {
    async fn ask(&self, _request: &PermissionRequest) -> PermissionDecision {
        PermissionDecision::Deny
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionGrant {
    session_id: String,
    tool_name: String,
    action: String,
    path: PathBuf,
}

impl SessionGrant {
    fn from_request(request: &PermissionRequest) -> Self {
        Self {
            session_id: request.session_id.clone(),
            tool_name: request.tool_name.clone(),
            action: request.action.clone(),
            path: request.path.clone(),
        }
    }
}

pub struct PermissionService {
    skip_requests: bool,
    allowed_tools: Vec<String>,
    grants: StdMutex<Vec<SessionGrant>>,
    auto_approved: StdMutex<HashSet<String>>,
    prompter: Arc<dyn PermissionPrompter>,
    prompt_lock: Mutex<()>,
}

impl PermissionService {
    pub fn new(config: &PermissionsConfig, prompter: Arc<dyn PermissionPrompter>) -> Self {
        Self {
            skip_requests: config.skip_requests,
            allowed_tools: config.allowed_tools.clone(),
            grants: StdMutex::new(Vec::new()),
            auto_approved: StdMutex::new(HashSet::new()),
            prompter,
            prompt_lock: Mutex::new(()),
        }
    }

    /// Approve every future request from `session_id` without asking.
    pub fn auto_approve_session(&self, session_id: impl Into<String>) {
        self.auto_approved.lock().unwrap().insert(session_id.into());
    }

    /// Remember an approval for this session, tool, action and path.
    pub fn grant_session(&self, request: &PermissionRequest) {
        let grant = SessionGrant::from_request(request);
        let mut grants = self.grants.lock().unwrap();
        if !grants.contains(&grant) {
            grants.push(grant);
        }
    }

    fn is_pre_approved(&self, request: &PermissionRequest) -> bool {
        if self.skip_requests {
            return true;
        }
        let qualified = format!("{}:{}", request.tool_name, request.action);
        if self
            .allowed_tools
            .iter()
            .any(|t| *t == request.tool_name || *t == qualified)
        {
            return true;
        }
        if self
            .auto_approved
            .lock()
            .unwrap()
            .contains(&request.session_id)
        {
            return true;
        }
        self.is_granted(request)
    }

    fn is_granted(&self, request: &PermissionRequest) -> bool {
        let grant = SessionGrant::from_request(request);
        self.grants.lock().unwrap().contains(&grant)
    }
}

#[async_trait]
impl PermissionGate for PermissionService {
    async fn request(&self, request: PermissionRequest) -> bool {
        if self.is_pre_approved(&request) {
            debug!(tool = %request.tool_name, action = %request.action, "Permission pre-approved");
            return true;
        }

        let _prompt = self.prompt_lock.lock().await;
        // A prompt answered while we waited may already cover this request.
        if self.is_granted(&request) {
            return true;
        }

        let decision = self.prompter.ask(&request).await;
        info!(
            tool = %request.tool_name,
            action = %request.action,
            session = %request.session_id,
            ?decision,
            "Permission decided"
        );
        match decision {
            PermissionDecision::Allow => true,
            PermissionDecision::AllowForSession => {
                self.grant_session(&request);
                true
            }
            PermissionDecision::Deny => false,
        }
    }
}
