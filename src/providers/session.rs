use super::SessionProvider;
use crate::config::SessionConfig;

/// Session backed by configuration, active whenever a role is set.
#[derive(Debug, Clone)]
pub struct StaticSession {
    role: String,
    operator: Option<String>,
}

impl StaticSession {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            operator: None,
        }
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }
}

impl From<&SessionConfig> for StaticSession {
    fn from(config: &SessionConfig) -> Self {
        Self {
            role: config.role.clone(),
            operator: config.operator.clone(),
        }
    }
}

impl SessionProvider for StaticSession {
    fn is_active(&self) -> bool {
        !self.role.trim().is_empty()
    }

    fn role_label(&self) -> &str {
        &self.role
    }
}
