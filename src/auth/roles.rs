use serde::{Deserialize, Serialize};

/// Application-wide permission tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemRole {
    #[serde(rename = "System Administrator")]
    SystemAdmin,
    #[serde(rename = "Maintainer")]
    Maintainer,
    #[serde(rename = "Project Creator")]
    ProjectCreator,
}

impl SystemRole {
    pub fn name(&self) -> &'static str {
        match self {
            SystemRole::SystemAdmin => "System Administrator",
            SystemRole::Maintainer => "Maintainer",
            SystemRole::ProjectCreator => "Project Creator",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "System Administrator" => Some(SystemRole::SystemAdmin),
            "Maintainer" => Some(SystemRole::Maintainer),
            "Project Creator" => Some(SystemRole::ProjectCreator),
            _ => None,
        }
    }
}

/// Permissions scoped to one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectRole {
    #[serde(rename = "Lead Editor")]
    LeadEditor,
    #[serde(rename = "Team Member Editor")]
    TeamMemberEditor,
    #[serde(rename = "Viewer")]
    Viewer,
}

impl ProjectRole {
    pub fn name(&self) -> &'static str {
        match self {
            ProjectRole::LeadEditor => "Lead Editor",
            ProjectRole::TeamMemberEditor => "Team Member Editor",
            ProjectRole::Viewer => "Viewer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Lead Editor" => Some(ProjectRole::LeadEditor),
            "Team Member Editor" => Some(ProjectRole::TeamMemberEditor),
            "Viewer" => Some(ProjectRole::Viewer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_serde() {
        let json = serde_json::to_string(&SystemRole::ProjectCreator).unwrap();
        assert_eq!(json, "\"Project Creator\"");
        assert_eq!(SystemRole::from_name("Maintainer"), Some(SystemRole::Maintainer));
        assert_eq!(ProjectRole::from_name(ProjectRole::LeadEditor.name()), Some(ProjectRole::LeadEditor));
        assert_eq!(ProjectRole::from_name("Owner"), None);
    }
}
