use std::collections::HashMap;

use crate::auth::{ProjectRole, SystemRole};

use super::Rule;

/// Path and query parameters of the incoming request, merged. Path
/// parameters win over query parameters of the same name.
#[derive(Debug, Clone, Default)]
pub struct RouteParams(HashMap<String, String>);

impl RouteParams {
    pub fn new(path: HashMap<String, String>, query: HashMap<String, String>) -> Self {
        let mut params = query;
        params.extend(path);
        Self(params)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for RouteParams {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }
}

pub type RuleBuilder = fn(&RouteParams) -> Rule;

const EDITORS: &[ProjectRole] = &[ProjectRole::LeadEditor, ProjectRole::TeamMemberEditor];
const ALL_PROJECT_ROLES: &[ProjectRole] = &[ProjectRole::LeadEditor, ProjectRole::TeamMemberEditor, ProjectRole::Viewer];

fn project_id(params: &RouteParams) -> Option<&str> {
    params.get("projectId")
}

/// Any recognized system user.
pub fn system_user(_: &RouteParams) -> Rule {
    Rule::SystemUser
}

/// Administrators only (they bypass the tree, so nothing else passes).
pub fn administrator(_: &RouteParams) -> Rule {
    Rule::system_role(&[SystemRole::SystemAdmin])
}

/// Administrators and maintainers.
pub fn maintainer(_: &RouteParams) -> Rule {
    Rule::system_role(&[SystemRole::SystemAdmin, SystemRole::Maintainer])
}

pub fn project_creator(_: &RouteParams) -> Rule {
    Rule::And(vec![
        Rule::SystemUser,
        Rule::system_role(&[SystemRole::SystemAdmin, SystemRole::Maintainer, SystemRole::ProjectCreator]),
    ])
}

/// Any participant of the project, or a maintainer.
pub fn project_viewer(params: &RouteParams) -> Rule {
    Rule::Or(vec![
        Rule::system_role(&[SystemRole::SystemAdmin, SystemRole::Maintainer]),
        Rule::project_role(ALL_PROJECT_ROLES, project_id(params)),
    ])
}

pub fn project_editor(params: &RouteParams) -> Rule {
    Rule::Or(vec![
        Rule::system_role(&[SystemRole::SystemAdmin]),
        Rule::project_role(EDITORS, project_id(params)),
    ])
}

pub fn project_lead(params: &RouteParams) -> Rule {
    Rule::Or(vec![
        Rule::system_role(&[SystemRole::SystemAdmin]),
        Rule::project_role(&[ProjectRole::LeadEditor], project_id(params)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parameters_override_query() {
        let path = HashMap::from([("projectId".to_string(), "7".to_string())]);
        let query = HashMap::from([("projectId".to_string(), "8".to_string()), ("page".to_string(), "2".to_string())]);
        let params = RouteParams::new(path, query);
        assert_eq!(params.get("projectId"), Some("7"));
        assert_eq!(params.get("page"), Some("2"));
    }

    #[test]
    fn project_rules_carry_the_raw_id() {
        let rule = project_editor(&RouteParams::from([("projectId", "12")]));
        assert_eq!(
            rule,
            Rule::Or(vec![
                Rule::system_role(&[SystemRole::SystemAdmin]),
                Rule::project_role(EDITORS, Some("12")),
            ])
        );

        let rule = project_viewer(&RouteParams::default());
        assert!(matches!(rule, Rule::Or(ref c) if matches!(c[1], Rule::ProjectRole { project_id: None, .. })));
    }
}
