//! Declarative access rules and their evaluation.
//!
//! A route describes who may call it as a [`Rule`] tree. The tree is plain
//! data, rebuilt from the request parameters on every call, and evaluated
//! against the request's [`AuthPrincipal`] before the handler runs.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use crate::auth::{AuthPrincipal, ProjectRole, SystemRole};
use crate::database::error::{SqlError, SqlResultExt};
use crate::database::repository::participation::ParticipationRepository;

pub mod rules;

pub use rules::RouteParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// The principal holds one of these system roles.
    SystemRole(Vec<SystemRole>),
    /// The principal participates in the project with one of these roles.
    /// `project_id` is the raw request parameter.
    ProjectRole {
        roles: Vec<ProjectRole>,
        project_id: Option<String>,
    },
    /// The principal is a recognized, active, non-pending system user.
    SystemUser,
    And(Vec<Rule>),
    Or(Vec<Rule>),
}

impl Rule {
    pub fn system_role(roles: &[SystemRole]) -> Self {
        Rule::SystemRole(roles.to_vec())
    }

    pub fn project_role(roles: &[ProjectRole], project_id: Option<&str>) -> Self {
        Rule::ProjectRole {
            roles: roles.to_vec(),
            project_id: project_id.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Forbidden,
    Unauthenticated,
}

/// Source of a user's roles on one project.
#[async_trait]
pub trait ProjectRoleLookup: Send + Sync {
    async fn project_roles(&self, system_user_id: i32, project_id: i32) -> Result<Vec<String>, SqlError>;
}

#[async_trait]
impl ProjectRoleLookup for PgPool {
    async fn project_roles(&self, system_user_id: i32, project_id: i32) -> Result<Vec<String>, SqlError> {
        let stmt = ParticipationRepository::project_roles_statement(system_user_id, project_id);
        let rows: Vec<(String,)> = stmt.fetch_all(self).await.origin("ProjectRoleLookup->project_roles")?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

/// Evaluates one rule tree for one principal. Project-role lookups are
/// cached for the lifetime of the evaluator, so each project id is fetched
/// at most once.
pub struct RuleEvaluator<'a, L: ProjectRoleLookup + ?Sized> {
    principal: &'a AuthPrincipal,
    lookup: &'a L,
    project_roles: HashMap<i32, Vec<String>>,
}

impl<'a, L: ProjectRoleLookup + ?Sized> RuleEvaluator<'a, L> {
    pub fn new(principal: &'a AuthPrincipal, lookup: &'a L) -> Self {
        Self {
            principal,
            lookup,
            project_roles: HashMap::new(),
        }
    }

    pub fn evaluate<'s>(&'s mut self, rule: &'s Rule) -> BoxFuture<'s, Result<bool, SqlError>> {
        Box::pin(async move {
            match rule {
                Rule::And(children) => {
                    for child in children {
                        if !self.evaluate(child).await? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                Rule::Or(children) => {
                    for child in children {
                        if self.evaluate(child).await? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                Rule::SystemRole(roles) => Ok(self.principal.has_system_role(roles)),
                Rule::SystemUser => Ok(self.principal.is_valid_system_user()),
                Rule::ProjectRole { roles, project_id } => {
                    let Some(project_id) = project_id.as_deref().and_then(|id| id.trim().parse::<i32>().ok()) else {
                        return Ok(false);
                    };
                    let Some(system_user_id) = self.principal.system_user_id else {
                        return Ok(false);
                    };
                    let held = self.roles_for(system_user_id, project_id).await?;
                    Ok(held.iter().any(|name| roles.iter().any(|role| role.name() == name)))
                }
            }
        })
    }

    async fn roles_for(&mut self, system_user_id: i32, project_id: i32) -> Result<&[String], SqlError> {
        if !self.project_roles.contains_key(&project_id) {
            let roles = self.lookup.project_roles(system_user_id, project_id).await?;
            self.project_roles.insert(project_id, roles);
        }
        Ok(self.project_roles.get(&project_id).map(Vec::as_slice).unwrap_or_default())
    }
}

/// Decide whether `principal` may proceed under `rule`.
///
/// A caller with no resolved system user is unauthenticated; an inactive
/// record is forbidden; a System Administrator is allowed outright.
pub async fn authorize<L>(principal: Option<&AuthPrincipal>, rule: &Rule, lookup: &L) -> Result<Decision, SqlError>
where
    L: ProjectRoleLookup + ?Sized,
{
    let Some(principal) = principal.filter(|p| p.system_user_id.is_some()) else {
        return Ok(Decision::Unauthenticated);
    };

    if !principal.record_active {
        return Ok(Decision::Forbidden);
    }

    if principal.is_system_admin() {
        return Ok(Decision::Allow);
    }

    let allowed = RuleEvaluator::new(principal, lookup).evaluate(rule).await?;
    debug!(system_user_id = ?principal.system_user_id, allowed, "Evaluated access rule");

    Ok(if allowed { Decision::Allow } else { Decision::Forbidden })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockLookup {
        roles: HashMap<i32, Vec<String>>,
        calls: AtomicUsize,
        seen: Mutex<Vec<i32>>,
    }

    impl MockLookup {
        fn new(entries: &[(i32, &str)]) -> Self {
            let mut roles: HashMap<i32, Vec<String>> = HashMap::new();
            for (project_id, role) in entries {
                roles.entry(*project_id).or_default().push(role.to_string());
            }
            Self {
                roles,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(vec![]),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProjectRoleLookup for MockLookup {
        async fn project_roles(&self, _system_user_id: i32, project_id: i32) -> Result<Vec<String>, SqlError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(project_id);
            Ok(self.roles.get(&project_id).cloned().unwrap_or_default())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl ProjectRoleLookup for FailingLookup {
        async fn project_roles(&self, _: i32, _: i32) -> Result<Vec<String>, SqlError> {
            Err(SqlError::unexpected("lookup failed", "FailingLookup"))
        }
    }

    fn principal(roles: &[&str]) -> AuthPrincipal {
        AuthPrincipal {
            user_identifier: "jdoe".into(),
            identity_source: "IDIR".into(),
            username: "jdoe@idir".into(),
            email: None,
            display_name: None,
            system_user_id: Some(10),
            system_roles: roles.iter().map(|r| r.to_string()).collect(),
            record_active: true,
            has_project_roles: true,
        }
    }

    fn lead(project_id: &str) -> Rule {
        Rule::project_role(&[ProjectRole::LeadEditor], Some(project_id))
    }

    #[tokio::test]
    async fn and_stops_at_first_failure() {
        let lookup = MockLookup::new(&[(2, "Lead Editor")]);
        let user = principal(&[]);
        let rule = Rule::And(vec![lead("1"), lead("2"), lead("3")]);

        let allowed = RuleEvaluator::new(&user, &lookup).evaluate(&rule).await.unwrap();
        assert!(!allowed);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn or_stops_at_first_success() {
        let lookup = MockLookup::new(&[(1, "Lead Editor")]);
        let user = principal(&[]);
        let rule = Rule::Or(vec![lead("1"), lead("2"), lead("3")]);

        let allowed = RuleEvaluator::new(&user, &lookup).evaluate(&rule).await.unwrap();
        assert!(allowed);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn lookups_are_deduplicated_per_project() {
        let lookup = MockLookup::new(&[(5, "Viewer")]);
        let user = principal(&[]);
        let rule = Rule::Or(vec![
            lead("5"),
            Rule::project_role(&[ProjectRole::TeamMemberEditor], Some("5")),
            Rule::And(vec![Rule::project_role(&[ProjectRole::Viewer], Some("5")), lead("6")]),
        ]);

        let allowed = RuleEvaluator::new(&user, &lookup).evaluate(&rule).await.unwrap();
        assert!(!allowed);
        assert_eq!(*lookup.seen.lock().unwrap(), vec![5, 6]);
    }

    #[tokio::test]
    async fn missing_or_non_numeric_project_id_is_false() {
        let lookup = MockLookup::new(&[(1, "Lead Editor")]);
        let user = principal(&[]);

        for rule in [
            Rule::project_role(&[ProjectRole::LeadEditor], None),
            lead("abc"),
            lead(""),
            lead("1.5"),
        ] {
            let allowed = RuleEvaluator::new(&user, &lookup).evaluate(&rule).await.unwrap();
            assert!(!allowed);
        }
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn nested_trees_combine_system_and_project_roles() {
        let lookup = MockLookup::new(&[(3, "Team Member Editor")]);
        let user = principal(&["Project Creator"]);
        let rule = Rule::And(vec![
            Rule::SystemUser,
            Rule::Or(vec![
                Rule::system_role(&[SystemRole::Maintainer]),
                Rule::project_role(&[ProjectRole::LeadEditor, ProjectRole::TeamMemberEditor], Some("3")),
            ]),
        ]);

        assert_eq!(authorize(Some(&user), &rule, &lookup).await.unwrap(), Decision::Allow);
    }

    #[tokio::test]
    async fn unresolved_principal_is_unauthenticated() {
        let lookup = MockLookup::new(&[]);
        let mut user = principal(&[]);
        user.system_user_id = None;

        assert_eq!(authorize(Some(&user), &Rule::SystemUser, &lookup).await.unwrap(), Decision::Unauthenticated);
        assert_eq!(authorize(None, &Rule::SystemUser, &lookup).await.unwrap(), Decision::Unauthenticated);
    }

    #[tokio::test]
    async fn failing_rule_is_forbidden() {
        let lookup = MockLookup::new(&[]);
        let user = principal(&["Project Creator"]);
        let rule = Rule::system_role(&[SystemRole::Maintainer]);
        assert_eq!(authorize(Some(&user), &rule, &lookup).await.unwrap(), Decision::Forbidden);

        let mut ended = principal(&["Maintainer"]);
        ended.record_active = false;
        assert_eq!(authorize(Some(&ended), &rule, &lookup).await.unwrap(), Decision::Forbidden);
    }

    #[tokio::test]
    async fn administrators_skip_the_tree() {
        let user = principal(&["System Administrator"]);
        let rule = lead("99");
        assert_eq!(authorize(Some(&user), &rule, &FailingLookup).await.unwrap(), Decision::Allow);
    }

    #[tokio::test]
    async fn lookup_failures_propagate() {
        let user = principal(&[]);
        assert!(authorize(Some(&user), &lead("1"), &FailingLookup).await.is_err());
    }

    #[test]
    fn rules_are_plain_data() {
        let rule = Rule::Or(vec![Rule::SystemUser, lead("4")]);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"or": ["system_user", {"project_role": {"roles": ["Lead Editor"], "project_id": "4"}}]})
        );
        let back: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }
}
