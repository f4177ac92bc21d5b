use std::collections::HashSet;

use tracing::info;

use crate::auth::{AuthPrincipal, ProjectRole};
use crate::database::connection::DbConnection;
use crate::database::models::project::{
    ContactPayload, FundingPayload, LocationPayload, ParticipantPayload, ParticipantRecord, PermitPayload,
    ProjectCreateRequest, ProjectDetails, ProjectListItem, ProjectState, ProjectUpdateRequest, ProjectView,
    SpatialRecord,
};
use crate::database::repository::{
    contact::ContactRepository, draft::DraftRepository, funding::FundingRepository, iucn::IucnRepository,
    participation::ParticipationRepository, partnership::PartnershipRepository, permit::PermitRepository,
    project::ProjectRepository, spatial::SpatialRepository, species::SpeciesRepository,
};
use crate::error::{ApiError, ApiResult};
use crate::spatial::apply_mask;

use super::require_system_user_id;

pub fn validate_details(details: &ProjectDetails) -> ApiResult<()> {
    if details.name.trim().is_empty() {
        return Err(ApiError::invalid_field("project.name", "is required"));
    }
    if let Some(end) = details.end_date {
        if end < details.start_date {
            return Err(ApiError::invalid_field("project.end_date", "must not be before the start date"));
        }
    }
    if matches!(details.people_involved, Some(n) if n < 0) {
        return Err(ApiError::invalid_field("project.people_involved", "must not be negative"));
    }
    Ok(())
}

/// A non-empty contact list has exactly one primary contact.
pub fn validate_contacts(contacts: &[ContactPayload]) -> ApiResult<()> {
    if contacts.is_empty() {
        return Ok(());
    }
    let primaries = contacts.iter().filter(|c| c.is_primary).count();
    if primaries != 1 {
        return Err(ApiError::invalid_field(
            "contacts",
            format!("must have exactly one primary contact, found {}", primaries),
        ));
    }
    if contacts.iter().any(|c| c.email_address.trim().is_empty()) {
        return Err(ApiError::invalid_field("contacts.email_address", "is required"));
    }
    Ok(())
}

pub fn validate_funding(funding: &[FundingPayload]) -> ApiResult<()> {
    for source in funding {
        if source.end_date < source.start_date {
            return Err(ApiError::invalid_field("funding_sources.end_date", "must not be before the start date"));
        }
        if source.funding_amount < 0.0 {
            return Err(ApiError::invalid_field("funding_sources.funding_amount", "must not be negative"));
        }
    }
    Ok(())
}

pub fn validate_iucn(classifications: &[i32]) -> ApiResult<()> {
    let mut seen = HashSet::new();
    if classifications.iter().all(|id| seen.insert(*id)) {
        Ok(())
    } else {
        Err(ApiError::invalid_field("iucn_classifications", "contains a duplicate classification"))
    }
}

/// Location as published: when a project has mask components only those are
/// shown, each feature's geometry replaced by its mask circle.
pub fn public_location(location: Vec<SpatialRecord>) -> ApiResult<Vec<SpatialRecord>> {
    if !location.iter().any(|c| c.component_type == "Mask") {
        return Ok(location);
    }
    location
        .into_iter()
        .filter(|c| c.component_type == "Mask")
        .map(|mut component| {
            let id = component.project_spatial_component_id;
            let masked = match &mut component.geojson {
                serde_json::Value::Array(features) => features.iter_mut().try_for_each(apply_mask),
                feature => apply_mask(feature),
            };
            masked.map_err(|e| ApiError::internal_server_error(format!("Spatial component {}: {}", id, e)))?;
            Ok(component)
        })
        .collect()
}

pub struct ProjectService<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> ProjectService<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    /// Create a project (or plan) with every section in the request. The
    /// creator becomes its Lead Editor; a referenced draft is deleted.
    pub async fn create(&mut self, request: &ProjectCreateRequest, is_project: bool) -> ApiResult<i32> {
        let details = request
            .project
            .as_ref()
            .ok_or_else(|| ApiError::invalid_field("project", "is required"))?;
        validate_details(details)?;
        validate_contacts(&request.contacts)?;
        validate_funding(&request.funding_sources)?;
        validate_iucn(&request.iucn_classifications)?;

        let system_user_id = require_system_user_id(self.conn.system_user_id())?;

        let project_id = ProjectRepository::new(self.conn).insert(details, is_project).await?;

        self.insert_contacts(project_id, &request.contacts).await?;
        self.insert_funding(project_id, &request.funding_sources).await?;
        self.insert_permits(project_id, &request.permits).await?;
        self.insert_partnerships(project_id, &request.partnerships).await?;
        self.insert_iucn(project_id, &request.iucn_classifications).await?;
        self.insert_species(project_id, &request.focal_species).await?;
        if let Some(location) = &request.location {
            self.insert_location(project_id, location).await?;
        }

        ParticipationRepository::new(self.conn)
            .add(project_id, system_user_id, ProjectRole::LeadEditor)
            .await?;

        if let Some(draft_id) = request.draft_id {
            DraftRepository::new(self.conn).delete(system_user_id, draft_id).await?;
        }

        info!(project_id, is_project, "Created project");
        Ok(project_id)
    }

    pub async fn view(&mut self, project_id: i32) -> ApiResult<ProjectView> {
        let project = ProjectRepository::new(self.conn)
            .get(project_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Project {} not found", project_id)))?;

        Ok(ProjectView {
            project,
            contacts: ContactRepository::new(self.conn).list(project_id).await?,
            funding_sources: FundingRepository::new(self.conn).list(project_id).await?,
            permits: PermitRepository::new(self.conn).list(project_id).await?,
            partnerships: PartnershipRepository::new(self.conn).list(project_id).await?,
            iucn_classifications: IucnRepository::new(self.conn).list(project_id).await?,
            focal_species: SpeciesRepository::new(self.conn).list(project_id).await?,
            location: SpatialRepository::new(self.conn).list(project_id).await?,
        })
    }

    /// Published records only; contacts not marked public are withheld and
    /// masked locations are shown as their circles.
    pub async fn view_published(&mut self, project_id: i32) -> ApiResult<ProjectView> {
        let mut view = self.view(project_id).await?;
        if view.project.state_code != ProjectState::Published.code() {
            return Err(ApiError::not_found(format!("Project {} not found", project_id)));
        }
        view.contacts.retain(|c| c.is_public);
        view.location = public_location(view.location)?;
        Ok(view)
    }

    pub async fn update(&mut self, project_id: i32, request: &ProjectUpdateRequest) -> ApiResult<()> {
        if let Some(update) = &request.project {
            validate_details(&update.details)?;
            let updated = ProjectRepository::new(self.conn)
                .update_details(project_id, &update.details, update.revision_count)
                .await?;
            if updated == 0 {
                self.ensure_exists(project_id).await?;
                return Err(ApiError::conflict(
                    "Failed to update stale project data; reload the project and try again",
                ));
            }
        } else {
            self.ensure_exists(project_id).await?;
        }

        if let Some(contacts) = &request.contacts {
            validate_contacts(contacts)?;
            ContactRepository::new(self.conn).delete_all(project_id).await?;
            self.insert_contacts(project_id, contacts).await?;
        }
        if let Some(funding) = &request.funding_sources {
            validate_funding(funding)?;
            FundingRepository::new(self.conn).delete_all(project_id).await?;
            self.insert_funding(project_id, funding).await?;
        }
        if let Some(permits) = &request.permits {
            PermitRepository::new(self.conn).delete_all(project_id).await?;
            self.insert_permits(project_id, permits).await?;
        }
        if let Some(partnerships) = &request.partnerships {
            PartnershipRepository::new(self.conn).delete_all(project_id).await?;
            self.insert_partnerships(project_id, partnerships).await?;
        }
        if let Some(iucn) = &request.iucn_classifications {
            validate_iucn(iucn)?;
            IucnRepository::new(self.conn).delete_all(project_id).await?;
            self.insert_iucn(project_id, iucn).await?;
        }
        if let Some(species) = &request.focal_species {
            let existing: HashSet<i32> = SpeciesRepository::new(self.conn).list(project_id).await?.into_iter().collect();
            SpeciesRepository::new(self.conn).delete_except(project_id, species).await?;
            let added: Vec<i32> = species.iter().copied().filter(|id| !existing.contains(id)).collect();
            self.insert_species(project_id, &added).await?;
        }
        if let Some(location) = &request.location {
            SpatialRepository::new(self.conn).delete_all(project_id).await?;
            self.insert_location(project_id, location).await?;
        }

        info!(project_id, "Updated project");
        Ok(())
    }

    /// Draft to Published, or back with `publish = false`.
    pub async fn set_published(&mut self, project_id: i32, publish: bool) -> ApiResult<ProjectState> {
        let current = self.state_of(project_id).await?;
        let (from, to) = if publish {
            (ProjectState::Draft, ProjectState::Published)
        } else {
            (ProjectState::Published, ProjectState::Draft)
        };
        if current != from {
            return Err(ApiError::conflict(format!("Project is {:?}, expected {:?}", current, from)));
        }
        ProjectRepository::new(self.conn).set_state(project_id, to).await?;
        Ok(to)
    }

    /// Deleting archives the record.
    pub async fn delete(&mut self, project_id: i32) -> ApiResult<()> {
        if self.state_of(project_id).await? == ProjectState::Archived {
            return Err(ApiError::not_found(format!("Project {} not found", project_id)));
        }
        ProjectRepository::new(self.conn)
            .set_state(project_id, ProjectState::Archived)
            .await?;
        info!(project_id, "Archived project");
        Ok(())
    }

    pub async fn list(&mut self, principal: &AuthPrincipal, is_project: bool) -> ApiResult<Vec<ProjectListItem>> {
        let participant = if principal.sees_all_projects() {
            None
        } else {
            Some(require_system_user_id(principal.system_user_id)?)
        };
        Ok(ProjectRepository::new(self.conn).list(is_project, participant).await?)
    }

    pub async fn list_published(&mut self) -> ApiResult<Vec<ProjectListItem>> {
        let projects = ProjectRepository::new(self.conn).list(true, None).await?;
        Ok(projects
            .into_iter()
            .filter(|p| p.state_code == ProjectState::Published.code())
            .collect())
    }

    pub async fn participants(&mut self, project_id: i32) -> ApiResult<Vec<ParticipantRecord>> {
        self.ensure_exists(project_id).await?;
        Ok(ParticipationRepository::new(self.conn).list(project_id).await?)
    }

    pub async fn add_participant(&mut self, project_id: i32, payload: &ParticipantPayload) -> ApiResult<i32> {
        let role = parse_project_role(&payload.project_role)?;
        self.ensure_exists(project_id).await?;
        Ok(ParticipationRepository::new(self.conn)
            .add(project_id, payload.system_user_id, role)
            .await?)
    }

    pub async fn change_participant_role(&mut self, project_id: i32, participation_id: i32, role: &str) -> ApiResult<()> {
        let role = parse_project_role(role)?;
        let current = self.participant(project_id, participation_id).await?;
        if role != ProjectRole::LeadEditor {
            self.ensure_other_lead(project_id, &current).await?;
        }
        ParticipationRepository::new(self.conn)
            .update_role(project_id, participation_id, role)
            .await?;
        Ok(())
    }

    pub async fn remove_participant(&mut self, project_id: i32, participation_id: i32) -> ApiResult<()> {
        let current = self.participant(project_id, participation_id).await?;
        self.ensure_other_lead(project_id, &current).await?;
        ParticipationRepository::new(self.conn)
            .remove(project_id, participation_id)
            .await?;
        Ok(())
    }

    async fn participant(&mut self, project_id: i32, participation_id: i32) -> ApiResult<ParticipantRecord> {
        ParticipationRepository::new(self.conn)
            .list(project_id)
            .await?
            .into_iter()
            .find(|p| p.project_participation_id == participation_id)
            .ok_or_else(|| ApiError::not_found(format!("Participant {} not found", participation_id)))
    }

    async fn ensure_other_lead(&mut self, project_id: i32, participant: &ParticipantRecord) -> ApiResult<()> {
        if participant.project_role_name != ProjectRole::LeadEditor.name() {
            return Ok(());
        }
        let leads = ParticipationRepository::new(self.conn)
            .count_role(project_id, ProjectRole::LeadEditor)
            .await?;
        if leads <= 1 {
            return Err(ApiError::bad_request("A project must keep at least one Lead Editor"));
        }
        Ok(())
    }

    async fn state_of(&mut self, project_id: i32) -> ApiResult<ProjectState> {
        let project = ProjectRepository::new(self.conn)
            .get(project_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Project {} not found", project_id)))?;
        ProjectState::from_code(project.state_code)
            .ok_or_else(|| ApiError::internal_server_error(format!("Unknown project state {}", project.state_code)))
    }

    async fn ensure_exists(&mut self, project_id: i32) -> ApiResult<()> {
        self.state_of(project_id).await.map(|_| ())
    }

    async fn insert_contacts(&mut self, project_id: i32, contacts: &[ContactPayload]) -> ApiResult<()> {
        for contact in contacts {
            ContactRepository::new(self.conn).insert(project_id, contact).await?;
        }
        Ok(())
    }

    async fn insert_funding(&mut self, project_id: i32, funding: &[FundingPayload]) -> ApiResult<()> {
        for source in funding {
            FundingRepository::new(self.conn).insert(project_id, source).await?;
        }
        Ok(())
    }

    async fn insert_permits(&mut self, project_id: i32, permits: &[PermitPayload]) -> ApiResult<()> {
        for permit in permits {
            PermitRepository::new(self.conn).insert(project_id, permit).await?;
        }
        Ok(())
    }

    async fn insert_partnerships(&mut self, project_id: i32, partnerships: &[String]) -> ApiResult<()> {
        for name in partnerships {
            PartnershipRepository::new(self.conn).insert(project_id, name).await?;
        }
        Ok(())
    }

    async fn insert_iucn(&mut self, project_id: i32, classifications: &[i32]) -> ApiResult<()> {
        for id in classifications {
            IucnRepository::new(self.conn).insert(project_id, *id).await?;
        }
        Ok(())
    }

    async fn insert_species(&mut self, project_id: i32, species: &[i32]) -> ApiResult<()> {
        for id in species {
            SpeciesRepository::new(self.conn).insert(project_id, *id).await?;
        }
        Ok(())
    }

    async fn insert_location(&mut self, project_id: i32, location: &LocationPayload) -> ApiResult<()> {
        SpatialRepository::new(self.conn).insert(project_id, location).await?;
        Ok(())
    }
}

fn parse_project_role(name: &str) -> ApiResult<ProjectRole> {
    ProjectRole::from_name(name).ok_or_else(|| ApiError::invalid_field("project_role", format!("unknown role '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn contact(primary: bool) -> ContactPayload {
        ContactPayload {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email_address: "jane@example.com".into(),
            agency: "Ministry".into(),
            is_public: false,
            is_primary: primary,
        }
    }

    fn details(start: (i32, u32, u32), end: Option<(i32, u32, u32)>) -> ProjectDetails {
        ProjectDetails {
            name: "Caribou".into(),
            objectives: None,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: end.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            is_healing_land: false,
            is_healing_people: false,
            is_land_initiative: false,
            is_cultural_initiative: false,
            people_involved: None,
        }
    }

    #[test]
    fn contacts_need_exactly_one_primary() {
        assert!(validate_contacts(&[]).is_ok());
        assert!(validate_contacts(&[contact(true), contact(false)]).is_ok());

        let none = validate_contacts(&[contact(false), contact(false)]).unwrap_err();
        assert_eq!(none.status_code(), 400);
        assert!(validate_contacts(&[contact(true), contact(true)]).is_err());
    }

    #[test]
    fn dates_must_be_ordered() {
        assert!(validate_details(&details((2024, 1, 1), Some((2024, 12, 31)))).is_ok());
        assert!(validate_details(&details((2024, 1, 1), None)).is_ok());
        assert!(validate_details(&details((2024, 6, 1), Some((2024, 1, 1)))).is_err());

        let mut blank = details((2024, 1, 1), None);
        blank.name = "  ".into();
        assert!(validate_details(&blank).is_err());
    }

    #[test]
    fn duplicate_iucn_classifications_are_rejected() {
        assert!(validate_iucn(&[1, 2, 3]).is_ok());
        assert!(validate_iucn(&[1, 2, 1]).is_err());
    }

    #[test]
    fn funding_ranges_are_checked() {
        let source = FundingPayload {
            funding_source_id: 1,
            funding_project_id: None,
            funding_amount: 1000.0,
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            description: None,
        };
        assert!(validate_funding(&[source]).is_err());
    }

    #[test]
    fn unknown_project_roles_are_bad_requests() {
        assert_eq!(parse_project_role("Lead Editor").unwrap(), ProjectRole::LeadEditor);
        assert_eq!(parse_project_role("Owner").unwrap_err().status_code(), 400);
    }

    fn component(id: i32, component_type: &str, geojson: serde_json::Value) -> SpatialRecord {
        SpatialRecord {
            project_spatial_component_id: id,
            component_type: component_type.into(),
            name: None,
            geojson,
            number_sites: Some(1),
            size_ha: Some(2.5),
            is_within_overlapping: None,
        }
    }

    fn point_feature(properties: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-123.4, 48.4]},
            "properties": properties
        })
    }

    #[test]
    fn unmasked_locations_are_published_as_stored() {
        let location = vec![component(1, "Boundary", serde_json::json!([point_feature(serde_json::json!({}))]))];
        let published = public_location(location.clone()).unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].geojson, location[0].geojson);
    }

    #[test]
    fn masked_locations_hide_the_boundary() {
        let mask = serde_json::json!({"mask": {"centroid": [-123.0, 48.0], "radius": 1000}});
        let location = vec![
            component(1, "Boundary", serde_json::json!([point_feature(serde_json::json!({}))])),
            component(2, "Mask", serde_json::json!([point_feature(mask)])),
        ];
        let published = public_location(location).unwrap();

        assert_eq!(published.len(), 1);
        assert_eq!(published[0].component_type, "Mask");
        assert_eq!(published[0].geojson[0]["geometry"]["type"], "Polygon");
        assert!(!published[0].geojson.to_string().contains("-123.4"));
    }

    #[test]
    fn malformed_public_masks_are_server_errors() {
        let location = vec![component(
            2,
            "Mask",
            serde_json::json!([point_feature(serde_json::json!({"mask": {"radius": 10}}))]),
        )];
        assert_eq!(public_location(location).unwrap_err().status_code(), 500);
    }
}
