//! Attendance desk: company sites and geofenced check-ins

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::entity::Status;
use crate::core::geofence::{classify, Coordinates, LocationEvidence, DEFAULT_RADIUS_METERS};
use crate::core::identity::EntityId;
use crate::core::team::{Actor, ATTENDANCE_VERIFIERS, OWNERS, REGISTRARS};
use crate::core::workflow::{authorize, Action, WorkflowEngine, WorkflowError};
use crate::entities::checkin::{CheckIn, GeofenceStamp, VerificationDecision, VerificationStatus};
use crate::entities::company::{Company, CompanyDraft};
use crate::entities::placement::Placement;
use crate::store::{EntityFilter, EntityStore};

/// A student's check-in attempt
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInRequest {
    pub company_id: EntityId,
    pub evidence: LocationEvidence,
}

/// Check-in creation and supervisor verification
pub struct AttendanceDesk<S> {
    engine: WorkflowEngine<S>,
    default_radius_meters: f64,
}

impl<S: EntityStore> AttendanceDesk<S> {
    pub fn new(engine: WorkflowEngine<S>) -> Self {
        Self {
            engine,
            default_radius_meters: DEFAULT_RADIUS_METERS,
        }
    }

    /// Radius used for companies registered without one
    pub fn with_default_radius(mut self, radius_meters: f64) -> Self {
        self.default_radius_meters = radius_meters;
        self
    }

    pub fn engine(&self) -> &WorkflowEngine<S> {
        &self.engine
    }

    /// Register a host company's site
    pub async fn register_company(
        &self,
        actor: &Actor,
        draft: CompanyDraft,
    ) -> Result<Company, WorkflowError> {
        authorize(actor, REGISTRARS, Action::Create, "company")?;
        draft.validate()?;

        let coords = Coordinates::new(draft.lat, draft.lng)?;
        let mut company = Company::new(draft.name.trim(), coords, &actor.id, Utc::now());
        if let Some(radius) = draft.radius_meters {
            company = company.with_radius(radius);
        }
        if let Some(address) = draft.address.filter(|a| !a.trim().is_empty()) {
            company = company.with_address(address);
        }
        // Reject a bad radius now rather than at the first check-in
        company.site(self.default_radius_meters)?;

        self.engine.store().put(&company).await?;
        info!(entity = %company.id, name = %company.name, "company registered");
        Ok(company)
    }

    pub async fn get_company(&self, id: &EntityId) -> Result<Company, WorkflowError> {
        self.engine
            .store()
            .get::<Company>(id)
            .await?
            .ok_or(WorkflowError::EntityNotFound {
                kind: "company",
                id: *id,
            })
    }

    /// All companies, sorted by name
    pub async fn list_companies(&self) -> Result<Vec<Company>, WorkflowError> {
        let mut companies: Vec<Company> = self.engine.store().list(&EntityFilter::all()).await?;
        companies.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then(a.id.cmp(&b.id)));
        Ok(companies)
    }

    pub async fn get_check_in(&self, id: &EntityId) -> Result<CheckIn, WorkflowError> {
        self.engine
            .store()
            .get::<CheckIn>(id)
            .await?
            .ok_or(WorkflowError::EntityNotFound {
                kind: "check-in",
                id: *id,
            })
    }

    /// Record a check-in, classifying it against the company's geofence
    ///
    /// The classification is computed once here and stored with the check-in.
    pub async fn create_check_in(
        &self,
        actor: &Actor,
        request: CheckInRequest,
    ) -> Result<CheckIn, WorkflowError> {
        authorize(actor, OWNERS, Action::Create, "check-in")?;

        let company = self.get_company(&request.company_id).await?;
        let site = company.site(self.default_radius_meters)?;
        let outcome = classify(&request.evidence, &site)?;
        let stamp = GeofenceStamp::new(request.evidence.coordinates, outcome, site.radius_meters);

        let now = Utc::now();
        let (check, anchor) = self
            .engine
            .placement_window(&actor.id, now.date_naive())
            .await?;

        let mut checkin = CheckIn::new(&actor.id, company.id, stamp, now);
        checkin.placement_check = check;
        checkin.placement_id = anchor;

        self.engine.store().put(&checkin).await?;
        if checkin.geofence.is_outside_geofence() {
            warn!(
                entity = %checkin.id,
                student = %actor.id,
                distance = checkin.geofence.distance_meters().unwrap_or_default(),
                radius = site.radius_meters,
                "check-in outside geofence"
            );
        }
        info!(
            entity = %checkin.id,
            student = %actor.id,
            company = %company.id,
            class = %checkin.geofence.class(),
            "check-in recorded"
        );
        Ok(checkin)
    }

    /// Supervisor's verdict on a check-in
    ///
    /// The verdict can be changed later; the geofence stamp never is.
    pub async fn set_check_in_verification(
        &self,
        id: &EntityId,
        actor: &Actor,
        decision: VerificationDecision,
        comment: Option<&str>,
    ) -> Result<CheckIn, WorkflowError> {
        let _guard = self.engine.lock_entity(id).await?;
        let mut checkin = self.get_check_in(id).await?;
        authorize(actor, ATTENDANCE_VERIFIERS, Action::Verify, "check-in")?;

        self.ensure_supervises(actor, &checkin).await?;

        let previous = checkin.supervisor_verification_status;
        checkin.supervisor_verification_status = decision.into();
        if let Some(text) = comment.filter(|c| !c.trim().is_empty()) {
            checkin.supervisor_comment = Some(text.to_string());
        }
        checkin.verified_by = Some(actor.id.clone());
        checkin.updated = Utc::now();

        self.engine.store().put(&checkin).await?;
        info!(
            entity = %id,
            actor = %actor.id,
            from = %previous,
            to = %checkin.supervisor_verification_status,
            "check-in verification set"
        );
        Ok(checkin)
    }

    /// The actor must be the supervisor named on the student's placement
    ///
    /// The placement the check-in was anchored to decides when it names a
    /// supervisor; otherwise any of the student's approved placements may.
    async fn ensure_supervises(&self, actor: &Actor, checkin: &CheckIn) -> Result<(), WorkflowError> {
        let refuse = |required: String| WorkflowError::UnauthorizedRole {
            role: actor.role,
            action: Action::Verify,
            kind: "check-in",
            required,
        };

        if let Some(placement_id) = checkin.placement_id {
            let placement: Option<Placement> = self.engine.store().get(&placement_id).await?;
            if let Some(assigned) = placement.and_then(|p| p.supervisor_id) {
                return if assigned == actor.id {
                    Ok(())
                } else {
                    Err(refuse(format!("the placement's supervisor ({})", assigned)))
                };
            }
        }

        let filter = EntityFilter {
            owner: Some(checkin.student_id.clone()),
            status: Some(Status::Approved),
        };
        let placements: Vec<Placement> = self.engine.store().list(&filter).await?;
        if placements
            .iter()
            .any(|p| p.supervisor_id.as_deref() == Some(actor.id.as_str()))
        {
            Ok(())
        } else {
            warn!(
                entity = %checkin.id,
                actor = %actor.id,
                student = %checkin.student_id,
                "verifier supervises none of the student's approved placements"
            );
            Err(refuse(format!(
                "a supervisor named on an approved placement of {}",
                checkin.student_id
            )))
        }
    }

    /// A student's check-ins, oldest first
    pub async fn list_check_ins_for(&self, student_id: &str) -> Result<Vec<CheckIn>, WorkflowError> {
        let mut items: Vec<CheckIn> = self
            .engine
            .store()
            .list(&EntityFilter::by_owner(student_id))
            .await?;
        items.sort_by_key(|c| (c.timestamp_utc, c.id));
        debug!(student = student_id, count = items.len(), "listed check-ins");
        Ok(items)
    }

    /// Check-ins in one verification state, oldest first
    pub async fn list_check_ins_by_verification(
        &self,
        status: VerificationStatus,
    ) -> Result<Vec<CheckIn>, WorkflowError> {
        let all: Vec<CheckIn> = self.engine.store().list(&EntityFilter::all()).await?;
        let mut items: Vec<CheckIn> = all
            .into_iter()
            .filter(|c| c.supervisor_verification_status == status)
            .collect();
        items.sort_by_key(|c| (c.timestamp_utc, c.id));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::PlacementCheck;
    use crate::core::workflow::WorkflowConfig;
    use crate::entities::placement::PlacementDraft;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn desk() -> AttendanceDesk<MemoryStore> {
        let engine = WorkflowEngine::new(Arc::new(MemoryStore::new()), WorkflowConfig::default());
        AttendanceDesk::new(engine)
    }

    async fn company(desk: &AttendanceDesk<MemoryStore>) -> Company {
        desk.register_company(
            &Actor::admin("admin-1"),
            CompanyDraft {
                name: "Volta Analytics".to_string(),
                lat: 5.6037,
                lng: -0.1870,
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    /// Store an approved placement naming `supervisor` for `student`
    async fn supervised_by(desk: &AttendanceDesk<MemoryStore>, student: &str, supervisor: &str) {
        let now = Utc::now();
        let mut placement = Placement::new(
            student,
            PlacementDraft {
                company_name: "Volta Analytics".to_string(),
                supervisor_contact: "ama@volta.example".to_string(),
                supervisor_id: Some(supervisor.to_string()),
                start_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2999, 12, 31).unwrap(),
                ..Default::default()
            },
            now,
        );
        placement.review.set_status(Status::Approved, now);
        desk.engine().store().put(&placement).await.unwrap();
    }

    #[tokio::test]
    async fn test_student_cannot_register_company() {
        let desk = desk();
        let err = desk
            .register_company(
                &Actor::student("stu-1"),
                CompanyDraft {
                    name: "Nope Ltd".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnauthorizedRole { .. }));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let desk = desk();
        let admin = Actor::admin("admin-1");

        let bad_coords = CompanyDraft {
            name: "Far Away".to_string(),
            lat: 123.0,
            lng: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            desk.register_company(&admin, bad_coords).await,
            Err(WorkflowError::InvalidCoordinates { .. })
        ));

        let bad_radius = CompanyDraft {
            name: "Shrinking Co".to_string(),
            radius_meters: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            desk.register_company(&admin, bad_radius).await,
            Err(WorkflowError::InvalidRadius(_))
        ));
    }

    #[tokio::test]
    async fn test_check_in_at_site() {
        let desk = desk();
        let co = company(&desk).await;

        let checkin = desk
            .create_check_in(
                &Actor::student("stu-1"),
                CheckInRequest {
                    company_id: co.id,
                    evidence: LocationEvidence::gps(co.registered_coordinates),
                },
            )
            .await
            .unwrap();

        assert!(checkin.geofence.is_gps_verified());
        assert!(!checkin.geofence.is_outside_geofence());
        assert_eq!(checkin.geofence.distance_meters(), Some(0.0));
        assert_eq!(checkin.geofence.radius_meters(), 100.0);
        assert_eq!(checkin.placement_check, PlacementCheck::NoApprovedPlacement);
        assert_eq!(checkin.supervisor_verification_status, VerificationStatus::Pending);
    }

    #[tokio::test]
    async fn test_check_in_unknown_company() {
        let desk = desk();
        let err = desk
            .create_check_in(
                &Actor::student("stu-1"),
                CheckInRequest {
                    company_id: EntityId::new(crate::core::identity::EntityPrefix::Co),
                    evidence: LocationEvidence::manual("GPS off"),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::EntityNotFound { kind: "company", .. }));
    }

    #[tokio::test]
    async fn test_verification_can_be_revised() {
        let desk = desk();
        let co = company(&desk).await;
        supervised_by(&desk, "stu-1", "sup-1").await;
        let checkin = desk
            .create_check_in(
                &Actor::student("stu-1"),
                CheckInRequest {
                    company_id: co.id,
                    evidence: LocationEvidence::manual("Phone battery died"),
                },
            )
            .await
            .unwrap();
        let stamp = checkin.geofence.clone();
        let sup = Actor::supervisor("sup-1");

        let flagged = desk
            .set_check_in_verification(&checkin.id, &sup, VerificationDecision::Flagged, Some("Not seen on site"))
            .await
            .unwrap();
        assert_eq!(flagged.supervisor_verification_status, VerificationStatus::Flagged);

        let verified = desk
            .set_check_in_verification(&checkin.id, &sup, VerificationDecision::Verified, None)
            .await
            .unwrap();
        assert_eq!(verified.supervisor_verification_status, VerificationStatus::Verified);
        assert_eq!(verified.supervisor_comment.as_deref(), Some("Not seen on site"));
        assert_eq!(verified.verified_by.as_deref(), Some("sup-1"));
        assert_eq!(verified.geofence, stamp);
    }

    #[tokio::test]
    async fn test_lecturer_cannot_verify() {
        let desk = desk();
        let co = company(&desk).await;
        let checkin = desk
            .create_check_in(
                &Actor::student("stu-1"),
                CheckInRequest {
                    company_id: co.id,
                    evidence: LocationEvidence::gps(co.registered_coordinates),
                },
            )
            .await
            .unwrap();

        let err = desk
            .set_check_in_verification(&checkin.id, &Actor::lecturer("lec-1"), VerificationDecision::Verified, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnauthorizedRole { action: Action::Verify, .. }));
    }

    #[tokio::test]
    async fn test_unrelated_supervisor_cannot_verify() {
        let desk = desk();
        let co = company(&desk).await;
        let checkin = desk
            .create_check_in(
                &Actor::student("stu-1"),
                CheckInRequest {
                    company_id: co.id,
                    evidence: LocationEvidence::manual("GPS off"),
                },
            )
            .await
            .unwrap();
        assert_eq!(checkin.placement_id, None);

        // No placement at all ties any supervisor to the student
        let err = desk
            .set_check_in_verification(&checkin.id, &Actor::supervisor("sup-9"), VerificationDecision::Verified, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnauthorizedRole { action: Action::Verify, .. }));

        // A placement for someone else's student does not count either
        supervised_by(&desk, "stu-2", "sup-9").await;
        let err = desk
            .set_check_in_verification(&checkin.id, &Actor::supervisor("sup-9"), VerificationDecision::Verified, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnauthorizedRole { .. }));

        supervised_by(&desk, "stu-1", "sup-1").await;
        let verified = desk
            .set_check_in_verification(&checkin.id, &Actor::supervisor("sup-1"), VerificationDecision::Verified, None)
            .await
            .unwrap();
        assert_eq!(verified.supervisor_verification_status, VerificationStatus::Verified);
        let unchanged = desk.get_check_in(&checkin.id).await.unwrap();
        assert_eq!(unchanged.verified_by.as_deref(), Some("sup-1"));
    }

    #[tokio::test]
    async fn test_list_by_verification() {
        let desk = desk();
        let co = company(&desk).await;
        supervised_by(&desk, "stu-1", "sup-1").await;
        let student = Actor::student("stu-1");
        for _ in 0..2 {
            desk.create_check_in(
                &student,
                CheckInRequest {
                    company_id: co.id,
                    evidence: LocationEvidence::gps(co.registered_coordinates),
                },
            )
            .await
            .unwrap();
        }
        let first = desk.list_check_ins_for("stu-1").await.unwrap()[0].id;
        desk.set_check_in_verification(&first, &Actor::supervisor("sup-1"), VerificationDecision::Verified, None)
            .await
            .unwrap();

        let pending = desk
            .list_check_ins_by_verification(VerificationStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_ne!(pending[0].id, first);
    }
}
