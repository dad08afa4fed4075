//! Library-level tests for the review engine, geofencing and the placement queue

use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use idesk::core::{
    haversine_distance, Actor, ApprovalPolicy, AttendanceDesk, CheckInRequest, Coordinates,
    Decision, Entity, LocationEvidence, PlacementQueue, Role, Status, WorkflowConfig,
    WorkflowEngine, WorkflowError,
};
use idesk::entities::{
    CompanyDraft, DailyReport, DailyTask, Placement, PlacementDraft, ReportDraft, TaskDraft,
    VerificationDecision, VerificationStatus,
};
use idesk::store::{EntityStore, MemoryStore, YamlStore};

const OFFICE: (f64, f64) = (5.6037, -0.1870);

fn engine() -> WorkflowEngine<MemoryStore> {
    WorkflowEngine::new(Arc::new(MemoryStore::new()), WorkflowConfig::default())
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
}

fn task_draft(description: &str) -> TaskDraft {
    TaskDraft {
        date: day(1),
        description: description.to_string(),
        ..Default::default()
    }
}

fn placement_draft(department: Option<&str>) -> PlacementDraft {
    PlacementDraft {
        company_name: "Volta Analytics".to_string(),
        supervisor_contact: "ama@volta.example".to_string(),
        start_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2999, 12, 31).unwrap(),
        department: department.map(str::to_string),
        ..Default::default()
    }
}

async fn register_office(desk: &AttendanceDesk<MemoryStore>, radius: f64) -> idesk::core::EntityId {
    desk.register_company(
        &Actor::admin("admin-1"),
        CompanyDraft {
            name: "Volta Analytics".to_string(),
            lat: OFFICE.0,
            lng: OFFICE.1,
            radius_meters: Some(radius),
            address: None,
        },
    )
    .await
    .unwrap()
    .id
}

// ============================================================================
// Review Workflow
// ============================================================================

#[tokio::test]
async fn test_task_review_last_decision_wins_and_keeps_comments() {
    let engine = engine();
    let student = Actor::student("stu-1");
    let task = engine.create_task(&student, task_draft("Built the login form")).await.unwrap();
    assert_eq!(task.review.status, Status::Pending);

    let task: DailyTask = engine.submit(&task.id, &student).await.unwrap();
    assert_eq!(task.review.status, Status::Submitted);

    let task: DailyTask = engine
        .review(&task.id, &Actor::supervisor("sup-1"), Decision::Approved, Some("Great work"))
        .await
        .unwrap();
    assert_eq!(task.review.status, Status::Approved);
    assert_eq!(
        task.review.reviewer_comments.get(&Role::Supervisor).map(String::as_str),
        Some("Great work")
    );

    // A finalized task refuses further review until re-opened
    let err = engine
        .review::<DailyTask>(&task.id, &Actor::lecturer("lec-1"), Decision::Rejected, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::AlreadyFinalized { status: Status::Approved, .. }));
}

#[tokio::test]
async fn test_decision_flip_while_in_review() {
    let engine = engine();
    let student = Actor::student("stu-1");
    let task = engine.create_task(&student, task_draft("Refactored queries")).await.unwrap();

    let task: DailyTask = engine
        .review(&task.id, &Actor::supervisor("sup-1"), Decision::Approved, Some("Great work"))
        .await
        .unwrap();
    assert_eq!(task.review.status, Status::Approved);

    let other = engine.create_task(&student, task_draft("Paired on tests")).await.unwrap();
    engine
        .save_comment::<DailyTask>(&other.id, &Actor::supervisor("sup-1"), "Keep going")
        .await
        .unwrap();
    let other: DailyTask = engine
        .review(&other.id, &Actor::lecturer("lec-1"), Decision::Rejected, Some("Needs detail"))
        .await
        .unwrap();

    assert_eq!(other.review.status, Status::Rejected);
    assert_eq!(
        other.review.reviewer_comments.get(&Role::Supervisor).map(String::as_str),
        Some("Keep going")
    );
    assert_eq!(
        other.review.reviewer_comments.get(&Role::Lecturer).map(String::as_str),
        Some("Needs detail")
    );
}

#[tokio::test]
async fn test_hod_cannot_review_task() {
    let engine = engine();
    let task = engine
        .create_task(&Actor::student("stu-1"), task_draft("Wrote docs"))
        .await
        .unwrap();

    let err = engine
        .review::<DailyTask>(&task.id, &Actor::hod("hod-1"), Decision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnauthorizedRole { role: Role::Hod, .. }));

    let stored: DailyTask = engine.get(&task.id).await.unwrap();
    assert_eq!(stored.review.status, Status::Pending);
}

#[tokio::test]
async fn test_terminal_entities_refuse_submit_and_comment() {
    let engine = engine();
    let student = Actor::student("stu-1");
    let task = engine.create_task(&student, task_draft("Wrote docs")).await.unwrap();
    engine
        .review::<DailyTask>(&task.id, &Actor::lecturer("lec-1"), Decision::Rejected, None)
        .await
        .unwrap();

    let err = engine.submit::<DailyTask>(&task.id, &student).await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { from: Status::Rejected, .. }));

    let err = engine
        .save_comment::<DailyTask>(&task.id, &Actor::supervisor("sup-1"), "Too late")
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::AlreadyFinalized { .. }));
}

#[tokio::test]
async fn test_unanimous_policy_waits_for_every_role() {
    let config = WorkflowConfig {
        approval_policy: ApprovalPolicy::Unanimous,
        ..WorkflowConfig::default()
    };
    let engine = WorkflowEngine::new(Arc::new(MemoryStore::new()), config);
    let student = Actor::student("stu-1");
    let report = engine
        .create_report(
            &student,
            ReportDraft {
                date: day(2),
                title: "Week one".to_string(),
                description: "Onboarding".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine.submit::<DailyReport>(&report.id, &student).await.unwrap();

    let report: DailyReport = engine
        .review(&report.id, &Actor::supervisor("sup-1"), Decision::Approved, None)
        .await
        .unwrap();
    assert_eq!(report.review.status, Status::Submitted);

    let report: DailyReport = engine
        .review(&report.id, &Actor::lecturer("lec-1"), Decision::Approved, None)
        .await
        .unwrap();
    assert_eq!(report.review.status, Status::Approved);
    assert_eq!(report.review.review_log.len(), 2);
}

#[tokio::test]
async fn test_reopen_returns_to_pending_when_enabled() {
    let config = WorkflowConfig {
        allow_reopen: true,
        ..WorkflowConfig::default()
    };
    let engine = WorkflowEngine::new(Arc::new(MemoryStore::new()), config);
    let student = Actor::student("stu-1");
    let task = engine.create_task(&student, task_draft("Wrote docs")).await.unwrap();
    engine
        .review::<DailyTask>(&task.id, &Actor::lecturer("lec-1"), Decision::Rejected, Some("Redo"))
        .await
        .unwrap();

    let err = engine
        .reopen::<DailyTask>(&task.id, &Actor::supervisor("sup-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnauthorizedRole { .. }));

    let task: DailyTask = engine.reopen(&task.id, &Actor::admin("admin-1")).await.unwrap();
    assert_eq!(task.review.status, Status::Pending);
    assert!(task.review.submitted.is_none());
    assert_eq!(
        task.review.reviewer_comments.get(&Role::Lecturer).map(String::as_str),
        Some("Redo")
    );

    let task: DailyTask = engine.submit(&task.id, &student).await.unwrap();
    assert_eq!(task.review.status, Status::Submitted);
}

#[tokio::test]
async fn test_list_by_owner_is_stable() {
    let engine = engine();
    for n in 0..4 {
        let student = Actor::student(if n % 2 == 0 { "stu-1" } else { "stu-2" });
        engine
            .create_task(&student, task_draft(&format!("Task {}", n)))
            .await
            .unwrap();
    }

    let first: Vec<DailyTask> = engine.list_by_owner("stu-1").await.unwrap();
    let second: Vec<DailyTask> = engine.list_by_owner("stu-1").await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert!(first.iter().all(|t| t.owner_id() == "stu-1"));

    let pending: Vec<DailyTask> = engine.list_by_review_status(Status::Pending).await.unwrap();
    assert_eq!(pending.len(), 4);
}

#[tokio::test]
async fn test_storage_outage_is_distinct() {
    let store = Arc::new(MemoryStore::new());
    let engine = WorkflowEngine::new(Arc::clone(&store), WorkflowConfig::default());
    let task = engine
        .create_task(&Actor::student("stu-1"), task_draft("Wrote docs"))
        .await
        .unwrap();

    store.set_online(false);
    let err = engine
        .review::<DailyTask>(&task.id, &Actor::supervisor("sup-1"), Decision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::StorageUnavailable(_)));

    store.set_online(true);
    let stored: DailyTask = engine.get(&task.id).await.unwrap();
    assert_eq!(stored.review.status, Status::Pending);
}

#[tokio::test]
async fn test_concurrent_reviews_serialize_per_entity() {
    let engine = engine();
    let task = engine
        .create_task(&Actor::student("stu-1"), task_draft("Wrote docs"))
        .await
        .unwrap();

    let a = {
        let engine = engine.clone();
        let id = task.id;
        tokio::spawn(async move {
            engine
                .review::<DailyTask>(&id, &Actor::supervisor("sup-1"), Decision::Approved, None)
                .await
        })
    };
    let b = {
        let engine = engine.clone();
        let id = task.id;
        tokio::spawn(async move {
            engine
                .review::<DailyTask>(&id, &Actor::lecturer("lec-1"), Decision::Rejected, None)
                .await
        })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    // Exactly one decision lands; the other sees a finalized entity
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let stored: DailyTask = engine.get(&task.id).await.unwrap();
    assert_eq!(stored.review.review_log.len(), 1);
}

// ============================================================================
// Shared YAML Project
// ============================================================================

fn yaml_engine(root: &std::path::Path) -> WorkflowEngine<YamlStore> {
    WorkflowEngine::new(Arc::new(YamlStore::new(root)), WorkflowConfig::default())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_engines_on_one_project_keep_both_comments() {
    for _ in 0..15 {
        let tmp = tempfile::tempdir().unwrap();
        let first = yaml_engine(tmp.path());
        let second = yaml_engine(tmp.path());
        let task = first
            .create_task(&Actor::student("stu-1"), task_draft("Shared project"))
            .await
            .unwrap();

        let sup = {
            let engine = first.clone();
            let id = task.id;
            tokio::spawn(async move {
                engine
                    .save_comment::<DailyTask>(&id, &Actor::supervisor("sup-1"), "sup note")
                    .await
            })
        };
        let lec = {
            let engine = second.clone();
            let id = task.id;
            tokio::spawn(async move {
                engine
                    .save_comment::<DailyTask>(&id, &Actor::lecturer("lec-1"), "lec note")
                    .await
            })
        };
        sup.await.unwrap().unwrap();
        lec.await.unwrap().unwrap();

        let stored: DailyTask = second.get(&task.id).await.unwrap();
        assert_eq!(stored.review.comment(Role::Supervisor), Some("sup note"));
        assert_eq!(stored.review.comment(Role::Lecturer), Some("lec note"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_engines_on_one_project_finalize_once() {
    let tmp = tempfile::tempdir().unwrap();
    let first = yaml_engine(tmp.path());
    let second = yaml_engine(tmp.path());
    let task = first
        .create_task(&Actor::student("stu-1"), task_draft("Shared project"))
        .await
        .unwrap();

    let a = {
        let engine = first.clone();
        let id = task.id;
        tokio::spawn(async move {
            engine
                .review::<DailyTask>(&id, &Actor::supervisor("sup-1"), Decision::Approved, None)
                .await
        })
    };
    let b = {
        let engine = second.clone();
        let id = task.id;
        tokio::spawn(async move {
            engine
                .review::<DailyTask>(&id, &Actor::lecturer("lec-1"), Decision::Rejected, None)
                .await
        })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(WorkflowError::AlreadyFinalized { .. }))));
    let stored: DailyTask = first.get(&task.id).await.unwrap();
    assert_eq!(stored.review.review_log.len(), 1);
}

// ============================================================================
// Geofence Verification
// ============================================================================

#[test]
fn test_haversine_symmetry_and_identity() {
    let a = Coordinates::new(OFFICE.0, OFFICE.1).unwrap();
    let b = Coordinates::new(6.6885, -1.6244).unwrap();

    assert_eq!(haversine_distance(a, b), haversine_distance(b, a));
    assert_eq!(haversine_distance(a, a), 0.0);
}

#[tokio::test]
async fn test_check_in_on_boundary_is_inside() {
    let desk = AttendanceDesk::new(engine());
    let office = Coordinates::new(OFFICE.0, OFFICE.1).unwrap();
    let device = Coordinates::new(OFFICE.0 + 0.0009, OFFICE.1).unwrap();
    let radius = haversine_distance(device, office);
    let company = register_office(&desk, radius).await;

    let checkin = desk
        .create_check_in(
            &Actor::student("stu-1"),
            CheckInRequest {
                company_id: company,
                evidence: LocationEvidence::gps(device),
            },
        )
        .await
        .unwrap();

    assert!(checkin.geofence.is_gps_verified());
    assert!(!checkin.geofence.is_outside_geofence());
}

#[tokio::test]
async fn test_check_in_150m_away_is_outside() {
    let desk = AttendanceDesk::new(engine());
    let company = register_office(&desk, 100.0).await;
    let device = Coordinates::new(OFFICE.0 + 0.00135, OFFICE.1).unwrap();

    let checkin = desk
        .create_check_in(
            &Actor::student("stu-1"),
            CheckInRequest {
                company_id: company,
                evidence: LocationEvidence::gps(device),
            },
        )
        .await
        .unwrap();

    assert!(checkin.geofence.is_outside_geofence());
    let distance = checkin.geofence.distance_meters().unwrap();
    assert!(distance > 140.0 && distance < 160.0, "distance was {}", distance);
    assert!(checkin.needs_attention());
}

#[tokio::test]
async fn test_manual_check_in_never_fails_geofence() {
    let desk = AttendanceDesk::new(engine());
    let company = register_office(&desk, 100.0).await;

    let checkin = desk
        .create_check_in(
            &Actor::student("stu-1"),
            CheckInRequest {
                company_id: company,
                evidence: LocationEvidence::manual("Phone battery died"),
            },
        )
        .await
        .unwrap();

    assert!(!checkin.geofence.is_gps_verified());
    assert!(!checkin.geofence.is_outside_geofence());
    assert_eq!(checkin.geofence.manual_reason(), Some("Phone battery died"));
}

#[tokio::test]
async fn test_check_in_without_evidence_fails() {
    let desk = AttendanceDesk::new(engine());
    let company = register_office(&desk, 100.0).await;

    let err = desk
        .create_check_in(
            &Actor::student("stu-1"),
            CheckInRequest {
                company_id: company,
                evidence: LocationEvidence {
                    coordinates: None,
                    manual_reason: Some("   ".to_string()),
                },
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::MissingLocationEvidence));

    let stored = desk.list_check_ins_for("stu-1").await.unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_verification_limited_to_placement_supervisor() {
    let engine = engine();
    let queue = PlacementQueue::new(engine.clone());
    let desk = AttendanceDesk::new(engine.clone());
    let company = register_office(&desk, 100.0).await;
    let student = Actor::student("stu-1");

    let placement = queue
        .create_placement(
            &student,
            PlacementDraft {
                supervisor_id: Some("sup-1".to_string()),
                ..placement_draft(None)
            },
        )
        .await
        .unwrap();
    queue
        .review_placement(&placement.id, &Actor::hod("hod-1"), Decision::Approved, None)
        .await
        .unwrap();

    let checkin = desk
        .create_check_in(
            &student,
            CheckInRequest {
                company_id: company,
                evidence: LocationEvidence::manual("Badge reader offline"),
            },
        )
        .await
        .unwrap();
    assert_eq!(checkin.placement_id, Some(placement.id));

    let err = desk
        .set_check_in_verification(&checkin.id, &Actor::supervisor("sup-2"), VerificationDecision::Verified, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnauthorizedRole { .. }));

    let checkin = desk
        .set_check_in_verification(&checkin.id, &Actor::supervisor("sup-1"), VerificationDecision::Flagged, Some("Not seen"))
        .await
        .unwrap();
    assert_eq!(checkin.supervisor_verification_status, VerificationStatus::Flagged);

    let checkin = desk
        .set_check_in_verification(&checkin.id, &Actor::supervisor("sup-1"), VerificationDecision::Verified, None)
        .await
        .unwrap();
    assert_eq!(checkin.supervisor_verification_status, VerificationStatus::Verified);
    assert_eq!(checkin.supervisor_comment.as_deref(), Some("Not seen"));
    assert_eq!(checkin.verified_by.as_deref(), Some("sup-1"));
}

// ============================================================================
// Placement Approval Queue
// ============================================================================

#[tokio::test]
async fn test_queue_orders_by_submission_date() {
    let store = Arc::new(MemoryStore::new());
    let engine = WorkflowEngine::new(Arc::clone(&store), WorkflowConfig::default());
    let queue = PlacementQueue::new(engine);
    let base = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();

    let mut ids = Vec::new();
    for submitted_day in [1, 3, 2] {
        let mut placement = Placement::new("stu-1", placement_draft(None), base);
        placement.review.submitted = Some(base + Duration::days(submitted_day));
        store.put(&placement).await.unwrap();
        ids.push(placement.id);
    }

    let pending = queue.list_pending().await.unwrap();
    let order: Vec<_> = pending.iter().map(|p| p.id).collect();
    assert_eq!(order, vec![ids[0], ids[2], ids[1]]);
    assert_eq!(queue.pending_count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_queue_drops_decided_placements() {
    let queue = PlacementQueue::new(engine());
    let student = Actor::student("stu-1");
    let a = queue.create_placement(&student, placement_draft(None)).await.unwrap();
    let b = queue.create_placement(&student, placement_draft(None)).await.unwrap();

    queue
        .review_placement(&a.id, &Actor::hod("hod-1"), Decision::Rejected, Some("Wrong dates"))
        .await
        .unwrap();

    let pending = queue.list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, b.id);
}

#[tokio::test]
async fn test_placement_review_checks_department() {
    let queue = PlacementQueue::new(engine());
    let student = Actor::student("stu-1").with_department("Computer Science");
    let placement = queue
        .create_placement(&student, placement_draft(Some("Computer Science")))
        .await
        .unwrap();

    let err = queue
        .review_placement(
            &placement.id,
            &Actor::hod("hod-2").with_department("Physics"),
            Decision::Approved,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::DepartmentMismatch { .. }));

    let err = queue
        .review_placement(&placement.id, &Actor::lecturer("lec-1"), Decision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnauthorizedRole { .. }));

    let approved = queue
        .review_placement(
            &placement.id,
            &Actor::hod("hod-1").with_department("computer science "),
            Decision::Approved,
            None,
        )
        .await
        .unwrap();
    assert!(approved.is_approved());
    assert!(queue
        .approved_placement_for("stu-1", day(15))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_only_students_create_placements() {
    let queue = PlacementQueue::new(engine());
    let err = queue
        .create_placement(&Actor::hod("hod-1"), placement_draft(None))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnauthorizedRole { .. }));
}
