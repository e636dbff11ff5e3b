//! The minutes wizard: step order, validation and history snapshots.

mod common;

use condominio::models::acta::{AttendanceType, VoteOutcome, VotingResult};
use condominio::models::minutes::{AgendaItem, MinuteStatus};
use condominio::models::signature::SignerType;
use condominio::workflow::{ActaStep, ActaWorkflow, SignerRole, WorkflowError};
use common::*;

fn quorate_attendance() -> Vec<condominio::models::acta::Attendee> {
    vec![
        attendee("Ana Silva", AttendanceType::Present, 300.0),
        attendee("Rui Costa", AttendanceType::Represented, 250.0),
        attendee("Marta Lopes", AttendanceType::Absent, 450.0),
    ]
}

fn workflow_in_deliberation() -> ActaWorkflow {
    let mut wf = ActaWorkflow::new(sample_minute());
    wf.record_attendance(quorate_attendance()).expect("attendance");
    assert!(wf.verify_quorum().expect("quorum"));
    wf.open_deliberation().expect("deliberation");
    wf
}

#[test]
fn test_attendance_requires_someone_present() {
    let mut wf = ActaWorkflow::new(sample_minute());
    let err = wf
        .record_attendance(vec![attendee("Marta Lopes", AttendanceType::Absent, 450.0)])
        .unwrap_err();
    assert_eq!(err.to_string(), "Deve registar os presentes");
    assert_eq!(wf.current().name(), "preparation");
    assert!(wf.history().is_empty());
}

#[test]
fn test_quorum_counts_present_and_represented() {
    let mut wf = ActaWorkflow::new(sample_minute());
    wf.record_attendance(quorate_attendance()).expect("attendance");
    assert!(wf.verify_quorum().expect("quorum"));

    let quorum = wf.current().minute().quorum;
    assert!((quorum.permilage - 550.0).abs() < 1e-9);
    assert!((quorum.percentage - 55.0).abs() < 1e-9);
}

#[test]
fn test_missing_quorum_blocks_deliberation() {
    let mut wf = ActaWorkflow::new(sample_minute());
    wf.record_attendance(vec![attendee("Ana Silva", AttendanceType::Present, 300.0)])
        .expect("attendance");
    assert!(!wf.verify_quorum().expect("quorum computed"));

    let err = wf.open_deliberation().unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
    assert_eq!(err.to_string(), "Quórum não atingido - Necessária segunda convocatória");
    assert_eq!(wf.current().name(), "quorum");
}

#[test]
fn test_steps_cannot_be_skipped() {
    let mut wf = ActaWorkflow::new(sample_minute());
    let err = wf.start_signing().unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::WrongStep { expected: "deliberation", actual: "preparation" }
    ));
    assert!(wf.collector_mut().is_err());
}

#[test]
fn test_history_keeps_every_snapshot() {
    let mut wf = workflow_in_deliberation();
    wf.deliberate(
        vec![AgendaItem::new("Aprovação das contas de 2024")],
        vec![VotingResult {
            title: "Aprovação das contas de 2024".to_string(),
            in_favor: Some(5),
            against: Some(1),
            abstentions: Some(0),
            result: Some(VoteOutcome::Approved),
        }],
    )
    .expect("deliberate");

    assert_eq!(
        wf.history().step_names(),
        vec!["preparation", "attendance", "quorum", "deliberation"]
    );
    // Earlier snapshots are untouched by later edits.
    let first_deliberation = wf.history().iter().last().expect("snapshot");
    assert_eq!(first_deliberation.minute().agenda_items.len(), 2);
    assert_eq!(wf.current().minute().agenda_items.len(), 1);
}

#[tokio::test]
async fn test_full_run_to_signed() {
    let gateway = MockGateway::new();
    let mut wf = workflow_in_deliberation();
    wf.start_signing().expect("signing");

    let image = signature_data_url();
    {
        let collector = wf.collector_mut().expect("collector");
        assert_eq!(collector.present_members().count(), 2, "absent members cannot sign");
        collector.begin_sign(SignerRole::President, "Ana Silva").expect("name");
        collector.complete_sign(SignerRole::President, &image).expect("sign");
        collector.begin_sign(SignerRole::Secretary, "Rui Costa").expect("name");
        collector.complete_sign(SignerRole::Secretary, &image).expect("sign");
    }

    let report = wf.finalize(&gateway).await.expect("finalize");
    assert_eq!(report.summary(), "Presidente + Secretário");

    assert_eq!(wf.current().name(), "signed");
    assert_eq!(wf.current().minute().status, MinuteStatus::Signed);
    assert_eq!(gateway.upserts(), vec![SignerType::President, SignerType::Secretary]);
}

#[tokio::test]
async fn test_failed_finalize_stays_on_signing() {
    let gateway = MockGateway::failing_on(SignerType::President);
    let mut wf = workflow_in_deliberation();
    wf.start_signing().expect("signing");

    let image = signature_data_url();
    {
        let collector = wf.collector_mut().expect("collector");
        collector.begin_sign(SignerRole::President, "Ana Silva").expect("name");
        collector.complete_sign(SignerRole::President, &image).expect("sign");
        collector.begin_sign(SignerRole::Secretary, "Rui Costa").expect("name");
        collector.complete_sign(SignerRole::Secretary, &image).expect("sign");
    }

    let err = wf.finalize(&gateway).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Finalize(_)));
    assert_eq!(wf.current().name(), "signing");
    assert!(wf.collector_mut().expect("collector").can_finalize());
    assert_eq!(wf.current().minute().status, MinuteStatus::Draft);
}
