//! Signature collection: capture rules, finalize persistence order and the
//! rollback of a failed finalize.

mod common;

use condominio::gateway::GatewayError;
use condominio::integrity::IntegrityMode;
use condominio::models::minutes::MinuteStatus;
use condominio::models::signature::SignerType;
use condominio::workflow::{
    CollectionPhase, FinalizeError, PersistStage, PresentMember, SignatureCollector, SignerRole,
};
use common::*;
use uuid::Uuid;

fn present(n: usize) -> Vec<PresentMember> {
    (0..n)
        .map(|i| PresentMember {
            member_id: Uuid::new_v4(),
            name: format!("Condómino {}", i + 1),
        })
        .collect()
}

fn sign_officers(collector: &mut SignatureCollector) {
    let image = signature_data_url();
    collector.begin_sign(SignerRole::President, "Ana Silva").expect("president name");
    collector.complete_sign(SignerRole::President, &image).expect("president signature");
    collector.begin_sign(SignerRole::Secretary, "Rui Costa").expect("secretary name");
    collector.complete_sign(SignerRole::Secretary, &image).expect("secretary signature");
}

fn sign_member(collector: &mut SignatureCollector, member_id: Uuid) {
    collector.begin_member_sign(member_id).expect("begin member");
    collector
        .complete_member_sign(member_id, &signature_data_url())
        .expect("member signature");
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

#[test]
fn test_can_finalize_ignores_members() {
    let members = present(3);
    let first = members[0].member_id;
    let mut collector = SignatureCollector::new(sample_minute(), members);

    collector.begin_member_sign(first).expect("begin member");
    sign_officers(&mut collector);

    assert!(collector.can_finalize());
    assert_eq!(collector.phase(), CollectionPhase::ReadyToFinalize);
    assert!(collector.signed_members().is_empty());
}

#[test]
fn test_cannot_finalize_without_both_officers() {
    let mut collector = SignatureCollector::new(sample_minute(), vec![]);
    assert!(!collector.can_finalize());

    collector.begin_sign(SignerRole::President, "Ana Silva").expect("name");
    collector
        .complete_sign(SignerRole::President, &signature_data_url())
        .expect("sign");
    assert!(!collector.can_finalize());

    collector.begin_sign(SignerRole::Secretary, "Rui Costa").expect("name");
    assert!(!collector.can_finalize(), "name without image is not enough");

    let err = collector.complete_sign(SignerRole::Secretary, "   ").unwrap_err();
    assert_eq!(err.0, "A assinatura está vazia");
    assert!(!collector.can_finalize());
}

#[test]
fn test_complete_sign_requires_a_name_first() {
    let mut collector = SignatureCollector::new(sample_minute(), vec![]);
    let err = collector
        .complete_sign(SignerRole::President, &signature_data_url())
        .unwrap_err();
    assert_eq!(err.0, "Por favor, indique o nome do Presidente");
}

#[tokio::test]
async fn test_finalize_refused_when_not_ready() {
    let gateway = MockGateway::new();
    let mut collector = SignatureCollector::new(sample_minute(), vec![]);
    collector.begin_sign(SignerRole::President, "Ana Silva").expect("name");

    let err = collector.finalize(&gateway).await.unwrap_err();
    assert_eq!(err, FinalizeError::NotReady);
    assert!(gateway.calls().is_empty());
    assert_eq!(collector.minute().status, MinuteStatus::Draft);
}

// ---------------------------------------------------------------------------
// Finalize scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_finalize_officers_only() {
    let gateway = MockGateway::new();
    let mut collector = SignatureCollector::new(sample_minute(), vec![]);
    assert_eq!(collector.minute().agenda_items.len(), 2);
    sign_officers(&mut collector);

    let report = collector.finalize(&gateway).await.expect("finalize");

    assert_eq!(collector.minute().status, MinuteStatus::Signed);
    assert_eq!(gateway.upserts(), vec![SignerType::President, SignerType::Secretary]);
    assert_eq!(report.member_count, 0);
    assert_eq!(report.summary(), "Presidente + Secretário");
    assert_eq!(report.integrity.mode, IntegrityMode::Sha256);
    assert_eq!(report.signatures.len(), 2);
}

#[tokio::test]
async fn test_finalize_with_two_of_three_members() {
    let gateway = MockGateway::new();
    let members = present(3);
    let (a, b) = (members[0].member_id, members[2].member_id);
    let mut collector = SignatureCollector::new(sample_minute(), members);
    sign_officers(&mut collector);
    sign_member(&mut collector, a);
    sign_member(&mut collector, b);

    let report = collector.finalize(&gateway).await.expect("finalize");

    assert_eq!(
        gateway.upserts(),
        vec![
            SignerType::President,
            SignerType::Secretary,
            SignerType::Member,
            SignerType::Member
        ]
    );
    assert_eq!(report.summary(), "Presidente + Secretário + 2 condóminos");
    assert_eq!(gateway.stored(), 4);
}

#[tokio::test]
async fn test_secretary_failure_stops_and_rolls_back() {
    let gateway = MockGateway::failing_on(SignerType::Secretary);
    let members = present(2);
    let member = members[0].member_id;
    let mut collector = SignatureCollector::new(sample_minute(), members);
    sign_officers(&mut collector);
    sign_member(&mut collector, member);

    let err = collector.finalize(&gateway).await.unwrap_err();

    match &err {
        FinalizeError::Persistence { stage, source, compensation } => {
            assert_eq!(*stage, PersistStage::Secretary);
            assert!(matches!(source, GatewayError::Transport(_)));
            assert_eq!(compensation.reverted, vec![PersistStage::President]);
            assert!(compensation.is_clean());
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().starts_with("Erro ao guardar a assinatura (Secretário)"));

    // President, secretary, then the president's removal. No member call.
    assert_eq!(gateway.upserts(), vec![SignerType::President, SignerType::Secretary]);
    assert_eq!(gateway.removals(), 1);
    assert_eq!(gateway.stored(), 0);
    assert_eq!(collector.minute().status, MinuteStatus::Draft);
    assert!(collector.can_finalize(), "captured signatures are kept for a retry");
}

#[tokio::test]
async fn test_member_failure_reverts_in_reverse_order() {
    let gateway = MockGateway::failing_on(SignerType::Member);
    let members = present(1);
    let member = members[0].member_id;
    let mut collector = SignatureCollector::new(sample_minute(), members);
    sign_officers(&mut collector);
    sign_member(&mut collector, member);

    let err = collector.finalize(&gateway).await.unwrap_err();
    match err {
        FinalizeError::Persistence { stage, compensation, .. } => {
            assert!(matches!(stage, PersistStage::Member { member_id, .. } if member_id == member));
            assert_eq!(
                compensation.reverted,
                vec![PersistStage::Secretary, PersistStage::President]
            );
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(gateway.stored(), 0);
}

#[tokio::test]
async fn test_replaced_signatures_are_reported_not_removed() {
    let gateway = MockGateway::failing_on(SignerType::Secretary).with_existing(SignerType::President, None);
    let mut collector = SignatureCollector::new(sample_minute(), vec![]);
    sign_officers(&mut collector);

    let err = collector.finalize(&gateway).await.unwrap_err();
    match &err {
        FinalizeError::Persistence { compensation, .. } => {
            assert!(compensation.reverted.is_empty());
            assert_eq!(compensation.replaced, vec![PersistStage::President]);
            assert!(!compensation.is_clean());
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(gateway.removals(), 0);
    assert!(err.to_string().contains("anteriores foram substituídas"));
}

#[tokio::test]
async fn test_failed_removal_is_reported() {
    let gateway = MockGateway::failing_on(SignerType::Secretary).fail_removals();
    let mut collector = SignatureCollector::new(sample_minute(), vec![]);
    sign_officers(&mut collector);

    let err = collector.finalize(&gateway).await.unwrap_err();
    match &err {
        FinalizeError::Persistence { compensation, .. } => {
            assert_eq!(compensation.failed.len(), 1);
            assert_eq!(compensation.failed[0].0, PersistStage::President);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("devem ser revistas"));
}

#[tokio::test]
async fn test_refinalize_replaces_and_counts() {
    let gateway = MockGateway::new();
    let mut collector = SignatureCollector::new(sample_minute(), vec![]);
    sign_officers(&mut collector);

    let first = collector.finalize(&gateway).await.expect("first finalize");
    assert_eq!(first.replaced, 0);

    let second = collector.finalize(&gateway).await.expect("second finalize");
    assert_eq!(second.replaced, 2);
    assert_eq!(gateway.stored(), 2);
}

// ---------------------------------------------------------------------------
// Re-opened capture pads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reopened_member_pad_still_persists_signature() {
    let gateway = MockGateway::new();
    let members = present(1);
    let maria = members[0].member_id;
    let mut collector = SignatureCollector::new(sample_minute(), members);
    sign_officers(&mut collector);
    sign_member(&mut collector, maria);

    collector.begin_member_sign(maria).expect("reopen");
    assert_eq!(collector.signed_members().len(), 1);

    let report = collector.finalize(&gateway).await.expect("finalize");

    assert_eq!(report.summary(), "Presidente + Secretário + 1 condómino");
    assert_eq!(gateway.stored(), 3);
}

#[tokio::test]
async fn test_reopening_officer_after_signing_keeps_minute_finalizable() {
    let gateway = MockGateway::new();
    let mut collector = SignatureCollector::new(sample_minute(), vec![]);
    sign_officers(&mut collector);
    collector.finalize(&gateway).await.expect("finalize");
    assert_eq!(collector.minute().status, MinuteStatus::Signed);

    collector.begin_sign(SignerRole::President, "Ana Silva").expect("reopen");
    assert!(collector.can_finalize());
    assert_eq!(collector.phase(), CollectionPhase::ReadyToFinalize);

    collector.cancel_sign(SignerRole::President);
    let report = collector.finalize(&gateway).await.expect("finalize again");
    assert_eq!(report.replaced, 2);
}
