//! Signature persistence against Postgres. Skipped when DATABASE_URL is unset.

mod common;

use uuid::Uuid;

use condominio::gateway::{GatewayError, PgSignatureGateway, SignatureGateway};
use condominio::models::signature::{self, SignerType};
use common::*;

macro_rules! db_or_skip {
    () => {
        match setup_test_db().await {
            Some(db) => db,
            None => {
                eprintln!("DATABASE_URL not set, skipping");
                return;
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Upsert
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_upsert_creates_then_replaces() {
    let db = db_or_skip!();
    let minute_id = Uuid::new_v4();

    let (first, created) = signature::upsert(
        db.pool(),
        minute_id,
        &new_signature(SignerType::President, "Ana Silva", None),
    )
    .await
    .expect("insert");
    assert!(created);

    let (second, created) = signature::upsert(
        db.pool(),
        minute_id,
        &new_signature(SignerType::President, "  Ana M. Silva  ", None),
    )
    .await
    .expect("replace");
    assert!(!created);
    assert_eq!(second.id, first.id);
    assert_eq!(second.signer_name, "Ana M. Silva");

    let all = signature::find_by_minute(db.pool(), minute_id).await.expect("list");
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_each_member_has_own_slot() {
    let db = db_or_skip!();
    let minute_id = Uuid::new_v4();
    let (marta, rui) = (Uuid::new_v4(), Uuid::new_v4());

    for (name, member) in [("Marta Lopes", marta), ("Rui Costa", rui), ("Marta Lopes", marta)] {
        signature::upsert(db.pool(), minute_id, &new_signature(SignerType::Member, name, Some(member)))
            .await
            .expect("upsert member");
    }

    let all = signature::find_by_minute(db.pool(), minute_id).await.expect("list");
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|s| s.signer_type == SignerType::Member));
}

#[tokio::test]
async fn test_find_by_minute_orders_officers_first() {
    let db = db_or_skip!();
    let minute_id = Uuid::new_v4();

    signature::upsert(db.pool(), minute_id, &new_signature(SignerType::Member, "Marta Lopes", Some(Uuid::new_v4())))
        .await
        .expect("member");
    signature::upsert(db.pool(), minute_id, &new_signature(SignerType::Secretary, "Rui Costa", None))
        .await
        .expect("secretary");
    signature::upsert(db.pool(), minute_id, &new_signature(SignerType::President, "Ana Silva", None))
        .await
        .expect("president");

    let order: Vec<SignerType> = signature::find_by_minute(db.pool(), minute_id)
        .await
        .expect("list")
        .into_iter()
        .map(|s| s.signer_type)
        .collect();
    assert_eq!(order, vec![SignerType::President, SignerType::Secretary, SignerType::Member]);
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_batch_is_all_or_nothing() {
    let db = db_or_skip!();
    let minute_id = Uuid::new_v4();

    // A member row without member_id violates the slot constraint.
    let batch = vec![
        new_signature(SignerType::President, "Ana Silva", None),
        new_signature(SignerType::Secretary, "Rui Costa", None),
        new_signature(SignerType::Member, "Marta Lopes", None),
    ];
    assert!(signature::upsert_batch(db.pool(), minute_id, &batch).await.is_err());
    assert!(signature::find_by_minute(db.pool(), minute_id).await.expect("list").is_empty());

    let stored = signature::upsert_batch(db.pool(), minute_id, &batch[..2]).await.expect("batch");
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|(_, created)| *created));
}

// ---------------------------------------------------------------------------
// Delete and status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_delete_and_required_status() {
    let db = db_or_skip!();
    let minute_id = Uuid::new_v4();

    let status = signature::check_required(db.pool(), minute_id).await.expect("status");
    assert!(!status.has_president && !status.has_secretary && !status.is_complete);

    let (president, _) = signature::upsert(db.pool(), minute_id, &new_signature(SignerType::President, "Ana Silva", None))
        .await
        .expect("president");
    signature::upsert(db.pool(), minute_id, &new_signature(SignerType::Secretary, "Rui Costa", None))
        .await
        .expect("secretary");
    assert!(signature::check_required(db.pool(), minute_id).await.expect("status").is_complete);

    assert!(signature::delete(db.pool(), minute_id, president.id).await.expect("delete"));
    assert!(!signature::delete(db.pool(), minute_id, president.id).await.expect("second delete"));
    assert!(signature::find_by_id(db.pool(), minute_id, president.id).await.expect("find").is_none());

    let status = signature::check_required(db.pool(), minute_id).await.expect("status");
    assert!(!status.has_president);
    assert!(status.has_secretary);
    assert!(!status.is_complete);
}

// ---------------------------------------------------------------------------
// Postgres gateway
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_pg_gateway_round_trip() {
    let db = db_or_skip!();
    let gateway = PgSignatureGateway::new(db.pool().clone());
    let minute_id = Uuid::new_v4();

    let outcome = gateway
        .upsert(minute_id, &new_signature(SignerType::Secretary, "Rui Costa", None))
        .await
        .expect("upsert");
    assert!(outcome.created);

    let err = gateway
        .upsert(minute_id, &new_signature(SignerType::President, " ", None))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Rejected("signer_name é obrigatório".to_string()));

    gateway.remove(minute_id, outcome.signature_id).await.expect("remove");
    let err = gateway.remove(minute_id, outcome.signature_id).await.unwrap_err();
    assert_eq!(err, GatewayError::Rejected("Assinatura não encontrada".to_string()));
}
