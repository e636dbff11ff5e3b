use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::types::*;

const COLUMNS: &str = "id, minute_id, member_id, signer_type, signer_name, signature, \
                       signed_at, created_at, updated_at";

fn decode(row: SignatureRow) -> Result<StoredSignature, sqlx::Error> {
    StoredSignature::try_from(row).map_err(|e| sqlx::Error::Decode(e.into()))
}

/// All signatures of a minute: president, secretary, then members by signing order.
pub async fn find_by_minute(pool: &PgPool, minute_id: Uuid) -> Result<Vec<StoredSignature>, sqlx::Error> {
    let rows: Vec<SignatureRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM minute_signatures WHERE minute_id = $1 \
         ORDER BY CASE signer_type WHEN 'president' THEN 1 WHEN 'secretary' THEN 2 ELSE 3 END, \
         created_at ASC"
    ))
    .bind(minute_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(decode).collect()
}

pub async fn find_by_id(
    pool: &PgPool,
    minute_id: Uuid,
    signature_id: Uuid,
) -> Result<Option<StoredSignature>, sqlx::Error> {
    let row: Option<SignatureRow> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM minute_signatures WHERE minute_id = $1 AND id = $2"
    ))
    .bind(minute_id)
    .bind(signature_id)
    .fetch_optional(pool)
    .await?;

    row.map(decode).transpose()
}

/// Insert or replace the signature for the signer's slot.
///
/// The slot is `(minute_id, signer_type, member_id)`. Returns the stored row and
/// `true` when no signature existed for that slot before.
pub async fn upsert<'e, E: PgExecutor<'e>>(
    executor: E,
    minute_id: Uuid,
    sig: &NewSignature,
) -> Result<(StoredSignature, bool), sqlx::Error> {
    let row: UpsertRow = sqlx::query_as(&format!(
        "INSERT INTO minute_signatures (minute_id, member_id, signer_type, signer_name, signature, signed_at) \
         VALUES ($1, $2, $3, $4, $5, COALESCE($6, NOW())) \
         ON CONFLICT (minute_id, signer_type, (COALESCE(member_id, '00000000-0000-0000-0000-000000000000'::uuid))) \
         DO UPDATE SET signer_name = EXCLUDED.signer_name, \
                       signature = EXCLUDED.signature, \
                       signed_at = EXCLUDED.signed_at, \
                       updated_at = NOW() \
         RETURNING {COLUMNS}, (xmax = 0) AS created"
    ))
    .bind(minute_id)
    .bind(sig.member_id)
    .bind(sig.signer_type.as_str())
    .bind(sig.signer_name.trim())
    .bind(&sig.signature)
    .bind(sig.signed_at)
    .fetch_one(executor)
    .await?;

    let created = row.created;
    Ok((decode(row.row)?, created))
}

/// Upsert every signature in one transaction. Nothing is stored if any row fails.
pub async fn upsert_batch(
    pool: &PgPool,
    minute_id: Uuid,
    signatures: &[NewSignature],
) -> Result<Vec<(StoredSignature, bool)>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut stored = Vec::with_capacity(signatures.len());
    for sig in signatures {
        stored.push(upsert(&mut *tx, minute_id, sig).await?);
    }
    tx.commit().await?;
    Ok(stored)
}

/// Returns whether a row was removed.
pub async fn delete(pool: &PgPool, minute_id: Uuid, signature_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM minute_signatures WHERE minute_id = $1 AND id = $2")
        .bind(minute_id)
        .bind(signature_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn check_required(pool: &PgPool, minute_id: Uuid) -> Result<SignatureStatus, sqlx::Error> {
    let (presidents, secretaries): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE signer_type = 'president'), \
                COUNT(*) FILTER (WHERE signer_type = 'secretary') \
         FROM minute_signatures WHERE minute_id = $1",
    )
    .bind(minute_id)
    .fetch_one(pool)
    .await?;

    Ok(SignatureStatus::new(presidents > 0, secretaries > 0))
}
