//! Repository for the `open_play_rules` table.

use courtside_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::open_play::OpenPlayRule;

/// Column list for `open_play_rules` queries.
const COLUMNS: &str = "id, facility_id, name, min_participants, max_participants_per_court, \
    cancellation_cutoff_minutes, auto_scale_enabled, min_courts, max_courts, \
    created_at, updated_at";

/// Read access to open play rules. Rules are written by staff CRUD only.
pub struct OpenPlayRuleRepo;

impl OpenPlayRuleRepo {
    /// Find a rule by ID, scoped to its facility.
    pub async fn find_for_facility(
        conn: &mut PgConnection,
        id: DbId,
        facility_id: DbId,
    ) -> Result<Option<OpenPlayRule>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM open_play_rules WHERE id = $1 AND facility_id = $2");
        sqlx::query_as::<_, OpenPlayRule>(&query)
            .bind(id)
            .bind(facility_id)
            .fetch_optional(conn)
            .await
    }

    /// IDs of every facility that owns at least one open play rule.
    pub async fn list_facility_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT DISTINCT facility_id FROM open_play_rules ORDER BY facility_id",
        )
        .fetch_all(pool)
        .await
    }
}
