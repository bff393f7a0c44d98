use diesel::prelude::*;

use amoura_shared::clients::db::DbPool;
use amoura_shared::errors::{AppError, AppResult, ErrorCode};

use crate::schema::counters;

const MEMBER_SEQ: &str = "member_seq";

/// Allocate the next member reference (`YBE` + zero-padded 8-digit sequence).
///
/// The read-increment-write runs inside one transaction with the counter row
/// locked (`FOR UPDATE`), so two concurrent signups can never be handed the
/// same sequence number.
pub fn allocate_member_ref(pool: &DbPool) -> AppResult<String> {
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;

    let next = conn
        .transaction::<i64, diesel::result::Error, _>(|conn| {
            diesel::insert_into(counters::table)
                .values((counters::name.eq(MEMBER_SEQ), counters::value.eq(0_i64)))
                .on_conflict_do_nothing()
                .execute(conn)?;

            let current: i64 = counters::table
                .filter(counters::name.eq(MEMBER_SEQ))
                .select(counters::value)
                .for_update()
                .first(conn)?;

            let next = current + 1;
            diesel::update(counters::table.filter(counters::name.eq(MEMBER_SEQ)))
                .set(counters::value.eq(next))
                .execute(conn)?;

            Ok(next)
        })
        .map_err(|e| {
            tracing::error!(error = %e, "member ref allocation failed");
            AppError::new(ErrorCode::MemberRefAllocationFailed, "could not allocate member reference")
        })?;

    Ok(format_member_ref(next))
}

pub fn format_member_ref(sequence: i64) -> String {
    format!("YBE{sequence:08}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_padded_to_eight_digits() {
        assert_eq!(format_member_ref(1), "YBE00000001");
        assert_eq!(format_member_ref(42), "YBE00000042");
        assert_eq!(format_member_ref(12_345_678), "YBE12345678");
    }

    #[test]
    fn fixed_width_for_normal_range() {
        assert_eq!(format_member_ref(99_999_999).len(), 11);
        assert_eq!(format_member_ref(7).len(), 11);
    }
}
