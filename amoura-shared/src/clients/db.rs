use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(10)
        .min_idle(Some(2))
        .test_on_check_out(true)
        .build(manager)
        .expect("failed to create database pool");

    tracing::info!("database connection pool created");
    pool
}

/// Maximum number of ids a single `id IN (...)` batch read may carry.
/// Larger batches are split and the results merged.
pub const ID_BATCH_LIMIT: usize = 30;

/// Split a list of ids into store-sized batches of at most [`ID_BATCH_LIMIT`].
pub fn id_batches<T>(ids: &[T]) -> impl Iterator<Item = &[T]> {
    ids.chunks(ID_BATCH_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_respect_limit() {
        let ids: Vec<u32> = (0..95).collect();
        let batches: Vec<&[u32]> = id_batches(&ids).collect();
        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| b.len() <= ID_BATCH_LIMIT));
        assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), 95);
    }

    #[test]
    fn small_batch_passes_through() {
        let ids = vec!["a", "b"];
        let batches: Vec<&[&str]> = id_batches(&ids).collect();
        assert_eq!(batches, vec![&["a", "b"][..]]);
    }

    #[test]
    fn empty_yields_nothing() {
        let ids: Vec<u8> = vec![];
        assert_eq!(id_batches(&ids).count(), 0);
    }
}
