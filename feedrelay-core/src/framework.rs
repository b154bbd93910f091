use sqlx::PgPool;

/// Executes the per-operation query structs in [`crate::entities`] through
/// `kanau::processor::Processor`.
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
