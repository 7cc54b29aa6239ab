use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("accrual error: {0}")]
    Accrual(#[from] minebank_accrual::AccrualError),

    #[error("store error: {0}")]
    Store(#[from] minebank_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] minebank_store_lmdb::LmdbError),

    #[error("config error: {0}")]
    Config(String),

    #[error("service already running")]
    AlreadyRunning,

    #[error("tick task failed: {0}")]
    Task(String),
}
