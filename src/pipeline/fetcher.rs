// src/pipeline/fetcher.rs
use crate::checkpoint::Checkpoint;
use crate::config::TableEncryptionConfig;
use crate::error::Result;
use crate::store::{Batch, BatchQuery, RowStore};

/// Next batch of rows strictly after `checkpoint`, ascending by primary key.
/// An empty batch means the table is exhausted.
pub fn fetch_batch<S>(
    store: &S,
    config: &TableEncryptionConfig,
    checkpoint: &Checkpoint,
    batch_size: usize,
) -> Result<Batch>
where
    S: RowStore + ?Sized,
{
    let query = BatchQuery::for_table(config, checkpoint, batch_size);
    let batch = store.fetch_batch(&query)?;
    tracing::debug!(
        table = %config.table_name,
        after = %checkpoint,
        rows = batch.len(),
        "fetched batch"
    );
    Ok(batch)
}
