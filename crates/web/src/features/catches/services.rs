use sqlx::Connection;
use storage::{
    Database,
    dto::{
        catch::{CatchInput, CatchListFilter, CatchListPage, CatchStats},
        common::PaginationMeta,
    },
    error::Result,
    models::Catch,
    repository::catch::CatchRepository,
};

/// One page of catches matching the filter, with weight aggregates over every record
pub async fn list_catches(db: &Database, filter: &CatchListFilter) -> Result<CatchListPage> {
    let mut conn = db.acquire().await?;
    let mut repo = CatchRepository::new(&mut conn);

    let (catches, total_records) = repo.list(filter).await?;
    let avg_weight = repo.average_weight().await?;
    let max_weight = repo.max_weight().await?;

    Ok(CatchListPage {
        catches,
        pagination: PaginationMeta::new(
            filter.pagination.page,
            filter.pagination.page_size,
            total_records,
        ),
        total_records,
        avg_weight,
        max_weight,
    })
}

/// Summary statistics over the whole table
pub async fn catch_stats(db: &Database) -> Result<CatchStats> {
    let mut conn = db.acquire().await?;
    let mut repo = CatchRepository::new(&mut conn);

    Ok(CatchStats {
        total_records: repo.count().await?,
        most_common: repo.most_common_species().await?.unwrap_or_default(),
        avg_weight: repo.average_weight().await?,
        biggest_fish: repo.biggest_fish().await?,
    })
}

/// Get a catch by id
pub async fn get_catch(db: &Database, id: i32) -> Result<Catch> {
    let mut conn = db.acquire().await?;
    CatchRepository::new(&mut conn).find_by_id(id).await
}

/// Create a new catch
pub async fn create_catch(db: &Database, input: &CatchInput) -> Result<Catch> {
    let mut conn = db.acquire().await?;
    let mut tx = conn.begin().await?;

    let catch = CatchRepository::new(&mut tx).create(input).await?;
    tx.commit().await?;

    tracing::info!(id = catch.id, species = %catch.species, "Catch created");
    Ok(catch)
}

/// Replace every mutable field of a catch
pub async fn update_catch(db: &Database, id: i32, input: &CatchInput) -> Result<Catch> {
    let mut conn = db.acquire().await?;
    let mut tx = conn.begin().await?;

    let catch = CatchRepository::new(&mut tx).update(id, input).await?;
    tx.commit().await?;

    tracing::info!(id, "Catch updated");
    Ok(catch)
}

/// Delete a catch. Deleting an id that no longer exists is not an error.
pub async fn delete_catch(db: &Database, id: i32) -> Result<()> {
    let mut conn = db.acquire().await?;
    let mut tx = conn.begin().await?;

    let removed = CatchRepository::new(&mut tx).delete(id).await?;
    tx.commit().await?;

    if removed {
        tracing::info!(id, "Catch deleted");
    } else {
        tracing::debug!(id, "Delete of missing catch ignored");
    }
    Ok(())
}
