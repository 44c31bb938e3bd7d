use crate::bail_if_err;
use futures::future::BoxFuture;
use sqlx::{Sqlite, SqlitePool};
use warp::{Rejection, Reply};

pub type Transaction = sqlx::Transaction<'static, Sqlite>;

fn transaction<F, R, E>(pool: SqlitePool, callback: F) -> BoxFuture<'static, Result<R, E>>
where
    for<'c> F: FnOnce(&'c mut Transaction) -> BoxFuture<'c, Result<R, E>> + 'static + Send + Sync,
    R: Send,
    E: From<sqlx::Error> + Send,
{
    Box::pin(async move {
        let mut transaction = pool.begin().await?;
        let ret = callback(&mut transaction).await;

        match ret {
            Ok(ret) => {
                transaction.commit().await?;

                Ok(ret)
            }
            Err(err) => {
                transaction.rollback().await?;

                Err(err)
            }
        }
    })
}

pub async fn with_transaction<F, R>(pool: SqlitePool, callback: F) -> Result<impl Reply, Rejection>
where
    for<'c> F:
        FnOnce(&'c mut Transaction) -> BoxFuture<'c, anyhow::Result<R>> + 'static + Send + Sync,
    R: Reply + Send,
{
    let ret: anyhow::Result<R> =
        transaction(pool, |db| Box::pin(async move { Ok(callback(db).await?) })).await;

    let ret = bail_if_err!(ret);
    Ok(ret.into_response())
}
