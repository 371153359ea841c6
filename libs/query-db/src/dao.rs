//! Generic data-access object driven by directive sets.
//!
//! One `DynamicDao` serves every entity; the entity is picked per call by a
//! type parameter. The DAO is generic over the connection, so the same code
//! runs on a pooled `DatabaseConnection` or inside a `DatabaseTransaction`.

use query_core::{DirectiveSet, Page, PageRequest};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, Condition, ConnectionTrait, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, PrimaryKeyTrait, QueryFilter, QuerySelect, Select,
    SqlErr, Value,
};
use tracing::{debug, info, instrument};

use crate::config::QueryConfig;
use crate::error::{DaoError, DaoResult};
use crate::predicate::{apply_sorts, build_condition};
use crate::schema::{table_name, RecordSchema};

/// Primary key value type of an entity.
pub type KeyOf<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// Model type behind an active model.
pub type ModelOf<A> = <<A as ActiveModelTrait>::Entity as EntityTrait>::Model;

pub struct DynamicDao<C>
where
    C: ConnectionTrait,
{
    conn: C,
    config: QueryConfig,
}

impl<C> DynamicDao<C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: C) -> Self {
        Self::with_config(conn, QueryConfig::default())
    }

    pub fn with_config(conn: C, config: QueryConfig) -> Self {
        Self { conn, config }
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Hands the connection back, e.g. to commit a transaction.
    pub fn into_inner(self) -> C {
        self.conn
    }

    #[instrument(name = "query_db.dao.find_by_key", skip_all, fields(table = %table_name::<E>()))]
    pub async fn find_by_key<E, K>(&self, key: K) -> DaoResult<Option<E::Model>>
    where
        E: EntityTrait,
        K: Into<KeyOf<E>>,
    {
        Ok(E::find_by_id(key).one(&self.conn).await?)
    }

    /// Like [`find_by_key`](Self::find_by_key), but absence is an error.
    pub async fn get_by_key<E, K>(&self, key: K) -> DaoResult<E::Model>
    where
        E: EntityTrait,
        K: Into<KeyOf<E>>,
    {
        let key: KeyOf<E> = key.into();
        let label = format!("{key:?}");
        self.find_by_key::<E, _>(key)
            .await?
            .ok_or_else(|| DaoError::NotFound {
                entity: table_name::<E>(),
                key: label,
            })
    }

    /// Runs a caller-built query. `build` receives `SELECT * FROM <table>`.
    #[instrument(name = "query_db.dao.find_by_predicate", skip_all, fields(table = %table_name::<E>()))]
    pub async fn find_by_predicate<E, F>(&self, build: F) -> DaoResult<Vec<E::Model>>
    where
        E: EntityTrait,
        F: FnOnce(Select<E>) -> Select<E>,
    {
        Ok(build(E::find()).all(&self.conn).await?)
    }

    /// One page of records matching `directives`, sorted and paged.
    #[instrument(name = "query_db.dao.find", skip_all, fields(table = %table_name::<E>()))]
    pub async fn find<E>(&self, directives: &DirectiveSet) -> DaoResult<Vec<E::Model>>
    where
        E: EntityTrait,
    {
        let request = self.page_request(directives);
        let schema = RecordSchema::<E>::of();

        let mut query = E::find().filter(build_condition(&schema, directives));
        query = apply_sorts(query, &schema, directives);
        if request.distinct {
            query = query.distinct();
        }
        let query = query.offset(request.offset()).limit(request.page_size);

        let rows = query.all(&self.conn).await?;
        debug!(
            rows = rows.len(),
            page_number = request.page_number,
            page_size = request.page_size,
            "directive query done"
        );
        Ok(rows)
    }

    /// Number of records matching the filters and keywords of `directives`.
    /// Sort and paging directives are ignored.
    #[instrument(name = "query_db.dao.count", skip_all, fields(table = %table_name::<E>()))]
    pub async fn count<E>(&self, directives: &DirectiveSet) -> DaoResult<u64>
    where
        E: EntityTrait,
        E::Model: Send + Sync,
    {
        let schema = RecordSchema::<E>::of();
        let total = E::find()
            .filter(build_condition(&schema, directives))
            .count(&self.conn)
            .await?;
        Ok(total)
    }

    pub async fn count_all<E>(&self) -> DaoResult<u64>
    where
        E: EntityTrait,
        E::Model: Send + Sync,
    {
        Ok(E::find().count(&self.conn).await?)
    }

    /// [`find`](Self::find) and [`count`](Self::count) combined into a page.
    #[instrument(name = "query_db.dao.find_page", skip_all, fields(table = %table_name::<E>()))]
    pub async fn find_page<E>(&self, directives: &DirectiveSet) -> DaoResult<Page<E::Model>>
    where
        E: EntityTrait,
        E::Model: Send + Sync,
    {
        let request = self.page_request(directives);
        let (items, total) =
            tokio::try_join!(self.find::<E>(directives), self.count::<E>(directives))?;
        Ok(Page::new(items, request.page_info(total)))
    }

    /// Insert-or-merge. A record whose key already exists is updated in
    /// place; anything else, including a record without a key, is inserted.
    #[instrument(name = "query_db.dao.save", skip_all, fields(table = %table_name::<A::Entity>()))]
    pub async fn save<A, R>(&self, record: R) -> DaoResult<ModelOf<A>>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send,
        R: IntoActiveModel<A>,
        ModelOf<A>: IntoActiveModel<A> + Send + Sync,
    {
        let active = record.into_active_model().reset_all();
        let exists = match self.active_key_values(&active)? {
            Some(key) => self.exists::<A::Entity>(key).await?,
            None => false,
        };

        let model = if exists {
            debug!("merging into existing record");
            active.update(&self.conn).await?
        } else {
            active.insert(&self.conn).await?
        };
        Ok(model)
    }

    /// Inserts `record` as a new row. The store's unique-key violation maps to
    /// `Conflict`, so an existing record is never overwritten.
    #[instrument(name = "query_db.dao.insert", skip_all, fields(table = %table_name::<A::Entity>()))]
    pub async fn insert<A, R>(&self, record: R) -> DaoResult<ModelOf<A>>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send,
        R: IntoActiveModel<A>,
        ModelOf<A>: IntoActiveModel<A>,
    {
        let active = record.into_active_model().reset_all();
        let key = self.active_key_values(&active)?;
        active.insert(&self.conn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                DaoError::conflict(table_name::<A::Entity>(), key.unwrap_or_default())
            }
            _ => DaoError::Store(e),
        })
    }

    /// Whether a record with the same key as `record` is stored.
    pub async fn contains<E>(&self, record: &E::Model) -> DaoResult<bool>
    where
        E: EntityTrait,
        E::Model: Send + Sync,
    {
        let key = self.primary_key_values::<E>(record)?;
        self.exists::<E>(key).await
    }

    /// Like [`contains`](Self::contains) for a not-yet-saved active model.
    /// A model whose key is not set is never contained.
    pub async fn contains_active<A>(&self, active: &A) -> DaoResult<bool>
    where
        A: ActiveModelTrait,
        ModelOf<A>: Send + Sync,
    {
        match self.active_key_values(active)? {
            Some(key) => self.exists::<A::Entity>(key).await,
            None => Ok(false),
        }
    }

    /// Deletes the stored record with `record`'s key.
    #[instrument(name = "query_db.dao.remove", skip_all, fields(table = %table_name::<E>()))]
    pub async fn remove<E>(&self, record: &E::Model) -> DaoResult<()>
    where
        E: EntityTrait,
    {
        let schema = RecordSchema::<E>::of();
        let cols = schema.primary_key()?;
        let key: Vec<Value> = cols.iter().map(|c| record.get(*c)).collect();
        let label = format!("{key:?}");

        let res = E::delete_many()
            .filter(key_condition::<E>(&cols, key))
            .exec(&self.conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(DaoError::NotFound {
                entity: schema.table_name().to_owned(),
                key: label,
            });
        }
        info!("record removed");
        Ok(())
    }

    #[instrument(name = "query_db.dao.remove_by_key", skip_all, fields(table = %table_name::<E>()))]
    pub async fn remove_by_key<E, K>(&self, key: K) -> DaoResult<()>
    where
        E: EntityTrait,
        K: Into<KeyOf<E>>,
    {
        let key: KeyOf<E> = key.into();
        let label = format!("{key:?}");
        let res = E::delete_by_id(key).exec(&self.conn).await?;
        if res.rows_affected == 0 {
            return Err(DaoError::NotFound {
                entity: table_name::<E>(),
                key: label,
            });
        }
        info!("record removed");
        Ok(())
    }

    /// Key attribute values of `record`, in key declaration order.
    pub fn primary_key_values<E>(&self, record: &E::Model) -> DaoResult<Vec<Value>>
    where
        E: EntityTrait,
    {
        let cols = RecordSchema::<E>::of().primary_key()?;
        Ok(cols.into_iter().map(|c| record.get(c)).collect())
    }

    fn page_request(&self, directives: &DirectiveSet) -> PageRequest {
        PageRequest::from_directives(directives, self.config.page_limits())
    }

    /// Key values of an active model, or `None` while any key attribute is unset.
    pub fn active_key_values<A>(&self, active: &A) -> DaoResult<Option<Vec<Value>>>
    where
        A: ActiveModelTrait,
    {
        let cols = RecordSchema::<A::Entity>::of().primary_key()?;
        let mut key = Vec::with_capacity(cols.len());
        for col in cols {
            match active.get(col).into_value() {
                Some(v) => key.push(v),
                None => return Ok(None),
            }
        }
        Ok(Some(key))
    }

    async fn exists<E>(&self, key: Vec<Value>) -> DaoResult<bool>
    where
        E: EntityTrait,
        E::Model: Send + Sync,
    {
        let cols = RecordSchema::<E>::of().primary_key()?;
        let n = E::find()
            .filter(key_condition::<E>(&cols, key))
            .count(&self.conn)
            .await?;
        Ok(n > 0)
    }
}

fn key_condition<E: EntityTrait>(cols: &[E::Column], key: Vec<Value>) -> Condition {
    cols.iter()
        .zip(key)
        .fold(Condition::all(), |cond, (col, v)| cond.add(Expr::col(*col).eq(v)))
}
