use std::sync::Arc;

use query_core::{DirectiveSet, Page};
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel};
use tracing::{debug, info, instrument};

use crate::dao::{DynamicDao, KeyOf};
use crate::error::{DaoError, DaoResult};
use crate::schema::table_name;

/// Maps one record type to and from its transfer representation.
pub trait RecordBinding: Send + Sync {
    type Entity: EntityTrait<Model = Self::Model>;
    type Model: IntoActiveModel<Self::ActiveModel> + Send + Sync;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send;
    type Data: Send;

    /// Builds a new record from transfer data.
    fn to_record(&self, data: Self::Data) -> Self::ActiveModel;

    fn from_record(&self, record: Self::Model) -> Self::Data;

    /// Overwrites the mutable attributes of a stored record with `data`.
    fn apply_update(&self, data: Self::Data, record: Self::Model) -> Self::ActiveModel;
}

/// CRUD over one record type, in transfer representation.
pub struct RecordService<B, C>
where
    B: RecordBinding,
    C: ConnectionTrait,
{
    dao: Arc<DynamicDao<C>>,
    binding: B,
}

impl<B, C> RecordService<B, C>
where
    B: RecordBinding,
    C: ConnectionTrait,
{
    pub fn new(dao: Arc<DynamicDao<C>>, binding: B) -> Self {
        Self { dao, binding }
    }

    pub fn dao(&self) -> &DynamicDao<C> {
        &self.dao
    }

    #[instrument(name = "query_db.service.filter", skip_all, fields(table = %table_name::<B::Entity>()))]
    pub async fn filter(&self, directives: &DirectiveSet) -> DaoResult<Page<B::Data>> {
        let page = self.dao.find_page::<B::Entity>(directives).await?;
        debug!(
            items = page.items.len(),
            total = page.page_info.total_size,
            "filtered records"
        );
        Ok(page.map_items(|m| self.binding.from_record(m)))
    }

    pub async fn find(&self, key: KeyOf<B::Entity>) -> DaoResult<Option<B::Data>> {
        let found = self.dao.find_by_key::<B::Entity, _>(key).await?;
        Ok(found.map(|m| self.binding.from_record(m)))
    }

    /// Stores a new record. Fails with `Conflict` and writes nothing when a
    /// record with the same key already exists, including one inserted
    /// concurrently after the check.
    #[instrument(name = "query_db.service.create", skip_all, fields(table = %table_name::<B::Entity>()))]
    pub async fn create(&self, data: B::Data) -> DaoResult<B::Data> {
        let record = self.binding.to_record(data);
        if self.dao.contains_active(&record).await? {
            let key = self.dao.active_key_values(&record)?.unwrap_or_default();
            return Err(DaoError::conflict(table_name::<B::Entity>(), key));
        }
        let saved = self.dao.insert::<B::ActiveModel, _>(record).await?;
        info!("record created");
        Ok(self.binding.from_record(saved))
    }

    /// Loads the record stored under `key`, applies `data` and saves it.
    #[instrument(name = "query_db.service.update", skip_all, fields(table = %table_name::<B::Entity>()))]
    pub async fn update(&self, key: KeyOf<B::Entity>, data: B::Data) -> DaoResult<B::Data> {
        let current = self.dao.get_by_key::<B::Entity, _>(key).await?;
        let record = self.binding.apply_update(data, current);
        let saved = self.dao.save::<B::ActiveModel, _>(record).await?;
        info!("record updated");
        Ok(self.binding.from_record(saved))
    }

    #[instrument(name = "query_db.service.delete", skip_all, fields(table = %table_name::<B::Entity>()))]
    pub async fn delete(&self, key: KeyOf<B::Entity>) -> DaoResult<()> {
        self.dao.remove_by_key::<B::Entity, _>(key).await
    }
}
