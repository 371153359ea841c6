#![allow(dead_code)]
use anyhow::Result;
use query_db::{connect, DatabaseConfig, DynamicDao};
use sea_orm::{ActiveValue::Set, ConnectionTrait, DatabaseConnection, EntityTrait, Schema};

pub mod person {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "people")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub name: String,
        pub surname: String,
        pub age: i32,
        pub email: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::pet::Entity")]
        Pets,
    }

    impl Related<super::pet::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Pets.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod pet {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "pets")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub owner_id: i32,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::person::Entity",
            from = "Column::OwnerId",
            to = "super::person::Column::Id"
        )]
        Owner,
    }

    impl Related<super::person::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Owner.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub async fn create_tables<C: ConnectionTrait>(conn: &C) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    conn.execute(backend.build(&schema.create_table_from_entity(person::Entity)))
        .await?;
    conn.execute(backend.build(&schema.create_table_from_entity(pet::Entity)))
        .await?;
    Ok(())
}

pub fn new_person(
    id: i32,
    name: &str,
    surname: &str,
    age: i32,
    email: Option<&str>,
) -> person::ActiveModel {
    person::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
        surname: Set(surname.to_owned()),
        age: Set(age),
        email: Set(email.map(str::to_owned)),
    }
}

/// Five people, ids 1..=5, ages 15, 18, 25, 30, 40.
pub fn sample_people() -> Vec<person::ActiveModel> {
    vec![
        new_person(1, "Anna", "Smith", 15, Some("anna@example.com")),
        new_person(2, "Bruno", "Jones", 18, None),
        new_person(3, "Chloé", "Brown", 25, Some("chloe@example.com")),
        new_person(4, "Dmitri", "Smithers", 30, None),
        new_person(5, "Eve", "Adams", 40, Some("eve@example.com")),
    ]
}

pub async fn bring_up() -> Result<DynamicDao<DatabaseConnection>> {
    let conn = connect(&DatabaseConfig::default()).await?;
    create_tables(&conn).await?;
    Ok(DynamicDao::new(conn))
}

pub async fn bring_up_people() -> Result<DynamicDao<DatabaseConnection>> {
    let dao = bring_up().await?;
    person::Entity::insert_many(sample_people())
        .exec(dao.connection())
        .await?;
    Ok(dao)
}

pub fn ids(rows: &[person::Model]) -> Vec<i32> {
    rows.iter().map(|p| p.id).collect()
}
