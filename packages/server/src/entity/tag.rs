use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Conflict target for the lookup-or-create insert.
    #[sea_orm(unique, column_type = "String(StringLen::N(255))")]
    pub name: String,

    #[sea_orm(has_many, via = "blog_tag")]
    pub blogs: HasMany<super::blog::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
