//! Location entity - physical sites
//!
//! Table: organisation_location

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organisation_location")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "String(Some(256))", unique)]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub address: String,

    /// PO Box
    #[sea_orm(column_type = "Text")]
    pub pobox: String,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub phone: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub fax: Option<String>,

    #[sea_orm(column_type = "String(Some(128))", nullable)]
    pub email: Option<String>,

    /// WGS84 coordinates of the site
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// URL to webpage with more information
    #[sea_orm(column_type = "String(Some(2000))", nullable)]
    pub url: Option<String>,

    /// URL to graph of bandwidth utilisation
    #[sea_orm(column_type = "String(Some(2000))", nullable)]
    pub bandwidth_url: Option<String>,

    pub manager_id: Option<i32>,

    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Contact card embedded in department user org data. Empty fields are left out.
    pub fn as_dict(&self) -> Json {
        let mut card = Map::new();
        card.insert("id".into(), json!(self.id));
        card.insert("name".into(), json!(self.name));
        let fields = [
            ("address", Some(&self.address)),
            ("pobox", Some(&self.pobox)),
            ("phone", self.phone.as_ref()),
            ("fax", self.fax.as_ref()),
            ("email", self.email.as_ref()),
            ("url", self.url.as_ref()),
        ];
        for (key, value) in fields {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                card.insert(key.into(), json!(v));
            }
        }
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            card.insert("point".into(), json!([lon, lat]));
        }
        Json::Object(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Model {
        Model {
            id: 3,
            name: "Kensington".into(),
            address: "17 Dick Perry Avenue".into(),
            pobox: String::new(),
            phone: Some("08 9219 9000".into()),
            fax: None,
            email: Some(String::new()),
            latitude: Some(-31.98),
            longitude: Some(115.88),
            url: None,
            bandwidth_url: Some("http://prtg/graph".into()),
            manager_id: None,
            active: true,
        }
    }

    #[test]
    fn test_as_dict_skips_empty_fields() {
        let card = site().as_dict();
        assert_eq!(card["name"], "Kensington");
        assert_eq!(card["phone"], "08 9219 9000");
        assert_eq!(card["point"], json!([115.88, -31.98]));
        assert!(card.get("pobox").is_none());
        assert!(card.get("email").is_none());
        assert!(card.get("fax").is_none());
        assert!(card.get("bandwidth_url").is_none());
    }
}
