//! CRUD for shared learning-resource links.

use monkey_shared::constants::DEFAULT_RESOURCE_CATEGORY;
use monkey_shared::validate;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewResource, Resource};
use crate::row::{format_timestamp, now, parse_timestamp, parse_uuid};

impl Database {
    pub fn create_resource(&self, new: &NewResource) -> Result<Resource> {
        let username = validate::username("username", &new.username)?;
        let title = validate::required("title", &new.title)?;
        let url = validate::required("url", &new.url)?;
        let category = new
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_RESOURCE_CATEGORY);

        let resource = Resource {
            id: Uuid::new_v4(),
            username: username.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            description: new.description.clone().filter(|d| !d.is_empty()),
            category: category.to_string(),
            created_at: now(),
        };

        self.conn().execute(
            "INSERT INTO resources (id, username, title, url, description, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                resource.id.to_string(),
                resource.username,
                resource.title,
                resource.url,
                resource.description,
                resource.category,
                format_timestamp(&resource.created_at),
            ],
        )?;
        Ok(resource)
    }

    /// All resources, newest first.
    pub fn list_resources(&self) -> Result<Vec<Resource>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, username, title, url, description, category, created_at
             FROM resources
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], row_to_resource)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn delete_resource(&self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM resources WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_resource(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
    let id_str: String = row.get(0)?;
    let created_str: String = row.get(6)?;

    Ok(Resource {
        id: parse_uuid(0, &id_str)?,
        username: row.get(1)?,
        title: row.get(2)?,
        url: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        created_at: parse_timestamp(6, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("resources.db")).unwrap();
        (db, dir)
    }

    fn link(title: &str) -> NewResource {
        NewResource {
            username: "alice".into(),
            title: title.into(),
            url: "https://doc.rust-lang.org/book/".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_and_newest_first() {
        let (db, _dir) = test_db();
        let older = db.create_resource(&link("The Book")).unwrap();
        let newer = db
            .create_resource(&NewResource {
                category: Some("Video".into()),
                description: Some("talk".into()),
                ..link("RustConf")
            })
            .unwrap();

        assert_eq!(older.category, "Other");
        assert_eq!(older.description, None);
        assert_eq!(db.list_resources().unwrap(), vec![newer, older]);
    }

    #[test]
    fn test_missing_url_rejected() {
        let (db, _dir) = test_db();
        let mut bad = link("No link");
        bad.url.clear();
        assert!(matches!(
            db.create_resource(&bad),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_resource() {
        let (db, _dir) = test_db();
        let r = db.create_resource(&link("The Book")).unwrap();
        assert!(db.delete_resource(r.id).unwrap());
        assert!(db.list_resources().unwrap().is_empty());
    }
}
