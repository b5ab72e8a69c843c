pub mod auth;
pub mod events;
pub mod init;
pub mod plannings;
pub mod users;
pub mod validation;

use serde::{Deserialize, Deserializer};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::db::UserRepository;
use crate::error::AppResult;

/// Open a transaction that already holds the write lock, so the overlap
/// check and the write that follows it see no interleaved writer.
pub(crate) async fn begin_write(
    pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Transaction<'static, Sqlite>> {
    let mut tx = pool.begin().await?;
    UserRepository::lock_for_write(&mut *tx, user_id).await?;
    Ok(tx)
}

/// Deserialize a present field (including `null`) as `Some(..)`.
///
/// Paired with `#[serde(default)]` on an `Option<Option<T>>`, an absent field
/// stays `None` while an explicit `null` becomes `Some(None)`.
pub fn deserialize_nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_nullable")]
        color: Option<Option<String>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"color": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r##"{"color": "#ff0000"}"##).unwrap();
        assert_eq!(absent.color, None);
        assert_eq!(null.color, Some(None));
        assert_eq!(set.color, Some(Some("#ff0000".to_string())));
    }
}
