use crate::{AsValue, Error, Result, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeStruct};
use std::sync::OnceLock;

/// Id of a user, stored as an integer column and rendered as `{"id": .., "name": ..}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct UserId {
    pub id: i64,
    pub name: String,
}

impl UserId {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            name: String::new(),
        }
    }
    /// The stored name, or the one known to the registered [`UserDirectory`].
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        USER_DIRECTORY
            .get()
            .and_then(|v| v.name_by_id(self.id))
            .unwrap_or_default()
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

/// Resolves user names for serialized [`UserId`] values.
pub trait UserDirectory: Send + Sync {
    fn name_by_id(&self, id: i64) -> Option<String>;
    /// Called once, when the directory gets registered.
    fn init(&self) {}
}

static USER_DIRECTORY: OnceLock<Box<dyn UserDirectory>> = OnceLock::new();

/// Registers the process wide user directory, only the first registration succeeds.
pub fn init_user_directory(directory: impl UserDirectory + 'static) -> Result<()> {
    directory.init();
    USER_DIRECTORY
        .set(Box::new(directory))
        .map_err(|_| Error::msg("The user directory is already initialized"))
}

impl AsValue for UserId {
    fn as_empty_value() -> Value {
        Value::Int64(None)
    }
    fn as_value(self) -> Value {
        Value::Int64(Some(self.id))
    }
    /// A null column reads as no user.
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(Self::new(i64::try_from_value(value)?))
    }
    fn parse(input: &str) -> Result<Self> {
        Ok(Self::new(i64::parse(input)?))
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("UserId", 2)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.display_name())?;
        state.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserIdRepr {
    Object {
        id: i64,
        #[serde(default)]
        name: String,
    },
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for UserId {
    /// Accepts an object with `id` and optional `name`, a number, a numeric string or an
    /// empty string for no user.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match UserIdRepr::deserialize(deserializer)? {
            UserIdRepr::Object { id, name } => Ok(Self { id, name }),
            UserIdRepr::Number(id) => Ok(Self::new(id)),
            UserIdRepr::Text(text) if text.trim().is_empty() => Ok(Self::default()),
            UserIdRepr::Text(text) => text
                .trim()
                .parse()
                .map(Self::new)
                .map_err(|_| serde::de::Error::custom(format!("invalid user id `{text}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_from_json() {
        let parse = |v: &str| serde_json::from_str::<UserId>(v);
        assert_eq!(parse("12").unwrap(), UserId::new(12));
        assert_eq!(parse(r#""34""#).unwrap(), UserId::new(34));
        assert_eq!(parse(r#""""#).unwrap(), UserId::default());
        assert_eq!(
            parse(r#"{"id": 5, "name": "ann"}"#).unwrap(),
            UserId {
                id: 5,
                name: "ann".into()
            }
        );
        assert!(parse(r#""abc""#).is_err());
        assert!(parse(r#"{"name": "ann"}"#).is_err());
    }

    #[test]
    fn column_value() {
        assert_eq!(UserId::new(7).as_value(), Value::Int64(Some(7)));
        assert_eq!(
            UserId::try_from_value(Value::Blob(Some(b"42".to_vec().into()))).unwrap(),
            UserId::new(42)
        );
        assert_eq!(UserId::try_from_value(Value::Null).unwrap(), UserId::default());
        assert!(UserId::try_from_value(Value::Varchar(Some("bob".into()))).is_err());
    }

    #[test]
    fn encode_with_stored_name() {
        let user = UserId {
            id: 3,
            name: "bob".into(),
        };
        assert_eq!(
            serde_json::to_string(&user).unwrap(),
            r#"{"id":3,"name":"bob"}"#
        );
    }
}
