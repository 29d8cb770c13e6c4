use sift::{Model, UserId};
use time::PrimitiveDateTime;

#[derive(Model, Debug, Default, Clone, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub weight: i32,
}

#[derive(Model, Debug, Default, Clone, PartialEq)]
#[sift(
    table = "user",
    unique_index(name = "uk_email", message = "email already registered"),
    unique_index(name = "user.uk_phone"),
    not_found = "user not found",
    not_affected = "user not updated"
)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub phone: String,
    pub name: String,
    pub age: i32,
    #[sift(name = "nick_name")]
    pub nickname: Option<String>,
    pub created_by: UserId,
    pub updated_by: UserId,
    pub deleted: i64,
    #[sift(ignore)]
    pub session: Vec<u8>,
}

#[derive(Model, Debug, Default, Clone, PartialEq)]
#[sift(schema = "blog")]
pub struct Note {
    #[sift(primary_key)]
    pub code: String,
    pub body: String,
    pub created_at: Option<PrimitiveDateTime>,
    #[sift(updated_at)]
    pub touched: i64,
    #[sift(name = "removed", deleted)]
    pub r#gone: i64,
}
