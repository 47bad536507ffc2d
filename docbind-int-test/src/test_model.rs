use docbind::document::ObjectId;
use docbind_derive::{Convertible, Entity};
use fake::faker::internet::en::FreeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;

#[derive(Debug, Clone, PartialEq, Default, Convertible, Entity)]
#[entity(name = "friends", id(field = "key"))]
pub struct Friend {
    pub key: Option<ObjectId>,
    pub name: String,
    pub age: Option<i32>,
}

impl Friend {
    pub fn new(name: &str) -> Self {
        Friend {
            key: None,
            name: name.to_string(),
            age: None,
        }
    }

    pub fn random() -> Self {
        let first: String = FirstName().fake();
        let last: String = LastName().fake();
        Friend {
            key: None,
            name: format!("{} {}", first, last),
            age: Some((18..90).fake()),
        }
    }
}

/// Identity held as the hex form of an object id.
#[derive(Debug, Clone, PartialEq, Default, Convertible, Entity)]
#[entity(id(field = "id", hex))]
pub struct HexFriend {
    pub id: Option<String>,
    pub email: String,
}

impl HexFriend {
    pub fn random() -> Self {
        HexFriend {
            id: None,
            email: FreeEmail().fake(),
        }
    }
}

/// Identity plus another object id field that is only data.
#[derive(Debug, Clone, PartialEq, Default, Convertible, Entity)]
#[entity(id(field = "id"))]
pub struct Invitation {
    pub id: Option<ObjectId>,
    pub invited_by: Option<ObjectId>,
    pub message: String,
}

/// Caller-assigned identity of a custom type.
#[derive(Debug, Clone, PartialEq, Default, Convertible, Entity)]
#[entity(name = "accounts", id(field = "account_number"))]
pub struct Account {
    pub account_number: i64,
    pub owner: String,
    pub tags: Vec<String>,
}

/// No identity field at all.
#[derive(Debug, Clone, PartialEq, Default, Convertible, Entity)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Convertible)]
pub struct Address {
    pub street: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Default, Convertible, Entity)]
#[entity(id(field = "id"))]
#[converter(ignored = "session_token")]
pub struct Customer {
    pub id: Option<ObjectId>,
    pub name: String,
    pub address: Option<Address>,
    pub status: Status,
    pub session_token: String,
}

#[derive(Debug, Clone, PartialEq, Default, Convertible)]
pub enum Status {
    #[default]
    Active,
    Suspended {
        reason: String,
    },
    Closed(i64, String),
}
