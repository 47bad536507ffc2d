use docbind::common::{Value, DOC_ID};
use docbind::doc;
use docbind::document::ObjectId;
use docbind::errors::ErrorKind;
use docbind::mapper::Mapper;
use docbind::marshall::{Entity, IdKind, TargetShape};
use docbind_int_test::test_model::{Account, Coordinate, Customer, Friend, HexFriend, Invitation, Status};
use docbind_int_test::test_util::{cleanup, create_test_context, run_test, FailingMarshaller};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_save_generates_object_id() {
    run_test(
        create_test_context,
        |ctx| {
            let mut friend = Friend::random();
            assert!(friend.key.is_none());

            let stored = ctx.collection().save(&ctx.mapper(), &mut friend)?;
            let key = friend.key.expect("generated id written back");
            assert_eq!(stored, Some(Value::ObjectId(key)));
            assert_eq!(ctx.collection().size(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_saved_document_layout() {
    run_test(
        create_test_context,
        |ctx| {
            let mut friend = Friend::new("John");
            let document = ctx.mapper().prepare_save(&mut friend)?;
            let key = friend.key.expect("generated id written back");

            assert_eq!(
                document,
                doc! { "_id": key, name: "John", age: (Value::Null) }
            );
            assert_eq!(document.keys().next().map(String::as_str), Some(DOC_ID));
            assert!(!document.contains_key("key"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_keeps_assigned_id() {
    run_test(
        create_test_context,
        |ctx| {
            let id = ObjectId::new();
            let mut friend = Friend {
                key: Some(id),
                ..Friend::new("Jane")
            };
            ctx.collection().save(&ctx.mapper(), &mut friend)?;
            assert_eq!(friend.key, Some(id));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_twice_replaces() {
    run_test(
        create_test_context,
        |ctx| {
            let mapper = ctx.mapper();
            let collection = ctx.collection();
            let mut friend = Friend::new("John");
            collection.save(&mapper, &mut friend)?;
            let first_key = friend.key;

            friend.age = Some(40);
            collection.save(&mapper, &mut friend)?;
            assert_eq!(friend.key, first_key);
            assert_eq!(collection.size(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_generates_hex_id() {
    run_test(
        create_test_context,
        |ctx| {
            let mut friend = HexFriend::random();
            let document = ctx.mapper().prepare_save(&mut friend)?;

            let hex = friend.id.clone().expect("hex id written back");
            assert!(ObjectId::is_valid(&hex));
            assert_eq!(document.object_id().map(|id| id.to_hex()), Some(hex));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_assigned_hex_id_is_stored_as_object_id() {
    run_test(
        create_test_context,
        |ctx| {
            let hex = "47cc67093475061e3d95369d".to_string();
            let mut friend = HexFriend {
                id: Some(hex.clone()),
                email: "a@b.c".to_string(),
            };
            let document = ctx.mapper().prepare_save(&mut friend)?;
            assert_eq!(document.get(DOC_ID)?, Value::ObjectId(ObjectId::parse(&hex)?));
            assert_eq!(friend.id, Some(hex));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_invalid_hex_id_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let mut friend = HexFriend {
                id: Some("not-an-id".to_string()),
                email: "a@b.c".to_string(),
            };
            let err = ctx.mapper().prepare_save(&mut friend).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
            assert_eq!(err.cause().map(|c| c.kind().clone()), Some(ErrorKind::InvalidId));
            assert_eq!(friend.id.as_deref(), Some("not-an-id"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_other_object_id_fields_are_untouched() {
    run_test(
        create_test_context,
        |ctx| {
            let inviter = ObjectId::new();
            let mut invitation = Invitation {
                id: None,
                invited_by: Some(inviter),
                message: "join us".to_string(),
            };
            let document = ctx.mapper().prepare_save(&mut invitation)?;

            let id = invitation.id.expect("generated id written back");
            assert_ne!(id, inviter);
            assert_eq!(invitation.invited_by, Some(inviter));
            assert_eq!(document.get(DOC_ID)?, Value::ObjectId(id));
            assert_eq!(document.get("invited_by")?, Value::ObjectId(inviter));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_custom_id_is_never_generated() {
    run_test(
        create_test_context,
        |ctx| {
            let mut account = Account {
                account_number: 42,
                owner: "John".to_string(),
                tags: vec!["gold".to_string()],
            };
            let document = ctx.mapper().prepare_save(&mut account)?;
            assert_eq!(
                document,
                doc! { "_id": 42_i64, owner: "John", tags: ["gold"] }
            );
            assert_eq!(account.account_number, 42);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_entity_without_id() {
    run_test(
        create_test_context,
        |ctx| {
            assert_eq!(Coordinate::target_shape(), TargetShape::new("Coordinate"));
            let mut coordinate = Coordinate { lat: 48.85, lon: 2.35 };
            let document = ctx.mapper().prepare_save(&mut coordinate)?;
            assert!(!document.has_id());
            assert_eq!(document, doc! { lat: 48.85, lon: 2.35 });
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_save_with_failing_marshaller() {
    let mapper = Mapper::builder().marshaller(FailingMarshaller).build().unwrap();
    let mut friend = Friend::new("John");

    let err = mapper.prepare_save(&mut friend).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
    assert!(err.message().starts_with("Unable to save object"));
    assert_eq!(err.cause().map(|c| c.kind().clone()), Some(ErrorKind::ObjectMappingError));
    assert!(friend.key.is_none());
}

#[test]
fn test_save_and_restore_nested_entity() {
    run_test(
        create_test_context,
        |ctx| {
            let mapper = ctx.mapper();
            let mut customer = Customer {
                id: None,
                name: "Ada".to_string(),
                address: None,
                status: Status::Suspended {
                    reason: "unpaid".to_string(),
                },
                session_token: "secret".to_string(),
            };

            let document = mapper.prepare_save(&mut customer)?;
            assert!(!document.contains_key("session_token"));
            assert_eq!(
                document.get("status")?,
                Value::Document(doc! { variant: "Suspended", value: { reason: "unpaid" } })
            );

            let restored: Customer = mapper.unmarshall(&document)?;
            assert_eq!(restored.id, customer.id);
            assert_eq!(restored.status, customer.status);
            assert_eq!(restored.session_token, "");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_entity_shapes() {
    assert_eq!(Friend::entity_name(), "friends");
    assert_eq!(
        Friend::target_shape(),
        TargetShape::with_id("Friend", "key", IdKind::ObjectId)
    );
    assert_eq!(
        HexFriend::target_shape(),
        TargetShape::with_id("HexFriend", "id", IdKind::Hex)
    );
    assert_eq!(Account::entity_name(), "accounts");
    assert_eq!(
        Account::target_shape(),
        TargetShape::with_id("Account", "account_number", IdKind::Custom)
    );
}
