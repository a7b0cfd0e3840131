use blogstore_core::{Category, NewCategory, PostTag, User};
use serde_json::json;

#[test]
fn category_serializes_with_plain_field_names() {
    let category = NewCategory::new("Tech", Some("Tech posts".to_string())).into_category(3);

    let value = serde_json::to_value(&category).unwrap();

    assert_eq!(
        value,
        json!({ "id": 3, "name": "Tech", "description": "Tech posts" })
    );
    let back: Category = serde_json::from_value(value).unwrap();
    assert_eq!(back, category);
}

#[test]
fn user_serialization_omits_password_hash() {
    let user = User {
        id: 1,
        email: "ada@example.com".to_string(),
        username: "ada".to_string(),
        password_hash: "secret-hash".to_string(),
        bio: None,
    };

    let text = serde_json::to_string(&user).unwrap();

    assert!(!text.contains("secret-hash"));
    assert!(!text.contains("password_hash"));
    let back: User = serde_json::from_str(&text).unwrap();
    assert_eq!(back.password_hash, "");
    assert_eq!(back.email, user.email);
}

#[test]
fn post_tag_deserializes_from_pair_object() {
    let link: PostTag = serde_json::from_value(json!({ "post_id": 4, "tag_id": 9 })).unwrap();

    assert_eq!(
        link,
        PostTag {
            post_id: 4,
            tag_id: 9
        }
    );
}
