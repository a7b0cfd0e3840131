use blogstore_core::{
    ConnectionProvider, Entity, MemoryConnectionProvider, PostTag, PostTagRepository, RepoError,
    SqlitePostTagRepository,
};

/// Seeds one category, two posts (ids 1, 2) and two tags (ids 1, 2).
fn setup() -> MemoryConnectionProvider {
    let provider = MemoryConnectionProvider::new().unwrap();
    let conn = provider.acquire().unwrap();
    conn.execute_batch(
        "INSERT INTO category (name) VALUES ('Tech');
         INSERT INTO post (category_id, title) VALUES (1, 'first'), (1, 'second');
         INSERT INTO tag (name) VALUES ('rust'), ('sqlite');",
    )
    .unwrap();
    provider.release(conn);
    provider
}

#[test]
fn add_links_post_and_tag() {
    let provider = setup();
    let repo = SqlitePostTagRepository::new(&provider);

    let link = repo.add_post_tag(1, 2).unwrap();

    assert_eq!(
        link,
        PostTag {
            post_id: 1,
            tag_id: 2
        }
    );
    assert_eq!(repo.list_tags_for_post(1).unwrap(), vec![2]);
    assert!(repo.list_tags_for_post(2).unwrap().is_empty());
}

#[test]
fn duplicate_link_is_rejected() {
    let provider = setup();
    let repo = SqlitePostTagRepository::new(&provider);
    repo.add_post_tag(1, 1).unwrap();

    let err = repo.add_post_tag(1, 1).unwrap_err();

    assert!(matches!(
        err,
        RepoError::AlreadyExists {
            entity: Entity::PostTag,
            ..
        }
    ));
    assert_eq!(repo.list_tags_for_post(1).unwrap(), vec![1]);
}

#[test]
fn link_to_missing_post_or_tag_is_not_found() {
    let provider = setup();
    let repo = SqlitePostTagRepository::new(&provider);

    assert!(matches!(
        repo.add_post_tag(99, 1),
        Err(RepoError::NotFound {
            entity: Entity::Post,
            ..
        })
    ));
    assert!(matches!(
        repo.add_post_tag(1, 99),
        Err(RepoError::NotFound {
            entity: Entity::Tag,
            ..
        })
    ));
}

#[test]
fn remove_deletes_only_the_given_link() {
    let provider = setup();
    let repo = SqlitePostTagRepository::new(&provider);
    repo.add_post_tag(1, 1).unwrap();
    repo.add_post_tag(1, 2).unwrap();
    repo.add_post_tag(2, 1).unwrap();

    repo.remove_post_from_tag(1, 1).unwrap();

    assert_eq!(repo.list_tags_for_post(1).unwrap(), vec![2]);
    assert_eq!(repo.list_tags_for_post(2).unwrap(), vec![1]);
}

#[test]
fn removing_missing_link_is_a_no_op() {
    let provider = setup();
    let repo = SqlitePostTagRepository::new(&provider);

    repo.remove_post_from_tag(1, 2).unwrap();
    repo.remove_post_from_tag(404, 404).unwrap();
}

#[test]
fn link_can_be_re_added_after_removal() {
    let provider = setup();
    let repo = SqlitePostTagRepository::new(&provider);
    repo.add_post_tag(2, 2).unwrap();
    repo.remove_post_from_tag(2, 2).unwrap();

    repo.add_post_tag(2, 2).unwrap();

    assert_eq!(repo.list_tags_for_post(2).unwrap(), vec![2]);
}
