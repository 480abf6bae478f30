//! Post-registry integration tests: the sorted read model, like counting
//! (including concurrent fan-in), ownership-scoped deletion and the full
//! end-to-end scenario.

use tempfile::tempdir;
use uuid::Uuid;

use bloglist::error::AppError;
use bloglist::identity::{Authenticator, LoginRequest, Principal, TokenSigner};
use bloglist::storage::SharedStore;
use bloglist::tprintln;

fn fresh_store() -> (tempfile::TempDir, SharedStore) {
    let tmp = tempdir().unwrap();
    let store = SharedStore::new(tmp.path()).unwrap();
    (tmp, store)
}

fn user_principal(store: &SharedStore, username: &str) -> Principal {
    let guard = store.0.lock();
    let user = guard.find_user_by_username(username).unwrap();
    Principal { user_id: user.id, username: user.username.clone() }
}

#[tokio::test]
async fn listing_is_sorted_by_likes_with_stable_ties() {
    let (_tmp, store) = fresh_store();
    let mut guard = store.0.lock();
    let user = guard.create_user("alice", "Alice", "pw12345").unwrap();

    let ids: Vec<Uuid> = [3, 7, 3, 12, 0, 7]
        .iter()
        .enumerate()
        .map(|(i, likes)| {
            guard
                .insert_blog(None, &format!("blog-{}", i), "X", "http://u", user.id, *likes)
                .unwrap()
                .id
        })
        .collect();

    let listed = guard.list_blogs();
    let got: Vec<Uuid> = listed.iter().map(|v| v.id).collect();
    // 12, then the two 7s in creation order, then the two 3s in creation
    // order, then 0
    assert_eq!(got, vec![ids[3], ids[1], ids[5], ids[0], ids[2], ids[4]]);
    for pair in listed.windows(2) {
        assert!(pair[0].likes >= pair[1].likes);
    }
    // Owner public fields are joined in; the hash never appears
    assert_eq!(listed[0].user.username, "alice");
}

#[tokio::test]
async fn like_increments_by_exactly_one_and_checks_existence() {
    let (_tmp, store) = fresh_store();
    let blog_id = {
        let mut guard = store.0.lock();
        let user = guard.create_user("alice", "Alice", "pw12345").unwrap();
        guard.insert_blog(None, "A", "X", "http://u", user.id, 0).unwrap().id
    };

    let mut guard = store.0.lock();
    assert_eq!(guard.like_blog(blog_id).unwrap().likes, 1);
    assert_eq!(guard.like_blog(blog_id).unwrap().likes, 2);

    let err = guard.like_blog(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likes_never_lose_updates() {
    let (_tmp, store) = fresh_store();
    let blog_id = {
        let mut guard = store.0.lock();
        let user = guard.create_user("alice", "Alice", "pw12345").unwrap();
        guard.insert_blog(None, "A", "X", "http://u", user.id, 0).unwrap().id
    };

    let n = 64;
    let tasks: Vec<_> = (0..n)
        .map(|_| {
            let store = store.clone();
            tokio::task::spawn_blocking(move || {
                store.0.lock().like_blog(blog_id).unwrap();
            })
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    let final_likes = store.0.lock().find_blog(blog_id).unwrap().likes;
    tprintln!("final likes after {} concurrent increments: {}", n, final_likes);
    assert_eq!(final_likes, n);
}

#[tokio::test]
async fn create_requires_title_and_url() {
    let (_tmp, store) = fresh_store();
    let mut guard = store.0.lock();
    let user = guard.create_user("alice", "Alice", "pw12345").unwrap();
    let principal = Principal { user_id: user.id, username: user.username.clone() };

    let err = guard.create_blog(&principal, "", "X", "http://u").unwrap_err();
    assert!(matches!(err, AppError::UserInput { .. }));
    let err = guard.create_blog(&principal, "A", "X", "  ").unwrap_err();
    assert!(matches!(err, AppError::UserInput { .. }));
    assert_eq!(guard.blog_count(), 0);
    // author is not part of the validation contract
    let ok = guard.create_blog(&principal, "A", "", "http://u").unwrap();
    assert_eq!(ok.author, "");
}

#[tokio::test]
async fn delete_is_owner_only() {
    let (_tmp, store) = fresh_store();
    let mut guard = store.0.lock();
    let alice = guard.create_user("alice", "Alice", "pw12345").unwrap();
    let bob = guard.create_user("bob", "Bob", "pw67890").unwrap();
    let blog = guard.insert_blog(None, "A", "X", "http://u", alice.id, 3).unwrap();

    let err = guard.delete_blog(bob.id, blog.id).unwrap_err();
    assert!(matches!(err, AppError::Forbidden { .. }));
    // Still retrievable afterwards, count intact
    let listed: Vec<Uuid> = guard.list_blogs().iter().map(|v| v.id).collect();
    assert!(listed.contains(&blog.id));
    assert_eq!(guard.find_blog(blog.id).unwrap().likes, 3);

    guard.delete_blog(alice.id, blog.id).unwrap();
    assert!(guard.find_blog(blog.id).is_none());
    assert!(guard.find_user(alice.id).unwrap().blogs.is_empty());

    let err = guard.delete_blog(alice.id, blog.id).unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn reset_clears_users_and_blogs() {
    let (_tmp, store) = fresh_store();
    let mut guard = store.0.lock();
    let user = guard.create_user("alice", "Alice", "pw12345").unwrap();
    guard.insert_blog(None, "A", "X", "http://u", user.id, 0).unwrap();

    guard.reset().unwrap();
    assert_eq!(guard.user_count(), 0);
    assert_eq!(guard.blog_count(), 0);
}

#[tokio::test]
async fn end_to_end_create_like_forbidden_delete() {
    let (_tmp, store) = fresh_store();
    let auth = Authenticator::new(store.clone(), TokenSigner::new("e2e-secret", None));

    {
        let mut guard = store.0.lock();
        guard.create_user("alice", "Alice", "pw12345").unwrap();
        guard.create_user("bob", "Bob", "pw67890").unwrap();
    }

    // alice logs in and creates a post
    let alice_login = auth
        .login(&LoginRequest { username: "alice".into(), password: "pw12345".into() })
        .unwrap();
    let alice = auth.authenticate(Some(&alice_login.token)).unwrap();
    let created = store.0.lock().create_blog(&alice, "A", "X", "u").unwrap();
    assert_eq!(created.likes, 0);
    assert_eq!(created.user.username, "alice");

    // three likes, no identity involved
    for _ in 0..3 {
        store.0.lock().like_blog(created.id).unwrap();
    }
    assert_eq!(store.0.lock().find_blog(created.id).unwrap().likes, 3);

    // bob's token cannot delete it
    let bob_login = auth
        .login(&LoginRequest { username: "bob".into(), password: "pw67890".into() })
        .unwrap();
    let bob = auth.authenticate(Some(&bob_login.token)).unwrap();
    let err = store.0.lock().delete_blog(bob.user_id, created.id).unwrap_err();
    assert!(matches!(err, AppError::Forbidden { .. }));
    assert_eq!(store.0.lock().find_blog(created.id).unwrap().likes, 3);

    // alice's can
    store.0.lock().delete_blog(alice.user_id, created.id).unwrap();
    let guard = store.0.lock();
    let listed: Vec<Uuid> = guard.list_blogs().iter().map(|v| v.id).collect();
    assert!(!listed.contains(&created.id));
    assert!(guard.find_user(alice.user_id).unwrap().blogs.is_empty());
}

#[tokio::test]
async fn user_principal_helper_matches_store_state() {
    // Sanity check for the helper used across suites
    let (_tmp, store) = fresh_store();
    let created = store.0.lock().create_user("alice", "Alice", "pw12345").unwrap();
    let principal = user_principal(&store, "alice");
    assert_eq!(principal.user_id, created.id);
}
