//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port and drives the
//! client over real HTTP with the default ureq transport, so request
//! building, rate-header parsing and response classification are checked
//! against an independent implementation of the wire format.

use std::net::SocketAddr;

use docbase_core::{
    AttachmentApi, Client, CommentApi, CommentCreateRequest, Error, GroupApi, GroupCreateRequest,
    GroupListOptions, GroupUserApi, GroupUsersRequest, PostApi, PostCreateRequest,
    PostListOptions, PostUpdateRequest, Scope, TagApi, UploadFile, UreqTransport, UserApi,
    UserListOptions,
};
use mock_server::MockConfig;

/// Start a mock server in a background thread and return its address.
fn start_mock(config: MockConfig) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_config(listener, config).await
        })
        .unwrap();
    });

    addr
}

fn client_for(addr: SocketAddr, token: &str) -> Client {
    Client::builder("kray", token)
        .base_url(format!("http://{addr}/teams/kray"))
        .build()
        .unwrap()
}

fn start() -> Client {
    client_for(start_mock(MockConfig::default()), "token")
}

#[test]
fn post_lifecycle() {
    let client = start();
    let posts = client.posts();

    // Create two posts so the list can page.
    let mut request = PostCreateRequest::new("Integration memo", "first body");
    request.tags = vec!["rust".to_string()];
    request.scope = Some(Scope::Group);
    request.groups = vec![1];
    let (created, response) = posts.create(&request).unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(created.title, "Integration memo");
    assert_eq!(created.scope, Scope::Group);
    assert_eq!(created.groups[0].name, "DocBase");
    assert_eq!(created.user.name, "danny");
    posts
        .create(&PostCreateRequest::new("Second memo", "second body"))
        .unwrap();

    // Get.
    let (fetched, _) = posts.get(created.id).unwrap();
    assert_eq!(fetched, created);

    // List with paging; meta lands on the response.
    let (page, response) = posts
        .list(&PostListOptions {
            page: Some(1),
            per_page: Some(1),
            ..PostListOptions::default()
        })
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(response.total(), 2);
    assert_eq!(response.previous_page(), None);
    assert_eq!(
        response.next_page(),
        Some("/teams/kray/posts?page=2&per_page=1")
    );

    // Search by tag.
    let (tagged, _) = posts
        .list(&PostListOptions {
            q: Some("tag:rust".to_string()),
            ..PostListOptions::default()
        })
        .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].id, created.id);

    // Update only the title.
    let (updated, _) = posts
        .update(
            created.id,
            &PostUpdateRequest {
                title: Some("Renamed memo".to_string()),
                ..PostUpdateRequest::default()
            },
        )
        .unwrap();
    assert_eq!(updated.title, "Renamed memo");
    assert_eq!(updated.body, "first body");

    // Comment, then remove it.
    let (comment, response) = client
        .comments()
        .create(created.id, &CommentCreateRequest::new("Looks good"))
        .unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(comment.body, "Looks good");
    let (with_comment, _) = posts.get(created.id).unwrap();
    assert_eq!(with_comment.comments.len(), 1);
    let response = client.comments().delete(comment.id).unwrap();
    assert_eq!(response.status, 204);

    // Archive round trip.
    posts.archive(created.id).unwrap();
    assert!(posts.get(created.id).unwrap().0.archived);
    posts.unarchive(created.id).unwrap();
    assert!(!posts.get(created.id).unwrap().0.archived);

    // Delete; the post is gone afterwards.
    let response = posts.delete(created.id).unwrap();
    assert_eq!(response.status, 204);
    let err = posts.get(created.id).unwrap_err();
    match err {
        Error::Api {
            status,
            error,
            messages,
        } => {
            assert_eq!(status, 404);
            assert_eq!(error.as_deref(), Some("not_found"));
            assert_eq!(messages, vec!["post not found".to_string()]);
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[test]
fn validation_failure_carries_server_messages() {
    let client = start();
    let err = client
        .posts()
        .create(&PostCreateRequest::new("  ", "body"))
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.messages(), ["Title can't be blank".to_string()]);
}

#[test]
fn groups_and_membership() {
    let client = start();
    let groups = client.groups();

    let (found, _) = groups
        .list(&GroupListOptions {
            name: Some("kray".to_string()),
            ..GroupListOptions::default()
        })
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "kray-internal");

    let (created, response) = groups
        .create(&GroupCreateRequest {
            name: "writers".to_string(),
            description: Some("People who write".to_string()),
        })
        .unwrap();
    assert_eq!(response.status, 201);
    assert!(created.users.is_empty());

    groups
        .add_users(created.id, &GroupUsersRequest::new([1, 2]))
        .unwrap();
    let (group, _) = groups.get(created.id).unwrap();
    assert_eq!(group.users.len(), 2);

    let response = groups
        .remove_users(created.id, &GroupUsersRequest::new([1]))
        .unwrap();
    assert_eq!(response.status, 204);
    let (group, _) = groups.get(created.id).unwrap();
    assert_eq!(group.users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2]);

    // The membership service hits the same endpoints.
    client
        .group_users()
        .create(created.id, &GroupUsersRequest::new([1]))
        .unwrap();
    client
        .group_users()
        .delete(created.id, &GroupUsersRequest::new([2]))
        .unwrap();
    let (group, _) = groups.get(created.id).unwrap();
    assert_eq!(group.users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1]);

    let err = groups
        .create(&GroupCreateRequest {
            name: "writers".to_string(),
            description: None,
        })
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[test]
fn tags_come_from_posts() {
    let client = start();
    let (tags, _) = client.tags().list().unwrap();
    assert!(tags.is_empty());

    let mut request = PostCreateRequest::new("Tagged", "body");
    request.tags = vec!["ruby".to_string(), "rails".to_string()];
    client.posts().create(&request).unwrap();

    let (tags, _) = client.tags().list().unwrap();
    let names: Vec<_> = tags.into_iter().map(|tag| tag.name).collect();
    assert_eq!(names, vec!["rails".to_string(), "ruby".to_string()]);
}

#[test]
fn users_with_group_membership() {
    let client = start();

    let (users, _) = client
        .users()
        .list(&UserListOptions {
            q: Some("danny".to_string()),
            ..UserListOptions::default()
        })
        .unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].groups.is_empty());

    let (users, _) = client
        .users()
        .list(&UserListOptions {
            q: Some("danny".to_string()),
            include_user_groups: true,
            ..UserListOptions::default()
        })
        .unwrap();
    assert_eq!(users[0].role, "owner");
    assert_eq!(users[0].groups.len(), 1);
    assert_eq!(users[0].groups[0].name, "DocBase");
}

#[test]
fn attachments_upload_and_download() {
    let client = start();
    let dir = tempfile::tempdir().unwrap();
    let text = dir.path().join("notes.txt");
    let image = dir.path().join("pixel.png");
    std::fs::write(&text, "meeting notes").unwrap();
    std::fs::write(&image, [0x89, 0x50, 0x4e, 0x47, 0x00, 0xff]).unwrap();

    let (uploaded, response) = client.attachments().upload_paths(&[&text, &image]).unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(uploaded.len(), 2);
    assert_eq!(uploaded[0].name, "notes.txt");
    assert_eq!(uploaded[1].size, 6);

    let (bytes, _) = client.attachments().download(&uploaded[1].id).unwrap();
    assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47, 0x00, 0xff]);

    let err = client.attachments().download("missing.png").unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[test]
fn downloads_larger_than_ten_mebibytes() {
    let client = start();
    let bytes: Vec<u8> = (0..11 * 1024 * 1024).map(|i| (i % 251) as u8).collect();

    let (uploaded, _) = client
        .attachments()
        .upload(&[UploadFile::from_bytes("big.bin", &bytes)])
        .unwrap();
    assert_eq!(uploaded[0].size, bytes.len() as u64);

    let (downloaded, _) = client.attachments().download(&uploaded[0].id).unwrap();
    assert_eq!(downloaded.len(), bytes.len());
    assert!(downloaded == bytes);

    let capped = Client::builder("kray", "token")
        .base_url(client.base_url().as_str())
        .transport(UreqTransport::new().with_body_limit(1024))
        .build()
        .unwrap();
    let err = capped.attachments().download(&uploaded[0].id).unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}

#[test]
fn rate_headers_are_recorded() {
    let client = client_for(
        start_mock(MockConfig {
            rate_limit: 50,
            reset_after_secs: 120,
        }),
        "token",
    );
    let (_, response) = client.tags().list().unwrap();

    assert_eq!(response.rate.limit, 50);
    assert_eq!(response.rate.remaining, 49);
    assert!(response.rate.reset.is_some());
    assert_eq!(client.rate(), response.rate);
}

#[test]
fn server_rate_limit_then_local_refusal() {
    let addr = start_mock(MockConfig {
        rate_limit: 2,
        reset_after_secs: 300,
    });

    // A second client spends the shared budget without this client seeing it.
    let other = client_for(addr, "token");
    other.tags().list().unwrap();
    other.tags().list().unwrap();

    let client = client_for(addr, "token");
    let err = client.tags().list().unwrap_err();
    match &err {
        Error::RateLimit { status, rate, .. } => {
            assert_eq!(*status, Some(429));
            assert_eq!(rate.remaining, 0);
            assert!(rate.reset.is_some());
        }
        other => panic!("expected RateLimit error, got {other:?}"),
    }

    // The snapshot now says the budget is spent, so nothing is sent.
    let err = client.tags().list().unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.status(), None);
    assert!(err.messages()[0].contains("not making remote request"));
}

#[test]
fn missing_token_is_unauthorized() {
    let client = client_for(start_mock(MockConfig::default()), "");
    let err = client.tags().list().unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!err.is_rate_limited());
}

#[test]
fn closed_port_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client_for(addr, "token");
    let err = client.tags().list().unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}
