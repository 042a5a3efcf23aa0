use std::collections::BTreeSet;
use std::path::Path as FsPath;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use uuid::Uuid;

use crate::model::*;
use crate::{error, now, AppState, Store};

type ApiResult<T> = Result<T, Response>;

const DEFAULT_PER_PAGE: usize = 20;

fn payload<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| error(StatusCode::BAD_REQUEST, "bad_request", rejection.body_text()))
}

fn not_found(what: &str) -> Response {
    error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
}

fn page_bounds(page: Option<usize>, per_page: Option<usize>) -> (usize, usize) {
    (page.unwrap_or(1).max(1), per_page.unwrap_or(DEFAULT_PER_PAGE).max(1))
}

/// Items on `page`; a page past the end (or past `usize`) is empty.
fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Vec<T> {
    let Some(offset) = page.saturating_sub(1).checked_mul(per_page) else {
        return Vec::new();
    };
    items
        .iter()
        .skip(offset)
        .take(per_page)
        .cloned()
        .collect()
}

fn group_refs(store: &Store, ids: &[u64]) -> ApiResult<Vec<GroupRef>> {
    ids.iter()
        .map(|id| {
            store
                .groups
                .get(id)
                .map(|group| GroupRef {
                    id: group.id,
                    name: group.name.clone(),
                })
                .ok_or_else(|| {
                    error(
                        StatusCode::BAD_REQUEST,
                        "bad_request",
                        format!("group {id} does not exist"),
                    )
                })
        })
        .collect()
}

fn tags(names: &[String]) -> Vec<Tag> {
    names.iter().map(|name| Tag { name: name.clone() }).collect()
}

/// True when `post` satisfies every non-sort term of `q`.
fn matches_query(post: &Post, q: &str) -> bool {
    q.split_whitespace().all(|term| match term.split_once(':') {
        Some(("desc" | "asc", _)) => true,
        Some(("tag", name)) => post.tags.iter().any(|tag| tag.name == name),
        Some(("author", name)) => post.user.name == name,
        Some(("title", text)) => post.title.contains(text),
        _ => post.title.contains(term) || post.body.contains(term),
    })
}

// --- posts ---

pub(crate) async fn list_posts(
    State(state): State<AppState>,
    Path(team): Path<String>,
    Query(query): Query<PostQuery>,
) -> Json<PostList> {
    let store = state.db.read().await;
    let q = query.q.unwrap_or_default();
    let mut posts: Vec<Post> = store
        .posts
        .values()
        .filter(|post| matches_query(post, &q))
        .cloned()
        .collect();
    if !q.contains("asc:") {
        posts.reverse();
    }

    let (page, per_page) = page_bounds(query.page, query.per_page);
    let total = posts.len();
    let link = |page: usize| format!("/teams/{team}/posts?page={page}&per_page={per_page}");
    let meta = Meta {
        previous_page: (page > 1).then(|| link(page - 1)),
        next_page: page
            .checked_mul(per_page)
            .is_some_and(|seen| seen < total)
            .then(|| link(page + 1)),
        total,
    };
    Json(PostList {
        posts: paginate(&posts, page, per_page),
        meta,
    })
}

pub(crate) async fn get_post(
    State(state): State<AppState>,
    Path((_team, id)): Path<(String, u64)>,
) -> ApiResult<Json<Post>> {
    let store = state.db.read().await;
    store
        .posts
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("post"))
}

pub(crate) async fn create_post(
    State(state): State<AppState>,
    Path(team): Path<String>,
    input: Result<Json<CreatePost>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let input = payload(input)?;
    if input.title.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "bad_request", "Title can't be blank"));
    }

    let mut store = state.db.write().await;
    let groups = group_refs(&store, &input.groups)?;
    let author = store
        .user(1)
        .map(User::to_ref)
        .ok_or_else(|| not_found("user"))?;
    let id = store.next_post_id;
    store.next_post_id += 1;

    let post = Post {
        id,
        title: input.title,
        body: input.body,
        draft: input.draft,
        archived: false,
        url: format!("https://{team}.docbase.io/posts/{id}"),
        created_at: now(),
        tags: tags(&input.tags),
        scope: input.scope.unwrap_or_else(|| "everyone".to_string()),
        sharing_url: None,
        user: author,
        stars_count: 0,
        good_jobs_count: 0,
        comments: Vec::new(),
        groups,
        attachments: Vec::new(),
    };
    store.posts.insert(id, post.clone());
    Ok((StatusCode::CREATED, Json(post)))
}

pub(crate) async fn update_post(
    State(state): State<AppState>,
    Path((_team, id)): Path<(String, u64)>,
    input: Result<Json<UpdatePost>, JsonRejection>,
) -> ApiResult<Json<Post>> {
    let input = payload(input)?;
    let mut store = state.db.write().await;
    let groups = match &input.groups {
        Some(ids) => Some(group_refs(&store, ids)?),
        None => None,
    };
    let post = store.posts.get_mut(&id).ok_or_else(|| not_found("post"))?;

    if let Some(title) = input.title {
        post.title = title;
    }
    if let Some(body) = input.body {
        post.body = body;
    }
    if let Some(draft) = input.draft {
        post.draft = draft;
    }
    if let Some(names) = input.tags {
        post.tags = tags(&names);
    }
    if let Some(scope) = input.scope {
        post.scope = scope;
    }
    if let Some(groups) = groups {
        post.groups = groups;
    }
    Ok(Json(post.clone()))
}

pub(crate) async fn delete_post(
    State(state): State<AppState>,
    Path((_team, id)): Path<(String, u64)>,
) -> ApiResult<StatusCode> {
    let mut store = state.db.write().await;
    store
        .posts
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("post"))
}

async fn set_archived(state: &AppState, id: u64, archived: bool) -> ApiResult<StatusCode> {
    let mut store = state.db.write().await;
    let post = store.posts.get_mut(&id).ok_or_else(|| not_found("post"))?;
    post.archived = archived;
    Ok(StatusCode::OK)
}

pub(crate) async fn archive_post(
    State(state): State<AppState>,
    Path((_team, id)): Path<(String, u64)>,
) -> ApiResult<StatusCode> {
    set_archived(&state, id, true).await
}

pub(crate) async fn unarchive_post(
    State(state): State<AppState>,
    Path((_team, id)): Path<(String, u64)>,
) -> ApiResult<StatusCode> {
    set_archived(&state, id, false).await
}

// --- comments ---

pub(crate) async fn create_comment(
    State(state): State<AppState>,
    Path((_team, post_id)): Path<(String, u64)>,
    input: Result<Json<CreateComment>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let input = payload(input)?;
    if input.body.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "bad_request", "Body can't be blank"));
    }

    let mut store = state.db.write().await;
    let author = store
        .user(1)
        .map(User::to_ref)
        .ok_or_else(|| not_found("user"))?;
    let id = store.next_comment_id;
    let post = store.posts.get_mut(&post_id).ok_or_else(|| not_found("post"))?;

    let comment = Comment {
        id,
        body: input.body,
        created_at: now(),
        user: author,
    };
    post.comments.push(comment.clone());
    store.next_comment_id += 1;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    Path((_team, id)): Path<(String, u64)>,
) -> ApiResult<StatusCode> {
    let mut store = state.db.write().await;
    for post in store.posts.values_mut() {
        if let Some(index) = post.comments.iter().position(|comment| comment.id == id) {
            post.comments.remove(index);
            return Ok(StatusCode::NO_CONTENT);
        }
    }
    Err(not_found("comment"))
}

// --- groups ---

pub(crate) async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> Json<Vec<GroupRef>> {
    let store = state.db.read().await;
    let name = query.name.unwrap_or_default().to_lowercase();
    let groups: Vec<GroupRef> = store
        .groups
        .values()
        .filter(|group| group.name.to_lowercase().contains(&name))
        .map(|group| GroupRef {
            id: group.id,
            name: group.name.clone(),
        })
        .collect();
    let (page, per_page) = page_bounds(query.page, query.per_page);
    Json(paginate(&groups, page, per_page))
}

pub(crate) async fn get_group(
    State(state): State<AppState>,
    Path((_team, id)): Path<(String, u64)>,
) -> ApiResult<Json<Group>> {
    let store = state.db.read().await;
    store
        .groups
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("group"))
}

pub(crate) async fn create_group(
    State(state): State<AppState>,
    input: Result<Json<CreateGroup>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    let input = payload(input)?;
    let mut store = state.db.write().await;
    if input.name.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "bad_request", "Name can't be blank"));
    }
    if store.groups.values().any(|group| group.name == input.name) {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "bad_request",
            "Name has already been taken",
        ));
    }

    let id = store.next_group_id;
    store.next_group_id += 1;
    let group = Group {
        id,
        name: input.name,
        description: input.description,
        posts_count: 0,
        last_activity_at: None,
        created_at: now(),
        users: Vec::new(),
    };
    store.groups.insert(id, group.clone());
    Ok((StatusCode::CREATED, Json(group)))
}

fn member_refs(store: &Store, user_ids: &[u64]) -> ApiResult<Vec<UserRef>> {
    user_ids
        .iter()
        .map(|id| {
            store.user(*id).map(User::to_ref).ok_or_else(|| {
                error(
                    StatusCode::BAD_REQUEST,
                    "bad_request",
                    format!("user {id} does not exist"),
                )
            })
        })
        .collect()
}

pub(crate) async fn add_group_users(
    State(state): State<AppState>,
    Path((_team, id)): Path<(String, u64)>,
    input: Result<Json<GroupUsers>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let input = payload(input)?;
    let mut store = state.db.write().await;
    let members = member_refs(&store, &input.user_ids)?;
    let group = store.groups.get_mut(&id).ok_or_else(|| not_found("group"))?;
    for member in members {
        if !group.users.iter().any(|user| user.id == member.id) {
            group.users.push(member);
        }
    }
    Ok(StatusCode::OK)
}

pub(crate) async fn remove_group_users(
    State(state): State<AppState>,
    Path((_team, id)): Path<(String, u64)>,
    input: Result<Json<GroupUsers>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let input = payload(input)?;
    let mut store = state.db.write().await;
    let group = store.groups.get_mut(&id).ok_or_else(|| not_found("group"))?;
    group.users.retain(|user| !input.user_ids.contains(&user.id));
    Ok(StatusCode::NO_CONTENT)
}

// --- tags & users ---

pub(crate) async fn list_tags(State(state): State<AppState>) -> Json<Vec<Tag>> {
    let store = state.db.read().await;
    let unique: BTreeSet<Tag> = store
        .posts
        .values()
        .flat_map(|post| post.tags.iter().cloned())
        .collect();
    Json(unique.into_iter().collect())
}

pub(crate) async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Json<Vec<User>> {
    let store = state.db.read().await;
    let q = query.q.unwrap_or_default();
    let include_groups = query.include_user_groups.unwrap_or(false);
    let users: Vec<User> = store
        .users
        .iter()
        .filter(|user| user.name.contains(&q) || user.username.contains(&q))
        .map(|user| {
            let mut user = user.clone();
            user.posts_count = store.posts.values().filter(|p| p.user.id == user.id).count() as u64;
            user.groups = if include_groups {
                store
                    .groups
                    .values()
                    .filter(|group| group.users.iter().any(|member| member.id == user.id))
                    .map(|group| GroupRef {
                        id: group.id,
                        name: group.name.clone(),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            user
        })
        .collect();
    let (page, per_page) = page_bounds(query.page, query.per_page);
    Json(paginate(&users, page, per_page))
}

// --- attachments ---

pub(crate) async fn upload_attachments(
    State(state): State<AppState>,
    Path(team): Path<String>,
    input: Result<Json<Vec<UploadFile>>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Vec<Attachment>>)> {
    let files = payload(input)?;
    if files.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "bad_request", "No files given"));
    }

    let mut decoded = Vec::with_capacity(files.len());
    for file in files {
        let bytes = STANDARD.decode(&file.content).map_err(|e| {
            error(
                StatusCode::BAD_REQUEST,
                "bad_request",
                format!("{}: content is not base64: {e}", file.name),
            )
        })?;
        decoded.push((file.name, bytes));
    }

    let mut store = state.db.write().await;
    let mut attachments = Vec::with_capacity(decoded.len());
    for (name, bytes) in decoded {
        let extension = FsPath::new(&name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let id = format!("{}{extension}", Uuid::new_v4());
        let url = format!("https://{team}.docbase.io/uploads/{id}");
        attachments.push(Attachment {
            markdown: format!("![{name}]({url})"),
            id: id.clone(),
            name,
            size: bytes.len() as u64,
            url,
            created_at: now(),
        });
        store.files.insert(id, bytes);
    }
    Ok((StatusCode::CREATED, Json(attachments)))
}

pub(crate) async fn download_attachment(
    State(state): State<AppState>,
    Path((_team, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let store = state.db.read().await;
    let bytes = store.files.get(&id).cloned().ok_or_else(|| not_found("attachment"))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    )
        .into_response())
}
