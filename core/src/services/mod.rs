//! Resource services.
//!
//! Each service borrows the [`Client`](crate::Client), implements one
//! capability trait, and contributes only the path, query and payload of
//! each call. Code that depends on the traits can be handed a test double
//! instead of a networked client.

mod attachments;
mod comments;
mod group_users;
mod groups;
mod posts;
mod tags;
mod users;

pub use attachments::{AttachmentApi, Attachments, UploadFile};
pub use comments::{CommentApi, CommentCreateRequest, Comments};
pub use group_users::{GroupUserApi, GroupUsers};
pub use groups::{GroupApi, GroupCreateRequest, GroupListOptions, GroupUsersRequest, Groups};
pub use posts::{PostApi, PostCreateRequest, PostListOptions, PostUpdateRequest, Posts};
pub use tags::{TagApi, Tags};
pub use users::{UserApi, UserListOptions, Users};

/// Append `params` to `path` as a URL-encoded query string.
pub(crate) fn with_query(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(key, value)| (*key, value.as_str())))
        .finish();
    format!("{path}?{query}")
}

/// Push `page` and `per_page` when set.
pub(crate) fn push_paging(params: &mut Vec<(&str, String)>, page: Option<u32>, per_page: Option<u32>) {
    if let Some(page) = page {
        params.push(("page", page.to_string()));
    }
    if let Some(per_page) = per_page {
        params.push(("per_page", per_page.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_leaves_path_alone() {
        assert_eq!(with_query("/tags", &[]), "/tags");
    }

    #[test]
    fn query_values_are_encoded() {
        let path = with_query(
            "/posts",
            &[("q", "author:danny desc:score".to_string()), ("page", "2".to_string())],
        );
        assert_eq!(path, "/posts?q=author%3Adanny+desc%3Ascore&page=2");
    }

    #[test]
    fn paging_is_only_pushed_when_set() {
        let mut params = Vec::new();
        push_paging(&mut params, None, Some(5));
        assert_eq!(params, vec![("per_page", "5".to_string())]);
    }
}
