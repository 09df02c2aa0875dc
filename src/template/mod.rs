//! Page templates, compiled from `templates/` by askama.
//!
//! Each page is a view model struct deriving [`Template`]; its fields are
//! the names the template file sees.

use askama::Template;

use crate::database::Post;

/// View model for `templates/home.html`.
#[derive(Debug, Clone, Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Every post, in store order.
    pub posts: Vec<Post>,
}

impl HomeTemplate {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64, title: &str, author: &str, content: &str) -> Post {
        Post {
            id,
            title: title.to_owned(),
            content: content.to_owned(),
            author: author.to_owned(),
        }
    }

    #[test]
    fn empty_listing() {
        let html = HomeTemplate::new(Vec::new()).render().unwrap();
        assert!(html.contains("No posts yet."));
        assert!(!html.contains("<article"));
    }

    #[test]
    fn posts_render_in_order() {
        let html = HomeTemplate::new(vec![
            post(1, "First", "ana", "one"),
            post(2, "Second", "bo", "two"),
        ])
        .render()
        .unwrap();

        assert!(html.find("First").unwrap() < html.find("Second").unwrap());
        assert_eq!(html.matches("<article").count(), 2);
        assert!(html.contains("by bo"));
        assert!(!html.contains("No posts yet."));
    }

    #[test]
    fn content_is_escaped() {
        let html = HomeTemplate::new(vec![post(1, "<script>", "a&b", "\"q\"")])
            .render()
            .unwrap();
        assert!(!html.contains("<script>"));
        assert!(!html.contains("a&b"));
        assert!(!html.contains("\"q\""));
    }
}
