use crate::redirect::RedirectConfig;
use url::form_urlencoded;

/// Path of the public landing page, relative to the site base URL.
pub const LANDING_PATH: &str = "/u";

/// Builds the public landing URL carrying `config` as query parameters.
///
/// `title`, `desc` and `url` always come first. `image`, `keywords`,
/// `site_name` and `type` follow in that order, each only when set.
pub fn build_public_url(base_url: &str, config: &RedirectConfig) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("title", &config.title)
        .append_pair("desc", &config.description)
        .append_pair("url", &config.target_url);

    let optional = [
        ("image", config.image.as_deref()),
        ("keywords", config.keywords.as_deref()),
        ("site_name", config.site_name.as_deref()),
        ("type", config.page_type.as_ref().map(|t| t.as_str())),
    ];
    for (key, value) in optional {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            query.append_pair(key, value);
        }
    }

    format!(
        "{}{}?{}",
        base_url.trim_end_matches('/'),
        LANDING_PATH,
        query.finish()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::{PageType, RedirectId};
    use jiff::Timestamp;

    fn config(title: &str, description: &str, target_url: &str) -> RedirectConfig {
        let now = Timestamp::from_second(0).unwrap();
        RedirectConfig {
            id: RedirectId::new_unchecked("id"),
            title: title.into(),
            description: description.into(),
            target_url: target_url.into(),
            image: None,
            keywords: None,
            site_name: None,
            page_type: None,
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn required_fields_only() {
        let url = build_public_url("https://h", &config("A", "B", "https://x"));
        assert_eq!(url, "https://h/u?title=A&desc=B&url=https%3A%2F%2Fx");
    }

    #[test]
    fn optional_fields_in_fixed_order() {
        let mut c = config("A", "B", "https://x");
        c.page_type = Some(PageType::Product);
        c.site_name = Some("Shop".into());
        c.keywords = Some("k1,k2".into());
        c.image = Some("https://img/1.jpg".into());

        let url = build_public_url("https://h", &c);
        assert_eq!(
            url,
            "https://h/u?title=A&desc=B&url=https%3A%2F%2Fx\
             &image=https%3A%2F%2Fimg%2F1.jpg&keywords=k1%2Ck2&site_name=Shop&type=product"
        );
    }

    #[test]
    fn empty_optional_values_are_skipped() {
        let mut c = config("A", "B", "https://x");
        c.image = Some(String::new());
        c.site_name = Some("S".into());

        let url = build_public_url("https://h", &c);
        assert_eq!(url, "https://h/u?title=A&desc=B&url=https%3A%2F%2Fx&site_name=S");
    }

    #[test]
    fn spaces_and_reserved_characters_are_escaped() {
        let url = build_public_url(
            "https://h",
            &config("Hello World & more", "50% off", "https://x/?a=1&b=2"),
        );
        assert_eq!(
            url,
            "https://h/u?title=Hello+World+%26+more&desc=50%25+off\
             &url=https%3A%2F%2Fx%2F%3Fa%3D1%26b%3D2"
        );
    }

    #[test]
    fn trailing_slash_on_base_url_is_trimmed() {
        let c = config("A", "B", "https://x");
        assert_eq!(
            build_public_url("https://h/", &c),
            build_public_url("https://h", &c)
        );
    }

    #[test]
    fn output_is_deterministic() {
        let c = config("A", "B", "https://x");
        assert_eq!(build_public_url("https://h", &c), build_public_url("https://h", &c));
    }
}
