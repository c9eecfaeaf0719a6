use crate::redirect::{PageType, RedirectConfig, RedirectId};
use jiff::Timestamp;

struct Sample {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    image: &'static str,
    target_url: &'static str,
    keywords: &'static str,
    site_name: &'static str,
    page_type: PageType,
    created_at: Timestamp,
}

// 2024-01-15, 2024-01-10 and 2024-01-05 at midnight UTC.
const SAMPLES: [Sample; 3] = [
    Sample {
        id: "sample-product-1",
        title: "Premium Leather Wallet - Handcrafted Excellence",
        description: "Discover our premium handcrafted leather wallet made from full-grain leather. Perfect for the modern professional.",
        image: "https://images.pexels.com/photos/1152077/pexels-photo-1152077.jpeg",
        target_url: "https://example.com/products/leather-wallet",
        keywords: "leather wallet, premium wallet, handcrafted leather",
        site_name: "Premium Goods Store",
        page_type: PageType::Product,
        created_at: Timestamp::constant(1_705_276_800, 0),
    },
    Sample {
        id: "sample-service-1",
        title: "Expert Web Design Services - Transform Your Online Presence",
        description: "Professional web design services that transform your business. Custom designs, responsive layouts, and modern aesthetics.",
        image: "https://images.pexels.com/photos/196644/pexels-photo-196644.jpeg",
        target_url: "https://example.com/services/web-design",
        keywords: "web design, website design, responsive design, UI/UX",
        site_name: "Digital Agency Pro",
        page_type: PageType::Service,
        created_at: Timestamp::constant(1_704_844_800, 0),
    },
    Sample {
        id: "sample-article-1",
        title: "10 Essential Tips for Effective Digital Marketing",
        description: "Master digital marketing with these proven strategies. Learn SEO, social media marketing, and content creation techniques.",
        image: "https://images.pexels.com/photos/270408/pexels-photo-270408.jpeg",
        target_url: "https://example.com/blog/digital-marketing-tips",
        keywords: "digital marketing, SEO, social media marketing, content marketing",
        site_name: "Marketing Insights Blog",
        page_type: PageType::Article,
        created_at: Timestamp::constant(1_704_412_800, 0),
    },
];

/// Demo records for seeding a local store, newest first.
pub fn samples() -> Vec<RedirectConfig> {
    SAMPLES
        .iter()
        .map(|s| RedirectConfig {
            id: RedirectId::new_unchecked(s.id),
            title: s.title.to_owned(),
            description: s.description.to_owned(),
            target_url: s.target_url.to_owned(),
            image: Some(s.image.to_owned()),
            keywords: Some(s.keywords.to_owned()),
            site_name: Some(s.site_name.to_owned()),
            page_type: Some(s.page_type),
            owner_id: None,
            created_at: s.created_at,
            updated_at: s.created_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sort_newest_first;

    #[test]
    fn samples_are_valid_and_sorted() {
        let records = samples();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].created_at.to_string(), "2024-01-15T00:00:00Z");

        let mut sorted = records.clone();
        sort_newest_first(&mut sorted);
        assert_eq!(sorted, records);
    }
}
