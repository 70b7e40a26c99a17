use serde_json::{Map, Value};

use crate::features::images::models::ImageRecord;
use crate::features::plans::models::{PlanTier, ThumbnailSize};

/// View Materializer: computes the plan-gated response fields for an image.
///
/// Pure and idempotent. Field order is contractual: `name`, one thumbnail
/// field per size in the plan's iteration order, then `image_url` and
/// `create_expiring_link` when the plan's flags permit.
pub struct ViewService {
    base_url: String,
}

impl ViewService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn render(&self, image: &ImageRecord, plan: &PlanTier) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::String(image.name.clone()));

        for size in &plan.thumbnail_sizes {
            fields.insert(
                thumbnail_field_key(size),
                Value::String(self.media_url(&thumbnail_rel_path(&image.file_path, size))),
            );
        }

        if plan.show_original_link {
            fields.insert(
                "image_url".to_string(),
                Value::String(self.media_url(&image.file_path)),
            );
        }

        if plan.create_expiring_link {
            fields.insert(
                "create_expiring_link".to_string(),
                Value::String(format!("{}/make_temp/{}/", self.base_url, image.id)),
            );
        }

        fields
    }

    fn media_url(&self, rel: &str) -> String {
        format!("{}/media/{}", self.base_url, rel)
    }
}

/// Field key for a thumbnail view, derived from the size's dimensions
fn thumbnail_field_key(size: &ThumbnailSize) -> String {
    format!("thumbnail_{}x{}_url", size.height, size.width)
}

/// Media path of the thumbnail derived from `file_path`: the size suffix
/// `{width}x{height}` slots in before the extension
pub fn thumbnail_rel_path(file_path: &str, size: &ThumbnailSize) -> String {
    match file_path.rsplit_once('.') {
        Some((stem, ext)) => format!("{}.{}x{}.{}", stem, size.width, size.height, ext),
        None => format!("{}.{}x{}", file_path, size.width, size.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const BASE: &str = "http://testserver";

    fn image(name: &str, file_path: &str) -> ImageRecord {
        ImageRecord::new("test".to_string(), name.to_string(), file_path.to_string())
    }

    fn plan(sizes: Vec<(i32, i32)>, original: bool, expiring: bool) -> PlanTier {
        PlanTier {
            name: "Custom".to_string(),
            thumbnail_sizes: sizes
                .into_iter()
                .map(|(h, w)| ThumbnailSize::new(h, w))
                .collect(),
            show_original_link: original,
            create_expiring_link: expiring,
        }
    }

    #[test]
    fn name_is_always_present() {
        let view = ViewService::new(BASE).render(
            &image("macara", "user_test/macara.jpg"),
            &plan(vec![], false, false),
        );

        assert_eq!(view.len(), 1);
        assert_eq!(view["name"], "macara");
    }

    #[test]
    fn thumbnail_only_plan_renders_two_fields() {
        // Plan {sizes: [{height 0, width 50}], no original, no expiring link}
        let view = ViewService::new(BASE).render(
            &image("macara", "user_test/macara.jpg"),
            &plan(vec![(0, 50)], false, false),
        );

        assert_eq!(view.len(), 2);
        assert_eq!(view["name"], "macara");
        let url = view["thumbnail_0x50_url"].as_str().unwrap();
        assert!(url.contains("user_test/macara.50x0.jpg"));
    }

    #[test]
    fn original_only_plan_renders_two_fields() {
        let view = ViewService::new(BASE).render(
            &image("macara", "user_test/macara.jpg"),
            &plan(vec![], true, false),
        );

        assert_eq!(view.len(), 2);
        assert_eq!(view["name"], "macara");
        assert_eq!(
            view["image_url"],
            format!("{}/media/user_test/macara.jpg", BASE)
        );
    }

    #[test]
    fn full_plan_field_order_is_stable() {
        let service = ViewService::new(BASE);
        let img = image("macara", "user_test/macara.jpg");
        let full = plan(vec![(200, 0), (400, 0)], true, true);

        let view = service.render(&img, &full);
        let keys: Vec<&str> = view.keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "thumbnail_200x0_url",
                "thumbnail_400x0_url",
                "image_url",
                "create_expiring_link",
            ]
        );

        // Idempotent: a repeated render yields the same mapping
        assert_eq!(view, service.render(&img, &full));
    }

    #[test]
    fn expiring_link_field_points_at_the_issue_endpoint() {
        let img = image("macara", "user_test/macara.jpg");
        let view = ViewService::new(BASE).render(&img, &plan(vec![], false, true));

        assert_eq!(
            view["create_expiring_link"],
            format!("{}/make_temp/{}/", BASE, img.id)
        );
    }

    #[test]
    fn field_count_matches_plan_configuration() {
        let img = image("macara", "user_test/macara.jpg");
        for (sizes, original, expiring, expected) in [
            (vec![], false, false, 1),
            (vec![(200, 0)], false, false, 2),
            (vec![(200, 0), (400, 0)], true, false, 4),
            (vec![(200, 0), (400, 0)], true, true, 5),
        ] {
            let view = ViewService::new(BASE).render(&img, &plan(sizes, original, expiring));
            assert_eq!(view.len(), expected);
        }
    }

    #[test]
    fn thumbnail_rel_path_handles_missing_extension() {
        let size = ThumbnailSize::new(200, 0);
        assert_eq!(
            thumbnail_rel_path("user_test/odd", &size),
            "user_test/odd.0x200"
        );
        assert_eq!(
            thumbnail_rel_path("user_test/pic.png", &size),
            "user_test/pic.0x200.png"
        );
    }

    #[test]
    fn duplicate_uuid_in_sizes_is_irrelevant_to_keys() {
        // Two size records with equal dimensions produce one field; identity
        // by dimensions is not required to be unique
        let view = ViewService::new(BASE).render(
            &image("macara", "user_test/macara.jpg"),
            &plan(vec![(200, 0), (200, 0)], false, false),
        );
        assert_eq!(view.len(), 2);
    }
}
