use crate::config::SiteSettings;
use crate::presentation::views::{BrandView, LayoutChrome, PageMetaView};

/// Builds the layout shared by every page from the site settings.
#[derive(Clone)]
pub struct ChromeService {
    brand: BrandView,
    meta: PageMetaView,
}

impl ChromeService {
    pub fn new(site: &SiteSettings) -> Self {
        Self {
            brand: BrandView {
                title: site.title.clone(),
                href: "/".to_string(),
            },
            meta: PageMetaView {
                title: site.title.clone(),
                description: site.description.clone(),
                canonical: site.public_url.to_string(),
            },
        }
    }

    pub fn load(&self, preview_active: bool) -> LayoutChrome {
        LayoutChrome {
            brand: self.brand.clone(),
            meta: self.meta.clone(),
            preview_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    #[test]
    fn chrome_reflects_site_settings_and_preview_flag() {
        let chrome = ChromeService::new(&SiteSettings {
            title: "spacetraveling".to_string(),
            description: "Blog".to_string(),
            public_url: Url::parse("https://blog.example.com").expect("url"),
        });

        let layout = chrome.load(true);

        assert_eq!(layout.brand.href, "/");
        assert_eq!(layout.meta.title, "spacetraveling");
        assert_eq!(layout.meta.canonical, "https://blog.example.com/");
        assert!(layout.preview_active);
        assert!(!chrome.load(false).preview_active);
    }
}
