//! Builds delivery URLs for the hosted media CDN.
//!
//! Transformations are encoded as comma separated tokens in a fixed order:
//! size, crop, format, quality. Nothing here touches the network; a bad id
//! simply produces a URL the CDN answers with a 404.

use super::MediaKind;
use axum::http::HeaderMap;

pub const DEFAULT_DELIVERY_BASE: &str = "https://res.cloudinary.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionSpeed {
    #[default]
    Fast,
    Slow,
}

impl ConnectionSpeed {
    /// Reads the link speed hint a browser sends along with a page request.
    ///
    /// `ECT` of `2g`/`slow-2g` or `Save-Data: on` count as slow. Without any
    /// hint the connection is assumed to be fast.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ect = headers
            .get("ect")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.trim().to_ascii_lowercase());
        if let Some(ect) = ect {
            return Self::from_effective_type(&ect);
        }

        let save_data = headers
            .get("save-data")
            .and_then(|h| h.to_str().ok())
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("on"));
        if save_data {
            ConnectionSpeed::Slow
        } else {
            ConnectionSpeed::Fast
        }
    }

    pub fn from_effective_type(effective_type: &str) -> Self {
        match effective_type {
            "2g" | "slow-2g" => ConnectionSpeed::Slow,
            _ => ConnectionSpeed::Fast,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    /// Let the CDN pick, biased toward fidelity.
    AutoBest,
    /// Let the CDN pick, biased toward size.
    AutoGood,
    Auto,
    Fixed(u8),
}

impl Quality {
    fn token(&self) -> String {
        match self {
            Quality::AutoBest => "q_auto:best".to_string(),
            Quality::AutoGood => "q_auto:good".to_string(),
            Quality::Auto => "q_auto".to_string(),
            Quality::Fixed(q) => format!("q_{}", (*q).min(100)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crop {
    Fill,
    Limit,
    Fit,
    Thumb,
}

impl Crop {
    fn as_str(&self) -> &'static str {
        match self {
            Crop::Fill => "fill",
            Crop::Limit => "limit",
            Crop::Fit => "fit",
            Crop::Thumb => "thumb",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Auto,
    Jpg,
    Webp,
    Mp4,
}

impl Format {
    fn as_str(&self) -> &'static str {
        match self {
            Format::Auto => "auto",
            Format::Jpg => "jpg",
            Format::Webp => "webp",
            Format::Mp4 => "mp4",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<Quality>,
    pub format: Option<Format>,
    pub crop: Option<Crop>,
}

impl TransformOptions {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn crop(mut self, crop: Crop) -> Self {
        self.crop = Some(crop);
        self
    }
}

#[derive(Debug, Clone)]
pub struct UrlBuilder {
    delivery_base: String,
    cloud_name: String,
    speed: ConnectionSpeed,
}

impl UrlBuilder {
    pub fn new(cloud_name: impl Into<String>) -> Self {
        Self {
            delivery_base: DEFAULT_DELIVERY_BASE.to_string(),
            cloud_name: cloud_name.into(),
            speed: ConnectionSpeed::Fast,
        }
    }

    pub fn with_delivery_base(mut self, base: impl Into<String>) -> Self {
        self.delivery_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Pins the connection speed for one page load.
    pub fn with_speed(mut self, speed: ConnectionSpeed) -> Self {
        self.speed = speed;
        self
    }

    pub fn speed(&self) -> ConnectionSpeed {
        self.speed
    }

    pub fn default_quality(&self, eager: bool) -> Quality {
        match (self.speed, eager) {
            (ConnectionSpeed::Fast, true) => Quality::AutoBest,
            _ => Quality::AutoGood,
        }
    }

    pub fn build(&self, id: &str, kind: MediaKind, options: &TransformOptions) -> String {
        let tokens = self.tokens(options, self.default_quality(false));
        self.assemble(kind, &tokens, id, "")
    }

    /// Grid tile URL. Eager tiles (the first rows) get the better quality tier
    /// on a fast connection. Video tiles use the poster frame one second in.
    pub fn tile(&self, item_id: &str, kind: MediaKind, size: u32, eager: bool) -> String {
        let options = TransformOptions::sized(size, size)
            .crop(Crop::Fill)
            .format(Format::Auto)
            .quality(self.default_quality(eager));
        let tokens = self.tokens(&options, Quality::AutoGood);
        match kind {
            MediaKind::Image => self.assemble(kind, &tokens, item_id, ""),
            MediaKind::Video => {
                let tokens = format!("{}/so_1", tokens);
                self.assemble(kind, &tokens, item_id, ".jpg")
            }
        }
    }

    /// Large variant shown inside the lightbox.
    pub fn lightbox(&self, item_id: &str, kind: MediaKind) -> String {
        let quality = match kind {
            MediaKind::Image => Quality::AutoGood,
            MediaKind::Video => Quality::Auto,
        };
        let options = TransformOptions::sized(1400, 1000)
            .crop(Crop::Limit)
            .format(Format::Auto)
            .quality(quality);
        self.build(item_id, kind, &options)
    }

    /// Tiny blurred stand-in shown until the real asset has loaded.
    pub fn placeholder(&self, item_id: &str) -> String {
        let options = TransformOptions::sized(20, 20)
            .crop(Crop::Fill)
            .format(Format::Auto)
            .quality(Quality::Fixed(10));
        let tokens = format!("{},e_blur:1000", self.tokens(&options, Quality::Fixed(10)));
        self.assemble(MediaKind::Image, &tokens, item_id, "")
    }

    fn tokens(&self, options: &TransformOptions, default_quality: Quality) -> String {
        let mut tokens = Vec::with_capacity(5);

        if let Some(width) = options.width {
            tokens.push(format!("w_{}", width));
        }
        if let Some(height) = options.height {
            tokens.push(format!("h_{}", height));
        }
        // A crop mode means nothing without a target size
        if let Some(crop) = options.crop
            && (options.width.is_some() || options.height.is_some())
        {
            tokens.push(format!("c_{}", crop.as_str()));
        }
        tokens.push(format!(
            "f_{}",
            options.format.unwrap_or(Format::Auto).as_str()
        ));
        tokens.push(options.quality.unwrap_or(default_quality).token());

        tokens.join(",")
    }

    fn assemble(&self, kind: MediaKind, tokens: &str, id: &str, suffix: &str) -> String {
        format!(
            "{}/{}/{}/upload/{}/{}{}",
            self.delivery_base,
            self.cloud_name,
            kind.as_str(),
            tokens,
            id.trim_start_matches('/'),
            suffix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn builder() -> UrlBuilder {
        UrlBuilder::new("demo")
    }

    #[test]
    fn test_token_order_is_size_crop_format_quality() {
        let options = TransformOptions::default()
            .quality(Quality::Fixed(75))
            .crop(Crop::Fill)
            .format(Format::Webp)
            .height(300)
            .width(400);
        let url = builder().build("prenup/img_01", MediaKind::Image, &options);
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/w_400,h_300,c_fill,f_webp,q_75/prenup/img_01"
        );
    }

    #[test]
    fn test_crop_dropped_without_size() {
        let options = TransformOptions::default().crop(Crop::Fill);
        let url = builder().build("a", MediaKind::Image, &options);
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/f_auto,q_auto:good/a"
        );
    }

    #[test]
    fn test_quality_is_clamped() {
        let options = TransformOptions::default().quality(Quality::Fixed(250));
        let url = builder().build("a", MediaKind::Image, &options);
        assert!(url.contains("q_100"));
    }

    #[test]
    fn test_tile_quality_depends_on_speed() {
        let fast = builder();
        assert!(fast.tile("a", MediaKind::Image, 600, true).contains("q_auto:best"));
        assert!(fast.tile("a", MediaKind::Image, 600, false).contains("q_auto:good"));

        let slow = builder().with_speed(ConnectionSpeed::Slow);
        assert!(slow.tile("a", MediaKind::Image, 600, true).contains("q_auto:good"));
    }

    #[test]
    fn test_video_tile_uses_poster_frame() {
        let url = builder().tile("wedding-gallery/clip", MediaKind::Video, 600, false);
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/video/upload/w_600,h_600,c_fill,f_auto,q_auto:good/so_1/wedding-gallery/clip.jpg"
        );
    }

    #[test]
    fn test_placeholder_is_tiny_and_blurred() {
        let url = builder().placeholder("a");
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/w_20,h_20,c_fill,f_auto,q_10,e_blur:1000/a"
        );
    }

    #[test]
    fn test_speed_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(ConnectionSpeed::from_headers(&headers), ConnectionSpeed::Fast);

        headers.insert("ect", HeaderValue::from_static("slow-2g"));
        assert_eq!(ConnectionSpeed::from_headers(&headers), ConnectionSpeed::Slow);

        headers.insert("ect", HeaderValue::from_static("4g"));
        headers.insert("save-data", HeaderValue::from_static("on"));
        assert_eq!(ConnectionSpeed::from_headers(&headers), ConnectionSpeed::Fast);

        headers.remove("ect");
        assert_eq!(ConnectionSpeed::from_headers(&headers), ConnectionSpeed::Slow);
    }

    #[test]
    fn test_custom_delivery_base() {
        let url = UrlBuilder::new("demo")
            .with_delivery_base("http://localhost:9000/")
            .build("x", MediaKind::Image, &TransformOptions::default());
        assert!(url.starts_with("http://localhost:9000/demo/image/upload/"));
    }
}
