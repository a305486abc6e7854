use super::manager::{AssetLoader, AssetResolver, LoadError};
use crate::utils::Rgb;
use async_trait::async_trait;
use image::{Pixel, Rgba, RgbaImage};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Texture asset subfolders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureCategory {
    Skin,
    Eyes,
    Mouth,
    Face,
}

impl TextureCategory {
    pub fn folder(&self) -> &'static str {
        match self {
            TextureCategory::Skin => "skin",
            TextureCategory::Eyes => "eyes",
            TextureCategory::Mouth => "mouth",
            TextureCategory::Face => "face",
        }
    }
}

impl From<crate::world::avatar::FaceSlot> for TextureCategory {
    fn from(slot: crate::world::avatar::FaceSlot) -> Self {
        use crate::world::avatar::FaceSlot;
        match slot {
            FaceSlot::Eyes => TextureCategory::Eyes,
            FaceSlot::Mouth => TextureCategory::Mouth,
            FaceSlot::Face => TextureCategory::Face,
        }
    }
}

/// An RGBA8 pixel buffer used as a material map.
#[derive(Clone, PartialEq, Eq)]
pub struct CompositeTexture {
    image: RgbaImage,
}

impl fmt::Debug for CompositeTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeTexture")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl CompositeTexture {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Stand-in for "no texture": a single fully transparent pixel
    pub fn transparent() -> Self {
        Self::new(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }
}

/// Decodes image files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileLoader;

#[async_trait]
impl AssetLoader<RgbaImage> for ImageFileLoader {
    async fn load(&self, path: &Path) -> Result<RgbaImage, LoadError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| {
            error!("Failed to read texture: {:?}, error: {}", path, source);
            LoadError::Io { path: path.to_path_buf(), source }
        })?;

        match image::load_from_memory(&bytes) {
            Ok(img) => {
                info!("Loaded texture: {:?}", path);
                Ok(img.to_rgba8())
            }
            Err(source) => {
                error!("Failed to decode texture: {:?}, error: {}", path, source);
                Err(LoadError::Image { path: path.to_path_buf(), source })
            }
        }
    }
}

/// Builds the skin and face maps: loads texture layers, tints and stacks them.
#[derive(Clone)]
pub struct TextureCompositor {
    resolver: AssetResolver,
    loader: Arc<dyn AssetLoader<RgbaImage>>,
}

impl TextureCompositor {
    pub fn new(resolver: AssetResolver, loader: Arc<dyn AssetLoader<RgbaImage>>) -> Self {
        Self { resolver, loader }
    }

    /// Load `root/category/name.png`. An empty name yields a transparent
    /// placeholder rather than an error.
    pub async fn load(&self, name: &str, category: TextureCategory) -> Result<CompositeTexture, LoadError> {
        if name.is_empty() {
            debug!("No {} texture selected, using transparent placeholder", category.folder());
            return Ok(CompositeTexture::transparent());
        }
        let path = self.resolver.resolve(name, Some(category.folder()));
        let image = self.loader.load(&path).await?;
        Ok(CompositeTexture::new(image))
    }

    /// Paint every pixel that has any coverage with `color`, keeping its alpha.
    pub fn recolor(texture: &CompositeTexture, color: Rgb) -> CompositeTexture {
        let [r, g, b] = color.channels();
        let mut image = texture.image.clone();
        for px in image.pixels_mut() {
            if px[3] > 0 {
                px[0] = r;
                px[1] = g;
                px[2] = b;
            }
        }
        CompositeTexture::new(image)
    }

    /// Stack textures in order onto a canvas as large as the largest input.
    /// Every layer is drawn at the origin without scaling.
    pub fn composite<'a, I>(textures: I) -> CompositeTexture
    where
        I: IntoIterator<Item = &'a CompositeTexture>,
    {
        let layers: Vec<&CompositeTexture> = textures.into_iter().collect();
        let width = layers.iter().map(|t| t.width()).max().unwrap_or(0);
        let height = layers.iter().map(|t| t.height()).max().unwrap_or(0);

        let mut canvas = RgbaImage::new(width, height);
        for layer in &layers {
            for (x, y, src) in layer.image.enumerate_pixels() {
                match src[3] {
                    0 => {}
                    255 => canvas.put_pixel(x, y, *src),
                    _ => canvas.get_pixel_mut(x, y).blend(src),
                }
            }
        }
        CompositeTexture::new(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryImages {
        images: HashMap<PathBuf, RgbaImage>,
        requests: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl AssetLoader<RgbaImage> for MemoryImages {
        async fn load(&self, path: &Path) -> Result<RgbaImage, LoadError> {
            self.requests.lock().unwrap().push(path.to_path_buf());
            self.images
                .get(path)
                .cloned()
                .ok_or_else(|| LoadError::NotFound { path: path.to_path_buf() })
        }
    }

    fn solid(width: u32, height: u32, px: [u8; 4]) -> CompositeTexture {
        CompositeTexture::new(RgbaImage::from_pixel(width, height, Rgba(px)))
    }

    fn mixed_alpha() -> CompositeTexture {
        let mut image = RgbaImage::new(4, 1);
        image.put_pixel(0, 0, Rgba([10, 20, 30, 0]));
        image.put_pixel(1, 0, Rgba([10, 20, 30, 1]));
        image.put_pixel(2, 0, Rgba([200, 100, 50, 128]));
        image.put_pixel(3, 0, Rgba([1, 2, 3, 255]));
        CompositeTexture::new(image)
    }

    #[test]
    fn test_recolor_keeps_transparent_pixels() {
        let original = mixed_alpha();
        let once = TextureCompositor::recolor(&original, Rgb(0xff8000));
        let twice = TextureCompositor::recolor(&once, Rgb(0xff8000));

        assert_eq!(once.pixel(0, 0), [10, 20, 30, 0]);
        assert_eq!(twice.pixel(0, 0), [10, 20, 30, 0]);
        assert_eq!(once.pixel(1, 0), [0xff, 0x80, 0x00, 1]);
        assert_eq!(once.pixel(2, 0), [0xff, 0x80, 0x00, 128]);
        assert_eq!(once.pixel(3, 0), [0xff, 0x80, 0x00, 255]);
        // input untouched
        assert_eq!(original, mixed_alpha());
    }

    #[test]
    fn test_last_recolor_wins() {
        let original = mixed_alpha();
        let result = TextureCompositor::recolor(
            &TextureCompositor::recolor(&original, Rgb(0x112233)),
            Rgb(0xaabbcc),
        );
        for x in 1..4 {
            let px = result.pixel(x, 0);
            assert_eq!(&px[..3], &[0xaa, 0xbb, 0xcc]);
            assert_eq!(px[3], original.pixel(x, 0)[3]);
        }
    }

    #[test]
    fn test_composite_canvas_is_max_extent() {
        let a = solid(64, 64, [255, 0, 0, 255]);
        let b = solid(128, 32, [0, 255, 0, 255]);
        let out = TextureCompositor::composite([&a, &b]);
        assert_eq!((out.width(), out.height()), (128, 64));

        // b drawn over a at the origin, a visible below b, nothing to the right of a
        assert_eq!(out.pixel(0, 0), [0, 255, 0, 255]);
        assert_eq!(out.pixel(10, 40), [255, 0, 0, 255]);
        assert_eq!(out.pixel(100, 40), [0, 0, 0, 0]);
    }

    #[test]
    fn test_opaque_top_layer_occludes() {
        let a = mixed_alpha();
        let b = solid(4, 1, [9, 8, 7, 255]);
        let out = TextureCompositor::composite([&a, &b]);
        assert_eq!(out, b);
    }

    #[test]
    fn test_transparent_layer_is_noop() {
        let base = solid(8, 8, [40, 50, 60, 255]);
        let out = TextureCompositor::composite([&base, &CompositeTexture::transparent()]);
        assert_eq!(out, base);
    }

    #[test]
    fn test_composite_of_nothing_is_empty() {
        let out = TextureCompositor::composite(std::iter::empty());
        assert_eq!((out.width(), out.height()), (0, 0));
    }

    #[tokio::test]
    async fn test_load_resolves_category_folder() {
        let mut images = MemoryImages::default();
        images.images.insert(PathBuf::from("res/eyes/eyes_01.png"), RgbaImage::new(2, 2));
        let images = Arc::new(images);
        let compositor = TextureCompositor::new(AssetResolver::new("res", "png"), images.clone());

        let texture = compositor.load("eyes_01", TextureCategory::Eyes).await.unwrap();
        assert_eq!((texture.width(), texture.height()), (2, 2));
        assert_eq!(
            images.requests.lock().unwrap().as_slice(),
            &[PathBuf::from("res/eyes/eyes_01.png")]
        );
    }

    #[tokio::test]
    async fn test_empty_name_is_placeholder() {
        let images = Arc::new(MemoryImages::default());
        let compositor = TextureCompositor::new(AssetResolver::new("res", "png"), images.clone());

        let texture = compositor.load("", TextureCategory::Face).await.unwrap();
        assert_eq!(texture, CompositeTexture::transparent());
        assert!(images.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_texture_fails_with_path() {
        let compositor = TextureCompositor::new(
            AssetResolver::new("res", "png"),
            Arc::new(MemoryImages::default()),
        );
        let err = compositor.load("mouth_09", TextureCategory::Mouth).await.unwrap_err();
        assert_eq!(err.path(), Path::new("res/mouth/mouth_09.png"));
    }

    #[tokio::test]
    async fn test_file_loader_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skin.png");
        RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255])).save(&path).unwrap();

        let image = ImageFileLoader.load(&path).await.unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [1, 2, 3, 255]);
    }

    #[tokio::test]
    async fn test_file_loader_reports_io_and_decode_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.png");
        assert!(matches!(ImageFileLoader.load(&missing).await, Err(LoadError::Io { .. })));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        assert!(matches!(ImageFileLoader.load(&garbage).await, Err(LoadError::Image { .. })));
    }
}
