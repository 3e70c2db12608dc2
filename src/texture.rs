// texture.rs — texture ownership for the preview cube
//
// Each face owns at most one backend texture at a time. A rebind uploads
// the new image first and only then releases the previous handle, so a
// failed upload leaves the face exactly as it was.

use crate::geometry::{CubeFace, FaceMap};
use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("texture upload failed: {0}")]
    Upload(String),
}

/// Something that turns decoded pixels into texture handles.
pub trait TextureBackend {
    type Handle;

    fn upload(&mut self, image: &RgbaImage) -> Result<Self::Handle, TextureError>;

    fn release(&mut self, handle: Self::Handle);
}

/// Rejects images a backend can never upload.
pub fn validate_image(image: &RgbaImage) -> Result<(), TextureError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::EmptyImage { width, height });
    }
    Ok(())
}

/// Holds zero or one texture handle.
#[derive(Debug)]
pub struct TextureSlot<H> {
    handle: Option<H>,
}

impl<H> Default for TextureSlot<H> {
    fn default() -> Self {
        Self { handle: None }
    }
}

impl<H> TextureSlot<H> {
    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    pub fn rebind<B>(&mut self, backend: &mut B, image: &RgbaImage) -> Result<(), TextureError>
    where
        B: TextureBackend<Handle = H>,
    {
        validate_image(image)?;
        let fresh = backend.upload(image)?;
        if let Some(old) = self.handle.replace(fresh) {
            backend.release(old);
        }
        Ok(())
    }

    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: TextureBackend<Handle = H>,
    {
        if let Some(old) = self.handle.take() {
            backend.release(old);
        }
    }
}

/// Face textures plus the single panorama used in spherical mode.
#[derive(Debug)]
pub struct TextureBindings<H> {
    faces: FaceMap<TextureSlot<H>>,
    panorama: TextureSlot<H>,
}

impl<H> Default for TextureBindings<H> {
    fn default() -> Self {
        Self {
            faces: FaceMap::from_fn(|_| TextureSlot::default()),
            panorama: TextureSlot::default(),
        }
    }
}

impl<H> TextureBindings<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebind<B>(
        &mut self,
        backend: &mut B,
        face: CubeFace,
        image: &RgbaImage,
    ) -> Result<(), TextureError>
    where
        B: TextureBackend<Handle = H>,
    {
        self.faces[face].rebind(backend, image).map_err(|e| {
            log::error!("failed to bind texture for face {face}: {e}");
            e
        })?;
        log::debug!("bound {}x{} texture to face {face}", image.width(), image.height());
        Ok(())
    }

    pub fn rebind_panorama<B>(&mut self, backend: &mut B, image: &RgbaImage) -> Result<(), TextureError>
    where
        B: TextureBackend<Handle = H>,
    {
        self.panorama.rebind(backend, image).map_err(|e| {
            log::error!("failed to bind panorama texture: {e}");
            e
        })
    }

    pub fn handle(&self, face: CubeFace) -> Option<&H> {
        self.faces[face].handle()
    }

    pub fn panorama(&self) -> Option<&H> {
        self.panorama.handle()
    }

    pub fn clear_face<B>(&mut self, backend: &mut B, face: CubeFace)
    where
        B: TextureBackend<Handle = H>,
    {
        self.faces[face].clear(backend);
    }

    pub fn clear_panorama<B>(&mut self, backend: &mut B)
    where
        B: TextureBackend<Handle = H>,
    {
        self.panorama.clear(backend);
    }

    pub fn release_all<B>(&mut self, backend: &mut B)
    where
        B: TextureBackend<Handle = H>,
    {
        for (_, slot) in self.faces.iter_mut() {
            slot.clear(backend);
        }
        self.panorama.clear(backend);
    }

    pub fn bound_count(&self) -> usize {
        self.faces.iter().filter(|(_, s)| s.is_bound()).count() + usize::from(self.panorama.is_bound())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Hands out numbered handles and records every acquire and release.
    #[derive(Default)]
    struct CountingBackend {
        next: u32,
        acquired: u32,
        released: u32,
        live: HashSet<u32>,
        fail_next: bool,
    }

    impl TextureBackend for CountingBackend {
        type Handle = u32;

        fn upload(&mut self, _image: &RgbaImage) -> Result<u32, TextureError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(TextureError::Upload("out of memory".into()));
            }
            self.next += 1;
            self.acquired += 1;
            self.live.insert(self.next);
            Ok(self.next)
        }

        fn release(&mut self, handle: u32) {
            assert!(self.live.remove(&handle), "double release of {handle}");
            self.released += 1;
        }
    }

    fn image() -> RgbaImage {
        RgbaImage::new(4, 4)
    }

    #[test]
    fn test_rebind_twice_keeps_one_live_handle() {
        let mut backend = CountingBackend::default();
        let mut bindings = TextureBindings::new();

        bindings.rebind(&mut backend, CubeFace::Front, &image()).unwrap();
        bindings.rebind(&mut backend, CubeFace::Front, &image()).unwrap();

        assert_eq!(backend.acquired, 2);
        assert_eq!(backend.released, 1);
        assert_eq!(backend.live.len(), 1);
        assert_eq!(bindings.handle(CubeFace::Front), Some(&2));
        assert_eq!(bindings.bound_count(), 1);
    }

    #[test]
    fn test_failed_upload_keeps_previous_texture() {
        let mut backend = CountingBackend::default();
        let mut bindings = TextureBindings::new();
        bindings.rebind(&mut backend, CubeFace::Up, &image()).unwrap();

        backend.fail_next = true;
        let err = bindings.rebind(&mut backend, CubeFace::Up, &image());

        assert!(matches!(err, Err(TextureError::Upload(_))));
        assert_eq!(bindings.handle(CubeFace::Up), Some(&1));
        assert_eq!(backend.released, 0);
        assert_eq!(backend.live.len(), 1);
    }

    #[test]
    fn test_failed_first_upload_leaves_face_untextured() {
        let mut backend = CountingBackend {
            fail_next: true,
            ..Default::default()
        };
        let mut bindings: TextureBindings<u32> = TextureBindings::new();

        assert!(bindings.rebind(&mut backend, CubeFace::Down, &image()).is_err());
        assert_eq!(bindings.handle(CubeFace::Down), None);
        assert_eq!(bindings.bound_count(), 0);
    }

    #[test]
    fn test_empty_image_is_rejected_before_upload() {
        let mut backend = CountingBackend::default();
        let mut bindings: TextureBindings<u32> = TextureBindings::new();

        let err = bindings.rebind(&mut backend, CubeFace::Back, &RgbaImage::new(0, 512));
        assert!(matches!(err, Err(TextureError::EmptyImage { width: 0, height: 512 })));
        assert_eq!(backend.acquired, 0);
    }

    #[test]
    fn test_faces_are_independent() {
        let mut backend = CountingBackend::default();
        let mut bindings = TextureBindings::new();
        for face in CubeFace::ALL {
            bindings.rebind(&mut backend, face, &image()).unwrap();
        }
        bindings.rebind(&mut backend, CubeFace::Left, &image()).unwrap();

        assert_eq!(backend.live.len(), 6);
        assert_eq!(bindings.handle(CubeFace::Right), Some(&4));
        assert_eq!(bindings.handle(CubeFace::Left), Some(&7));
    }

    #[test]
    fn test_release_all_frees_every_handle() {
        let mut backend = CountingBackend::default();
        let mut bindings = TextureBindings::new();
        bindings.rebind(&mut backend, CubeFace::Front, &image()).unwrap();
        bindings.rebind(&mut backend, CubeFace::Right, &image()).unwrap();
        bindings.rebind_panorama(&mut backend, &image()).unwrap();
        bindings.rebind_panorama(&mut backend, &image()).unwrap();

        bindings.release_all(&mut backend);

        assert!(backend.live.is_empty());
        assert_eq!(backend.acquired, backend.released);
        assert_eq!(bindings.bound_count(), 0);
        assert_eq!(bindings.panorama(), None);
    }

    #[test]
    fn test_clear_face_releases_only_that_face() {
        let mut backend = CountingBackend::default();
        let mut bindings = TextureBindings::new();
        bindings.rebind(&mut backend, CubeFace::Front, &image()).unwrap();
        bindings.rebind(&mut backend, CubeFace::Back, &image()).unwrap();

        bindings.clear_face(&mut backend, CubeFace::Front);
        bindings.clear_face(&mut backend, CubeFace::Front);

        assert_eq!(backend.released, 1);
        assert_eq!(bindings.handle(CubeFace::Back), Some(&2));
    }

    #[test]
    fn test_clear_panorama_leaves_faces_bound() {
        let mut backend = CountingBackend::default();
        let mut bindings = TextureBindings::new();
        bindings.rebind(&mut backend, CubeFace::Up, &image()).unwrap();
        bindings.rebind_panorama(&mut backend, &image()).unwrap();

        bindings.clear_panorama(&mut backend);
        bindings.clear_panorama(&mut backend);

        assert!(bindings.panorama().is_none());
        assert_eq!(bindings.handle(CubeFace::Up), Some(&1));
        assert_eq!(backend.live.len(), 1);
        assert_eq!(bindings.bound_count(), 1);
    }
}
