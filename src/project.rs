// project.rs — skybox authoring: collecting face images and writing a Roblox skybox folder
//
// Every image is normalized to `FACE_SIZE` square on import. The Up face
// needs a quarter turn to line up with the side faces in Roblox, so it is
// turned on import and again when the folder is written.

use crate::geometry::{CubeFace, FaceMap};
use crate::projection::ProjectionMode;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};

pub const FACE_SIZE: u32 = 512;

/// Counter-clockwise rotation, in degrees, applied to the Up face.
pub const UP_ROTATION: u16 = 270;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("skybox title is empty")]
    EmptyTitle,

    #[error("skybox title {0:?} is not a plain folder name")]
    InvalidTitle(String),

    #[error("output folder {} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("face '{0}' has no image")]
    MissingFace(CubeFace),

    #[error("no stretch image loaded")]
    MissingStretch,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Where the preview's pixels come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    #[default]
    SixFaces,
    Stretch,
}

impl SourceMode {
    pub fn default_projection(self) -> ProjectionMode {
        match self {
            SourceMode::SixFaces => ProjectionMode::Flat,
            SourceMode::Stretch => ProjectionMode::Spherical,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: RgbaImage,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SkyboxProject {
    pub mode: SourceMode,
    faces: FaceMap<Option<SourceImage>>,
    rotations: FaceMap<u16>,
    stretch: Option<SourceImage>,
}

impl Default for SkyboxProject {
    fn default() -> Self {
        Self::new()
    }
}

fn initial_rotation(face: CubeFace) -> u16 {
    if face == CubeFace::Up {
        UP_ROTATION
    } else {
        0
    }
}

/// Rotates counter-clockwise by `degrees`, a multiple of 90.
fn rotate_ccw(image: &RgbaImage, degrees: u16) -> RgbaImage {
    match degrees % 360 {
        90 => imageops::rotate270(image),
        180 => imageops::rotate180(image),
        270 => imageops::rotate90(image),
        _ => image.clone(),
    }
}

fn normalize(image: DynamicImage) -> RgbaImage {
    if image.width() == FACE_SIZE && image.height() == FACE_SIZE {
        image.to_rgba8()
    } else {
        image
            .resize_exact(FACE_SIZE, FACE_SIZE, FilterType::Lanczos3)
            .to_rgba8()
    }
}

/// Decodes by content, so `.tex` files (PNG data) load like any image.
pub fn load_image(path: &Path) -> Result<DynamicImage, ProjectError> {
    let image_err = |source| ProjectError::Image {
        path: path.to_path_buf(),
        source,
    };
    image::io::Reader::open(path)
        .map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .with_guessed_format()
        .map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .decode()
        .map_err(image_err)
}

/// The face a file name belongs to: names ending in `<code>.png`,
/// case-insensitive, such as `sky512_ft.png`.
pub fn face_for_file_name(name: &str) -> Option<CubeFace> {
    let name = name.to_lowercase();
    CubeFace::ALL
        .into_iter()
        .find(|face| name.ends_with(&format!("{}.png", face.code())))
}

impl SkyboxProject {
    pub fn new() -> Self {
        Self {
            mode: SourceMode::SixFaces,
            faces: FaceMap::default(),
            rotations: FaceMap::from_fn(initial_rotation),
            stretch: None,
        }
    }

    pub fn face(&self, face: CubeFace) -> Option<&SourceImage> {
        self.faces[face].as_ref()
    }

    pub fn face_image(&self, face: CubeFace) -> Option<&RgbaImage> {
        self.face(face).map(|f| &f.image)
    }

    /// Current rotation label of a face, in degrees.
    pub fn rotation(&self, face: CubeFace) -> u16 {
        self.rotations[face]
    }

    pub fn stretch(&self) -> Option<&SourceImage> {
        self.stretch.as_ref()
    }

    pub fn stretch_image(&self) -> Option<&RgbaImage> {
        self.stretch.as_ref().map(|s| &s.image)
    }

    pub fn missing_faces(&self) -> Vec<CubeFace> {
        self.faces
            .iter()
            .filter(|(_, f)| f.is_none())
            .map(|(face, _)| face)
            .collect()
    }

    pub fn import_face(&mut self, face: CubeFace, path: &Path) -> Result<&RgbaImage, ProjectError> {
        let decoded = load_image(path)?;
        log::info!(
            "importing {} as face {face} ({}x{})",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        Ok(self.store_face(face, decoded, Some(path.to_path_buf())))
    }

    /// Stores an already decoded image, e.g. one loaded off the UI thread.
    pub fn set_face_image(
        &mut self,
        face: CubeFace,
        image: DynamicImage,
        path: Option<PathBuf>,
    ) -> &RgbaImage {
        self.store_face(face, image, path)
    }

    fn store_face(&mut self, face: CubeFace, image: DynamicImage, path: Option<PathBuf>) -> &RgbaImage {
        let rotation = initial_rotation(face);
        let image = rotate_ccw(&normalize(image), rotation);
        self.rotations[face] = rotation;
        &self.faces[face].insert(SourceImage { image, path }).image
    }

    /// Quarter turn clockwise. Returns the new image, or `None` if the
    /// face is empty.
    pub fn rotate_face(&mut self, face: CubeFace) -> Option<&RgbaImage> {
        let slot = self.faces[face].as_mut()?;
        slot.image = imageops::rotate90(&slot.image);
        self.rotations[face] = (self.rotations[face] + 270) % 360;
        Some(&slot.image)
    }

    /// Mirror left to right.
    pub fn flip_face(&mut self, face: CubeFace) -> Option<&RgbaImage> {
        let slot = self.faces[face].as_mut()?;
        imageops::flip_horizontal_in_place(&mut slot.image);
        Some(&slot.image)
    }

    pub fn clear_face(&mut self, face: CubeFace) {
        self.faces[face] = None;
        self.rotations[face] = initial_rotation(face);
    }

    pub fn import_stretch(&mut self, path: &Path) -> Result<&RgbaImage, ProjectError> {
        let decoded = load_image(path)?;
        log::info!("importing stretch image {}", path.display());
        let stored = self.stretch.insert(SourceImage {
            image: normalize(decoded),
            path: Some(path.to_path_buf()),
        });
        Ok(&stored.image)
    }

    pub fn set_stretch_image(&mut self, image: DynamicImage, path: Option<PathBuf>) -> &RgbaImage {
        &self
            .stretch
            .insert(SourceImage {
                image: normalize(image),
                path,
            })
            .image
    }

    pub fn rotate_stretch(&mut self) -> Option<&RgbaImage> {
        let slot = self.stretch.as_mut()?;
        slot.image = imageops::rotate90(&slot.image);
        Some(&slot.image)
    }

    pub fn flip_stretch(&mut self) -> Option<&RgbaImage> {
        let slot = self.stretch.as_mut()?;
        imageops::flip_horizontal_in_place(&mut slot.image);
        Some(&slot.image)
    }

    /// Imports every file in `dir` that [`face_for_file_name`] matches.
    /// Returns the faces that were filled, in face order. Either every
    /// matched file is imported or, on the first failure, none is.
    pub fn bulk_import(&mut self, dir: &Path) -> Result<Vec<CubeFace>, ProjectError> {
        let io_err = |source| ProjectError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        // decode everything before touching any face, so a bad file
        // leaves the project unchanged
        let mut decoded = Vec::new();
        for path in paths {
            let Some(face) = path
                .file_name()
                .and_then(|n| face_for_file_name(&n.to_string_lossy()))
            else {
                continue;
            };
            let image = load_image(&path)?;
            decoded.push((face, image, path));
        }

        let mut imported = Vec::with_capacity(decoded.len());
        for (face, image, path) in decoded {
            self.store_face(face, image, Some(path));
            imported.push(face);
        }

        imported.sort();
        imported.dedup();
        log::info!("bulk import from {} filled {} face(s)", dir.display(), imported.len());
        Ok(imported)
    }

    /// Writes `<root>/<title>/sky512_<code>.png` and `.tex` for all faces.
    pub fn export(&self, root: &Path, title: &str, overwrite: bool) -> Result<PathBuf, ProjectError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ProjectError::EmptyTitle);
        }
        if title == "." || title == ".." || title.contains(['/', '\\']) {
            return Err(ProjectError::InvalidTitle(title.to_string()));
        }

        let images = self.export_images()?;

        let output = root.join(title);
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ProjectError::Io { path, source }
        };
        if output.exists() {
            if !overwrite {
                return Err(ProjectError::OutputExists(output));
            }
            log::warn!("overwriting existing skybox folder {}", output.display());
            std::fs::remove_dir_all(&output).map_err(io_err(&output))?;
        }
        std::fs::create_dir_all(&output).map_err(io_err(&output))?;

        for (face, image) in images.iter() {
            for ext in ["png", "tex"] {
                let path = output.join(format!("sky512_{}.{ext}", face.code()));
                image
                    .save_with_format(&path, ImageFormat::Png)
                    .map_err(|source| ProjectError::Image {
                        path: path.clone(),
                        source,
                    })?;
            }
        }

        log::info!("skybox '{title}' written to {}", output.display());
        Ok(output)
    }

    /// The six images as they are written to disk.
    pub fn export_images(&self) -> Result<FaceMap<RgbaImage>, ProjectError> {
        let source = |face: CubeFace| -> Result<&RgbaImage, ProjectError> {
            match self.mode {
                SourceMode::SixFaces => self.face_image(face).ok_or(ProjectError::MissingFace(face)),
                SourceMode::Stretch => self.stretch_image().ok_or(ProjectError::MissingStretch),
            }
        };

        FaceMap::try_from_fn(|face| {
            let image = source(face)?;
            Ok(if face == CubeFace::Up {
                rotate_ccw(image, UP_ROTATION)
            } else {
                image.clone()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// Solid image with a red top-left pixel.
    fn marked(size: u32) -> DynamicImage {
        let mut img = RgbaImage::from_pixel(size, size, Rgba([0, 0, 255, 255]));
        img.put_pixel(0, 0, RED);
        DynamicImage::ImageRgba8(img)
    }

    fn full_project() -> SkyboxProject {
        let mut project = SkyboxProject::new();
        for face in CubeFace::ALL {
            project.set_face_image(face, marked(FACE_SIZE), None);
        }
        project
    }

    #[test]
    fn test_import_resizes_to_face_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("front.jpg.png");
        RgbaImage::new(64, 32).save(&path).unwrap();

        let mut project = SkyboxProject::new();
        let img = project.import_face(CubeFace::Front, &path).unwrap();
        assert_eq!(img.dimensions(), (FACE_SIZE, FACE_SIZE));
        assert_eq!(project.face(CubeFace::Front).unwrap().path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_tex_files_decode_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sky512_bk.tex");
        RgbaImage::new(8, 8)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let mut project = SkyboxProject::new();
        assert!(project.import_face(CubeFace::Back, &path).is_ok());
    }

    #[test]
    fn test_import_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = SkyboxProject::new();
        let err = project.import_face(CubeFace::Down, &dir.path().join("none.png"));
        assert!(matches!(err, Err(ProjectError::Io { .. })));
        assert!(project.face(CubeFace::Down).is_none());
    }

    #[test]
    fn test_up_face_turned_on_import() {
        let mut project = SkyboxProject::new();
        assert_eq!(project.rotation(CubeFace::Up), UP_ROTATION);

        let img = project.set_face_image(CubeFace::Up, marked(FACE_SIZE), None);
        // 270 counter-clockwise moves the top-left corner to the top-right
        assert_eq!(*img.get_pixel(FACE_SIZE - 1, 0), RED);
        assert_eq!(project.rotation(CubeFace::Up), UP_ROTATION);

        let img = project.set_face_image(CubeFace::Front, marked(FACE_SIZE), None);
        assert_eq!(*img.get_pixel(0, 0), RED);
        assert_eq!(project.rotation(CubeFace::Front), 0);
    }

    #[test]
    fn test_rotate_face_is_clockwise_and_tracks_label() {
        let mut project = SkyboxProject::new();
        assert!(project.rotate_face(CubeFace::Left).is_none());

        project.set_face_image(CubeFace::Left, marked(FACE_SIZE), None);
        let img = project.rotate_face(CubeFace::Left).unwrap();
        assert_eq!(*img.get_pixel(FACE_SIZE - 1, 0), RED);
        assert_eq!(project.rotation(CubeFace::Left), 270);

        for _ in 0..3 {
            project.rotate_face(CubeFace::Left);
        }
        assert_eq!(project.rotation(CubeFace::Left), 0);
        assert_eq!(*project.face_image(CubeFace::Left).unwrap().get_pixel(0, 0), RED);
    }

    #[test]
    fn test_flip_mirrors_horizontally() {
        let mut project = SkyboxProject::new();
        project.set_face_image(CubeFace::Right, marked(FACE_SIZE), None);
        let img = project.flip_face(CubeFace::Right).unwrap();
        assert_eq!(*img.get_pixel(FACE_SIZE - 1, 0), RED);
        assert_ne!(*img.get_pixel(0, 0), RED);
    }

    #[test]
    fn test_stretch_transforms() {
        let mut project = SkyboxProject::new();
        assert!(project.rotate_stretch().is_none());
        project.set_stretch_image(marked(100), None);
        assert_eq!(project.stretch_image().unwrap().dimensions(), (FACE_SIZE, FACE_SIZE));

        project.set_stretch_image(marked(FACE_SIZE), None);
        project.flip_stretch();
        project.rotate_stretch();
        // flip puts red top-right, clockwise turn moves it bottom-right
        let img = project.stretch_image().unwrap();
        assert_eq!(*img.get_pixel(FACE_SIZE - 1, FACE_SIZE - 1), RED);
    }

    #[test]
    fn test_bulk_import_matches_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["sky512_ft.png", "SKY512_UP.PNG", "sky512_dn.jpg", "notes.txt"] {
            RgbaImage::new(4, 4)
                .save_with_format(dir.path().join(name), ImageFormat::Png)
                .unwrap();
        }
        std::fs::create_dir(dir.path().join("sub_bk.png")).unwrap();

        let mut project = SkyboxProject::new();
        let faces = project.bulk_import(dir.path()).unwrap();
        assert_eq!(faces, vec![CubeFace::Front, CubeFace::Up]);
        assert!(project.face(CubeFace::Down).is_none());
        assert!(project.face(CubeFace::Back).is_none());
    }

    #[test]
    fn test_bulk_import_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::new(4, 4)
            .save_with_format(dir.path().join("sky512_bk.png"), ImageFormat::Png)
            .unwrap();
        std::fs::write(dir.path().join("sky512_ft.png"), b"not a png").unwrap();

        let mut project = SkyboxProject::new();
        project.set_face_image(CubeFace::Front, marked(FACE_SIZE), None);
        let err = project.bulk_import(dir.path());
        assert!(matches!(err, Err(ProjectError::Image { .. })));
        assert!(project.face(CubeFace::Back).is_none());
        // the face that was already loaded is untouched
        assert_eq!(*project.face_image(CubeFace::Front).unwrap().get_pixel(0, 0), RED);
    }

    #[test]
    fn test_import_stretch_normalizes_and_keeps_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panorama.png");
        RgbaImage::new(200, 100).save(&path).unwrap();

        let mut project = SkyboxProject::new();
        let img = project.import_stretch(&path).unwrap();
        assert_eq!(img.dimensions(), (FACE_SIZE, FACE_SIZE));
        assert_eq!(project.stretch().unwrap().path.as_deref(), Some(path.as_path()));

        let missing = dir.path().join("gone.png");
        assert!(matches!(project.import_stretch(&missing), Err(ProjectError::Io { .. })));
        assert!(project.stretch().is_some());
    }

    #[test]
    fn test_face_for_file_name() {
        assert_eq!(face_for_file_name("sky512_LF.png"), Some(CubeFace::Left));
        assert_eq!(face_for_file_name("clouds_dn.PNG"), Some(CubeFace::Down));
        assert_eq!(face_for_file_name("sky512_ft.jpg"), None);
        assert_eq!(face_for_file_name("ft.png.bak"), None);
    }

    #[test]
    fn test_export_writes_png_and_tex_per_face() {
        let root = tempfile::tempdir().unwrap();
        let out = full_project().export(root.path(), "  Night Sky ", false).unwrap();
        assert_eq!(out, root.path().join("Night Sky"));

        for face in CubeFace::ALL {
            for ext in ["png", "tex"] {
                let path = out.join(format!("sky512_{}.{ext}", face.code()));
                let img = image::io::Reader::open(&path)
                    .unwrap()
                    .with_guessed_format()
                    .unwrap()
                    .decode()
                    .unwrap();
                assert_eq!((img.width(), img.height()), (FACE_SIZE, FACE_SIZE));
            }
        }
    }

    #[test]
    fn test_export_turns_up_face_again() {
        let project = full_project();
        let images = project.export_images().unwrap();
        // stored Up already has red top-right; a second 270 turn moves it bottom-right
        assert_eq!(*images[CubeFace::Up].get_pixel(FACE_SIZE - 1, FACE_SIZE - 1), RED);
        assert_eq!(*images[CubeFace::Front].get_pixel(0, 0), RED);
    }

    #[test]
    fn test_export_requires_every_face() {
        let root = tempfile::tempdir().unwrap();
        let mut project = full_project();
        project.clear_face(CubeFace::Back);
        assert_eq!(project.missing_faces(), vec![CubeFace::Back]);

        let err = project.export(root.path(), "sky", false);
        assert!(matches!(err, Err(ProjectError::MissingFace(CubeFace::Back))));
        assert!(!root.path().join("sky").exists());
    }

    #[test]
    fn test_stretch_mode_uses_stretch_for_all_faces() {
        let mut project = SkyboxProject::new();
        project.mode = SourceMode::Stretch;
        assert!(matches!(project.export_images(), Err(ProjectError::MissingStretch)));

        project.set_stretch_image(marked(FACE_SIZE), None);
        let images = project.export_images().unwrap();
        assert_eq!(*images[CubeFace::Down].get_pixel(0, 0), RED);
        assert_eq!(SourceMode::Stretch.default_projection(), ProjectionMode::Spherical);
    }

    #[test]
    fn test_existing_folder_needs_overwrite() {
        let root = tempfile::tempdir().unwrap();
        let stale = root.path().join("sky").join("stale.txt");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        let project = full_project();
        assert!(matches!(
            project.export(root.path(), "sky", false),
            Err(ProjectError::OutputExists(_))
        ));
        project.export(root.path(), "sky", true).unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn test_title_validation() {
        let root = tempfile::tempdir().unwrap();
        let project = full_project();
        assert!(matches!(project.export(root.path(), "   ", false), Err(ProjectError::EmptyTitle)));
        assert!(matches!(
            project.export(root.path(), "../escape", false),
            Err(ProjectError::InvalidTitle(_))
        ));
    }
}
