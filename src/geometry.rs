// geometry.rs — cube corners and the six named skybox faces

use glam::Vec3;

/// Half edge length of the preview cube.
pub const HALF_SIZE: f32 = 1.0;

/// The eight cube corners. Index layout:
/// `0(-,-,+) 1(+,-,+) 2(+,+,+) 3(-,+,+) 4(-,-,-) 5(+,-,-) 6(+,+,-) 7(-,+,-)`.
pub const CUBE_VERTICES: [Vec3; 8] = [
    Vec3::new(-HALF_SIZE, -HALF_SIZE, HALF_SIZE),
    Vec3::new(HALF_SIZE, -HALF_SIZE, HALF_SIZE),
    Vec3::new(HALF_SIZE, HALF_SIZE, HALF_SIZE),
    Vec3::new(-HALF_SIZE, HALF_SIZE, HALF_SIZE),
    Vec3::new(-HALF_SIZE, -HALF_SIZE, -HALF_SIZE),
    Vec3::new(HALF_SIZE, -HALF_SIZE, -HALF_SIZE),
    Vec3::new(HALF_SIZE, HALF_SIZE, -HALF_SIZE),
    Vec3::new(-HALF_SIZE, HALF_SIZE, -HALF_SIZE),
];

/// A skybox face, named the way Roblox names its `sky512_*` images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    Front = 0,
    Back = 1,
    Left = 2,
    Right = 3,
    Up = 4,
    Down = 5,
}

impl CubeFace {
    /// All six faces in file order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Front,
        CubeFace::Back,
        CubeFace::Left,
        CubeFace::Right,
        CubeFace::Up,
        CubeFace::Down,
    ];

    /// Short code used in skybox file names (`sky512_<code>.png`).
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            CubeFace::Front => "ft",
            CubeFace::Back => "bk",
            CubeFace::Left => "lf",
            CubeFace::Right => "rt",
            CubeFace::Up => "up",
            CubeFace::Down => "dn",
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<CubeFace> {
        CubeFace::ALL
            .into_iter()
            .find(|face| face.code().eq_ignore_ascii_case(code))
    }

    /// Corner indices into [`CUBE_VERTICES`], counter-clockwise seen from
    /// outside the cube.
    ///
    /// Roblox's "rt" image sits on the -X side and "lf" on +X.
    #[must_use]
    pub fn corner_indices(self) -> [usize; 4] {
        match self {
            CubeFace::Front => [0, 1, 2, 3],
            CubeFace::Back => [5, 4, 7, 6],
            CubeFace::Right => [4, 0, 3, 7],
            CubeFace::Left => [1, 5, 6, 2],
            CubeFace::Up => [3, 2, 6, 7],
            CubeFace::Down => [4, 5, 1, 0],
        }
    }

    /// Corner positions in boundary order.
    #[must_use]
    pub fn corners(self) -> [Vec3; 4] {
        self.corner_indices().map(|i| CUBE_VERTICES[i])
    }

    /// Unit normal pointing away from the cube center.
    #[must_use]
    pub fn outward_normal(self) -> Vec3 {
        match self {
            CubeFace::Front => Vec3::Z,
            CubeFace::Back => Vec3::NEG_Z,
            CubeFace::Left => Vec3::X,
            CubeFace::Right => Vec3::NEG_X,
            CubeFace::Up => Vec3::Y,
            CubeFace::Down => Vec3::NEG_Y,
        }
    }
}

impl std::fmt::Display for CubeFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Per-face storage, indexed by [`CubeFace`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceMap<T>([T; 6]);

impl<T> FaceMap<T> {
    pub fn from_fn(mut f: impl FnMut(CubeFace) -> T) -> Self {
        Self(CubeFace::ALL.map(&mut f))
    }

    /// Like [`Self::from_fn`], returning the first error in face order.
    pub fn try_from_fn<E>(mut f: impl FnMut(CubeFace) -> Result<T, E>) -> Result<Self, E> {
        let [a, b, c, d, e, g] = CubeFace::ALL.map(&mut f);
        Ok(Self([a?, b?, c?, d?, e?, g?]))
    }

    pub fn get(&self, face: CubeFace) -> &T {
        &self.0[face as usize]
    }

    pub fn get_mut(&mut self, face: CubeFace) -> &mut T {
        &mut self.0[face as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CubeFace, &T)> {
        CubeFace::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (CubeFace, &mut T)> {
        CubeFace::ALL.into_iter().zip(self.0.iter_mut())
    }
}

impl<T> std::ops::Index<CubeFace> for FaceMap<T> {
    type Output = T;

    fn index(&self, face: CubeFace) -> &T {
        self.get(face)
    }
}

impl<T> std::ops::IndexMut<CubeFace> for FaceMap<T> {
    fn index_mut(&mut self, face: CubeFace) -> &mut T {
        self.get_mut(face)
    }
}
