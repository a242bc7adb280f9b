//! The seven tetromino kinds, their canonical occupancy matrices and the
//! generators that pick which kind comes next.

use core::mem::replace;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
};

use crate::config::PIECE_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PieceKind {
    I = 0,
    O = 1,
    T = 2,
    S = 3,
    Z = 4,
    J = 5,
    L = 6,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Maps `0..7` onto a kind; anything larger wraps around.
    pub const fn from_index(i: usize) -> Self {
        Self::ALL[i % Self::ALL.len()]
    }

    /// Board tag of a cell holding this kind. `0` is reserved for empty.
    pub const fn tag(self) -> u8 {
        self as u8 + 1
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1..=7 => Some(Self::ALL[tag as usize - 1]),
            _ => None,
        }
    }

    /// A fresh copy of the canonical occupancy matrix.
    pub const fn shape(self) -> Shape {
        SHAPES[self as usize]
    }

    pub fn color(self) -> Rgb565 {
        match self {
            PieceKind::I => Rgb565::CYAN,
            PieceKind::O => Rgb565::YELLOW,
            PieceKind::T => Rgb565::CSS_PURPLE,
            PieceKind::S => Rgb565::GREEN,
            PieceKind::Z => Rgb565::RED,
            PieceKind::J => Rgb565::BLUE,
            PieceKind::L => Rgb565::CSS_ORANGE,
        }
    }
}

// ── Occupancy matrices ──────────────────────────────────────────────────────

/// 4×4 occupancy matrix, indexed `[row][col]` with row 0 on top.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape([[bool; PIECE_SIZE]; PIECE_SIZE]);

/// Occupied bounding box of a [`Shape`], as offsets from its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

const fn parse(rows: [&[u8; PIECE_SIZE]; PIECE_SIZE]) -> Shape {
    let mut cells = [[false; PIECE_SIZE]; PIECE_SIZE];
    let mut r = 0;
    while r < PIECE_SIZE {
        let mut c = 0;
        while c < PIECE_SIZE {
            cells[r][c] = rows[r][c] == b'#';
            c += 1;
        }
        r += 1;
    }
    Shape(cells)
}

/// Canonical shapes, indexed by `PieceKind as usize`. Every kind covers at
/// least one of the two centre columns within its top two rows.
const SHAPES: [Shape; 7] = [
    parse([b"####", b"....", b"....", b"...."]),
    parse([b".##.", b".##.", b"....", b"...."]),
    parse([b".#..", b"###.", b"....", b"...."]),
    parse([b".##.", b"##..", b"....", b"...."]),
    parse([b"##..", b".##.", b"....", b"...."]),
    parse([b"#...", b"###.", b"....", b"...."]),
    parse([b"..#.", b"###.", b"....", b"...."]),
];

impl Shape {
    pub const fn from_cells(cells: [[bool; PIECE_SIZE]; PIECE_SIZE]) -> Self {
        Self(cells)
    }

    pub const fn is_set(&self, row: usize, col: usize) -> bool {
        self.0[row][col]
    }

    /// Occupied cells as `(row, col)` pairs, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..PIECE_SIZE)
            .flat_map(|r| (0..PIECE_SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.0[r][c])
    }

    /// Quarter turn clockwise: `rotated[j][3 - i] = cells[i][j]`.
    #[must_use]
    pub fn rotated_cw(&self) -> Self {
        let mut out = [[false; PIECE_SIZE]; PIECE_SIZE];
        for (i, row) in self.0.iter().enumerate() {
            for (j, &set) in row.iter().enumerate() {
                out[j][PIECE_SIZE - 1 - i] = set;
            }
        }
        Self(out)
    }

    /// Quarter turn counter-clockwise: `rotated[3 - j][i] = cells[i][j]`.
    #[must_use]
    pub fn rotated_ccw(&self) -> Self {
        let mut out = [[false; PIECE_SIZE]; PIECE_SIZE];
        for (i, row) in self.0.iter().enumerate() {
            for (j, &set) in row.iter().enumerate() {
                out[PIECE_SIZE - 1 - j][i] = set;
            }
        }
        Self(out)
    }

    /// Bounding box of the occupied cells, `None` for an empty matrix.
    pub fn extent(&self) -> Option<Extent> {
        self.cells().fold(None, |acc, (r, c)| {
            let (r, c) = (r as i32, c as i32);
            Some(match acc {
                None => Extent {
                    left: c,
                    right: c,
                    top: r,
                    bottom: r,
                },
                Some(e) => Extent {
                    left: e.left.min(c),
                    right: e.right.max(c),
                    top: e.top.min(r),
                    bottom: e.bottom.max(r),
                },
            })
        })
    }
}

// ── Generators ──────────────────────────────────────────────────────────────

/// Source of the kinds handed out at spawn time.
pub trait PieceProducer {
    fn generate(&mut self) -> PieceKind;

    /// Called when a new session starts. Deterministic producers ignore it.
    fn reseed(&mut self, _seed: u32) {}
}

/// Uniform random kinds from a xorshift32 generator.
pub struct RandomProducer(u32);

impl RandomProducer {
    const FALLBACK_SEED: u32 = 0xCAFE_BABE;

    pub const fn new(seed: u32) -> Self {
        // xorshift never leaves the all-zero state
        Self(if seed == 0 { Self::FALLBACK_SEED } else { seed })
    }

    fn next(&mut self) -> u32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0
    }
}

impl Default for RandomProducer {
    fn default() -> Self {
        Self::new(Self::FALLBACK_SEED)
    }
}

impl PieceProducer for RandomProducer {
    fn generate(&mut self) -> PieceKind {
        PieceKind::from_index((self.next() % 7) as usize)
    }

    fn reseed(&mut self, seed: u32) {
        *self = Self::new(seed ^ Self::FALLBACK_SEED);
    }
}

/// Always the same kind.
pub struct ConstantProducer(PieceKind);

impl ConstantProducer {
    #[must_use]
    pub const fn new(kind: PieceKind) -> Self {
        Self(kind)
    }
}

impl PieceProducer for ConstantProducer {
    fn generate(&mut self) -> PieceKind {
        self.0
    }
}

/// Cycles through all seven kinds in `I, O, T, S, Z, J, L` order.
pub struct LoopingProducer(PieceKind);

impl LoopingProducer {
    #[must_use]
    pub const fn new() -> Self {
        Self(PieceKind::I)
    }
}

impl Default for LoopingProducer {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProducer for LoopingProducer {
    fn generate(&mut self) -> PieceKind {
        let next = PieceKind::from_index(self.0 as usize + 1);
        replace(&mut self.0, next)
    }
}
