//! Packed positions inside one chunk.
//!
//! A chunk-wide index is `y << 8 | z << 4 | x` with `y` in `0..256`; the
//! low 12 bits of it are the index inside the section `y >> 4`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    pub fn axis(self) -> Axis {
        match self {
            Direction::Down | Direction::Up => Axis::Y,
            Direction::North | Direction::South => Axis::Z,
            Direction::West | Direction::East => Axis::X,
        }
    }

    pub fn step(self) -> i32 {
        match self {
            Direction::Down | Direction::North | Direction::West => -1,
            Direction::Up | Direction::South | Direction::East => 1,
        }
    }
}

pub fn chunk_index(section_y: i32, local: u16) -> i32 {
    section_y << 12 | local as i32
}

pub fn pack_local(x: i32, y: i32, z: i32) -> i32 {
    y << 8 | z << 4 | x
}

/// Moves `index` one step in `direction`. Returns `None` when the step
/// would leave the chunk (x or z outside `0..16`, y outside `0..256`);
/// neighbouring chunks are never addressed.
pub fn relative(index: i32, direction: Direction) -> Option<i32> {
    let step = direction.step();
    match direction.axis() {
        Axis::X => {
            let x = (index & 15) + step;
            (0..=15).contains(&x).then_some((index & !15) | x)
        }
        Axis::Y => {
            let y = (index >> 8) + step;
            (0..=255).contains(&y).then_some(y << 8 | (index & 255))
        }
        Axis::Z => {
            let z = ((index >> 4) & 15) + step;
            (0..=15).contains(&z).then_some((index & !0xF0) | z << 4)
        }
    }
}
