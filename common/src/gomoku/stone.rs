use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

// Every match opens with this color to move, regardless of who hosts
pub const FIRST_TURN: Stone = Stone::Black;

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Stone {
    Black,
    White,
}

impl Stone {
    pub fn opponent(self) -> Stone {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stone::Black => write!(f, "Black"),
            Stone::White => write!(f, "White"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ByStone<T> {
    pub black: T,
    pub white: T,
}

impl<T> Index<Stone> for ByStone<T> {
    type Output = T;
    fn index(&self, index: Stone) -> &Self::Output {
        match index {
            Stone::Black => &self.black,
            Stone::White => &self.white,
        }
    }
}

impl<T> IndexMut<Stone> for ByStone<T> {
    fn index_mut(&mut self, index: Stone) -> &mut Self::Output {
        match index {
            Stone::Black => &mut self.black,
            Stone::White => &mut self.white,
        }
    }
}
