use std::fmt::{Display, Formatter};

/// 2D extent with a width and a height.
///
/// Used both for block dimensions and for the fixed outline the final
/// placement is measured against.
#[derive(Debug, Copy, Clone, Default)]
#[derive(PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u64,
    pub height: u64,
}

impl Dimensions {
    pub const fn new(width: u64, height: u64) -> Self {
        Dimensions { width, height }
    }

    pub const fn width(self) -> u64 {
        self.width
    }

    pub const fn height(self) -> u64 {
        self.height
    }

    /// Swaps width and height.
    pub const fn flipped(self) -> Dimensions {
        Dimensions { width: self.height, height: self.width }
    }

    /// A conditional version of [`flipped`][`Self::flipped`]
    pub const fn flipped_if(self, cond: bool) -> Dimensions {
        if cond { self.flipped() } else { self }
    }

    pub const fn area(self) -> u64 {
        self.width * self.height
    }

    pub const fn empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_and_area() {
        let dims = Dimensions::new(7, 9);
        assert_eq!(dims.area(), 63);
        assert_eq!(dims.flipped(), Dimensions::new(9, 7));
        assert_eq!(dims.flipped().flipped(), dims);
        assert_eq!(dims.flipped_if(false), dims);
    }
}
