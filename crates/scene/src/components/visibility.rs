/// Render and pick gate. Hidden entities keep their other components, so a
/// filter toggle never rebuilds geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Visibility {
    pub visible: bool,
}

impl Visibility {
    pub const VISIBLE: Self = Self { visible: true };
    pub const HIDDEN: Self = Self { visible: false };

    pub fn when(shown: bool) -> Self {
        if shown { Self::VISIBLE } else { Self::HIDDEN }
    }
}

#[cfg(test)]
mod tests {
    use super::Visibility;

    #[test]
    fn when_maps_flag() {
        assert_eq!(Visibility::when(true), Visibility::VISIBLE);
        assert_eq!(Visibility::when(false), Visibility::HIDDEN);
        assert!(!Visibility::HIDDEN.visible);
    }
}
