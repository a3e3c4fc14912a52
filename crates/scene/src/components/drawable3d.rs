/// Index of a baked label texture owned by the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelTextureId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape3D {
    /// Faceted diamond used for generic markers.
    Octahedron { radius: f64 },
    Sphere { radius: f64 },
    /// Flat annulus in the local XY plane, facing local +Z.
    Ring { inner: f64, outer: f64 },
    /// Three orthogonal great circles drawn as lines.
    WireSphere { radius: f64 },
    /// Textured quad expanded toward the camera in the vertex stage.
    Label {
        width: f64,
        height: f64,
        texture: LabelTextureId,
    },
}

/// Which renderer pass a shape belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MeshKind {
    Octahedron,
    Sphere,
    Ring,
    WireSphere,
    Label,
}

impl Shape3D {
    pub fn kind(&self) -> MeshKind {
        match self {
            Shape3D::Octahedron { .. } => MeshKind::Octahedron,
            Shape3D::Sphere { .. } => MeshKind::Sphere,
            Shape3D::Ring { .. } => MeshKind::Ring,
            Shape3D::WireSphere { .. } => MeshKind::WireSphere,
            Shape3D::Label { .. } => MeshKind::Label,
        }
    }

    /// Scale applied to the unit mesh of this kind.
    pub fn extent(&self) -> f64 {
        match *self {
            Shape3D::Octahedron { radius }
            | Shape3D::Sphere { radius }
            | Shape3D::WireSphere { radius } => radius,
            Shape3D::Ring { outer, .. } => outer,
            Shape3D::Label { width, .. } => width,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drawable3D {
    pub shape: Shape3D,
}

impl Drawable3D {
    pub fn octahedron(radius: f64) -> Self {
        Self {
            shape: Shape3D::Octahedron { radius },
        }
    }

    pub fn sphere(radius: f64) -> Self {
        Self {
            shape: Shape3D::Sphere { radius },
        }
    }

    pub fn ring(inner: f64, outer: f64) -> Self {
        Self {
            shape: Shape3D::Ring { inner, outer },
        }
    }

    pub fn wire_sphere(radius: f64) -> Self {
        Self {
            shape: Shape3D::WireSphere { radius },
        }
    }

    pub fn label(width: f64, height: f64, texture: LabelTextureId) -> Self {
        Self {
            shape: Shape3D::Label {
                width,
                height,
                texture,
            },
        }
    }
}
