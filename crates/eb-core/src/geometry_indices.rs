//! Small newtype indices used throughout the connectivity codec.
//!
//! Keeping vertex, corner, face and point indices as distinct types (rather
//! than passing bare `u32`/`usize` around) makes the traversal code in
//! [`crate::encoder`] and [`crate::corner_table`] read the way the spec
//! talks about it: a `CornerIndex` is never accidentally used where a
//! `VertexIndex` was meant.

use std::fmt;

macro_rules! index_type {
    ($name:ident, $invalid:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        pub const $invalid: $name = $name(u32::MAX);
    };
}

index_type!(VertexIndex, INVALID_VERTEX_INDEX);
index_type!(CornerIndex, INVALID_CORNER_INDEX);
index_type!(FaceIndex, INVALID_FACE_INDEX);
index_type!(PointIndex, INVALID_POINT_INDEX);
