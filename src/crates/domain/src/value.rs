use std::fmt::{self, Display};

// Helper macro to define aggregate ID newtypes and common trait impls
macro_rules! define_id {
    ($name:ident, $inner:ty $(, $extra:ident)*) => {
        #[derive(Debug, Clone, Copy, PartialEq $(, $extra)*)]
        pub struct $name($inner);

        impl $name {
            pub fn value(&self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }

        impl From<$name> for $inner {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// users.id is an auto-increment INTEGER column
define_id!(UserId, i32, Eq, Hash);
