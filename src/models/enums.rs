use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(SkipReason {
    NoPid => "no_pid",
    NoEncounters => "no_encounters",
    NoNotes => "no_notes",
    OtherError => "other_error",
});

str_enum!(StagedFileKind {
    Ccda => "ccda",
    Notes => "notes",
});

impl SkipReason {
    pub const ALL: [SkipReason; 4] = [
        Self::NoPid,
        Self::NoEncounters,
        Self::NoNotes,
        Self::OtherError,
    ];
}

impl StagedFileKind {
    /// File extension (with leading dot) the generator uses for this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ccda => ".xml",
            Self::Notes => ".txt",
        }
    }
}
